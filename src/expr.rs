//! Boolean expression layer for WHERE/HAVING/ON conditions.
//!
//! `Expr` is a tagged union over the fragment kinds a filter can be built
//! from. Positional `$n` placeholders are computed at build time — no string
//! replacement of already-rendered text. Raw fragments may carry `:name`
//! tokens, which the statement renderer resolves against attached and bound
//! named parameters after clause assembly.

use crate::ident::quote_column;
use crate::param::{ParamList, Params};

/// Connector between compound sub-expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    fn as_sql(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// A renderable filter fragment plus its bound parameters.
#[derive(Clone, Debug, Default)]
pub enum Expr {
    /// No filter. Combining it with anything yields the other operand.
    #[default]
    None,

    /// A literal SQL fragment with optional attached named parameters.
    ///
    /// The text is emitted as-is, never quoted. `:name` tokens reference the
    /// attached parameters (or the statement's bound parameters).
    Raw { sql: String, params: Params },

    /// A column→value map rendered as `"col" = $n` fragments joined by AND,
    /// in ascending key order. A NULL-marker value renders `"col" IS NULL`.
    Hash(Params),

    /// Ordered (connector, expression) pairs; the first connector is ignored.
    /// Each non-empty sub-expression is parenthesized and joined by its
    /// connector. One element renders without parentheses.
    Compound(Vec<(Connector, Expr)>),
}

impl Expr {
    /// Create a raw SQL fragment.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw {
            sql: sql.into(),
            params: Params::new(),
        }
    }

    /// Create a raw SQL fragment with attached named parameters.
    ///
    /// # Example
    /// ```ignore
    /// Expr::raw_params("age > :min", Params::new().set("min", 18))
    /// ```
    pub fn raw_params(sql: impl Into<String>, params: Params) -> Self {
        Expr::Raw {
            sql: sql.into(),
            params,
        }
    }

    /// Create a hash expression from a column→value map.
    pub fn hash(params: Params) -> Self {
        Expr::Hash(params)
    }

    /// Combine with another expression using AND.
    pub fn and(self, other: Expr) -> Self {
        Self::combine(self, other, Connector::And)
    }

    /// Combine with another expression using OR.
    pub fn or(self, other: Expr) -> Self {
        Self::combine(self, other, Connector::Or)
    }

    /// Combine two expressions with a connector.
    ///
    /// An absent operand yields the other unchanged. A compound whose
    /// connectors all match is flattened (the new operand is appended);
    /// differing connectors nest, preserving the inner parentheses.
    fn combine(a: Expr, b: Expr, connector: Connector) -> Expr {
        if a.is_empty() {
            return b;
        }
        if b.is_empty() {
            return a;
        }
        if let Expr::Compound(mut items) = a {
            if items.iter().skip(1).all(|(c, _)| *c == connector) {
                items.push((connector, b));
                return Expr::Compound(items);
            }
            return Expr::Compound(vec![
                (connector, Expr::Compound(items)),
                (connector, b),
            ]);
        }
        Expr::Compound(vec![(connector, a), (connector, b)])
    }

    /// Check whether this expression renders to nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Expr::None => true,
            Expr::Raw { sql, .. } => sql.is_empty(),
            Expr::Hash(params) => params.is_empty(),
            Expr::Compound(items) => items.iter().all(|(_, e)| e.is_empty()),
        }
    }

    /// Build the SQL fragment.
    ///
    /// Hash values are pushed onto `params` with `$n` placeholders numbered
    /// at build time; raw-fragment parameters are collected into `pending`
    /// for `:name` resolution once the whole statement is assembled.
    pub(crate) fn build(&self, params: &mut ParamList, pending: &mut Params) -> String {
        match self {
            Expr::None => String::new(),
            Expr::Raw { sql, params: attached } => {
                pending.merge(attached.clone());
                sql.clone()
            }
            Expr::Hash(map) => {
                let parts: Vec<String> = map
                    .sorted()
                    .into_iter()
                    .map(|(col, value)| match value {
                        Some(param) => {
                            let idx = params.push_param(param.clone());
                            format!("{} = ${}", quote_column(col), idx)
                        }
                        None => format!("{} IS NULL", quote_column(col)),
                    })
                    .collect();
                parts.join(" AND ")
            }
            Expr::Compound(items) => {
                let rendered: Vec<(Connector, String)> = items
                    .iter()
                    .filter(|(_, e)| !e.is_empty())
                    .map(|(c, e)| (*c, e.build(params, pending)))
                    .filter(|(_, s)| !s.is_empty())
                    .collect();
                match rendered.len() {
                    0 => String::new(),
                    1 => rendered.into_iter().next().map(|(_, s)| s).unwrap_or_default(),
                    _ => {
                        let mut out = String::new();
                        for (i, (connector, sql)) in rendered.iter().enumerate() {
                            if i > 0 {
                                out.push(' ');
                                out.push_str(connector.as_sql());
                                out.push(' ');
                            }
                            out.push('(');
                            out.push_str(sql);
                            out.push(')');
                        }
                        out
                    }
                }
            }
        }
    }
}

/// Shorthand for a single-column equality hash expression.
pub fn eq<T: tokio_postgres::types::ToSql + Send + Sync + 'static>(
    column: impl Into<String>,
    value: T,
) -> Expr {
    Expr::hash(Params::new().set(column, value))
}
