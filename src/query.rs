//! A rendered SELECT statement: SQL text plus ordered parameters.

use crate::error::{QbError, QbResult};
use crate::param::ParamList;
use tokio_postgres::types::ToSql;

/// A rendered statement produced by [`SelectQuery::build`](crate::SelectQuery::build).
///
/// Holds the final SQL text and two parameter groups: the *referenced*
/// parameters (those with a `$n` placeholder in the text, in index order) and
/// the *extra* parameters (bound values never referenced by a placeholder,
/// appended last). Execution sends only the referenced group to the driver;
/// [`Query::params`] exposes both.
#[must_use]
#[derive(Clone, Debug)]
pub struct Query {
    pub(crate) sql: String,
    pub(crate) params: ParamList,
    pub(crate) extra: ParamList,
    pub(crate) build_error: Option<String>,
}

impl Query {
    /// The rendered SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// All parameters: referenced placeholders in order, then unreferenced
    /// bound values.
    pub fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let mut refs = self.params.as_refs();
        refs.extend(self.extra.as_refs());
        refs
    }

    /// Total parameter count (referenced + unreferenced).
    pub fn param_count(&self) -> usize {
        self.params.len() + self.extra.len()
    }

    /// Parameters actually sent to the driver.
    pub(crate) fn exec_params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.as_refs()
    }

    /// Surface any deferred rendering error.
    pub(crate) fn validate(&self) -> QbResult<()> {
        match &self.build_error {
            Some(msg) => Err(QbError::validation(msg.clone())),
            None => Ok(()),
        }
    }
}

/// Shift every `$n` placeholder in a SQL fragment by an offset.
///
/// Used when splicing a sub-query (UNION arm) into a statement that already
/// carries parameters: with offset=3, `$1 AND $2` becomes `$4 AND $5`.
pub(crate) fn adjust_placeholders(sql: &str, offset: usize) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            let mut num_str = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_ascii_digit() {
                    num_str.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            if let Ok(old_idx) = num_str.parse::<usize>() {
                result.push('$');
                result.push_str(&(old_idx + offset).to_string());
            } else {
                result.push('$');
                result.push_str(&num_str);
            }
        } else {
            result.push(ch);
        }
    }

    result
}
