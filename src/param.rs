//! Parameter storage using Arc for clone-friendly query builders.

use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly parameter wrapper using Arc.
///
/// This allows query builders and expressions to be cloned without copying
/// parameter values.
#[derive(Clone)]
pub struct Param(pub(crate) Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Create a new parameter from any ToSql value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Get a reference to the inner value as a ToSql trait object.
    pub fn as_ref(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Param").field(&"<dyn ToSql>").finish()
    }
}

/// An ordered positional parameter list, built up while rendering a statement.
#[derive(Clone, Debug, Default)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter and return its 1-based index.
    pub fn push<T: ToSql + Send + Sync + 'static>(&mut self, value: T) -> usize {
        self.params.push(Param::new(value));
        self.params.len()
    }

    /// Add a pre-wrapped Param and return its 1-based index.
    pub fn push_param(&mut self, param: Param) -> usize {
        self.params.push(param);
        self.params.len()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get all parameters as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }

    /// Extend this list with another list's parameters.
    pub fn extend(&mut self, other: &ParamList) {
        self.params.extend(other.params.iter().cloned());
    }
}

/// An ordered, name-keyed parameter set.
///
/// Used both for statement-level bound parameters (`bind`/`and_bind`) and as
/// the column→value map of hash expressions. A `None` value is the NULL
/// marker: hash expressions render it as `IS NULL`.
///
/// Insertion order is stable; setting an existing name replaces the value in
/// place, so repeated builds render identically.
#[derive(Clone, Debug, Default)]
pub struct Params {
    entries: Vec<(String, Option<Param>)>,
}

impl Params {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Bind a value under a name, replacing any existing value in place.
    pub fn set<T: ToSql + Send + Sync + 'static>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name.into(), Some(Param::new(value)));
        self
    }

    /// Bind the NULL marker under a name.
    pub fn set_null(mut self, name: impl Into<String>) -> Self {
        self.insert(name.into(), None);
        self
    }

    fn insert(&mut self, name: String, value: Option<Param>) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Merge another set into this one; later keys win on conflict.
    pub fn merge(&mut self, other: Params) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> Option<&Option<Param>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Option<Param>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Entries sorted ascending by name, for deterministic hash rendering.
    pub(crate) fn sorted(&self) -> Vec<(&str, &Option<Param>)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}
