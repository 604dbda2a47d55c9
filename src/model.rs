//! Table and primary-key registration for model lookups.

/// The schema-introspection collaborator: maps a destination type to its
/// table name and primary-key columns.
///
/// Implemented explicitly per type (there is no reflection to scan struct
/// attributes). [`SelectQuery::model`](crate::SelectQuery::model) consults
/// this to default the FROM clause and build the key-equality condition.
///
/// # Example
///
/// ```ignore
/// use pgqb::Model;
///
/// struct Customer {
///     id: i64,
///     email: String,
/// }
///
/// impl Model for Customer {
///     const TABLE: &'static str = "customer";
///     const PRIMARY_KEY: &'static [&'static str] = &["id"];
/// }
/// ```
pub trait Model {
    /// The table this type maps to.
    const TABLE: &'static str;

    /// Primary-key columns, in declaration order. May be empty or composite;
    /// `model()` rejects both with a distinct error.
    const PRIMARY_KEY: &'static [&'static str];
}
