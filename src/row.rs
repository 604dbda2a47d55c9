//! Row mapping traits and utilities.

use crate::error::{QbError, QbResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Trait for converting a database row into a Rust value.
///
/// Struct destinations implement this by hand; scalar types have built-in
/// implementations that require a single-column row.
///
/// # Example
///
/// ```ignore
/// use pgqb::{FromRow, QbResult, RowExt};
///
/// struct Customer {
///     id: i64,
///     email: String,
/// }
///
/// impl FromRow for Customer {
///     fn from_row(row: &tokio_postgres::Row) -> QbResult<Self> {
///         Ok(Self {
///             id: row.try_get_column("id")?,
///             email: row.try_get_column("email")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> QbResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning [`QbError::Decode`] on failure
    fn try_get_column<T>(&self, column: &str) -> QbResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> QbResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| QbError::decode(column, e.to_string()))
    }
}

/// Extract a scalar from a row, requiring exactly one column.
pub(crate) fn scalar_from_row<T>(row: &Row) -> QbResult<T>
where
    T: for<'a> FromSql<'a>,
{
    if row.len() != 1 {
        return Err(QbError::invalid_destination(format!(
            "scalar destination requires a single-column row, got {} columns",
            row.len()
        )));
    }
    row.try_get(0).map_err(|e| QbError::decode("0", e.to_string()))
}

macro_rules! impl_scalar_from_row {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromRow for $ty {
                fn from_row(row: &Row) -> QbResult<Self> {
                    scalar_from_row(row)
                }
            }

            impl FromRow for Option<$ty> {
                fn from_row(row: &Row) -> QbResult<Self> {
                    scalar_from_row(row)
                }
            }
        )*
    };
}

impl_scalar_from_row!(
    i16,
    i32,
    i64,
    f32,
    f64,
    bool,
    String,
    Vec<u8>,
    uuid::Uuid,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    serde_json::Value,
);
