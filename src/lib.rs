//! Composable SELECT statements for PostgreSQL, executed over
//! [`tokio-postgres`](tokio_postgres).
//!
//! A [`SelectQuery`] accumulates clauses through a fluent API, renders them
//! into parameterized SQL with `$n` placeholders, and executes against any
//! [`GenericClient`] (a client or a transaction). Filters are built from
//! [`Expr`] values combined with AND/OR semantics; results bind into raw
//! rows, scalars, or types implementing [`FromRow`]. Hook traits intercept
//! execution and binding, and the [`Model`] trait enables primary-key
//! lookups.
//!
//! # Example
//!
//! ```ignore
//! use pgqb::{eq, Expr, FromRow, Params, QbResult, RowExt};
//!
//! struct Customer {
//!     id: i64,
//!     email: String,
//! }
//!
//! impl FromRow for Customer {
//!     fn from_row(row: &tokio_postgres::Row) -> QbResult<Self> {
//!         Ok(Self {
//!             id: row.try_get_column("id")?,
//!             email: row.try_get_column("email")?,
//!         })
//!     }
//! }
//!
//! # async fn demo(client: &tokio_postgres::Client) -> QbResult<()> {
//! let mut active: Vec<Customer> = Vec::new();
//! pgqb::select(["id", "email"])
//!     .from(["customer"])
//!     .where_(eq("status", 1i32))
//!     .and_where(Expr::raw_params("created_at > :since", Params::new().set("since", "2024-01-01")))
//!     .order_by(["id"])
//!     .all(client, &mut active)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod expr;
pub mod hooks;
pub mod ident;
pub mod model;
pub mod param;
pub mod query;
pub mod row;
pub mod select;

pub use client::GenericClient;
pub use error::{QbError, QbResult};
pub use expr::{Connector, Expr, eq};
pub use hooks::{
    AllHook, BindNext, BindTarget, BoxFuture, ExecHook, ExecNext, OneHook, QueryContext,
};
pub use ident::{quote_column, quote_order_by, quote_table};
pub use model::Model;
pub use param::{Param, ParamList, Params};
pub use query::Query;
pub use row::{FromRow, RowExt};
pub use select::{SelectQuery, select, select_for};

#[cfg(feature = "tracing")]
pub use hooks::TracingExecHook;
