//! # fluentsql
//!
//! A fluent, dialect-aware SQL render engine. It sits between an
//! application's in-memory condition model and the textual SQL sent to a
//! relational database: statement intents in, parameterized SQL text plus
//! matching placeholder bindings out.
//!
//! ## Features
//!
//! - **Pure rendering**: no I/O, no connections; every entry point is a
//!   synchronous function over immutable inputs, safe to call from any
//!   number of threads
//! - **One grammar, many statement kinds**: insert / batch insert / update
//!   with optimistic-lock enforcement / physical and logical delete /
//!   count and paged select / batch array-update renumbering
//! - **Dangerous statements refused**: empty id lists, empty condition
//!   maps, unguarded versioned updates, and unconditioned deletes fail at
//!   render time instead of reaching the database
//! - **Dialect-aware**: identifier quoting and pagination per declared
//!   [`DbType`], no autodetection
//!
//! ## Usage
//!
//! ```ignore
//! use fluentsql::{DbType, FieldMeta, SqlProvider, StatementIntent, TableMapping};
//!
//! let mapping = TableMapping::new("t_user", vec![
//!     FieldMeta::new("id", "id").primary().auto_increment(),
//!     FieldMeta::new("userName", "user_name"),
//!     FieldMeta::new("version", "version").version().update_default("version + 1"),
//! ])?;
//! let provider = SqlProvider::new(&mapping, DbType::Mysql);
//!
//! // UPDATE t_user SET ... WHERE ... (version condition enforced)
//! let rendered = provider.update(
//!     &StatementIntent::new()
//!         .set("userName", "alice")
//!         .eq("id", 1i64)
//!         .eq("version", 3i32),
//! )?;
//! # Ok::<(), fluentsql::SqlError>(())
//! ```

pub mod dialect;
pub mod error;
pub mod expr;
pub mod intent;
pub mod meta;
pub mod param;
pub mod provider;
pub mod writer;

pub use dialect::DbType;
pub use error::{SqlError, SqlResult};
pub use expr::{Expr, ExprGroup};
pub use intent::{Paged, SetValue, StatementIntent};
pub use meta::{DeleteMarker, Entity, FieldMeta, FieldRole, TableMapping};
pub use param::{Binder, Binding, Param, ParamStyle, Rendered};
pub use provider::{SqlProvider, index_batch_params};
pub use writer::SqlWriter;

#[cfg(test)]
mod tests;
