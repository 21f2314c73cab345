//! # pgtable
//!
//! A single-table accessor for Postgres.
//!
//! ## Features
//!
//! - **One table, one key**: bind a [`Table`] to a table name and its primary key, then read and write rows
//! - **Bound literals, quoted identifiers**: values are always `$n` parameters; table and column names pass a strict allow-list
//! - **Sanitized input**: e-mail and URL values are filtered, everything else is HTML-escaped (configurable)
//! - **Result sets that act**: filter, group and pick rows in memory, then delete or update them by primary key
//! - **Transactions**: run a unit of work as an async closure; commit on `Ok`, roll back on `Err`
//!
//! ## Example
//!
//! ```ignore
//! use pgtable::prelude::*;
//!
//! let conn = Connection::connect("postgres://localhost/app").await?;
//! let users = Table::new(&conn, "users", "id")?;
//!
//! users.save(record! { "name" => "ali", "age" => "18" }).await?;
//! users.save(record! { "name" => "veli", "age" => "18" }).await?;
//!
//! if let Some(adults) = users.find_with_and(record! { "age" => 18 }).await? {
//!     println!("{}", adults.to_json()?);
//!     adults.update(record! { "age" => 19 }, RowScope::All).await?;
//! }
//!
//! users.transaction(async |tx| {
//!     tx.delete("name", "veli").await?;
//!     Ok(())
//! }).await?;
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod ident;
mod log;
pub mod prelude;
pub mod result_set;
pub mod row;
pub mod sanitize;
pub mod sql;
pub mod table;
mod transaction;
pub mod value;

#[cfg(test)]
mod testing;

pub use builder::{Combinator, SortOrder};
pub use client::Executor;
pub use config::TableConfig;
pub use connection::{Connection, TransactionState};
pub use error::{OrmError, OrmResult};
pub use ident::{Ident, IntoIdent};
pub use result_set::{ResultSet, RowScope};
pub use row::{Record, Row};
pub use sql::Sql;
pub use table::{ApplyToAll, Table};
pub use value::Value;
