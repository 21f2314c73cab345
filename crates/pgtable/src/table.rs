//! The table accessor.
//!
//! A [`Table`] binds a borrowed [`Connection`] to one table and its primary
//! key and exposes CRUD operations over it. Each operation validates
//! identifiers, sanitizes values, builds one statement and runs it; a driver
//! failure comes back as [`OrmError::Engine`] named after the operation
//! (`"Select function error: ..."`).
//!
//! # Example
//!
//! ```ignore
//! use pgtable::{record, Connection, Table};
//!
//! let conn = Connection::connect(&database_url).await?;
//! let users = Table::new(&conn, "users", "id")?;
//!
//! users.save(record! { "name" => "ali", "age" => "18" }).await?;
//! let ali = users.find("name", "ali").await?;
//! ali.delete(pgtable::RowScope::First).await?;
//! ```

use crate::builder::{self, Combinator, SortOrder};
use crate::client::Executor;
use crate::config::TableConfig;
use crate::connection::Connection;
use crate::error::{OrmError, OrmResult};
use crate::ident::{Ident, IntoIdent};
use crate::result_set::ResultSet;
use crate::row::{Record, Row};
use crate::sanitize;
use crate::sql::Sql;
use crate::transaction;
use crate::value::Value;

/// Marker argument for operations that touch every row of the table.
///
/// Passing it is the caller's explicit opt-in to an unconditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyToAll;

/// A single-table accessor over a shared connection.
pub struct Table<'c, E> {
    conn: &'c Connection<E>,
    table: Ident,
    primary_key: Ident,
    config: TableConfig,
}

impl<E> Clone for Table<'_, E> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn,
            table: self.table.clone(),
            primary_key: self.primary_key.clone(),
            config: self.config.clone(),
        }
    }
}

impl<E> std::fmt::Debug for Table<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("table", &self.table)
            .field("primary_key", &self.primary_key)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'c, E> Table<'c, E> {
    pub fn table_name(&self) -> &Ident {
        &self.table
    }

    pub fn primary_key(&self) -> &Ident {
        &self.primary_key
    }

    pub fn connection(&self) -> &'c Connection<E> {
        self.conn
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }
}

impl<'c, E: Executor> Table<'c, E> {
    /// Bind `conn` to `table` (optionally schema-qualified) keyed by `primary_key`.
    pub fn new(
        conn: &'c Connection<E>,
        table: impl IntoIdent,
        primary_key: impl IntoIdent,
    ) -> OrmResult<Self> {
        let table = table.into_ident()?;
        let primary_key = primary_key.into_ident()?;
        if !primary_key.is_simple() {
            return Err(OrmError::validation(format!(
                "Primary key '{primary_key}' must be a single column name"
            )));
        }
        Ok(Self {
            conn,
            table,
            primary_key,
            config: TableConfig::default(),
        })
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    pub(crate) fn value(&self, value: Value) -> OrmResult<Value> {
        if self.config.sanitize_values {
            sanitize::sanitize_value(value)
        } else {
            Ok(value)
        }
    }

    pub(crate) fn record(&self, record: Record) -> OrmResult<Record> {
        if self.config.sanitize_values {
            sanitize::sanitize_record(record)
        } else {
            Ok(record)
        }
    }

    fn wrap(&self, rows: Vec<Row>) -> Option<ResultSet<'c, E>> {
        ResultSet::non_empty(self, rows)
    }

    async fn fetch(&self, operation: &'static str, sql: Sql) -> OrmResult<Vec<Row>> {
        self.conn.query(operation, &sql, &self.config).await
    }

    async fn fetch_one(&self, operation: &'static str, sql: Sql) -> OrmResult<Row> {
        self.fetch(operation, sql)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OrmError::not_found(format!("no rows in {}", self.table)))
    }

    async fn scalar(&self, operation: &'static str, sql: Sql) -> OrmResult<i64> {
        let row = self.fetch_one(operation, sql).await?;
        row.iter()
            .next()
            .and_then(|(_, v)| v.as_i64())
            .ok_or_else(|| OrmError::decode("count", "expected an integer"))
    }

    async fn run(&self, operation: &'static str, sql: Sql) -> OrmResult<u64> {
        self.conn.execute(operation, &sql, &self.config).await
    }

    // ==================== Reads ====================

    /// `SELECT "field" FROM t`. `None` when the table is empty.
    pub async fn select(&self, field: &str) -> OrmResult<Option<ResultSet<'c, E>>> {
        let field = Ident::column(field)?;
        let rows = self
            .fetch("Select", builder::build_select(&self.table, Some(&field)))
            .await?;
        Ok(self.wrap(rows))
    }

    /// The first row where `field = value`, as a one-row result set.
    pub async fn find(&self, field: &str, value: impl Into<Value>) -> OrmResult<ResultSet<'c, E>> {
        let field = Ident::column(field)?;
        let value = self.value(value.into())?;
        let row = self
            .fetch("Find", builder::build_find(&self.table, &field, value.clone()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                OrmError::not_found(format!("no row in {} where {field} = {value}", self.table))
            })?;
        ResultSet::new(self, vec![row])
    }

    /// Rows matching every (`And`) or any (`Or`) of the equality conditions.
    pub async fn find_all(
        &self,
        conditions: Record,
        combinator: Combinator,
    ) -> OrmResult<Option<ResultSet<'c, E>>> {
        if conditions.is_empty() {
            return Err(OrmError::EmptyCondition);
        }
        let conditions = self.record(conditions)?;
        let sql = builder::build_find_multi(&self.table, &conditions, combinator)?;
        let operation = match combinator {
            Combinator::And => "FindWithAnd",
            Combinator::Or => "FindWithOr",
        };
        let rows = self.fetch(operation, sql).await?;
        Ok(self.wrap(rows))
    }

    /// Shorthand for `find_all(conditions, Combinator::And)`.
    pub async fn find_with_and(&self, conditions: Record) -> OrmResult<Option<ResultSet<'c, E>>> {
        self.find_all(conditions, Combinator::And).await
    }

    /// Shorthand for `find_all(conditions, Combinator::Or)`.
    pub async fn find_with_or(&self, conditions: Record) -> OrmResult<Option<ResultSet<'c, E>>> {
        self.find_all(conditions, Combinator::Or).await
    }

    pub async fn get_all(&self) -> OrmResult<Option<ResultSet<'c, E>>> {
        let rows = self
            .fetch("GetAll", builder::build_select(&self.table, None))
            .await?;
        Ok(self.wrap(rows))
    }

    /// The row with the lowest primary key.
    pub async fn get_first(&self) -> OrmResult<Row> {
        let sql = builder::build_first_last(&self.table, &self.primary_key, SortOrder::Asc);
        self.fetch_one("GetFirst", sql).await
    }

    /// The row with the highest primary key.
    pub async fn get_last(&self) -> OrmResult<Row> {
        let sql = builder::build_first_last(&self.table, &self.primary_key, SortOrder::Desc);
        self.fetch_one("GetLast", sql).await
    }

    pub async fn get_paginated(
        &self,
        limit: i64,
        offset: i64,
    ) -> OrmResult<Option<ResultSet<'c, E>>> {
        if limit < 0 || offset < 0 {
            return Err(OrmError::validation(format!(
                "limit ({limit}) and offset ({offset}) must not be negative"
            )));
        }
        let rows = self
            .fetch("GetPaginated", builder::build_paginate(&self.table, limit, offset))
            .await?;
        Ok(self.wrap(rows))
    }

    /// One row per distinct `field` value: `{field, count}`.
    pub async fn get_grouped(&self, field: &str) -> OrmResult<Option<ResultSet<'c, E>>> {
        let field = Ident::column(field)?;
        let rows = self
            .fetch("GetGrouped", builder::build_group_by(&self.table, &field))
            .await?;
        Ok(self.wrap(rows))
    }

    pub async fn get_random(&self) -> OrmResult<Row> {
        self.fetch_one("GetRandom", builder::build_random_row(&self.table))
            .await
    }

    /// Number of rows in the table.
    pub async fn total(&self) -> OrmResult<i64> {
        self.scalar("Total", builder::build_count(&self.table, None))
            .await
    }

    /// Number of rows where `field = value`.
    pub async fn total_field(&self, field: &str, value: impl Into<Value>) -> OrmResult<i64> {
        let field = Ident::column(field)?;
        let value = self.value(value.into())?;
        self.scalar(
            "TotalField",
            builder::build_count(&self.table, Some((&field, value))),
        )
        .await
    }

    // ==================== Writes ====================

    /// Insert when the primary key is absent or empty in `record`, update otherwise.
    ///
    /// "Empty" is [`Value::is_empty`]: `NULL`, `""`, `"0"`, `0` and `false`.
    pub async fn save(&self, record: Record) -> OrmResult<u64> {
        let record = self.record(record)?;
        let has_key = record
            .get(self.primary_key.name())
            .is_some_and(|v| !v.is_empty());
        if has_key {
            self.update_sanitized(&record).await
        } else {
            self.insert_sanitized(&record).await
        }
    }

    /// INSERT `record`, leaving the primary key to the database.
    pub async fn insert(&self, record: Record) -> OrmResult<u64> {
        let record = self.record(record)?;
        self.insert_sanitized(&record).await
    }

    /// UPDATE the row whose primary key is given in `record`.
    pub async fn update(&self, record: Record) -> OrmResult<u64> {
        let record = self.record(record)?;
        self.update_sanitized(&record).await
    }

    async fn insert_sanitized(&self, record: &Record) -> OrmResult<u64> {
        let sql = builder::build_insert(&self.table, &self.primary_key, record)?;
        self.run("Insert", sql).await
    }

    async fn update_sanitized(&self, record: &Record) -> OrmResult<u64> {
        let sql = builder::build_update(&self.table, &self.primary_key, record)?;
        self.run("Update", sql).await
    }

    /// DELETE every row where `field = value`.
    pub async fn delete(&self, field: &str, value: impl Into<Value>) -> OrmResult<u64> {
        let field = Ident::column(field)?;
        let value = self.value(value.into())?;
        self.run("Delete", builder::build_delete(&self.table, &field, value))
            .await
    }

    /// Set `field` to `value` on **every** row of the table (no WHERE clause).
    pub async fn update_field(
        &self,
        field: &str,
        value: impl Into<Value>,
        _scope: ApplyToAll,
    ) -> OrmResult<u64> {
        let field = Ident::column(field)?;
        let value = self.value(value.into())?;
        self.run(
            "UpdateField",
            builder::build_update_all(&self.table, &field, value),
        )
        .await
    }

    /// Remove every row.
    pub async fn truncate(&self) -> OrmResult<()> {
        self.run("Truncate", builder::build_truncate(&self.table))
            .await
            .map(|_| ())
    }

    // ==================== Transactions ====================

    /// Run `unit_of_work` inside a transaction on this table's connection.
    ///
    /// The closure receives this accessor; anything it does (including through
    /// result sets it produces) runs on the same connection. Commits on `Ok`,
    /// rolls back on `Err` and returns [`OrmError::Transaction`]. Fails with
    /// [`OrmError::TransactionActive`] if the connection is already in one.
    pub async fn transaction<T, F>(&self, unit_of_work: F) -> OrmResult<T>
    where
        F: AsyncFnOnce(&Table<'c, E>) -> OrmResult<T>,
    {
        transaction::run(self, unit_of_work).await
    }
}
