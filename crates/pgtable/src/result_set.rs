//! Rows returned by a table operation, with follow-up actions.
//!
//! A [`ResultSet`] remembers the table, primary key and connection that
//! produced it, so it can filter and group its rows in memory and also write
//! back to them (`delete`, `update`) by primary key.

use crate::builder;
use crate::client::Executor;
use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::row::{Record, Row};
use crate::table::Table;
use crate::value::Value;
use rand::Rng;
use std::collections::BTreeMap;

/// Which wrapped rows a write-back targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowScope {
    /// The first row only.
    First,
    /// The row at this position.
    Index(usize),
    /// Every row in the set.
    All,
}

/// A non-empty, ordered set of rows bound to the table that produced them.
pub struct ResultSet<'c, E> {
    table: Table<'c, E>,
    rows: Vec<Row>,
}

impl<E> Clone for ResultSet<'_, E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            rows: self.rows.clone(),
        }
    }
}

impl<E> std::fmt::Debug for ResultSet<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("table", self.table.table_name())
            .field("primary_key", self.table.primary_key())
            .field("rows", &self.rows)
            .finish()
    }
}

impl<'c, E: Executor> ResultSet<'c, E> {
    /// Wrap `rows` produced by `table`. Fails with [`OrmError::EmptyResult`]
    /// when `rows` is empty.
    pub fn new(table: &Table<'c, E>, rows: Vec<Row>) -> OrmResult<Self> {
        Self::non_empty(table, rows).ok_or(OrmError::EmptyResult)
    }

    /// `None` when `rows` is empty.
    pub(crate) fn non_empty(table: &Table<'c, E>, rows: Vec<Row>) -> Option<Self> {
        (!rows.is_empty()).then(|| Self {
            table: table.clone(),
            rows,
        })
    }

    pub fn table_name(&self) -> &Ident {
        self.table.table_name()
    }

    pub fn primary_key(&self) -> &Ident {
        self.table.primary_key()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// JSON array of row objects, keys in column order.
    pub fn to_json(&self) -> OrmResult<String> {
        serde_json::to_string(&self.rows).map_err(|e| OrmError::Serialization(e.to_string()))
    }

    /// Rows whose `field` loosely equals `value` (see [`Value::loose_eq`]).
    pub fn filter(&self, field: &str, value: impl Into<Value>) -> Option<Self> {
        let value = value.into();
        let rows: Vec<Row> = self
            .rows
            .iter()
            .filter(|row| row.get(field).is_some_and(|v| v.loose_eq(&value)))
            .cloned()
            .collect();
        Self::non_empty(&self.table, rows)
    }

    /// The first row. Requires at least two rows.
    pub fn first(&self) -> OrmResult<&Row> {
        self.require_pair()?;
        Ok(&self.rows[0])
    }

    /// The last row. Requires at least two rows.
    pub fn last(&self) -> OrmResult<&Row> {
        self.require_pair()?;
        Ok(&self.rows[self.rows.len() - 1])
    }

    fn require_pair(&self) -> OrmResult<()> {
        if self.rows.len() < 2 {
            return Err(OrmError::InsufficientRows {
                needed: 2,
                got: self.rows.len(),
            });
        }
        Ok(())
    }

    /// A uniformly chosen row.
    pub fn random(&self) -> &Row {
        let idx = rand::thread_rng().gen_range(0..self.rows.len());
        &self.rows[idx]
    }

    /// Group rows by one or more fields.
    ///
    /// Composite keys are joined with `-`; a missing or null field contributes
    /// an empty segment.
    pub fn group_by<I>(&self, keys: I) -> BTreeMap<String, Vec<Row>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let keys: Vec<I::Item> = keys.into_iter().collect();
        let mut groups: BTreeMap<String, Vec<Row>> = BTreeMap::new();
        for row in &self.rows {
            let key = keys
                .iter()
                .map(|k| row.get(k.as_ref()).map(Value::to_key_string).unwrap_or_default())
                .collect::<Vec<_>>()
                .join("-");
            groups.entry(key).or_default().push(row.clone());
        }
        groups
    }

    // ==================== Write-back ====================

    /// DELETE the targeted rows by primary key.
    pub async fn delete(&self, scope: RowScope) -> OrmResult<u64> {
        let table = &self.table;
        let sql = match scope {
            RowScope::All => {
                builder::build_delete_in(table.table_name(), table.primary_key(), &self.keys()?)?
            }
            single => builder::build_delete(
                table.table_name(),
                table.primary_key(),
                self.key_at(single)?,
            ),
        };
        table
            .connection()
            .execute("Delete", &sql, table.config())
            .await
    }

    /// UPDATE the targeted rows with `values`, keyed by primary key.
    ///
    /// `values` is sanitized like [`Table::save`]; a primary-key column in it
    /// is replaced by the targeted key.
    pub async fn update(&self, values: Record, scope: RowScope) -> OrmResult<u64> {
        let table = &self.table;
        let mut values = table.record(values)?;
        let sql = match scope {
            RowScope::All => {
                let keys = self.keys()?;
                values.remove(table.primary_key().name());
                builder::build_update_in(table.table_name(), table.primary_key(), &values, &keys)?
            }
            single => {
                values.set(table.primary_key().name(), self.key_at(single)?);
                builder::build_update(table.table_name(), table.primary_key(), &values)?
            }
        };
        table
            .connection()
            .execute("Update", &sql, table.config())
            .await
    }

    fn key_of(&self, row: &Row) -> OrmResult<Value> {
        let pk = self.table.primary_key().name();
        row.get(pk)
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| OrmError::MissingPrimaryKey(pk.to_string()))
    }

    fn key_at(&self, scope: RowScope) -> OrmResult<Value> {
        let idx = match scope {
            RowScope::Index(i) => i,
            _ => 0,
        };
        let row = self.rows.get(idx).ok_or(OrmError::InsufficientRows {
            needed: idx + 1,
            got: self.rows.len(),
        })?;
        self.key_of(row)
    }

    fn keys(&self) -> OrmResult<Vec<Value>> {
        self.rows.iter().map(|row| self.key_of(row)).collect()
    }
}

impl<'c, E> IntoIterator for ResultSet<'c, E> {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a, 'c, E> IntoIterator for &'a ResultSet<'c, E> {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
