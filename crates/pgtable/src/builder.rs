//! Statement builders for single-table operations.
//!
//! Pure construction, no I/O: every function returns an [`Sql`] (text plus
//! ordered bound values). Column names taken from a [`Record`] are validated
//! here; column lists follow the record's order.

use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::row::Record;
use crate::sql::Sql;
use crate::value::Value;

/// How the predicates of a condition set are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn separator(self) -> &'static str {
        match self {
            Combinator::And => " AND ",
            Combinator::Or => " OR ",
        }
    }
}

/// Primary-key ordering for first/last lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

fn columns(record: &Record) -> OrmResult<Vec<(Ident, Value)>> {
    record
        .iter()
        .map(|(name, value)| Ident::column(name).map(|c| (c, value.clone())))
        .collect()
}

fn select_from(table: &Ident) -> Sql {
    let mut q = Sql::new("SELECT * FROM ");
    q.push_ident(table);
    q
}

/// `SELECT "field" FROM t`, or `SELECT * FROM t` without a field.
pub fn build_select(table: &Ident, field: Option<&Ident>) -> Sql {
    let mut q = Sql::new("SELECT ");
    match field {
        Some(field) => q.push_ident(field),
        None => q.push("*"),
    };
    q.push(" FROM ").push_ident(table);
    q
}

/// `SELECT * FROM t WHERE "field" = $1`
pub fn build_find(table: &Ident, field: &Ident, value: Value) -> Sql {
    let mut q = select_from(table);
    q.push(" WHERE ").push_ident(field).push(" = ").push_bind(value);
    q
}

/// `SELECT * FROM t WHERE "a" = $1 AND|OR "b" = $2 ...`
pub fn build_find_multi(table: &Ident, conditions: &Record, combinator: Combinator) -> OrmResult<Sql> {
    if conditions.is_empty() {
        return Err(OrmError::EmptyCondition);
    }
    let predicates = columns(conditions)?;
    let mut q = select_from(table);
    q.push(" WHERE ").push_assignments(
        predicates.iter().map(|(c, v)| (c, v.clone())),
        combinator.separator(),
    );
    Ok(q)
}

/// `INSERT INTO t ("a", "b") VALUES ($1, $2)`; the primary key is left to the database.
pub fn build_insert(table: &Ident, primary_key: &Ident, values: &Record) -> OrmResult<Sql> {
    let cols: Vec<_> = columns(values)?
        .into_iter()
        .filter(|(c, _)| c != primary_key)
        .collect();
    if cols.is_empty() {
        return Err(OrmError::EmptyRecord);
    }

    let mut q = Sql::new("INSERT INTO ");
    q.push_ident(table)
        .push(" (")
        .push_ident_list(cols.iter().map(|(c, _)| c))
        .push(") VALUES (")
        .push_bind_list(cols.into_iter().map(|(_, v)| v))
        .push(")");
    Ok(q)
}

fn set_clause(table: &Ident, primary_key: &Ident, values: &Record) -> OrmResult<Sql> {
    let cols: Vec<_> = columns(values)?
        .into_iter()
        .filter(|(c, _)| c != primary_key)
        .collect();
    if cols.is_empty() {
        return Err(OrmError::EmptyRecord);
    }

    let mut q = Sql::new("UPDATE ");
    q.push_ident(table)
        .push(" SET ")
        .push_assignments(cols.iter().map(|(c, v)| (c, v.clone())), ", ");
    Ok(q)
}

/// `UPDATE t SET "a" = $1, ... WHERE "pk" = $n`.
///
/// The primary key is not part of the SET list; its value is bound as a
/// separate trailing parameter used only by the WHERE predicate. A missing or
/// `NULL` key fails with `MissingPrimaryKey`; `0` is a valid key.
pub fn build_update(table: &Ident, primary_key: &Ident, values: &Record) -> OrmResult<Sql> {
    let key = values
        .get(primary_key.name())
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or_else(|| OrmError::MissingPrimaryKey(primary_key.name().to_string()))?;

    let mut q = set_clause(table, primary_key, values)?;
    q.push(" WHERE ").push_ident(primary_key).push(" = ").push_bind(key);
    Ok(q)
}

/// `UPDATE t SET ... WHERE "pk" IN ($k, ...)`
pub fn build_update_in(
    table: &Ident,
    primary_key: &Ident,
    values: &Record,
    keys: &[Value],
) -> OrmResult<Sql> {
    if keys.is_empty() {
        return Err(OrmError::EmptyCondition);
    }
    let mut q = set_clause(table, primary_key, values)?;
    q.push(" WHERE ")
        .push_ident(primary_key)
        .push(" IN (")
        .push_bind_list(keys.iter().cloned())
        .push(")");
    Ok(q)
}

/// `UPDATE t SET "field" = $1` on every row.
pub fn build_update_all(table: &Ident, field: &Ident, value: Value) -> Sql {
    let mut q = Sql::new("UPDATE ");
    q.push_ident(table)
        .push(" SET ")
        .push_ident(field)
        .push(" = ")
        .push_bind(value);
    q
}

/// `DELETE FROM t WHERE "field" = $1`
pub fn build_delete(table: &Ident, field: &Ident, value: Value) -> Sql {
    let mut q = Sql::new("DELETE FROM ");
    q.push_ident(table)
        .push(" WHERE ")
        .push_ident(field)
        .push(" = ")
        .push_bind(value);
    q
}

/// `DELETE FROM t WHERE "field" IN ($1, ...)`
pub fn build_delete_in(table: &Ident, field: &Ident, values: &[Value]) -> OrmResult<Sql> {
    if values.is_empty() {
        return Err(OrmError::EmptyCondition);
    }
    let mut q = Sql::new("DELETE FROM ");
    q.push_ident(table)
        .push(" WHERE ")
        .push_ident(field)
        .push(" IN (")
        .push_bind_list(values.iter().cloned())
        .push(")");
    Ok(q)
}

/// `SELECT * FROM t LIMIT $1 OFFSET $2`
pub fn build_paginate(table: &Ident, limit: i64, offset: i64) -> Sql {
    let mut q = select_from(table);
    q.push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    q
}

/// `SELECT "field", COUNT(*) AS "count" FROM t GROUP BY "field"`
pub fn build_group_by(table: &Ident, field: &Ident) -> Sql {
    let mut q = Sql::new("SELECT ");
    q.push_ident(field)
        .push(r#", COUNT(*) AS "count" FROM "#)
        .push_ident(table)
        .push(" GROUP BY ")
        .push_ident(field);
    q
}

/// `SELECT * FROM t ORDER BY RANDOM() LIMIT 1`
pub fn build_random_row(table: &Ident) -> Sql {
    let mut q = select_from(table);
    q.push(" ORDER BY RANDOM() LIMIT 1");
    q
}

/// `SELECT * FROM t ORDER BY "pk" ASC|DESC LIMIT 1`
pub fn build_first_last(table: &Ident, primary_key: &Ident, order: SortOrder) -> Sql {
    let mut q = select_from(table);
    q.push(" ORDER BY ").push_ident(primary_key).push(match order {
        SortOrder::Asc => " ASC LIMIT 1",
        SortOrder::Desc => " DESC LIMIT 1",
    });
    q
}

/// `SELECT COUNT(*) FROM t [WHERE "field" = $1]`
pub fn build_count(table: &Ident, filter: Option<(&Ident, Value)>) -> Sql {
    let mut q = Sql::new("SELECT COUNT(*) FROM ");
    q.push_ident(table);
    if let Some((field, value)) = filter {
        q.push(" WHERE ").push_ident(field).push(" = ").push_bind(value);
    }
    q
}

/// `TRUNCATE TABLE t`
pub fn build_truncate(table: &Ident) -> Sql {
    let mut q = Sql::new("TRUNCATE TABLE ");
    q.push_ident(table);
    q
}
