//! Ordered field/value maps: [`Record`] for input, [`Row`] for query output.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tokio_postgres::types::{FromSql, Type};

/// An ordered mapping from column name to value.
///
/// Insertion order is kept so that generated column and SET lists are
/// deterministic. Setting an existing column replaces its value in place.
///
/// # Example
///
/// ```ignore
/// let user = pgtable::record! { "name" => "ali", "age" => 18 };
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value (chainable, consumes self).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(name, _)| name == column)?;
        Some(self.fields.remove(pos).1)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Apply `f` to every value, keeping order.
    pub(crate) fn try_map_values(
        self,
        mut f: impl FnMut(Value) -> OrmResult<Value>,
    ) -> OrmResult<Self> {
        let fields = self
            .fields
            .into_iter()
            .map(|(k, v)| f(v).map(|v| (k, v)))
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(Self { fields })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Build a [`Record`] from `column => value` pairs.
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut __pgtable_record = $crate::Record::new();
        $( __pgtable_record.set($column, $value); )+
        __pgtable_record
    }};
}

/// A row returned by the engine. Read-only once produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Build a row from `(column, value)` pairs, in column order.
    ///
    /// Used by [`Executor`](crate::Executor) implementations.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    /// Copy this row into a [`Record`] (e.g. to edit and `save` it back).
    pub fn to_record(&self) -> Record {
        self.iter().map(|(k, v)| (k, v.clone())).collect()
    }

    /// Decode a `tokio_postgres` row.
    pub fn from_pg(row: &tokio_postgres::Row) -> OrmResult<Self> {
        let columns = row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                decode_column(row, idx, column.type_())
                    .map(|v| (column.name().to_string(), v))
                    .map_err(|e| OrmError::decode(column.name(), e.to_string()))
            })
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(Self { columns })
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (k, v) in &self.columns {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

fn get<T>(
    row: &tokio_postgres::Row,
    idx: usize,
    f: impl FnOnce(T) -> Value,
) -> Result<Value, tokio_postgres::Error>
where
    T: for<'a> FromSql<'a>,
{
    Ok(row.try_get::<_, Option<T>>(idx)?.map_or(Value::Null, f))
}

fn decode_column(
    row: &tokio_postgres::Row,
    idx: usize,
    ty: &Type,
) -> Result<Value, tokio_postgres::Error> {
    match *ty {
        Type::BOOL => get::<bool>(row, idx, Value::Bool),
        Type::INT2 => get::<i16>(row, idx, Value::from),
        Type::INT4 => get::<i32>(row, idx, Value::from),
        Type::INT8 => get::<i64>(row, idx, Value::Int),
        Type::OID => get::<u32>(row, idx, Value::from),
        Type::FLOAT4 => get::<f32>(row, idx, Value::from),
        Type::FLOAT8 => get::<f64>(row, idx, Value::Float),
        Type::NUMERIC => get::<rust_decimal::Decimal>(row, idx, |v| Value::Text(v.to_string())),
        Type::UUID => get::<uuid::Uuid>(row, idx, |v| Value::Text(v.to_string())),
        Type::JSON | Type::JSONB => {
            get::<serde_json::Value>(row, idx, |v| Value::Text(v.to_string()))
        }
        Type::DATE => get::<chrono::NaiveDate>(row, idx, |v| Value::Text(v.to_string())),
        Type::TIME => get::<chrono::NaiveTime>(row, idx, |v| Value::Text(v.to_string())),
        Type::TIMESTAMP => {
            get::<chrono::NaiveDateTime>(row, idx, |v| Value::Text(v.to_string()))
        }
        Type::TIMESTAMPTZ => get::<chrono::DateTime<chrono::Utc>>(row, idx, |v| {
            Value::Text(v.to_rfc3339())
        }),
        _ => get::<String>(row, idx, Value::Text),
    }
}
