//! Parameter-safe SQL text assembly.
//!
//! `Sql` stores SQL pieces and bound values separately and generates `$1, $2, ...`
//! placeholders in binding order when rendered. Identifiers are appended through
//! [`Ident`], never as raw strings taken from callers.
//!
//! # Example
//!
//! ```ignore
//! use pgtable::{Ident, Sql, Value};
//!
//! let mut q = Sql::new("SELECT * FROM ");
//! q.push_ident(&Ident::parse("users")?)
//!     .push(" WHERE ")
//!     .push_ident(&Ident::column("name")?)
//!     .push(" = ")
//!     .push_bind("ali");
//! assert_eq!(q.to_sql(), r#"SELECT * FROM "users" WHERE "name" = $1"#);
//! ```

use crate::ident::Ident;
use crate::value::Value;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
enum SqlPart {
    Raw(String),
    Param,
}

/// A statement under construction: SQL text plus its ordered bound values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sql {
    parts: Vec<SqlPart>,
    params: Vec<Value>,
}

impl Sql {
    /// Create a new builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            parts: vec![SqlPart::Raw(initial_sql.into())],
            params: Vec::new(),
        }
    }

    /// Create an empty builder.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a validated identifier, double-quoted.
    pub fn push_ident(&mut self, ident: &Ident) -> &mut Self {
        let mut rendered = String::new();
        ident.write_sql(&mut rendered);
        self.push(&rendered)
    }

    /// Append `a, b, c` for a list of identifiers.
    pub fn push_ident_list<'a>(&mut self, idents: impl IntoIterator<Item = &'a Ident>) -> &mut Self {
        for (i, ident) in idents.into_iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_ident(ident);
        }
        self
    }

    /// Append a parameter placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value.into());
        self
    }

    /// Append a comma-separated list of placeholders and bind all values.
    ///
    /// If `values` is empty, this appends `NULL` (so `IN (NULL)` is valid SQL).
    pub fn push_bind_list<V: Into<Value>>(&mut self, values: impl IntoIterator<Item = V>) -> &mut Self {
        let mut iter = values.into_iter();
        let Some(first) = iter.next() else {
            return self.push("NULL");
        };

        self.push_bind(first);
        for v in iter {
            self.push(", ");
            self.push_bind(v);
        }
        self
    }

    /// Append `"col" = $n` joined by `separator`, one bound value per column.
    pub fn push_assignments<'a>(
        &mut self,
        pairs: impl IntoIterator<Item = (&'a Ident, Value)>,
        separator: &str,
    ) -> &mut Self {
        for (i, (column, value)) in pairs.into_iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            self.push_ident(column).push(" = ").push_bind(value);
        }
        self
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let mut idx: usize = 0;

        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => {
                    idx += 1;
                    let _ = write!(&mut out, "${}", idx);
                }
            }
        }
        out
    }

    /// The bound values, in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Number of bound values.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}
