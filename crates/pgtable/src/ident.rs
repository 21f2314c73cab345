//! Safe SQL identifier handling.
//!
//! Identifiers (table and column names) cannot be bound as parameters, so they
//! are interpolated into SQL text. [`Ident`] is the only way a name reaches the
//! generated SQL, and it only accepts a strict allow-list:
//!
//! - each `.`-separated part must match `[A-Za-z_][A-Za-z0-9_]*`
//! - table names may be schema-qualified (`public.users`)
//! - column names must be a single part
//!
//! Rendering wraps every part in double quotes, so reserved words such as
//! `order` or `user` are valid column names.
//!
//! # Example
//! ```ignore
//! use pgtable::Ident;
//!
//! let t = Ident::parse("public.users")?;
//! assert_eq!(t.to_sql(), r#""public"."users""#);
//! # Ok::<(), pgtable::OrmError>(())
//! ```

use crate::error::{OrmError, OrmResult};
use std::fmt;

/// A validated SQL identifier (column, table, or schema-qualified table).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    parts: Vec<String>,
}

fn validate_part(part: &str, whole: &str) -> OrmResult<()> {
    let mut chars = part.chars();
    let Some(first) = chars.next() else {
        return Err(OrmError::validation(format!(
            "Empty identifier segment in '{whole}'"
        )));
    };
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return Err(OrmError::validation(format!(
            "Invalid identifier start character '{first}' in '{whole}'"
        )));
    }
    if let Some(bad) = chars.find(|c| !(*c == '_' || c.is_ascii_alphanumeric())) {
        return Err(OrmError::validation(format!(
            "Invalid character '{}' in identifier '{whole}'",
            bad.escape_default()
        )));
    }
    Ok(())
}

impl Ident {
    /// Parse a possibly schema-qualified identifier (`users`, `public.users`).
    pub fn parse(s: &str) -> OrmResult<Self> {
        if s.is_empty() {
            return Err(OrmError::validation("Identifier cannot be empty"));
        }
        let parts = s
            .split('.')
            .map(|part| validate_part(part, s).map(|()| part.to_string()))
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(Self { parts })
    }

    /// Parse a column name: a single unqualified part.
    pub fn column(s: &str) -> OrmResult<Self> {
        let ident = Self::parse(s)?;
        if ident.parts.len() != 1 {
            return Err(OrmError::validation(format!(
                "Column name '{s}' must not be qualified"
            )));
        }
        Ok(ident)
    }

    /// Whether this identifier has a single part (usable as a column name).
    pub fn is_simple(&self) -> bool {
        self.parts.len() == 1
    }

    /// The unquoted name of the last part (the column name for columns).
    pub fn name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    /// Render the identifier as SQL, each part double-quoted.
    pub fn to_sql(&self) -> String {
        let cap = self.parts.iter().map(|p| p.len() + 3).sum();
        let mut out = String::with_capacity(cap);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            // Validated parts never contain `"`, no escaping needed.
            out.push('"');
            out.push_str(part);
            out.push('"');
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join("."))
    }
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in constructor APIs.
pub trait IntoIdent {
    fn into_ident(self) -> OrmResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> OrmResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> OrmResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> OrmResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> OrmResult<Ident> {
        Ident::parse(&self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> OrmResult<Ident> {
        Ident::parse(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        let ident = Ident::parse("users").unwrap();
        assert_eq!(ident.to_sql(), r#""users""#);
        assert_eq!(ident.name(), "users");
    }

    #[test]
    fn ident_dotted() {
        let ident = Ident::parse("public.users").unwrap();
        assert_eq!(ident.to_sql(), r#""public"."users""#);
        assert_eq!(ident.to_string(), "public.users");
        assert!(!ident.is_simple());
    }

    #[test]
    fn ident_underscore_and_digits() {
        let ident = Ident::parse("_user_2fa").unwrap();
        assert_eq!(ident.to_sql(), r#""_user_2fa""#);
    }

    #[test]
    fn column_rejects_qualified() {
        assert!(Ident::column("users.name").is_err());
        assert!(Ident::column("name").is_ok());
    }

    #[test]
    fn ident_rejects_empty() {
        assert!(Ident::parse("").is_err());
    }

    #[test]
    fn ident_rejects_start_digit() {
        assert!(Ident::parse("1table").is_err());
    }

    #[test]
    fn ident_rejects_space() {
        assert!(Ident::parse("my table").is_err());
    }

    #[test]
    fn ident_rejects_double_dot() {
        assert!(Ident::parse("schema..table").is_err());
    }

    #[test]
    fn ident_rejects_trailing_dot() {
        assert!(Ident::parse("schema.").is_err());
    }

    #[test]
    fn ident_rejects_injection_attempts() {
        assert!(Ident::parse(r#"name" = '' OR "1"#).is_err());
        assert!(Ident::parse("users; DROP TABLE users; --").is_err());
        assert!(Ident::parse("na`me").is_err());
        assert!(Ident::parse("name\0").is_err());
        assert!(Ident::parse("n&amp;me").is_err());
    }

    #[test]
    fn ident_rejects_dollar_and_unicode() {
        assert!(Ident::parse("my_var$1").is_err());
        assert!(Ident::parse("kullanıcı").is_err());
    }
}
