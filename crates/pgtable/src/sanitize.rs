//! Value sanitation applied before binding.
//!
//! This is not what keeps values out of the SQL text (binding does that). It
//! normalizes user input before it is stored:
//!
//! - e-mail addresses lose every character outside the e-mail character set
//! - absolute URLs lose every character outside the URL character set
//! - any other text is HTML-escaped
//! - non-finite floats are rejected
//!
//! Identifiers go through [`Ident`](crate::Ident) instead.

use crate::error::{OrmError, OrmResult};
use crate::row::Record;
use crate::value::Value;
use std::sync::OnceLock;

/// Best-effort e-mail detection.
///
/// This is intentionally not fully RFC-compliant.
pub fn is_email(s: &str) -> bool {
    static EMAIL_RE: OnceLock<regex::Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| {
            regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid built-in email regex")
        })
        .is_match(s)
}

/// Absolute URL with a host (`https://example.com/x`, not `mailto:` or a path).
pub fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok_and(|u| u.has_host())
}

/// Keep letters, digits and ``!#$%&'*+-=?^_`{|}~@.[]``.
pub fn sanitize_email(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~@.[]".contains(*c))
        .collect()
}

/// Keep letters, digits and ``$-_.+!*'(),{}|\^~[]`<>#%";/?:@&=``.
pub fn sanitize_url(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || "$-_.+!*'(),{}|\\^~[]`<>#%\";/?:@&=".contains(*c))
        .collect()
}

/// Escape `& < > " '` for safe embedding in HTML.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// Sanitize one value.
pub fn sanitize_value(value: Value) -> OrmResult<Value> {
    match value {
        Value::Text(s) if is_email(&s) => Ok(Value::Text(sanitize_email(&s))),
        Value::Text(s) if is_url(&s) => Ok(Value::Text(sanitize_url(&s))),
        Value::Text(s) => Ok(Value::Text(escape_html(&s))),
        Value::Float(f) if !f.is_finite() => Err(OrmError::validation(format!(
            "Non-finite float {f} cannot be stored"
        ))),
        other => Ok(other),
    }
}

/// Sanitize every value of a record, keeping column order.
pub fn sanitize_record(record: Record) -> OrmResult<Record> {
    record.try_map_values(sanitize_value)
}
