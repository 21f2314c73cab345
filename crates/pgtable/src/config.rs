//! Per-table configuration.

/// Configuration for a [`Table`](crate::Table) and the result sets it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Sanitize values (HTML-escape text, normalize e-mails/URLs) before binding.
    pub sanitize_values: bool,
    /// Emit a `tracing` debug event per executed statement.
    pub log_sql: bool,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            sanitize_values: true,
            log_sql: true,
            max_sql_length: Some(200),
        }
    }
}

impl TableConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable value sanitation.
    pub fn sanitize_values(mut self, enabled: bool) -> Self {
        self.sanitize_values = enabled;
        self
    }

    /// Enable or disable statement logging.
    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// SQL as it should appear in logs.
    pub fn display_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => {
                format!("{}...", truncate_sql_bytes(sql, max)).into()
            }
            _ => sql.into(),
        }
    }
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
