//! `tracing` events emitted by statements and transactions.
//!
//! Every event uses the `pgtable.sql` target. Without the `tracing` feature the
//! functions compile to nothing.

use crate::config::TableConfig;

pub(crate) fn statement(config: &TableConfig, operation: &str, sql: &str, param_count: usize) {
    #[cfg(feature = "tracing")]
    {
        if config.log_sql {
            let sql = config.display_sql(sql);
            tracing::debug!(
                target: "pgtable.sql",
                operation,
                param_count,
                sql = %sql,
                "statement"
            );
        }
    }
    #[cfg(not(feature = "tracing"))]
    let _ = (config, operation, sql, param_count);
}

pub(crate) fn transaction(event: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(target: "pgtable.sql", event, "transaction");
    #[cfg(not(feature = "tracing"))]
    let _ = event;
}

pub(crate) fn rollback(cause: &dyn std::fmt::Display) {
    #[cfg(feature = "tracing")]
    tracing::warn!(target: "pgtable.sql", cause = %cause, "transaction rolled back");
    #[cfg(not(feature = "tracing"))]
    let _ = cause;
}

pub(crate) fn abandoned_transaction() {
    #[cfg(feature = "tracing")]
    tracing::warn!(
        target: "pgtable.sql",
        "transaction dropped before commit or rollback; rolling back before the next statement"
    );
}

pub(crate) fn disconnected() {
    #[cfg(feature = "tracing")]
    tracing::debug!(target: "pgtable.sql", "connection disconnected");
}

pub(crate) fn connection_error(err: &dyn std::fmt::Display) {
    #[cfg(feature = "tracing")]
    tracing::error!(target: "pgtable.sql", error = %err, "connection task failed");
    #[cfg(not(feature = "tracing"))]
    let _ = err;
}
