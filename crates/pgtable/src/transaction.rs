//! Begin/commit/rollback around a unit of work.
//!
//! The state lives on the [`Connection`], so every [`Table`] sharing that
//! connection sees the same transaction and a nested `transaction` call fails
//! fast with [`OrmError::TransactionActive`] instead of opening a savepoint.
//!
//! # Example
//!
//! ```ignore
//! users.transaction(async |tx| {
//!     if tx.find_with_and(record! { "name" => "ali", "age" => "18" }).await?.is_some() {
//!         tx.delete("id", 2).await?;
//!     }
//!     Ok(())
//! }).await?;
//! ```

use crate::client::Executor;
use crate::connection::{Connection, TransactionState};
use crate::error::{OrmError, OrmResult};
use crate::log;
use crate::table::Table;

/// Holds a connection in `Active` until finished. If the unit-of-work future
/// is dropped mid-flight the connection goes back to `Idle` with a `ROLLBACK`
/// owed before its next statement.
struct TransactionGuard<'a, E: Executor> {
    conn: &'a Connection<E>,
    finished: bool,
}

impl<'a, E: Executor> TransactionGuard<'a, E> {
    fn begin(conn: &'a Connection<E>) -> OrmResult<Self> {
        conn.try_begin()?;
        Ok(Self {
            conn,
            finished: false,
        })
    }

    fn finish(mut self, state: TransactionState) {
        self.conn.set_transaction_state(state);
        self.finished = true;
    }
}

impl<E: Executor> Drop for TransactionGuard<'_, E> {
    fn drop(&mut self) {
        if !self.finished {
            self.conn.set_transaction_state(TransactionState::Idle);
            self.conn.mark_rollback_pending();
            log::abandoned_transaction();
        }
    }
}

/// Runs `unit_of_work` inside a transaction on the table's connection.
///
/// - Issues `BEGIN`, then runs the closure with `table`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)` and returns [`OrmError::Transaction`] wrapping the cause.
pub(crate) async fn run<'c, E, T, F>(table: &Table<'c, E>, unit_of_work: F) -> OrmResult<T>
where
    E: Executor,
    F: AsyncFnOnce(&Table<'c, E>) -> OrmResult<T>,
{
    let conn = table.connection();
    conn.ensure_open()?;
    conn.settle().await.map_err(OrmError::transaction)?;
    let guard = TransactionGuard::begin(conn)?;

    if let Err(e) = conn.client().batch_execute("BEGIN").await {
        guard.finish(TransactionState::Idle);
        return Err(OrmError::transaction(OrmError::engine("Begin", e)));
    }
    log::transaction("begin");

    match unit_of_work(table).await {
        Ok(value) => match conn.client().batch_execute("COMMIT").await {
            Ok(()) => {
                guard.finish(TransactionState::Committed);
                log::transaction("commit");
                Ok(value)
            }
            Err(e) => {
                // A failed COMMIT ends the transaction server-side.
                guard.finish(TransactionState::RolledBack);
                log::rollback(&e);
                Err(OrmError::transaction(OrmError::engine("Commit", e)))
            }
        },
        Err(error) => {
            log::rollback(&error);
            let rollback = conn.client().batch_execute("ROLLBACK").await;
            guard.finish(TransactionState::RolledBack);
            match rollback {
                Ok(()) => Err(OrmError::transaction(error)),
                Err(rollback_err) => Err(OrmError::transaction(OrmError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                )))),
            }
        }
    }
}
