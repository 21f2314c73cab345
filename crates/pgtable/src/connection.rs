//! The shared connection handle.
//!
//! [`Connection`] wraps an [`Executor`] together with the state that belongs to
//! the connection rather than to any one table: whether a transaction is
//! active, whether an abandoned one still has to be rolled back, and whether
//! the caller disconnected it. Tables and result sets
//! borrow it; its lifetime is the caller's business.

use crate::client::Executor;
use crate::config::TableConfig;
use crate::error::{OrmError, OrmResult};
use crate::log;
use crate::row::Row;
use crate::sql::Sql;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Transaction state of a connection.
///
/// `Committed` and `RolledBack` record how the last transaction ended; a new
/// transaction may begin from any state except `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    Active,
    Committed,
    RolledBack,
}

impl TransactionState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Active,
            2 => Self::Committed,
            3 => Self::RolledBack,
            _ => Self::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Active => 1,
            Self::Committed => 2,
            Self::RolledBack => 3,
        }
    }
}

/// A database connection shared by tables and result sets.
///
/// Not designed for concurrent use: callers serialize access.
///
/// # Example
///
/// ```ignore
/// let conn = pgtable::Connection::connect("postgres://localhost/app").await?;
/// let users = pgtable::Table::new(&conn, "users", "id")?;
/// println!("{} users", users.total().await?);
/// ```
pub struct Connection<E> {
    client: E,
    tx_state: AtomicU8,
    rollback_pending: AtomicBool,
    disconnected: AtomicBool,
}

impl<E: Executor> Connection<E> {
    /// Wrap an already connected client.
    pub fn new(client: E) -> Self {
        Self {
            client,
            tx_state: AtomicU8::new(TransactionState::Idle.as_u8()),
            rollback_pending: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
        }
    }

    /// The wrapped client.
    pub fn client(&self) -> &E {
        &self.client
    }

    /// Unwrap the client.
    pub fn into_inner(self) -> E {
        self.client
    }

    /// Whether the connection was disconnected or the driver reports it closed.
    pub fn is_closed(&self) -> bool {
        self.disconnected.load(Ordering::Acquire) || self.client.is_closed()
    }

    /// Mark the connection as closed; every later operation fails with
    /// [`OrmError::ConnectionClosed`]. The client itself is released when the
    /// `Connection` is dropped.
    pub fn disconnect(&self) {
        if !self.disconnected.swap(true, Ordering::AcqRel) {
            log::disconnected();
        }
    }

    pub fn transaction_state(&self) -> TransactionState {
        TransactionState::from_u8(self.tx_state.load(Ordering::Acquire))
    }

    pub(crate) fn ensure_open(&self) -> OrmResult<()> {
        if self.is_closed() {
            return Err(OrmError::ConnectionClosed);
        }
        Ok(())
    }

    /// Move to `Active`, failing fast if a transaction already is.
    pub(crate) fn try_begin(&self) -> OrmResult<()> {
        let current = self.tx_state.load(Ordering::Acquire);
        if current == TransactionState::Active.as_u8() {
            return Err(OrmError::TransactionActive);
        }
        self.tx_state
            .compare_exchange(
                current,
                TransactionState::Active.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|_| OrmError::TransactionActive)
    }

    /// Record that a transaction was abandoned after `BEGIN`; the server side
    /// is rolled back before the next statement.
    pub(crate) fn mark_rollback_pending(&self) {
        self.rollback_pending.store(true, Ordering::Release);
    }

    /// Issue the `ROLLBACK` owed by an abandoned transaction, if any.
    pub(crate) async fn settle(&self) -> OrmResult<()> {
        if !self.rollback_pending.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        match self.client.batch_execute("ROLLBACK").await {
            Ok(()) => {
                log::transaction("rollback");
                Ok(())
            }
            Err(e) => {
                self.rollback_pending.store(true, Ordering::Release);
                Err(OrmError::engine("Rollback", e))
            }
        }
    }

    pub(crate) fn set_transaction_state(&self, state: TransactionState) {
        self.tx_state.store(state.as_u8(), Ordering::Release);
    }

    pub(crate) async fn query(
        &self,
        operation: &'static str,
        sql: &Sql,
        config: &TableConfig,
    ) -> OrmResult<Vec<Row>> {
        self.ensure_open()?;
        self.settle().await?;
        let text = sql.to_sql();
        log::statement(config, operation, &text, sql.param_count());
        self.client
            .query(&text, sql.params())
            .await
            .map_err(|e| OrmError::engine(operation, e))
    }

    pub(crate) async fn execute(
        &self,
        operation: &'static str,
        sql: &Sql,
        config: &TableConfig,
    ) -> OrmResult<u64> {
        self.ensure_open()?;
        self.settle().await?;
        let text = sql.to_sql();
        log::statement(config, operation, &text, sql.param_count());
        self.client
            .execute(&text, sql.params())
            .await
            .map_err(|e| OrmError::engine(operation, e))
    }
}

impl Connection<tokio_postgres::Client> {
    /// Connect without TLS and drive the connection on a spawned task.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn connect(database_url: &str) -> OrmResult<Self> {
        let (client, connection) = tokio_postgres::connect(database_url, tokio_postgres::NoTls)
            .await
            .map_err(|e| OrmError::Connection(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::connection_error(&e);
            }
        });
        Ok(Self::new(client))
    }
}

impl<E> std::fmt::Debug for Connection<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field(
                "transaction_state",
                &TransactionState::from_u8(self.tx_state.load(Ordering::Acquire)),
            )
            .field(
                "rollback_pending",
                &self.rollback_pending.load(Ordering::Acquire),
            )
            .field("disconnected", &self.disconnected.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
