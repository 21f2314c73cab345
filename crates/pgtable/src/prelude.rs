//! Convenient imports for typical `pgtable` usage.
//!
//! ```ignore
//! use pgtable::prelude::*;
//! ```

pub use crate::record;
pub use crate::{
    ApplyToAll, Combinator, Connection, Executor, OrmError, OrmResult, Record, ResultSet, Row,
    RowScope, Table, TableConfig, Value,
};
