//! Storage collectors: backends that persist a completed record.
//!
//! The wizard is agnostic to backend identity or count; it fans a finished
//! record out to every registered collector concurrently and joins the
//! results. Each backend serializes its own writes internally, so `save` is
//! safe to call from overlapping invocations.

pub mod sheets;
pub mod sqlite;

use std::fmt;

use async_trait::async_trait;

use crate::wizard::record::MoneyFlowRecord;

pub use sheets::SheetsCollector;
pub use sqlite::SqliteCollector;

/// A failed save, tagged with the collector that failed.
#[derive(Debug)]
pub struct StorageError {
    pub collector: String,
    pub message: String,
}

impl StorageError {
    pub fn new(collector: &str, message: impl Into<String>) -> Self {
        Self {
            collector: collector.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.collector, self.message)
    }
}

impl std::error::Error for StorageError {}

/// Contract implemented by every storage backend.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Short name used in logs and failure messages.
    fn name(&self) -> &str;

    /// Persist one record. Must serialize internally if the underlying
    /// store requires exclusive access.
    async fn save(&self, record: &MoneyFlowRecord) -> Result<(), StorageError>;
}
