use async_trait::async_trait;
use thiserror::Error;

use depthview_types::FrameRecord;

pub mod memory;
pub use memory::InMemoryFrameStore;

pub mod sqlite;
pub use sqlite::SqliteFrameStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt frame row {id}: {message}")]
    Corrupt { id: String, message: String },
}

/// What happened to a single insert.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same id already exists; nothing was written.
    Duplicate,
}

/// JSON has no NaN or infinity, so such a row could be written but never read back.
pub(crate) fn ensure_finite(record: &FrameRecord) -> Result<(), StoreError> {
    if record.depth.is_finite() && record.frame.iter().all(|v| v.is_finite()) {
        return Ok(());
    }
    Err(StoreError::Corrupt {
        id: record.id.to_string(),
        message: "non-finite depth or sample".into(),
    })
}

/// The frame table: range reads for the query path, inserts for the loader.
#[async_trait]
pub trait FrameStore: Send + Sync {
    /// Create tables and indexes if they do not exist yet.
    async fn init_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// All records with `depth_min <= depth <= depth_max`, ascending by depth then id.
    async fn find(&self, depth_min: f64, depth_max: f64) -> Result<Vec<FrameRecord>, StoreError>;

    /// Insert one record. A primary-key collision is reported, not raised.
    async fn insert(&self, record: FrameRecord) -> Result<InsertOutcome, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}
