use async_trait::async_trait;
use tokio::sync::Mutex;

use depthview_types::FrameRecord;

use crate::{ensure_finite, FrameStore, InsertOutcome, StoreError};

/// In-memory frame table.
///
/// Not durable. Mirrors the SQLite ordering and duplicate handling so the
/// query pipeline can be exercised without a database.
#[derive(Default)]
pub struct InMemoryFrameStore {
    rows: Mutex<Vec<FrameRecord>>,
}

impl InMemoryFrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = FrameRecord>) -> Self {
        Self {
            rows: Mutex::new(records.into_iter().collect()),
        }
    }
}

#[async_trait]
impl FrameStore for InMemoryFrameStore {
    async fn find(&self, depth_min: f64, depth_max: f64) -> Result<Vec<FrameRecord>, StoreError> {
        let rows = self.rows.lock().await;
        let mut hits: Vec<FrameRecord> = rows
            .iter()
            .filter(|r| r.depth >= depth_min && r.depth <= depth_max)
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.depth.total_cmp(&b.depth).then_with(|| a.id.cmp(&b.id)));
        Ok(hits)
    }

    async fn insert(&self, record: FrameRecord) -> Result<InsertOutcome, StoreError> {
        ensure_finite(&record)?;
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|r| r.id == record.id) {
            return Ok(InsertOutcome::Duplicate);
        }
        rows.push(record);
        Ok(InsertOutcome::Inserted)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.rows.lock().await.len() as u64)
    }
}
