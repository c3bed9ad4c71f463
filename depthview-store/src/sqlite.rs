use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

use depthview_types::{FrameId, FrameRecord};

use crate::{ensure_finite, FrameStore, InsertOutcome, StoreError};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS frames (
    id    TEXT PRIMARY KEY NOT NULL,
    depth REAL NOT NULL,
    frame TEXT NOT NULL
)";

const CREATE_DEPTH_INDEX: &str = "CREATE INDEX IF NOT EXISTS ix_frames_depth ON frames (depth)";

/// SQLite-backed frame table.
///
/// `frame` is stored as a JSON array, `id` as the hyphenated UUID so that
/// `ORDER BY id` agrees with `FrameId` ordering.
#[derive(Clone)]
pub struct SqliteFrameStore {
    pool: SqlitePool,
}

impl SqliteFrameStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        debug!("opening frame store at {database_url}");
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Private in-memory database. Pinned to a single connection that never
    /// expires, otherwise every new connection would see an empty database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn decode_row(id: String, depth: f64, frame: String) -> Result<FrameRecord, StoreError> {
    let uuid = Uuid::parse_str(&id).map_err(|e| StoreError::Corrupt {
        id: id.clone(),
        message: e.to_string(),
    })?;
    let frame: Vec<f64> = serde_json::from_str(&frame).map_err(|e| StoreError::Corrupt {
        id: id.clone(),
        message: e.to_string(),
    })?;
    Ok(FrameRecord {
        id: FrameId(uuid),
        depth,
        frame,
    })
}

#[async_trait]
impl FrameStore for SqliteFrameStore {
    async fn init_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(CREATE_TABLE).execute(&mut *conn).await?;
        sqlx::query(CREATE_DEPTH_INDEX).execute(&mut *conn).await?;
        info!("frame schema ready");
        Ok(())
    }

    async fn find(&self, depth_min: f64, depth_max: f64) -> Result<Vec<FrameRecord>, StoreError> {
        // Connection goes back to the pool when `conn` drops, on every path.
        let mut conn = self.pool.acquire().await?;
        let rows: Vec<(String, f64, String)> = sqlx::query_as(
            "SELECT id, depth, frame FROM frames \
             WHERE depth >= ?1 AND depth <= ?2 \
             ORDER BY depth, id",
        )
        .bind(depth_min)
        .bind(depth_max)
        .fetch_all(&mut *conn)
        .await?;
        debug!(depth_min, depth_max, rows = rows.len(), "frame range scan");

        rows.into_iter()
            .map(|(id, depth, frame)| decode_row(id, depth, frame))
            .collect()
    }

    async fn insert(&self, record: FrameRecord) -> Result<InsertOutcome, StoreError> {
        ensure_finite(&record)?;
        let frame = serde_json::to_string(&record.frame).map_err(|e| StoreError::Corrupt {
            id: record.id.to_string(),
            message: e.to_string(),
        })?;
        let mut conn = self.pool.acquire().await?;
        let res = sqlx::query("INSERT INTO frames (id, depth, frame) VALUES (?1, ?2, ?3)")
            .bind(record.id.0.hyphenated().to_string())
            .bind(record.depth)
            .bind(frame)
            .execute(&mut *conn)
            .await;
        match res {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!(id = %record.id, "frame already stored");
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM frames")
            .fetch_one(&mut *conn)
            .await?;
        Ok(n.max(0) as u64)
    }
}
