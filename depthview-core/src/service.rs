use std::sync::Arc;

use depthview_colormap::map_frames;
use depthview_store::FrameStore;
use depthview_types::FrameView;
use tracing::debug;

use crate::{FrameError, FrameQuery};

/// Retrieval pipeline: store range scan, then one batched colormap pass.
///
/// Callers validate first (a `FrameQuery` cannot exist otherwise), so the
/// store is never touched for a rejected request.
#[derive(Clone)]
pub struct FrameService {
    store: Arc<dyn FrameStore>,
}

impl FrameService {
    pub fn new(store: Arc<dyn FrameStore>) -> Self {
        Self { store }
    }

    /// Frames with `depth_min <= depth <= depth_max`, ascending by depth.
    pub async fn retrieve(&self, query: &FrameQuery) -> Result<Vec<FrameView>, FrameError> {
        let (depth_min, depth_max) = (query.depth_min(), query.depth_max());
        let records = self.store.find(depth_min, depth_max).await?;
        if records.is_empty() {
            return Err(FrameError::NoFramesFound { depth_min, depth_max });
        }

        let colormap = query.colormap();
        let mapped = map_frames(records.iter().map(|r| r.frame.as_slice()), colormap);
        debug!(frames = records.len(), %colormap, "frames colormapped");

        Ok(records
            .iter()
            .zip(mapped)
            .map(|(record, frame)| FrameView {
                depth: record.depth,
                frame,
            })
            .collect())
    }
}
