use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One colormapped pixel: `[r, g, b]`.
pub type Rgb = [u8; 3];

/// Surrogate identifier for a stored frame. Depth is not unique, this is.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub Uuid);

impl FrameId {
    /// Content-derived id: the same depth and scanline always yield the same id,
    /// so loading a dataset twice collides on the primary key instead of
    /// duplicating rows.
    pub fn from_content(depth: f64, frame: &[f64]) -> Self {
        let mut bytes = Vec::with_capacity(8 * (frame.len() + 1));
        bytes.extend_from_slice(&depth.to_le_bytes());
        for v in frame {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, &bytes))
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A stored scanline keyed by depth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub id: FrameId,
    pub depth: f64,
    /// Fixed-length per dataset; the loader guarantees it, the store does not.
    pub frame: Vec<f64>,
}

impl FrameRecord {
    pub fn new(depth: f64, frame: Vec<f64>) -> Self {
        Self {
            id: FrameId::from_content(depth, &frame),
            depth,
            frame,
        }
    }
}

/// Response-shaped projection of a record after colormapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameView {
    pub depth: f64,
    pub frame: Vec<Rgb>,
}
