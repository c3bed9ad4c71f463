use depthview_colormap::Colormap;

use crate::FrameError;

/// Shallowest depth present in the dataset.
pub const DEPTH_MIN: f64 = 9000.0;
/// Deepest depth present in the dataset.
pub const DEPTH_MAX: f64 = 9546.0;

/// A depth window plus palette that has passed validation.
///
/// The only way to obtain one is through [`FrameQuery::new`] or
/// [`FrameQuery::parse`], so holding a `FrameQuery` means the range is inside
/// `[DEPTH_MIN, DEPTH_MAX]` and ordered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameQuery {
    depth_min: f64,
    depth_max: f64,
    colormap: Colormap,
}

impl FrameQuery {
    pub fn new(depth_min: f64, depth_max: f64, colormap: Colormap) -> Result<Self, FrameError> {
        let below = depth_min.is_nan() || depth_min < DEPTH_MIN;
        let above = depth_max.is_nan() || depth_max > DEPTH_MAX;
        if below || above {
            return Err(FrameError::RangeOutOfBounds { depth_min, depth_max });
        }
        if depth_min > depth_max {
            return Err(FrameError::InvertedRange { depth_min, depth_max });
        }
        Ok(Self {
            depth_min,
            depth_max,
            colormap,
        })
    }

    /// Resolve the palette by name, then validate the range.
    pub fn parse(depth_min: f64, depth_max: f64, colormap: &str) -> Result<Self, FrameError> {
        let colormap: Colormap = colormap.parse()?;
        Self::new(depth_min, depth_max, colormap)
    }

    pub fn depth_min(&self) -> f64 {
        self.depth_min
    }

    pub fn depth_max(&self) -> f64 {
        self.depth_max
    }

    pub fn colormap(&self) -> Colormap {
        self.colormap
    }
}
