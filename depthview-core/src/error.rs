use depthview_colormap::UnknownColormap;
use depthview_store::StoreError;
use thiserror::Error;

/// Everything a frame request can fail with. The first four are expected
/// outcomes reported to the caller; `Store` is an unclassified internal failure.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(
        "Min depth should be at least 9000 and Max depth at most 9546 \
         (requested {depth_min}..{depth_max})"
    )]
    RangeOutOfBounds { depth_min: f64, depth_max: f64 },

    #[error("Min depth should be smaller than Max depth (requested {depth_min}..{depth_max})")]
    InvertedRange { depth_min: f64, depth_max: f64 },

    #[error(transparent)]
    UnknownColormap(#[from] UnknownColormap),

    #[error("No Frames found between {depth_min} and {depth_max}")]
    NoFramesFound { depth_min: f64, depth_max: f64 },

    #[error("frame store failure: {0}")]
    Store(#[from] StoreError),
}

impl FrameError {
    /// Symbolic name surfaced to clients.
    pub fn name(&self) -> &'static str {
        match self {
            FrameError::RangeOutOfBounds { .. } => "RangeOutOfBounds",
            FrameError::InvertedRange { .. } => "InvertedRange",
            FrameError::UnknownColormap(_) => "UnknownColormap",
            FrameError::NoFramesFound { .. } => "NoFramesFound",
            FrameError::Store(_) => "InternalError",
        }
    }

    /// HTTP-style status class.
    pub fn status_code(&self) -> u16 {
        match self {
            FrameError::RangeOutOfBounds { .. }
            | FrameError::InvertedRange { .. }
            | FrameError::UnknownColormap(_) => 400,
            FrameError::NoFramesFound { .. } => 404,
            FrameError::Store(_) => 500,
        }
    }
}
