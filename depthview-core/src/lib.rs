//! Frame query validation and the retrieval pipeline.

pub mod error;
pub mod query;
pub mod service;

pub use error::FrameError;
pub use query::{FrameQuery, DEPTH_MAX, DEPTH_MIN};
pub use service::FrameService;

pub use depthview_colormap::Colormap;
