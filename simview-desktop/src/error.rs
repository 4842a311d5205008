//! View-level error taxonomy.

use simview_render::{GpuError, SurfaceError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    /// The title-based window lookup must resolve to exactly one window.
    #[error("found {count} windows titled `{title}`, expected exactly one")]
    AmbiguousWindow { title: String, count: usize },
    /// A raw input sample was handed to a constructor for another kind.
    #[error("raw input routed to the wrong constructor: expected {expected}, got {got}")]
    InvalidEvent {
        expected: &'static str,
        got: &'static str,
    },
    #[error("unknown mouse button {0}")]
    UnknownButton(u8),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("failed to initialize window: {0}")]
    WindowInit(String),
    #[error("view is closed")]
    Closed,
}
