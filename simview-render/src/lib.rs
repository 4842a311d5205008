//! # simview-render
//!
//! CPU rasterization and GPU presentation backend for simview.
//!
//! ## Architecture
//!
//! ```text
//!  SvgDocument (simview-core)
//!       │
//!       ▼
//!  SvgSurface.update()            ◀─── caches canonical source + geometry
//!       │
//!       ▼
//!  SvgSurface.rasterize()         ◀─── usvg/resvg → letterboxed Pixmap
//!       │
//!       ▼
//!  WindowTarget.present()         ◀─── one textured-quad draw + present
//! ```
//!
//! `SvgSurface` is a leaf: it knows nothing about windowing.  The desktop
//! crate hands it a [`surface::PresentTarget`] each frame.
//!
//! ## Crate modules
//!
//! - [`context`] — GPU device/queue/surface initialisation
//! - [`blit`] — textured-quad pipeline that puts the raster buffer on screen
//! - [`target`] — [`surface::PresentTarget`] implementation over a window surface
//! - [`surface`] — document ownership, coordinate transforms, rasterization
//! - [`hittest`] — point-containment queries over the SVG tree

pub mod blit;
pub mod context;
pub mod hittest;
pub mod surface;
pub mod target;

// Re-exports for convenience
pub use context::{GpuContext, GpuError};
pub use surface::{PresentTarget, SurfaceError, SvgSurface};
pub use target::WindowTarget;
