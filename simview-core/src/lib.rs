//! # simview-core
//!
//! Shared data model for the simview desktop UI backend: the SVG document
//! tree owned by the render surface, the typed input events handed back to
//! the host simulation, and the window configuration value object.
//!
//! ## Crate modules
//!
//! - [`document`] — mutable SVG element tree, validation, canonical
//!   serialization
//! - [`events`] — input event types published to the host
//! - [`geometry`] — points and colors
//! - [`config`] — window configuration

pub mod config;
pub mod document;
pub mod events;
pub mod geometry;

// Re-exports for convenience
pub use config::WindowConfig;
pub use document::{SvgDocument, SvgElement, ValidationError};
pub use events::{
    ButtonStatus, InputEvent, KeyEvent, MouseButton, MouseButtonEvent, MouseMotionEvent,
    ScreenSizeEvent, WindowCloseEvent, WindowFocusEvent, WindowMoveEvent, WindowOpenEvent,
    WindowResizeEvent,
};
pub use geometry::{Color, Point};
