//! Desktop backend for the simulation view.
//!
//! Bridges the OS window (winit), the SVG render surface
//! (`simview-render`), and the host's synchronous poll/render cycle:
//!
//! ```text
//!  winit pump ─────┐
//!                  ├──► EventQueue ──► poll_events() ──► [InputEvent]
//!  GeometryWatcher ┘                        │
//!                                           ▼
//!                   update(document) ──► render()
//! ```

pub mod error;
pub mod events;
pub mod queue;
pub mod view;
pub mod watcher;

pub use error::ViewError;
pub use events::{build_event, build_events, RawInput};
pub use queue::EventQueue;
pub use view::{ScreenInfo, WindowInfo, WindowView};
pub use watcher::{GeometryWatcher, WindowProbe, WATCH_INTERVAL};
