//! Typed input events published to the host simulation.
//!
//! Every event is constructed once from a raw input sample and never
//! mutated afterwards — the host's pub-sub layer may clone and broadcast
//! them freely.  All events carry a fresh v4 id and a millisecond
//! timestamp; for synthetic events (e.g. [`WindowOpenEvent`]) the
//! timestamp marks construction time, not the underlying OS event.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Point;

/// Milliseconds since the Unix epoch.
fn timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Press/release state shared by key and mouse-button events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonStatus {
    Down,
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyEvent {
    pub id: Uuid,
    pub timestamp: u64,
    /// Human-readable key name, e.g. `"a"` or `"Escape"`.
    pub key: String,
    /// Toolkit scancode for hosts that need layout-independent keys.
    pub keycode: u32,
    pub status: ButtonStatus,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, keycode: u32, status: ButtonStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: timestamp_ms(),
            key: key.into(),
            keycode,
            status,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MouseButtonEvent {
    pub id: Uuid,
    pub timestamp: u64,
    pub button: MouseButton,
    pub status: ButtonStatus,
    /// Cursor position in SVG space.
    pub position: Point,
    /// Cursor position in window pixels.
    pub position_raw: Point,
    /// Ids of the elements under the cursor, root-to-leaf.
    pub target: Vec<String>,
}

impl MouseButtonEvent {
    pub fn new(
        button: MouseButton,
        status: ButtonStatus,
        position: Point,
        position_raw: Point,
        target: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: timestamp_ms(),
            button,
            status,
            position,
            position_raw,
            target,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MouseMotionEvent {
    pub id: Uuid,
    pub timestamp: u64,
    /// Cursor position in SVG space.
    pub position: Point,
    /// Motion delta in SVG space (scaled, not translated).
    pub relative: Point,
    /// Cursor position in window pixels.
    pub position_raw: Point,
    /// Motion delta in window pixels.
    pub relative_raw: Point,
    /// Ids of the elements under the cursor, root-to-leaf.
    pub target: Vec<String>,
}

impl MouseMotionEvent {
    pub fn new(
        position: Point,
        relative: Point,
        position_raw: Point,
        relative_raw: Point,
        target: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: timestamp_ms(),
            position,
            relative,
            position_raw,
            relative_raw,
            target,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WindowMoveEvent {
    pub id: Uuid,
    pub timestamp: u64,
    /// New outer position of the window in screen pixels.
    pub position: (i32, i32),
}

impl WindowMoveEvent {
    pub fn new(position: (i32, i32)) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: timestamp_ms(),
            position,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WindowResizeEvent {
    pub id: Uuid,
    pub timestamp: u64,
    /// New inner size of the window in pixels.
    pub size: (u32, u32),
}

impl WindowResizeEvent {
    pub fn new(size: (u32, u32)) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: timestamp_ms(),
            size,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WindowFocusEvent {
    pub id: Uuid,
    pub timestamp: u64,
    pub has_focus: bool,
}

impl WindowFocusEvent {
    pub fn new(has_focus: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: timestamp_ms(),
            has_focus,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WindowOpenEvent {
    pub id: Uuid,
    /// Marks when the open notification was drained, not when the OS
    /// actually mapped the window.
    pub timestamp: u64,
}

impl WindowOpenEvent {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: timestamp_ms(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WindowCloseEvent {
    pub id: Uuid,
    pub timestamp: u64,
}

impl WindowCloseEvent {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: timestamp_ms(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScreenSizeEvent {
    pub id: Uuid,
    pub timestamp: u64,
    /// Monitor index — always 0, multi-monitor setups are unsupported.
    pub monitor: usize,
    pub size: (u32, u32),
}

impl ScreenSizeEvent {
    pub fn new(monitor: usize, size: (u32, u32)) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: timestamp_ms(),
            monitor,
            size,
        }
    }
}

/// Closed union over all events the view can hand to the host.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputEvent {
    Key(KeyEvent),
    MouseButton(MouseButtonEvent),
    MouseMotion(MouseMotionEvent),
    WindowMove(WindowMoveEvent),
    WindowResize(WindowResizeEvent),
    WindowFocus(WindowFocusEvent),
    WindowOpen(WindowOpenEvent),
    WindowClose(WindowCloseEvent),
    ScreenSize(ScreenSizeEvent),
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_get_unique_ids() {
        let a = WindowOpenEvent::new();
        let b = WindowOpenEvent::new();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_mouse_button_event_fields() {
        let event = MouseButtonEvent::new(
            MouseButton::Left,
            ButtonStatus::Down,
            Point::new(10.0, 20.0),
            Point::new(100.0, 200.0),
            vec!["r1".to_string()],
        );
        assert_eq!(event.button, MouseButton::Left);
        assert_eq!(event.position_raw, Point::new(100.0, 200.0));
        assert_eq!(event.target, vec!["r1".to_string()]);
    }

    #[test]
    fn test_serde_round_trip_preserves_variant() {
        let event = InputEvent::WindowResize(WindowResizeEvent::new((800, 600)));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"WindowResize\""));
        let back: InputEvent = serde_json::from_str(&json).unwrap();
        match back {
            InputEvent::WindowResize(e) => assert_eq!(e.size, (800, 600)),
            other => panic!("wrong variant: {other:?}"),
        }
    }
}
