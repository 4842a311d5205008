//! Raw input samples and their conversion into typed domain events.
//!
//! `RawInput` is the closed union of everything the toolkit or the
//! geometry watcher can enqueue.  Each domain event has a dedicated
//! constructor that validates the sample kind; [`build_event`] matches
//! exhaustively over the union, so adding a variant is a compile error
//! until every consumer handles it.

use log::error;
use simview_core::events::{
    ButtonStatus, InputEvent, KeyEvent, MouseButton, MouseButtonEvent, MouseMotionEvent,
    ScreenSizeEvent, WindowCloseEvent, WindowFocusEvent, WindowMoveEvent, WindowOpenEvent,
    WindowResizeEvent,
};
use simview_core::Point;
use simview_render::SvgSurface;

use crate::error::ViewError;

/// One untyped input sample, as enqueued by the toolkit pump or the
/// geometry watcher.
#[derive(Clone, Debug, PartialEq)]
pub enum RawInput {
    KeyDown { key: String, code: u32 },
    KeyUp { key: String, code: u32 },
    MouseDown { button: u8, position: (f64, f64) },
    MouseUp { button: u8, position: (f64, f64) },
    MouseMotion {
        position: (f64, f64),
        relative: (f64, f64),
    },
    Quit,
    WindowOpen,
    WindowFocus { has_focus: bool },
    WindowMove { position: (i32, i32) },
    WindowResize { size: (u32, u32) },
    ScreenSize { size: (u32, u32) },
}

impl RawInput {
    fn kind(&self) -> &'static str {
        match self {
            RawInput::KeyDown { .. } => "key down",
            RawInput::KeyUp { .. } => "key up",
            RawInput::MouseDown { .. } => "mouse down",
            RawInput::MouseUp { .. } => "mouse up",
            RawInput::MouseMotion { .. } => "mouse motion",
            RawInput::Quit => "quit",
            RawInput::WindowOpen => "window open",
            RawInput::WindowFocus { .. } => "window focus",
            RawInput::WindowMove { .. } => "window move",
            RawInput::WindowResize { .. } => "window resize",
            RawInput::ScreenSize { .. } => "screen size",
        }
    }
}

fn map_button(button: u8) -> Result<MouseButton, ViewError> {
    match button {
        1 => Ok(MouseButton::Left),
        2 => Ok(MouseButton::Middle),
        3 => Ok(MouseButton::Right),
        other => Err(ViewError::UnknownButton(other)),
    }
}

fn wrong_kind(expected: &'static str, raw: &RawInput) -> ViewError {
    ViewError::InvalidEvent {
        expected,
        got: raw.kind(),
    }
}

// ──────────────────── per-kind constructors ────────────────────

pub fn key_event(raw: &RawInput) -> Result<KeyEvent, ViewError> {
    match raw {
        RawInput::KeyDown { key, code } => Ok(KeyEvent::new(key.clone(), *code, ButtonStatus::Down)),
        RawInput::KeyUp { key, code } => Ok(KeyEvent::new(key.clone(), *code, ButtonStatus::Up)),
        other => Err(wrong_kind("key down/up", other)),
    }
}

/// Derives the SVG-space position and the hit-test target list from the
/// current surface transform.
pub fn mouse_button_event(
    raw: &RawInput,
    surface: &SvgSurface,
) -> Result<MouseButtonEvent, ViewError> {
    let (button, position, status) = match raw {
        RawInput::MouseDown { button, position } => (*button, *position, ButtonStatus::Down),
        RawInput::MouseUp { button, position } => (*button, *position, ButtonStatus::Up),
        other => return Err(wrong_kind("mouse down/up", other)),
    };
    let position_raw = Point::new(position.0, position.1);
    let position = surface.pixel_to_svg(position_raw);
    // Already in SVG space, no further transform.
    let target = surface.elements_under(position, false)?;
    Ok(MouseButtonEvent::new(
        map_button(button)?,
        status,
        position,
        position_raw,
        target,
    ))
}

pub fn mouse_motion_event(
    raw: &RawInput,
    surface: &SvgSurface,
) -> Result<MouseMotionEvent, ViewError> {
    let (position, relative) = match raw {
        RawInput::MouseMotion { position, relative } => (*position, *relative),
        other => return Err(wrong_kind("mouse motion", other)),
    };
    let position_raw = Point::new(position.0, position.1);
    let relative_raw = Point::new(relative.0, relative.1);
    let position = surface.pixel_to_svg(position_raw);
    let relative = surface.pixel_scale_to_svg_scale(relative_raw);
    let target = surface.elements_under(position, false)?;
    Ok(MouseMotionEvent::new(
        position,
        relative,
        position_raw,
        relative_raw,
        target,
    ))
}

pub fn window_close_event(raw: &RawInput) -> Result<WindowCloseEvent, ViewError> {
    match raw {
        RawInput::Quit => Ok(WindowCloseEvent::new()),
        other => Err(wrong_kind("quit", other)),
    }
}

pub fn window_open_event(raw: &RawInput) -> Result<WindowOpenEvent, ViewError> {
    match raw {
        RawInput::WindowOpen => Ok(WindowOpenEvent::new()),
        other => Err(wrong_kind("window open", other)),
    }
}

pub fn window_focus_event(raw: &RawInput) -> Result<WindowFocusEvent, ViewError> {
    match raw {
        RawInput::WindowFocus { has_focus } => Ok(WindowFocusEvent::new(*has_focus)),
        other => Err(wrong_kind("window focus", other)),
    }
}

pub fn window_move_event(raw: &RawInput) -> Result<WindowMoveEvent, ViewError> {
    match raw {
        RawInput::WindowMove { position } => Ok(WindowMoveEvent::new(*position)),
        other => Err(wrong_kind("window move", other)),
    }
}

pub fn window_resize_event(raw: &RawInput) -> Result<WindowResizeEvent, ViewError> {
    match raw {
        RawInput::WindowResize { size } => Ok(WindowResizeEvent::new(*size)),
        other => Err(wrong_kind("window resize", other)),
    }
}

pub fn screen_size_event(raw: &RawInput) -> Result<ScreenSizeEvent, ViewError> {
    match raw {
        // Multi-monitor setups are unsupported, the index is fixed.
        RawInput::ScreenSize { size } => Ok(ScreenSizeEvent::new(0, *size)),
        other => Err(wrong_kind("screen size", other)),
    }
}

/// Convert one raw sample into its domain event.
pub fn build_event(raw: &RawInput, surface: &SvgSurface) -> Result<InputEvent, ViewError> {
    match raw {
        RawInput::KeyDown { .. } | RawInput::KeyUp { .. } => {
            key_event(raw).map(InputEvent::Key)
        }
        RawInput::MouseDown { .. } | RawInput::MouseUp { .. } => {
            mouse_button_event(raw, surface).map(InputEvent::MouseButton)
        }
        RawInput::MouseMotion { .. } => {
            mouse_motion_event(raw, surface).map(InputEvent::MouseMotion)
        }
        RawInput::Quit => window_close_event(raw).map(InputEvent::WindowClose),
        RawInput::WindowOpen => window_open_event(raw).map(InputEvent::WindowOpen),
        RawInput::WindowFocus { .. } => window_focus_event(raw).map(InputEvent::WindowFocus),
        RawInput::WindowMove { .. } => window_move_event(raw).map(InputEvent::WindowMove),
        RawInput::WindowResize { .. } => window_resize_event(raw).map(InputEvent::WindowResize),
        RawInput::ScreenSize { .. } => screen_size_event(raw).map(InputEvent::ScreenSize),
    }
}

/// Convert one raw sample, logging and discarding it on failure.
pub fn build_event_logged(raw: &RawInput, surface: &SvgSurface) -> Option<InputEvent> {
    match build_event(raw, surface) {
        Ok(event) => Some(event),
        Err(e) => {
            error!("failed to convert raw input {raw:?}: {e}");
            None
        }
    }
}

/// Convert a drained batch, logging and skipping samples whose
/// construction fails.  One bad sample never aborts the batch.
pub fn build_events(samples: &[RawInput], surface: &SvgSurface) -> Vec<InputEvent> {
    samples
        .iter()
        .filter_map(|raw| build_event_logged(raw, surface))
        .collect()
}

// ===================================================================
// Tests
// ===================================================================
