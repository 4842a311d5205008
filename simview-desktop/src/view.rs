//! The window view: owns the OS window, the render surface, and the
//! shared input queue.
//!
//! The host drives the view synchronously, once per simulation cycle:
//!
//! ```text
//!  host cycle ──► poll_events() ──► update(document) ──► render()
//!                     ▲
//!        toolkit pump ┤ (key/mouse/resize/close)
//!    geometry watcher ┘ (move/focus, separate thread)
//! ```
//!
//! Both input sources enqueue onto one shared [`EventQueue`];
//! `poll_events` is the sole consumer, so the drained batch is totally
//! ordered even though the watcher runs concurrently.

use std::sync::Arc;
use std::time::Duration;

use log::info;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::Key;
use winit::platform::pump_events::EventLoopExtPumpEvents;
use winit::platform::scancode::PhysicalKeyExtScancode;
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use simview_core::{Color, InputEvent, Point, SvgDocument, WindowConfig};
use simview_render::{SvgSurface, WindowTarget};

use crate::error::ViewError;
use crate::events::{self, RawInput};
use crate::queue::EventQueue;
use crate::watcher::{self, GeometryWatcher, WindowProbe, WATCH_INTERVAL};

/// Margin subtracted from the window size when no explicit render
/// surface size is given (scaled by the aspect ratio on x).
const SURFACE_PADDING: f64 = 20.0;

/// Pump iterations to wait for window creation before giving up.
const INIT_ATTEMPTS: usize = 100;

fn resolve_size(size: (f64, f64)) -> (u32, u32) {
    (size.0.ceil() as u32, size.1.ceil() as u32)
}

fn default_surface_size(config: &WindowConfig) -> (u32, u32) {
    (
        (config.width - SURFACE_PADDING * config.aspect())
            .ceil()
            .max(1.0) as u32,
        (config.height - SURFACE_PADDING).ceil().max(1.0) as u32,
    )
}

/// Adopt the size the window manager actually granted, which may differ
/// from the request (tiling managers, fullscreen fallbacks).  Zero means
/// the window is not mapped yet; keep the requested size.
fn adopt_window_size(config: &mut WindowConfig, actual: (u32, u32)) {
    if actual.0 > 0 && actual.1 > 0 {
        config.width = f64::from(actual.0);
        config.height = f64::from(actual.1);
    }
}

/// Resize bookkeeping shared by [`WindowView::set_window_size`] and the
/// tests: the no-op decision, the watcher restart, the config update,
/// and the synthesized resize sample.  `resize` performs the actual
/// window/target/surface resize; `reattach` binds a fresh watcher.
fn apply_window_resize(
    requested: (f64, f64),
    config: &mut WindowConfig,
    queue: &EventQueue,
    watcher: &mut Option<GeometryWatcher>,
    resize: impl FnOnce((u32, u32)),
    reattach: impl FnOnce() -> Result<GeometryWatcher, ViewError>,
) -> Result<(), ViewError> {
    let new_size = resolve_size(requested);
    if new_size == config.size_px() {
        return Ok(());
    }
    // The watcher's binding does not survive the resize; stop it before
    // touching the window and reattach afterwards.
    if let Some(active) = watcher.take() {
        active.stop();
    }
    resize(new_size);
    config.width = f64::from(new_size.0);
    config.height = f64::from(new_size.1);
    *watcher = Some(reattach()?);
    // The toolkit does not reliably emit a resize for this path.
    queue.push(RawInput::WindowResize { size: new_size });
    Ok(())
}

/// Convert a drained batch in queue order, applying geometry updates as
/// they are encountered so every event sees the transform that was live
/// when its sample arrived.
fn drain_into_events(
    samples: &[RawInput],
    surface: &mut SvgSurface,
    config: &mut WindowConfig,
    mut on_resize: impl FnMut((u32, u32)),
) -> Vec<InputEvent> {
    let mut result = Vec::with_capacity(samples.len());
    for raw in samples {
        if let RawInput::WindowResize { size } = raw {
            surface.set_window_size(*size);
            config.width = f64::from(size.0);
            config.height = f64::from(size.1);
            on_resize(*size);
        }
        if let Some(event) = events::build_event_logged(raw, surface) {
            result.push(event);
        }
    }
    result
}

/// Basic window geometry reported to the host.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowInfo {
    pub title: String,
    pub position: (i32, i32),
    pub size: (u32, u32),
}

/// Screen geometry reported to the host.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenInfo {
    /// Always 0, multi-monitor setups are unsupported.
    pub monitor: usize,
    pub size: (u32, u32),
}

/// Winit 0.30 application handler used in pump mode.
///
/// Translates toolkit events into [`RawInput`] samples; never touches
/// view state directly.
struct PumpHandler {
    queue: EventQueue,
    attributes: WindowAttributes,
    window: Option<Arc<Window>>,
    init_error: Option<String>,
    // Winit reports button presses without a position, track the cursor.
    last_mouse: (f64, f64),
}

impl ApplicationHandler for PumpHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => self.init_error = Some(e.to_string()),
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.queue.push(RawInput::Quit),
            WindowEvent::KeyboardInput { event, .. } => {
                let key = match &event.logical_key {
                    Key::Character(text) => text.to_string(),
                    Key::Named(named) => format!("{named:?}"),
                    _ => String::new(),
                };
                let code = event.physical_key.to_scancode().unwrap_or(0);
                let raw = match event.state {
                    ElementState::Pressed => RawInput::KeyDown { key, code },
                    ElementState::Released => RawInput::KeyUp { key, code },
                };
                self.queue.push(raw);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    WinitMouseButton::Left => 1,
                    WinitMouseButton::Middle => 2,
                    WinitMouseButton::Right => 3,
                    // Side buttons are outside the event model.
                    _ => return,
                };
                let position = self.last_mouse;
                let raw = match state {
                    ElementState::Pressed => RawInput::MouseDown { button, position },
                    ElementState::Released => RawInput::MouseUp { button, position },
                };
                self.queue.push(raw);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = (position.x, position.y);
                let relative = (
                    position.0 - self.last_mouse.0,
                    position.1 - self.last_mouse.1,
                );
                self.last_mouse = position;
                self.queue.push(RawInput::MouseMotion { position, relative });
            }
            WindowEvent::Resized(size) => {
                self.queue.push(RawInput::WindowResize {
                    size: (size.width, size.height),
                });
            }
            // Moved and Focused arrive through the geometry watcher so
            // that every geometry change funnels through the one queue.
            _ => {}
        }
    }
}

/// Geometry probe over the live winit window, sampled from the watcher
/// thread.
struct WinitProbe {
    window: Arc<Window>,
}

impl WindowProbe for WinitProbe {
    fn position(&self) -> Option<(i32, i32)> {
        self.window.outer_position().ok().map(|p| (p.x, p.y))
    }

    fn has_focus(&self) -> bool {
        self.window.has_focus()
    }
}

/// The host-facing desktop view.  `Open → Closed` only; callers check
/// [`WindowView::is_open`] before further use.
pub struct WindowView {
    event_loop: EventLoop<()>,
    handler: PumpHandler,
    window: Arc<Window>,
    surface: SvgSurface,
    target: WindowTarget,
    queue: EventQueue,
    watcher: Option<GeometryWatcher>,
    config: WindowConfig,
    screen_size: (u32, u32),
    open: bool,
}

impl WindowView {
    /// Create the OS window, the render surface, and the geometry
    /// watcher, then enqueue the initial synthetic geometry samples so
    /// the host observes a consistent starting state on its first poll.
    pub fn new(
        config: WindowConfig,
        surface_size: Option<(u32, u32)>,
    ) -> Result<Self, ViewError> {
        let mut event_loop =
            EventLoop::new().map_err(|e| ViewError::WindowInit(e.to_string()))?;
        let queue = EventQueue::new();

        let mut attributes = Window::default_attributes()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(config.resizable);
        if config.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let mut handler = PumpHandler {
            queue: queue.clone(),
            attributes,
            window: None,
            init_error: None,
            last_mouse: (0.0, 0.0),
        };

        // Pump until `resumed` has created the window.
        for _ in 0..INIT_ATTEMPTS {
            event_loop.pump_app_events(Some(Duration::ZERO), &mut handler);
            if let Some(message) = handler.init_error.take() {
                return Err(ViewError::WindowInit(message));
            }
            if handler.window.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        let window = handler
            .window
            .clone()
            .ok_or_else(|| ViewError::WindowInit("window was never created".to_string()))?;

        let screen_size = window
            .current_monitor()
            .or_else(|| window.primary_monitor())
            .map(|monitor| {
                let size = monitor.size();
                (size.width, size.height)
            })
            .unwrap_or((0, 0));

        let mut config = config;
        if config.fullscreen {
            config.width = f64::from(screen_size.0);
            config.height = f64::from(screen_size.1);
        }
        // The window manager may have clamped or adjusted the request;
        // the starting geometry reported to the host is the real one.
        let actual = window.inner_size();
        adopt_window_size(&mut config, (actual.width, actual.height));
        let window_size = config.size_px();

        let surface_size = surface_size.unwrap_or_else(|| default_surface_size(&config));
        let mut surface = SvgSurface::new(surface_size)?;
        // Event conversion may run before the first render pass.
        surface.set_window_size(window_size);
        let target = pollster::block_on(WindowTarget::new(
            window.clone(),
            window_size,
            surface_size,
        ))?;

        watcher::register_window(&config.title);
        let watcher = match GeometryWatcher::attach(
            &config.title,
            WinitProbe {
                window: window.clone(),
            },
            queue.clone(),
            WATCH_INTERVAL,
        ) {
            Ok(watcher) => watcher,
            Err(e) => {
                watcher::unregister_window(&config.title);
                return Err(e);
            }
        };

        queue.push(RawInput::WindowOpen);
        queue.push(RawInput::WindowResize { size: window_size });
        if let Ok(position) = window.outer_position() {
            queue.push(RawInput::WindowMove {
                position: (position.x, position.y),
            });
        }
        queue.push(RawInput::ScreenSize { size: screen_size });

        info!(
            "window view opened: {}×{} (surface {}×{})",
            window_size.0, window_size.1, surface_size.0, surface_size.1
        );

        Ok(Self {
            event_loop,
            handler,
            window,
            surface,
            target,
            queue,
            watcher: Some(watcher),
            config,
            screen_size,
            open: true,
        })
    }

    /// Pump the toolkit once and convert everything queued since the
    /// last cycle.  Construction failures are logged and skipped; one
    /// bad sample never aborts the batch.
    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        if !self.open {
            return Vec::new();
        }
        self.event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler);
        let samples = self.queue.drain();
        let Self {
            surface,
            config,
            target,
            ..
        } = self;
        drain_into_events(&samples, surface, config, |size| {
            target.resize(size.0, size.1)
        })
    }

    /// Replace the rendered document.
    pub fn update(&mut self, document: SvgDocument) {
        self.surface.update(document);
    }

    /// Replace the rendered document from SVG text.
    pub fn update_from_str(&mut self, source: &str) -> Result<(), ViewError> {
        self.surface.update_from_str(source)?;
        Ok(())
    }

    /// Rasterize and present one frame.
    pub fn render(&mut self, background: Color) -> Result<(), ViewError> {
        if !self.open {
            return Err(ViewError::Closed);
        }
        self.surface.render(&mut self.target, background)?;
        Ok(())
    }

    pub fn elements_under(
        &self,
        point: Point,
        transform: bool,
    ) -> Result<Vec<String>, ViewError> {
        Ok(self.surface.elements_under(point, transform)?)
    }

    pub fn pixel_to_svg(&self, point: Point) -> Point {
        self.surface.pixel_to_svg(point)
    }

    pub fn pixel_scale_to_svg_scale(&self, vector: Point) -> Point {
        self.surface.pixel_scale_to_svg_scale(vector)
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.config.size_px()
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Resize the OS window.  A no-op when the rounded-up size matches
    /// the current one: no watcher restart, no synthetic resize.
    pub fn set_window_size(&mut self, size: (f64, f64)) -> Result<(), ViewError> {
        let title = self.config.title.clone();
        let probe_window = self.window.clone();
        let reattach_queue = self.queue.clone();
        let Self {
            window,
            surface,
            target,
            queue,
            watcher,
            config,
            ..
        } = self;
        apply_window_resize(
            size,
            config,
            queue,
            watcher,
            |new_size| {
                let _ = window.request_inner_size(PhysicalSize::new(new_size.0, new_size.1));
                target.resize(new_size.0, new_size.1);
                surface.set_window_size(new_size);
            },
            move || {
                GeometryWatcher::attach(
                    &title,
                    WinitProbe {
                        window: probe_window,
                    },
                    reattach_queue,
                    WATCH_INTERVAL,
                )
            },
        )
    }

    pub fn get_window_info(&self) -> WindowInfo {
        WindowInfo {
            title: self.config.title.clone(),
            position: self
                .window
                .outer_position()
                .map(|p| (p.x, p.y))
                .unwrap_or((0, 0)),
            size: self.config.size_px(),
        }
    }

    pub fn get_screen_info(&self) -> ScreenInfo {
        ScreenInfo {
            monitor: 0,
            size: self.screen_size,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Stop the watcher (joining its thread) and hide the window.  Not
    /// idempotent; callers check [`WindowView::is_open`] first.
    pub fn close(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.stop();
        }
        watcher::unregister_window(&self.config.title);
        self.window.set_visible(false);
        self.open = false;
        info!("window view closed");
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use simview_core::geometry::WHITE;

    // Window-creating paths need a display server and are exercised by
    // the demo binary; these cover the geometry helpers and the resize
    // and drain bookkeeping, which take the window-bound effects as
    // closures.

    struct StubProbe;

    impl WindowProbe for StubProbe {
        fn position(&self) -> Option<(i32, i32)> {
            Some((0, 0))
        }
        fn has_focus(&self) -> bool {
            true
        }
    }

    fn config_sized(width: f64, height: f64) -> WindowConfig {
        WindowConfig {
            width,
            height,
            ..WindowConfig::default()
        }
    }

    #[test]
    fn test_resolve_size_rounds_up() {
        assert_eq!(resolve_size((640.0, 480.0)), (640, 480));
        assert_eq!(resolve_size((640.1, 479.5)), (641, 480));
    }

    #[test]
    fn test_default_surface_size_pads_by_aspect() {
        // 640×480: aspect 4/3, x padding 20 * 4/3.
        let (w, h) = default_surface_size(&config_sized(640.0, 480.0));
        assert_eq!(h, 460);
        assert_eq!(w, (640.0f64 - 20.0 * (640.0 / 480.0)).ceil() as u32);
    }

    #[test]
    fn test_default_surface_size_never_zero() {
        assert_eq!(default_surface_size(&config_sized(10.0, 10.0)), (1, 1));
    }

    #[test]
    fn test_adopt_window_size_prefers_actual_geometry() {
        // A tiling window manager granted less than requested.
        let mut config = config_sized(640.0, 480.0);
        adopt_window_size(&mut config, (612, 468));
        assert_eq!(config.size_px(), (612, 468));
    }

    #[test]
    fn test_adopt_window_size_keeps_request_when_unmapped() {
        let mut config = config_sized(640.0, 480.0);
        adopt_window_size(&mut config, (0, 0));
        assert_eq!(config.size_px(), (640, 480));
    }

    #[test]
    fn test_resize_with_current_size_is_a_noop() {
        watcher::register_window("view-test-noop");
        let queue = EventQueue::new();
        let mut slot = Some(
            GeometryWatcher::attach("view-test-noop", StubProbe, queue.clone(), WATCH_INTERVAL)
                .unwrap(),
        );
        let mut config = config_sized(640.0, 480.0);

        // Rounds up to the current 640×480.
        apply_window_resize(
            (639.2, 479.5),
            &mut config,
            &queue,
            &mut slot,
            |_| panic!("window must not be resized"),
            || panic!("watcher must not be reattached"),
        )
        .unwrap();

        assert!(queue.is_empty());
        assert!(slot.is_some());
        assert_eq!(config.size_px(), (640, 480));

        slot.take().unwrap().stop();
        watcher::unregister_window("view-test-noop");
    }

    #[test]
    fn test_resize_restarts_watcher_and_synthesizes_sample() {
        watcher::register_window("view-test-resize");
        let queue = EventQueue::new();
        let mut slot = Some(
            GeometryWatcher::attach("view-test-resize", StubProbe, queue.clone(), WATCH_INTERVAL)
                .unwrap(),
        );
        let mut config = config_sized(640.0, 480.0);
        let mut resized_to = None;

        apply_window_resize(
            (800.0, 600.0),
            &mut config,
            &queue,
            &mut slot,
            |size| resized_to = Some(size),
            || GeometryWatcher::attach("view-test-resize", StubProbe, queue.clone(), WATCH_INTERVAL),
        )
        .unwrap();

        assert_eq!(resized_to, Some((800, 600)));
        assert_eq!(config.size_px(), (800, 600));
        assert_eq!(
            queue.drain(),
            vec![RawInput::WindowResize { size: (800, 600) }]
        );
        assert!(slot.is_some());

        slot.take().unwrap().stop();
        watcher::unregister_window("view-test-resize");
    }

    #[test]
    fn test_drain_applies_resize_in_queue_order() {
        // 100×100 buffer over a 200×200 document: scaling factor 0.5.
        let mut surface = SvgSurface::new((100, 100)).unwrap();
        surface
            .update_from_str(r#"<svg width="200" height="200"/>"#)
            .unwrap();
        surface.set_window_size((100, 100));
        surface.rasterize(WHITE).unwrap();
        let mut config = config_sized(100.0, 100.0);

        let click = RawInput::MouseDown {
            button: 1,
            position: (50.0, 50.0),
        };
        let samples = vec![
            click.clone(),
            RawInput::WindowResize { size: (300, 100) },
            click.clone(),
        ];

        let mut resizes = Vec::new();
        let events = drain_into_events(&samples, &mut surface, &mut config, |s| resizes.push(s));

        assert_eq!(resizes, vec![(300, 100)]);
        assert_eq!(config.size_px(), (300, 100));
        assert_eq!(events.len(), 3);
        // The first click uses the pre-resize transform; the second sees
        // the post-resize centering offset.
        match (&events[0], &events[2]) {
            (InputEvent::MouseButton(before), InputEvent::MouseButton(after)) => {
                assert_eq!(before.position, Point::new(100.0, 100.0));
                assert_eq!(after.position, Point::new(-100.0, 100.0));
            }
            other => panic!("wrong variants: {other:?}"),
        }
    }
}
