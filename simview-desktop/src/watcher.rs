//! Background geometry watcher.
//!
//! The toolkit does not reliably report window moves and focus changes
//! while the host only pumps the loop briefly each cycle, so a small
//! watcher thread samples window geometry at a fixed interval and
//! enqueues synthetic [`RawInput`] samples on change.  The watcher is
//! strictly a producer: all ordering happens when the poll thread drains
//! the shared queue.
//!
//! Watchers bind to their window through an exact-title lookup against
//! the process-wide registry, mirroring how an out-of-process window
//! manager would resolve the handle.  Zero or multiple matches are both
//! ambiguous and fail attachment.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::warn;

use crate::error::ViewError;
use crate::events::RawInput;
use crate::queue::EventQueue;

/// Sampling interval between geometry probes.
pub const WATCH_INTERVAL: Duration = Duration::from_millis(50);

/// Read access to live window geometry, from any thread.
pub trait WindowProbe: Send + 'static {
    /// Outer position in screen pixels, if the platform reports one.
    fn position(&self) -> Option<(i32, i32)>;
    fn has_focus(&self) -> bool;
}

fn registry() -> &'static Mutex<Vec<String>> {
    static REGISTRY: OnceLock<Mutex<Vec<String>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(Vec::new()))
}

/// Record a newly created window title in the process-wide registry.
pub(crate) fn register_window(title: &str) {
    registry()
        .lock()
        .expect("window registry poisoned")
        .push(title.to_string());
}

/// Remove one registration for `title` (windows may share titles, which
/// attachment then rejects).
pub(crate) fn unregister_window(title: &str) {
    let mut titles = registry().lock().expect("window registry poisoned");
    if let Some(index) = titles.iter().position(|t| t == title) {
        titles.remove(index);
    }
}

fn count_windows(title: &str) -> usize {
    registry()
        .lock()
        .expect("window registry poisoned")
        .iter()
        .filter(|t| t.as_str() == title)
        .count()
}

/// Handle to the watcher thread.  Stopping joins the thread, so no
/// callback can fire into a window being torn down.
#[derive(Debug)]
pub struct GeometryWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl GeometryWatcher {
    /// Attach to the single registered window named `title` and start
    /// sampling `probe` every `interval`.
    pub fn attach<P: WindowProbe>(
        title: &str,
        probe: P,
        queue: EventQueue,
        interval: Duration,
    ) -> Result<Self, ViewError> {
        let count = count_windows(title);
        if count != 1 {
            return Err(ViewError::AmbiguousWindow {
                title: title.to_string(),
                count,
            });
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = thread::Builder::new()
            .name("simview-watcher".to_string())
            .spawn(move || {
                let mut last_position = probe.position();
                let mut last_focus = probe.has_focus();
                while !stop_flag.load(Ordering::Relaxed) {
                    thread::sleep(interval);
                    let position = probe.position();
                    if position != last_position {
                        if let Some(position) = position {
                            queue.push(RawInput::WindowMove { position });
                        }
                        last_position = position;
                    }
                    let focus = probe.has_focus();
                    if focus != last_focus {
                        queue.push(RawInput::WindowFocus { has_focus: focus });
                        last_focus = focus;
                    }
                }
            })
            .map_err(|e| ViewError::WindowInit(e.to_string()))?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stop sampling and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("geometry watcher thread panicked");
            }
        }
    }
}

impl Drop for GeometryWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ===================================================================
// Tests
// ===================================================================
