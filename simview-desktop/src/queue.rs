//! The shared raw input queue.
//!
//! This queue is the single synchronization point between the geometry
//! watcher thread (producer) and the host's polling thread (producer of
//! toolkit events, sole consumer).  Samples are immutable once pushed,
//! so the lock only guards the queue structure itself.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::events::RawInput;

/// Cloneable handle to the shared queue.
#[derive(Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<RawInput>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, raw: RawInput) {
        self.inner.lock().expect("input queue poisoned").push_back(raw);
    }

    /// Remove and return every queued sample, in arrival order.
    pub fn drain(&self) -> Vec<RawInput> {
        self.inner
            .lock()
            .expect("input queue poisoned")
            .drain(..)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("input queue poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_arrival_order() {
        let queue = EventQueue::new();
        queue.push(RawInput::WindowOpen);
        queue.push(RawInput::Quit);
        let drained = queue.drain();
        assert_eq!(drained, vec![RawInput::WindowOpen, RawInput::Quit]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clones_share_one_queue() {
        let queue = EventQueue::new();
        let producer = queue.clone();
        std::thread::spawn(move || producer.push(RawInput::WindowOpen))
            .join()
            .unwrap();
        assert_eq!(queue.len(), 1);
    }
}
