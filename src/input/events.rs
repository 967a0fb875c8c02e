//! Buffered device events
//!
//! Device events (key presses, gamepad buttons and axes, gamepad connection)
//! arrive from the host whenever the platform delivers them. They are pushed
//! into an [`InputQueue`] and only become visible at the next frame boundary,
//! so a tick always reads a device snapshot that does not change under it.
//!
//! # Example
//!
//! ```ignore
//! // From a window or gamepad callback
//! queue.push(InputEvent::Key { key: KeyCode::KeyV, pressed: true });
//!
//! // At the start of the next tick
//! queue.swap();
//! for event in queue.drain() {
//!     devices.apply(event);
//! }
//! ```

use std::collections::VecDeque;

use winit::keyboard::KeyCode;

use crate::input::gamepad::{GamepadAxis, GamepadButton};

// ============================================================================
// Event Types
// ============================================================================

/// A raw device event, independent of the library that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A keyboard key changed state.
    Key {
        /// Physical key code
        key: KeyCode,
        /// `true` on press, `false` on release
        pressed: bool,
    },

    /// A gamepad button changed state.
    Button {
        /// Gamepad that reported the change
        id: usize,
        /// Button in the standard layout
        button: GamepadButton,
        /// `true` on press, `false` on release
        pressed: bool,
    },

    /// A gamepad axis moved.
    Axis {
        /// Gamepad that reported the change
        id: usize,
        /// Axis in the standard layout
        axis: GamepadAxis,
        /// Raw value, expected in `[-1, 1]`
        value: f32,
    },

    /// A gamepad became available.
    GamepadConnected {
        /// Gamepad identifier
        id: usize,
        /// Human-readable device name
        name: String,
    },

    /// A gamepad went away.
    GamepadDisconnected {
        /// Gamepad identifier
        id: usize,
    },

    /// The window lost focus; pending releases will never arrive.
    FocusLost,
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered queue of device events.
///
/// Events pushed during frame N are drained at the start of frame N+1.
#[derive(Debug)]
pub struct InputQueue {
    /// Events arriving this frame
    pending: VecDeque<InputEvent>,
    /// Events from the previous frame, ready to apply
    processing: VecDeque<InputEvent>,
}

impl InputQueue {
    const DEFAULT_CAPACITY: usize = 64;

    /// Create a new queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new queue with the given initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Buffer an event until the next frame boundary.
    #[inline]
    pub fn push(&mut self, event: InputEvent) {
        self.pending.push_back(event);
    }

    /// Make everything pushed so far available to [`drain`](Self::drain).
    ///
    /// Undrained events from the previous swap are kept ahead of the new ones
    /// so nothing is lost if a frame skips draining.
    pub fn swap(&mut self) {
        self.processing.append(&mut self.pending);
    }

    /// Take the events made available by the last [`swap`](Self::swap).
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.processing.drain(..)
    }

    /// Number of events ready to apply.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Whether no events are ready to apply.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Number of events waiting for the next swap.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop everything, pending or not.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(pressed: bool) -> InputEvent {
        InputEvent::Key {
            key: KeyCode::KeyV,
            pressed,
        }
    }

    #[test]
    fn test_events_hidden_until_swap() {
        let mut queue = InputQueue::new();

        queue.push(key(true));
        assert!(queue.is_empty(), "events should not be visible before swap");
        assert_eq!(queue.pending_count(), 1);

        queue.swap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_events_pushed_mid_frame_wait_for_next_swap() {
        let mut queue = InputQueue::new();

        queue.push(key(true));
        queue.swap();

        // Arrives while the previous batch is being applied
        queue.push(key(false));

        let applied: Vec<_> = queue.drain().collect();
        assert_eq!(applied, vec![key(true)]);

        queue.swap();
        let applied: Vec<_> = queue.drain().collect();
        assert_eq!(applied, vec![key(false)]);
    }

    #[test]
    fn test_swap_keeps_undrained_events_in_order() {
        let mut queue = InputQueue::new();

        queue.push(key(true));
        queue.swap();
        queue.push(key(false));
        queue.swap();

        let applied: Vec<_> = queue.drain().collect();
        assert_eq!(applied, vec![key(true), key(false)]);
    }

    #[test]
    fn test_clear() {
        let mut queue = InputQueue::new();
        queue.push(key(true));
        queue.swap();
        queue.push(key(false));

        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.pending_count(), 0);
    }
}
