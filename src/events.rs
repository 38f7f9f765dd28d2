//! Interrupt / callback → main-loop handoff.
//!
//! Two primitives bridge foreign execution contexts into the cooperative
//! main loop without locks:
//!
//! - [`Flag`]: a single-slot latch.  The producer (GPIO ISR, PMU poll)
//!   sets it; the main loop takes it.  Multiple edges between polls
//!   collapse into one.
//! - the link event queue: a lock-free SPSC ring carrying connection
//!   lifecycle events from the Bluedroid callback task.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Touch ISR    │────▶│ TOUCH_FLAG   │────▶│              │
//! │ PMU IRQ poll │────▶│ POWER_KEY    │────▶│  Main Loop   │
//! │ GATTS cb     │────▶│ Link queue   │────▶│  (consumer)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

// ── Single-slot flag ──────────────────────────────────────────

/// Set-by-producer / take-by-consumer boolean latch.
pub struct Flag(AtomicBool);

impl Flag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Mark the event as having occurred.  Safe from ISR context.
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Return whether the event occurred since the last take, clearing it.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Peek without clearing.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for Flag {
    fn default() -> Self {
        Self::new()
    }
}

/// Touch controller interrupt line fired.
pub static TOUCH_FLAG: Flag = Flag::new();

/// PMU reported a power-key short press.
pub static POWER_KEY_FLAG: Flag = Flag::new();

// ── Link event queue ──────────────────────────────────────────

/// Maximum number of pending link events.
/// Power of 2 for efficient ring buffer modulo.
const LINK_QUEUE_CAP: usize = 8;

/// Connection lifecycle events raised from the radio callback context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LinkEvent {
    /// A central connected.
    Connected = 1,
    /// The central went away.
    Disconnected = 2,
}

static LINK_HEAD: AtomicU8 = AtomicU8::new(0);
static LINK_TAIL: AtomicU8 = AtomicU8::new(0);
static LINK_BUFFER: [AtomicU8; LINK_QUEUE_CAP] = [const { AtomicU8::new(0) }; LINK_QUEUE_CAP];

/// Push a link event into the queue.
/// Safe to call from the radio callback task (single producer).
/// Returns `false` if the queue is full (event dropped).
pub fn push_link_event(event: LinkEvent) -> bool {
    let head = LINK_HEAD.load(Ordering::Relaxed);
    let tail = LINK_TAIL.load(Ordering::Acquire);
    let next_head = (head + 1) % LINK_QUEUE_CAP as u8;

    if next_head == tail {
        return false; // Queue full: drop event.
    }

    LINK_BUFFER[head as usize].store(event as u8, Ordering::Relaxed);
    LINK_HEAD.store(next_head, Ordering::Release);
    true
}

/// Pop the next link event.  Main loop only (single consumer).
pub fn pop_link_event() -> Option<LinkEvent> {
    let tail = LINK_TAIL.load(Ordering::Relaxed);
    let head = LINK_HEAD.load(Ordering::Acquire);

    if tail == head {
        return None;
    }

    let raw = LINK_BUFFER[tail as usize].load(Ordering::Relaxed);
    LINK_TAIL.store((tail + 1) % LINK_QUEUE_CAP as u8, Ordering::Release);

    link_event_from_u8(raw)
}

/// Drain all pending link events into a callback, in FIFO order.
pub fn drain_link_events(mut handler: impl FnMut(LinkEvent)) {
    while let Some(event) = pop_link_event() {
        handler(event);
    }
}

fn link_event_from_u8(raw: u8) -> Option<LinkEvent> {
    match raw {
        1 => Some(LinkEvent::Connected),
        2 => Some(LinkEvent::Disconnected),
        _ => None,
    }
}
