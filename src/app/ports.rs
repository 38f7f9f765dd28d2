//! Port traits: the hexagonal boundary between the watch core and the
//! hardware it drives.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ WatchService / PowerManager (domain)
//! ```
//!
//! Driven adapters (radio, display, storage, clock, CPU, sleep, event sink)
//! implement these traits.  The domain consumes them via generics, so the
//! protocol engine and power machine run unchanged on the host against
//! mocks.
//!
//! Failures come back as the typed errors in [`crate::error`]; the domain
//! logs them and degrades, it never aborts.

use crate::error::{HwError, RadioError};

// ───────────────────────────────────────────────────────────────
// Radio port (Nordic UART service)
// ───────────────────────────────────────────────────────────────

/// Advertising cadence, chosen by the power machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingProfile {
    /// Discovery / reconnect window, paired with the responsive
    /// connection interval.
    Fast,
    /// Sustained idle sleep, paired with the relaxed connection interval.
    Slow,
}

/// The write-side of the NUS link plus GAP control.
pub trait RadioPort {
    /// Send one notification on the TX characteristic.  `frame` is at most
    /// `mtu() - 3` bytes.
    fn notify(&mut self, frame: &[u8]) -> Result<(), RadioError>;

    /// Switch advertising interval and preferred connection parameters.
    fn set_advertising(&mut self, profile: AdvertisingProfile);

    /// Start advertising again after the central went away.
    fn restart_advertising(&mut self) -> Result<(), RadioError>;

    /// Negotiated ATT MTU.
    fn mtu(&self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Hardware collaborators
// ───────────────────────────────────────────────────────────────

/// Wall clock (RTC + system time).
pub trait ClockPort {
    /// Set local wall-clock time from seconds since the epoch.
    fn set_from_epoch(&mut self, local_epoch: i64) -> Result<(), HwError>;
}

/// CPU frequency control.
pub trait CpuPort {
    fn set_cpu_mhz(&mut self, mhz: u16) -> Result<(), HwError>;
}

/// Panel power and backlight.
pub trait DisplayPort {
    fn set_display_power(&mut self, on: bool);
    /// Backlight level, 0-100%.
    fn set_brightness(&mut self, percent: u8);
}

/// Removable storage.
pub trait StoragePort {
    fn mount(&mut self) -> Result<(), HwError>;
    fn unmount(&mut self);
}

/// Light-sleep control.
pub trait SleepPort {
    /// Arm the timer and touch-line wake sources.  Idempotent.
    fn arm_wake_sources(&mut self, timer_ms: u32);
    /// Enter light sleep until a wake source fires.
    fn light_sleep(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / UI)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, UI
/// collaborator, vibration motor).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
