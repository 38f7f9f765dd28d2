//! Shared mutable context threaded through every power-state handler.
//!
//! `PowerContext` is the single struct that state handlers read from and
//! write to: the latest activity/connection inputs, the desired hardware
//! outputs and configuration.

use crate::app::ports::AdvertisingProfile;
use crate::config::WatchConfig;

// ---------------------------------------------------------------------------
// Inputs (written by the power manager before each tick)
// ---------------------------------------------------------------------------

/// Signals sampled once per main-loop iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerInputs {
    /// Milliseconds since the last activity signal.
    pub idle_ms: u64,
    /// A phone is connected.
    pub connected: bool,
    /// Touch, new notification or ringing call this iteration.
    pub activity: bool,
    /// Inbound protocol command this iteration.
    pub traffic: bool,
    /// Power key short press this iteration.
    pub button: bool,
}

// ---------------------------------------------------------------------------
// Outputs (written by state handlers; applied by the power manager)
// ---------------------------------------------------------------------------

/// Desired hardware configuration for the current power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerCommands {
    pub cpu_mhz: u16,
    pub display_on: bool,
    /// Backlight, 0-100%.
    pub brightness: u8,
    pub storage_mounted: bool,
    pub advertising: AdvertisingProfile,
    /// The main loop may enter light sleep instead of yielding.
    pub light_sleep: bool,
}

impl PowerCommands {
    /// Hardware state right after reset: nothing powered, nothing mounted.
    pub const BOOT: Self = Self {
        cpu_mhz: 0,
        display_on: false,
        brightness: 0,
        storage_mounted: false,
        advertising: AdvertisingProfile::Slow,
        light_sleep: false,
    };
}

// ---------------------------------------------------------------------------
// PowerContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct PowerContext {
    pub inputs: PowerInputs,
    pub commands: PowerCommands,
    pub config: WatchConfig,

    /// Backlight level the user chose; restored on wake.
    pub user_brightness: u8,
}

impl PowerContext {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            inputs: PowerInputs::default(),
            commands: PowerCommands::BOOT,
            user_brightness: config.user_brightness_percent.min(100),
            config,
        }
    }

    /// Activity or the power key: both wake a sleeping watch.
    pub fn wake_signal(&self) -> bool {
        self.inputs.activity || self.inputs.button
    }

    /// Anything that keeps an awake watch at full speed.
    pub fn busy(&self) -> bool {
        self.inputs.activity || self.inputs.traffic
    }

    /// Quiet long enough to sleep.
    pub fn sleep_due(&self) -> bool {
        self.inputs.idle_ms >= self.config.sleep_timeout_ms
    }
}
