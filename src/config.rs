//! System configuration parameters
//!
//! All tunable parameters for the WizWatch firmware: radio identity and
//! advertising cadence, power-state thresholds, CPU frequencies and
//! display wake sequencing.

use serde::{Deserialize, Serialize};

/// Advertising interval window in BLE units of 0.625 ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvInterval {
    pub min: u16,
    pub max: u16,
}

impl AdvInterval {
    /// Lower bound of the window in milliseconds.
    pub fn min_ms(&self) -> u32 {
        u32::from(self.min) * 625 / 1000
    }

    /// Upper bound of the window in milliseconds.
    pub fn max_ms(&self) -> u32 {
        u32::from(self.max) * 625 / 1000
    }
}

/// Preferred connection interval window in BLE units of 1.25 ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnInterval {
    pub min: u16,
    pub max: u16,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    // --- Radio ---
    /// Advertised GAP name. Gadgetbridge matches on the `Bangle.js` prefix.
    pub device_name: heapless::String<32>,
    /// Requested ATT MTU.
    pub mtu: u16,
    /// Discovery / reconnect advertising (20–40 ms).
    pub adv_fast: AdvInterval,
    /// Sustained idle-sleep advertising (1000–2000 ms).
    pub adv_slow: AdvInterval,
    /// Preferred connection interval while the user is interacting.
    pub conn_responsive: ConnInterval,
    /// Preferred connection interval while asleep.
    pub conn_relaxed: ConnInterval,
    /// Delay before advertising restarts after a disconnect (ms).
    pub readvertise_delay_ms: u32,
    /// Pause between the flush frame and the payload frame (ms).
    pub flush_delay_ms: u32,

    // --- Power ---
    /// Inactivity before the CPU is throttled (ms).
    pub idle_throttle_ms: u64,
    /// Inactivity before the display sleeps (ms).
    pub sleep_timeout_ms: u64,
    pub cpu_active_mhz: u16,
    pub cpu_idle_mhz: u16,
    pub cpu_sleep_connected_mhz: u16,
    pub cpu_sleep_disconnected_mhz: u16,
    /// Light-sleep timer wake period while sleeping disconnected (ms).
    pub light_sleep_period_ms: u32,

    // --- Display ---
    /// Safe brightness applied first on wake (0-100%).
    pub wake_brightness_percent: u8,
    /// Brightness restored after the wake ramp (0-100%).
    pub user_brightness_percent: u8,
    /// Settle time after display power-on and after each wake step (ms).
    pub wake_step_delay_ms: u32,
    /// Settle time between backlight off and CPU down-clock (ms).
    pub sleep_step_delay_ms: u32,

    // --- Timing ---
    /// Main loop yield while awake (ms).
    pub loop_awake_ms: u32,
    /// Main loop yield while sleeping connected (ms).
    pub loop_sleeping_ms: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        let mut device_name = heapless::String::new();
        // Fits: 18 bytes into 32.
        let _ = device_name.push_str("Bangle.js WizWatch");
        Self {
            // Radio
            device_name,
            mtu: 256,
            adv_fast: AdvInterval { min: 0x20, max: 0x40 },  // 20–40 ms
            adv_slow: AdvInterval { min: 1600, max: 3200 },  // 1–2 s
            conn_responsive: ConnInterval { min: 0x06, max: 0x12 }, // 7.5–22.5 ms
            conn_relaxed: ConnInterval { min: 0x50, max: 0xA0 },    // 100–200 ms
            readvertise_delay_ms: 500,
            flush_delay_ms: 20,

            // Power
            idle_throttle_ms: 2_000,
            sleep_timeout_ms: 30_000,
            cpu_active_mhz: 240,
            cpu_idle_mhz: 160,
            cpu_sleep_connected_mhz: 80,
            cpu_sleep_disconnected_mhz: 40,
            light_sleep_period_ms: 1_000,

            // Display
            wake_brightness_percent: 20,
            user_brightness_percent: 50,
            wake_step_delay_ms: 50,
            sleep_step_delay_ms: 10,

            // Timing
            loop_awake_ms: 1,
            loop_sleeping_ms: 100,
        }
    }
}
