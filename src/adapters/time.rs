//! ESP32 time adapter.
//!
//! Monotonic uptime for the main loop plus the wall clock the phone sets.
//!
//! - **`feature = "espidf"`**: wraps `esp_timer_get_time()` (microsecond,
//!   monotonic) and `settimeofday()` / `gettimeofday()`.
//! - **otherwise**: uses `std::time::Instant` and an in-memory offset for
//!   host-side testing and simulation.

use crate::app::ports::ClockPort;
use crate::error::HwError;

/// Anything earlier was never set by a phone.
const EPOCH_2020: i64 = 1_577_836_800;

/// Time adapter for the ESP32-S3 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
    /// Simulation: wall-clock seconds at `start`.
    #[cfg(not(feature = "espidf"))]
    wall_base: Option<i64>,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(not(feature = "espidf"))]
            wall_base: None,
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(feature = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(feature = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Milliseconds since boot (monotonic).
    pub fn uptime_ms(&self) -> u64 {
        self.uptime_us() / 1000
    }

    /// Local wall-clock seconds, `None` until a phone has synced the time.
    #[cfg(feature = "espidf")]
    pub fn wall_clock(&self) -> Option<i64> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        let secs = tv.tv_sec as i64;
        (secs >= EPOCH_2020).then_some(secs)
    }

    /// Local wall-clock seconds, `None` until a phone has synced the time.
    #[cfg(not(feature = "espidf"))]
    pub fn wall_clock(&self) -> Option<i64> {
        let base = self.wall_base?;
        let secs = base + self.start.elapsed().as_secs() as i64;
        (secs >= EPOCH_2020).then_some(secs)
    }
}

impl ClockPort for Esp32TimeAdapter {
    #[cfg(feature = "espidf")]
    fn set_from_epoch(&mut self, local_epoch: i64) -> Result<(), HwError> {
        let tv = esp_idf_svc::sys::timeval {
            tv_sec: local_epoch as esp_idf_svc::sys::time_t,
            tv_usec: 0,
        };
        let ret = unsafe { esp_idf_svc::sys::settimeofday(&tv, core::ptr::null()) };
        if ret != 0 {
            return Err(HwError::ClockSetFailed(ret));
        }
        log::info!("CLOCK: set to {}", local_epoch);
        Ok(())
    }

    #[cfg(not(feature = "espidf"))]
    fn set_from_epoch(&mut self, local_epoch: i64) -> Result<(), HwError> {
        self.wall_base = Some(local_epoch - self.start.elapsed().as_secs() as i64);
        log::info!("CLOCK(sim): set to {}", local_epoch);
        Ok(())
    }
}
