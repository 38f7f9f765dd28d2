//! Hardware adapter: bridges the watch peripherals to the domain ports.
//!
//! [`WatchHardware`] owns the radio and the clock and drives the CPU
//! frequency and light sleep directly.  The display panel and the SD card
//! belong to the UI collaborator; this adapter records the power state it
//! asks for (panel power, backlight level, storage mount) and the UI side
//! reads it back.
//!
//! A single value implements every port, so the domain receives one
//! `&mut hw` bound by the traits it needs.

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use super::ble::NusAdapter;
use super::time::Esp32TimeAdapter;
use crate::app::ports::{
    AdvertisingProfile, ClockPort, CpuPort, DisplayPort, RadioPort, SleepPort, StoragePort,
};
use crate::error::{HwError, RadioError};

/// Frequencies the ESP32-S3 clock tree can run the CPU at.
pub const SUPPORTED_CPU_MHZ: [u16; 4] = [240, 160, 80, 40];

/// Map a 0-100% level onto the panel's 8-bit backlight register.
pub fn backlight_level(percent: u8) -> u8 {
    (u16::from(percent.min(100)) * 255 / 100) as u8
}

pub struct WatchHardware {
    radio: NusAdapter,
    clock: Esp32TimeAdapter,
    cpu_mhz: u16,
    display_on: bool,
    backlight: u8,
    storage_mounted: bool,
    wake_armed: bool,
    light_sleeps: u32,
}

impl WatchHardware {
    pub fn new(radio: NusAdapter, clock: Esp32TimeAdapter) -> Self {
        Self {
            radio,
            clock,
            cpu_mhz: 240,
            display_on: false,
            backlight: 0,
            storage_mounted: false,
            wake_armed: false,
            light_sleeps: 0,
        }
    }

    pub fn radio(&self) -> &NusAdapter {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut NusAdapter {
        &mut self.radio
    }

    pub fn clock(&self) -> &Esp32TimeAdapter {
        &self.clock
    }

    pub fn cpu_mhz(&self) -> u16 {
        self.cpu_mhz
    }

    pub fn display_on(&self) -> bool {
        self.display_on
    }

    /// Panel backlight register value, 0-255.
    pub fn backlight(&self) -> u8 {
        self.backlight
    }

    pub fn storage_mounted(&self) -> bool {
        self.storage_mounted
    }

    /// Light-sleep entries since boot.
    pub fn light_sleeps(&self) -> u32 {
        self.light_sleeps
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(feature = "espidf")]
    fn platform_set_cpu(&mut self, mhz: u16) -> Result<(), HwError> {
        use esp_idf_svc::sys::*;
        let cfg = esp_pm_config_t {
            max_freq_mhz: i32::from(mhz),
            min_freq_mhz: i32::from(mhz),
            light_sleep_enable: false,
        };
        let ret = unsafe { esp_pm_configure((&cfg as *const esp_pm_config_t).cast()) };
        if ret != ESP_OK as i32 {
            return Err(HwError::CpuFreqFailed(ret));
        }
        Ok(())
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_set_cpu(&mut self, mhz: u16) -> Result<(), HwError> {
        debug!("HW(sim): CPU {} MHz", mhz);
        Ok(())
    }

    #[cfg(feature = "espidf")]
    fn platform_arm_wake(&mut self, timer_ms: u32) {
        use esp_idf_svc::sys::*;
        unsafe {
            esp_sleep_enable_timer_wakeup(u64::from(timer_ms) * 1000);
            gpio_wakeup_enable(
                crate::pins::TOUCH_INT_GPIO,
                gpio_int_type_t_GPIO_INTR_LOW_LEVEL,
            );
            esp_sleep_enable_gpio_wakeup();
        }
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_arm_wake(&mut self, timer_ms: u32) {
        debug!("HW(sim): wake sources armed (timer {} ms, touch)", timer_ms);
    }

    #[cfg(feature = "espidf")]
    fn platform_light_sleep(&mut self) {
        unsafe {
            esp_idf_svc::sys::esp_light_sleep_start();
        }
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_light_sleep(&mut self) {}

    #[cfg(feature = "espidf")]
    fn platform_delay_ms(&mut self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

// ── CpuPort ───────────────────────────────────────────────────

impl CpuPort for WatchHardware {
    fn set_cpu_mhz(&mut self, mhz: u16) -> Result<(), HwError> {
        if !SUPPORTED_CPU_MHZ.contains(&mhz) {
            return Err(HwError::CpuFreqFailed(-1));
        }
        if mhz == self.cpu_mhz {
            return Ok(());
        }
        self.platform_set_cpu(mhz)?;
        info!("HW: CPU {} -> {} MHz", self.cpu_mhz, mhz);
        self.cpu_mhz = mhz;
        Ok(())
    }
}

// ── DisplayPort ───────────────────────────────────────────────

impl DisplayPort for WatchHardware {
    fn set_display_power(&mut self, on: bool) {
        self.display_on = on;
        debug!("HW: display {}", if on { "on" } else { "off" });
    }

    fn set_brightness(&mut self, percent: u8) {
        self.backlight = backlight_level(percent);
        debug!("HW: backlight {}% ({})", percent, self.backlight);
    }
}

// ── StoragePort ───────────────────────────────────────────────

impl StoragePort for WatchHardware {
    fn mount(&mut self) -> Result<(), HwError> {
        self.storage_mounted = true;
        debug!("HW: storage mounted");
        Ok(())
    }

    fn unmount(&mut self) {
        self.storage_mounted = false;
        debug!("HW: storage unmounted");
    }
}

// ── SleepPort ─────────────────────────────────────────────────

impl SleepPort for WatchHardware {
    fn arm_wake_sources(&mut self, timer_ms: u32) {
        if self.wake_armed {
            return;
        }
        self.platform_arm_wake(timer_ms);
        self.wake_armed = true;
    }

    fn light_sleep(&mut self) {
        self.light_sleeps = self.light_sleeps.wrapping_add(1);
        self.platform_light_sleep();
    }
}

// ── ClockPort (delegates to the time adapter) ─────────────────

impl ClockPort for WatchHardware {
    fn set_from_epoch(&mut self, local_epoch: i64) -> Result<(), HwError> {
        self.clock.set_from_epoch(local_epoch)
    }
}

// ── RadioPort (delegates to the NUS adapter) ──────────────────

impl RadioPort for WatchHardware {
    fn notify(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        self.radio.notify(frame)
    }

    fn set_advertising(&mut self, profile: AdvertisingProfile) {
        self.radio.set_advertising(profile);
    }

    fn restart_advertising(&mut self) -> Result<(), RadioError> {
        self.radio.restart_advertising()
    }

    fn mtu(&self) -> u16 {
        self.radio.mtu()
    }
}

// ── DelayNs ───────────────────────────────────────────────────

impl DelayNs for WatchHardware {
    fn delay_ns(&mut self, ns: u32) {
        self.platform_delay_ms(ns.div_ceil(1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.platform_delay_ms(ms);
    }
}
