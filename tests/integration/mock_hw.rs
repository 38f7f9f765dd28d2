//! Mock hardware adapter for integration tests.
//!
//! Implements every port the watch core drives and records each call so
//! tests can assert on the full command history without a radio, panel or
//! PMU attached.

use embedded_hal::delay::DelayNs;
use wizwatch::app::events::AppEvent;
use wizwatch::app::ports::{
    AdvertisingProfile, ClockPort, CpuPort, DisplayPort, EventSink, RadioPort, SleepPort,
    StoragePort,
};
use wizwatch::error::{HwError, RadioError};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    Cpu(u16),
    Display(bool),
    Brightness(u8),
    Delay(u32),
    Mount,
    Unmount,
    Advertise(AdvertisingProfile),
    RestartAdvertising,
    ArmWake(u32),
    LightSleep,
}

// ── MockHw ────────────────────────────────────────────────────

pub struct MockHw {
    pub calls: Vec<HwCall>,
    /// Every notification payload, in order.
    pub frames: Vec<Vec<u8>>,
    pub mtu: u16,
    pub notify_fails: bool,
    pub clock: Option<i64>,
}

#[allow(dead_code)]
impl MockHw {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            frames: Vec::new(),
            mtu: 256,
            notify_fails: false,
            clock: None,
        }
    }

    /// All notified bytes joined into one string.
    pub fn sent_text(&self) -> String {
        let bytes: Vec<u8> = self.frames.iter().flatten().copied().collect();
        String::from_utf8(bytes).expect("outbound frames are UTF-8")
    }

    pub fn count(&self, call: HwCall) -> usize {
        self.calls.iter().filter(|&&c| c == call).count()
    }

    pub fn last_brightness(&self) -> Option<u8> {
        self.calls.iter().rev().find_map(|c| match c {
            HwCall::Brightness(b) => Some(*b),
            _ => None,
        })
    }

    pub fn last_cpu(&self) -> Option<u16> {
        self.calls.iter().rev().find_map(|c| match c {
            HwCall::Cpu(mhz) => Some(*mhz),
            _ => None,
        })
    }

    pub fn display_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                HwCall::Display(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
        self.frames.clear();
    }
}

impl Default for MockHw {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioPort for MockHw {
    fn notify(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        if self.notify_fails {
            return Err(RadioError::NotifyFailed(-1));
        }
        assert!(frame.len() <= usize::from(self.mtu) - 3, "frame exceeds MTU");
        self.frames.push(frame.to_vec());
        Ok(())
    }

    fn set_advertising(&mut self, profile: AdvertisingProfile) {
        self.calls.push(HwCall::Advertise(profile));
    }

    fn restart_advertising(&mut self) -> Result<(), RadioError> {
        self.calls.push(HwCall::RestartAdvertising);
        Ok(())
    }

    fn mtu(&self) -> u16 {
        self.mtu
    }
}

impl ClockPort for MockHw {
    fn set_from_epoch(&mut self, local_epoch: i64) -> Result<(), HwError> {
        self.clock = Some(local_epoch);
        Ok(())
    }
}

impl CpuPort for MockHw {
    fn set_cpu_mhz(&mut self, mhz: u16) -> Result<(), HwError> {
        self.calls.push(HwCall::Cpu(mhz));
        Ok(())
    }
}

impl DisplayPort for MockHw {
    fn set_display_power(&mut self, on: bool) {
        self.calls.push(HwCall::Display(on));
    }

    fn set_brightness(&mut self, percent: u8) {
        self.calls.push(HwCall::Brightness(percent));
    }
}

impl StoragePort for MockHw {
    fn mount(&mut self) -> Result<(), HwError> {
        self.calls.push(HwCall::Mount);
        Ok(())
    }

    fn unmount(&mut self) {
        self.calls.push(HwCall::Unmount);
    }
}

impl SleepPort for MockHw {
    fn arm_wake_sources(&mut self, timer_ms: u32) {
        self.calls.push(HwCall::ArmWake(timer_ms));
    }

    fn light_sleep(&mut self) {
        self.calls.push(HwCall::LightSleep);
    }
}

impl DelayNs for MockHw {
    fn delay_ns(&mut self, ns: u32) {
        self.calls.push(HwCall::Delay(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(HwCall::Delay(ms));
    }
}

// ── Event sink ────────────────────────────────────────────────

/// Collects every emitted event.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
