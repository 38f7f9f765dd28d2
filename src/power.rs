//! Power manager: owns the power FSM and applies its outputs.
//!
//! The FSM handlers only write a [`PowerCommands`] snapshot.  Each tick the
//! manager diffs the new snapshot against what the hardware was last told
//! ([`plan_actions`]) and executes the resulting ordered action list against
//! the CPU, display, storage and radio ports.
//!
//! ```text
//!  activity / key / link ──▶ PowerContext ──▶ Fsm::tick ──▶ PowerCommands
//!                                                               │
//!                          hardware ◀── execute ◀── plan_actions(prev, next)
//! ```
//!
//! Wake and sleep are sequenced so the panel never flashes at full
//! brightness before it is powered and never stays lit while the CPU drops.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{
    AdvertisingProfile, CpuPort, DisplayPort, EventSink, RadioPort, SleepPort, StoragePort,
};
use crate::config::WatchConfig;
use crate::fsm::context::{PowerCommands, PowerContext, PowerInputs};
use crate::fsm::{states, Fsm, StateId};

/// Upper bound on actions emitted for a single transition.
pub const MAX_ACTIONS: usize = 12;

/// One hardware step, executed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    SetCpuMhz(u16),
    DisplayPower(bool),
    /// Backlight, 0-100%.
    SetBrightness(u8),
    Delay(u32),
    MountStorage,
    UnmountStorage,
    Advertising(AdvertisingProfile),
}

pub type ActionList = Vec<PowerAction, MAX_ACTIONS>;

/// Signals sampled from the main loop for one power tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerSignals {
    /// Touch, new notification or ringing call.  Wakes from any state.
    pub activity: bool,
    /// Any inbound command.  Keeps an awake watch at full speed but does
    /// not light a dark panel.
    pub traffic: bool,
    /// Power key short press.
    pub button: bool,
    pub connected: bool,
}

/// Snapshot exposed to the UI collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerState {
    pub sleeping: bool,
    pub cpu_throttled: bool,
    /// Uptime (ms) of the last activity signal.
    pub last_activity_ms: u64,
}

// ───────────────────────────────────────────────────────────────
// Action planning (pure)
// ───────────────────────────────────────────────────────────────

/// Ordered hardware steps that move the hardware from `prev` to `next`.
///
/// * Panel coming on: CPU first, then panel power, a dim step at the wake
///   brightness, then the target level.  Storage and advertising follow.
/// * Panel going off: backlight to zero and panel off before the CPU
///   slows.  Storage and advertising follow.
/// * Otherwise only the fields that changed.
pub fn plan_actions(prev: &PowerCommands, next: &PowerCommands, config: &WatchConfig) -> ActionList {
    let mut actions = ActionList::new();
    let mut push = |a: PowerAction| {
        let _ = actions.push(a);
    };

    match (prev.display_on, next.display_on) {
        (false, true) => {
            if prev.cpu_mhz != next.cpu_mhz {
                push(PowerAction::SetCpuMhz(next.cpu_mhz));
            }
            push(PowerAction::DisplayPower(true));
            push(PowerAction::Delay(config.wake_step_delay_ms));
            push(PowerAction::SetBrightness(config.wake_brightness_percent));
            push(PowerAction::Delay(config.wake_step_delay_ms));
            push(PowerAction::SetBrightness(next.brightness));
        }
        (true, false) => {
            push(PowerAction::SetBrightness(0));
            push(PowerAction::DisplayPower(false));
            push(PowerAction::Delay(config.sleep_step_delay_ms));
            if prev.cpu_mhz != next.cpu_mhz {
                push(PowerAction::SetCpuMhz(next.cpu_mhz));
            }
        }
        (on, _) => {
            if prev.cpu_mhz != next.cpu_mhz {
                push(PowerAction::SetCpuMhz(next.cpu_mhz));
            }
            if on && prev.brightness != next.brightness {
                push(PowerAction::SetBrightness(next.brightness));
            }
        }
    }

    match (prev.storage_mounted, next.storage_mounted) {
        (false, true) => push(PowerAction::MountStorage),
        (true, false) => push(PowerAction::UnmountStorage),
        _ => {}
    }
    if prev.advertising != next.advertising {
        push(PowerAction::Advertising(next.advertising));
    }
    actions
}

// ───────────────────────────────────────────────────────────────
// PowerManager
// ───────────────────────────────────────────────────────────────

pub struct PowerManager {
    fsm: Fsm,
    ctx: PowerContext,
    /// What the hardware was last told.
    applied: PowerCommands,
    last_activity_ms: u64,
    wake_armed: bool,
}

impl PowerManager {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            fsm: Fsm::new(states::build_state_table(), StateId::Active),
            ctx: PowerContext::new(config),
            applied: PowerCommands::BOOT,
            last_activity_ms: 0,
            wake_armed: false,
        }
    }

    /// Enter `Active` and bring the hardware up from its reset state.
    pub fn start(
        &mut self,
        now_ms: u64,
        hw: &mut (impl CpuPort + DisplayPort + StoragePort + RadioPort + DelayNs),
    ) {
        self.last_activity_ms = now_ms;
        self.fsm.start(&mut self.ctx);
        self.apply(hw);
    }

    /// Feed one iteration's signals through the FSM and apply the result.
    /// Returns the state after the tick.
    pub fn tick(
        &mut self,
        now_ms: u64,
        signals: PowerSignals,
        hw: &mut (impl CpuPort + DisplayPort + StoragePort + RadioPort + DelayNs),
        sink: &mut impl EventSink,
    ) -> StateId {
        if signals.activity || signals.traffic || signals.button {
            self.last_activity_ms = now_ms;
        }
        self.ctx.inputs = PowerInputs {
            idle_ms: now_ms.saturating_sub(self.last_activity_ms),
            connected: signals.connected,
            activity: signals.activity,
            traffic: signals.traffic,
            button: signals.button,
        };

        let from = self.fsm.current_state();
        self.fsm.tick(&mut self.ctx);
        let to = self.fsm.current_state();

        self.apply(hw);

        if from != to {
            if !to.is_sleeping() {
                self.wake_armed = false;
            }
            sink.emit(&AppEvent::PowerStateChanged { from, to });
        }
        to
    }

    /// Change the user backlight level (clamped to 100%).  Applied on the
    /// next tick if the panel is lit, otherwise restored on wake.
    pub fn set_user_brightness(&mut self, percent: u8) {
        let level = percent.min(100);
        self.ctx.user_brightness = level;
        if self.ctx.commands.display_on {
            self.ctx.commands.brightness = level;
        }
    }

    pub fn user_brightness(&self) -> u8 {
        self.ctx.user_brightness
    }

    /// Enter light sleep if the current state allows it.  Wake sources are
    /// armed once per sleep period.  Returns `true` if the CPU slept.
    pub fn sleep_if_eligible(&mut self, hw: &mut impl SleepPort) -> bool {
        if !self.ctx.commands.light_sleep {
            return false;
        }
        if !self.wake_armed {
            hw.arm_wake_sources(self.ctx.config.light_sleep_period_ms);
            self.wake_armed = true;
        }
        hw.light_sleep();
        true
    }

    /// How long the main loop should yield when it does not light-sleep.
    pub fn idle_delay_ms(&self) -> u32 {
        if self.fsm.current_state().is_sleeping() {
            self.ctx.config.loop_sleeping_ms
        } else {
            self.ctx.config.loop_awake_ms
        }
    }

    pub fn state_id(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn state(&self) -> PowerState {
        let id = self.fsm.current_state();
        PowerState {
            sleeping: id.is_sleeping(),
            cpu_throttled: id != StateId::Active,
            last_activity_ms: self.last_activity_ms,
        }
    }

    /// Outputs currently applied to the hardware.
    pub fn commands(&self) -> PowerCommands {
        self.applied
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply(&mut self, hw: &mut (impl CpuPort + DisplayPort + StoragePort + RadioPort + DelayNs)) {
        let next = self.ctx.commands;
        if next == self.applied {
            return;
        }
        for action in plan_actions(&self.applied, &next, &self.ctx.config) {
            match action {
                PowerAction::SetCpuMhz(mhz) => {
                    if let Err(e) = hw.set_cpu_mhz(mhz) {
                        warn!("POWER: CPU to {} MHz failed: {}", mhz, e);
                    }
                }
                PowerAction::DisplayPower(on) => hw.set_display_power(on),
                PowerAction::SetBrightness(level) => hw.set_brightness(level),
                PowerAction::Delay(ms) => hw.delay_ms(ms),
                PowerAction::MountStorage => {
                    if let Err(e) = hw.mount() {
                        warn!("POWER: storage remount failed: {}", e);
                    }
                }
                PowerAction::UnmountStorage => hw.unmount(),
                PowerAction::Advertising(profile) => hw.set_advertising(profile),
            }
        }
        info!(
            "POWER: {} MHz, display {}, brightness {}%",
            next.cpu_mhz,
            if next.display_on { "on" } else { "off" },
            next.brightness
        );
        self.applied = next;
    }
}
