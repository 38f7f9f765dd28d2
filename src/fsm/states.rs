//! Concrete power-state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  ACTIVE ──[idle ≥ 2 s]──▶ IDLE_THROTTLED
//!    ▲  │                        │
//!    │  └──[idle ≥ 30 s | key]───┼──[idle ≥ 30 s | key]──┐
//!    │                           ▼                        ▼
//!    │          SLEEPING_CONNECTED ◀──[link up/down]──▶ SLEEPING_DISCONNECTED
//!    │                  │                                   │
//!    └──[activity | key]┴───────────────────────────────────┘
//!
//!  Any state ──[activity]──▶ ACTIVE
//!  IDLE_THROTTLED ──[inbound traffic]──▶ ACTIVE
//! ```

use super::context::PowerContext;
use super::{StateDescriptor, StateId};
use crate::app::ports::AdvertisingProfile;
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Active
        StateDescriptor {
            id: StateId::Active,
            name: "Active",
            on_enter: Some(active_enter),
            on_exit: None,
            on_update: active_update,
        },
        // Index 1: IdleThrottled
        StateDescriptor {
            id: StateId::IdleThrottled,
            name: "IdleThrottled",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 2: SleepingConnected
        StateDescriptor {
            id: StateId::SleepingConnected,
            name: "SleepingConnected",
            on_enter: Some(sleeping_connected_enter),
            on_exit: None,
            on_update: sleeping_connected_update,
        },
        // Index 3: SleepingDisconnected
        StateDescriptor {
            id: StateId::SleepingDisconnected,
            name: "SleepingDisconnected",
            on_enter: Some(sleeping_disconnected_enter),
            on_exit: Some(sleeping_disconnected_exit),
            on_update: sleeping_disconnected_update,
        },
    ]
}

/// Which sleep sub-state matches the current link.
fn sleep_state(ctx: &PowerContext) -> StateId {
    if ctx.inputs.connected {
        StateId::SleepingConnected
    } else {
        StateId::SleepingDisconnected
    }
}

/// Shared by both sleeping states: panel dark, storage released.
fn enter_sleep(ctx: &mut PowerContext, cpu_mhz: u16) {
    ctx.commands.cpu_mhz = cpu_mhz;
    ctx.commands.display_on = false;
    ctx.commands.brightness = 0;
    ctx.commands.storage_mounted = false;
    ctx.commands.advertising = AdvertisingProfile::Slow;
}

// ═══════════════════════════════════════════════════════════════════════════
//  ACTIVE: user is interacting
// ═══════════════════════════════════════════════════════════════════════════

fn active_enter(ctx: &mut PowerContext) {
    ctx.commands.cpu_mhz = ctx.config.cpu_active_mhz;
    ctx.commands.display_on = true;
    ctx.commands.brightness = ctx.user_brightness;
    ctx.commands.storage_mounted = true;
    ctx.commands.advertising = AdvertisingProfile::Fast;
    ctx.commands.light_sleep = false;
    info!("ACTIVE: {} MHz, display on", ctx.commands.cpu_mhz);
}

fn active_update(ctx: &mut PowerContext) -> Option<StateId> {
    if ctx.busy() {
        return None;
    }
    if ctx.inputs.button || ctx.sleep_due() {
        return Some(sleep_state(ctx));
    }
    if ctx.inputs.idle_ms >= ctx.config.idle_throttle_ms {
        return Some(StateId::IdleThrottled);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE_THROTTLED: display still on, CPU slowed
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut PowerContext) {
    ctx.commands.cpu_mhz = ctx.config.cpu_idle_mhz;
    info!("IDLE: CPU throttled to {} MHz", ctx.commands.cpu_mhz);
}

fn idle_update(ctx: &mut PowerContext) -> Option<StateId> {
    if ctx.busy() {
        return Some(StateId::Active);
    }
    if ctx.inputs.button || ctx.sleep_due() {
        return Some(sleep_state(ctx));
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  SLEEPING_CONNECTED: dark, link kept alive at a reduced clock
// ═══════════════════════════════════════════════════════════════════════════

fn sleeping_connected_enter(ctx: &mut PowerContext) {
    enter_sleep(ctx, ctx.config.cpu_sleep_connected_mhz);
    info!("SLEEP: connected, {} MHz", ctx.commands.cpu_mhz);
}

fn sleeping_connected_update(ctx: &mut PowerContext) -> Option<StateId> {
    if ctx.wake_signal() {
        return Some(StateId::Active);
    }
    if !ctx.inputs.connected {
        return Some(StateId::SleepingDisconnected);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  SLEEPING_DISCONNECTED: dark, minimum clock, light sleep between loops
// ═══════════════════════════════════════════════════════════════════════════

fn sleeping_disconnected_enter(ctx: &mut PowerContext) {
    enter_sleep(ctx, ctx.config.cpu_sleep_disconnected_mhz);
    ctx.commands.light_sleep = true;
    info!("SLEEP: disconnected, {} MHz, light sleep enabled", ctx.commands.cpu_mhz);
}

fn sleeping_disconnected_exit(ctx: &mut PowerContext) {
    ctx.commands.light_sleep = false;
}

fn sleeping_disconnected_update(ctx: &mut PowerContext) -> Option<StateId> {
    if ctx.wake_signal() {
        return Some(StateId::Active);
    }
    if ctx.inputs.connected {
        return Some(StateId::SleepingConnected);
    }
    None
}
