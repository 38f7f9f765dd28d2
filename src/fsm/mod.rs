//! Function-pointer finite state machine engine for power management.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                         │
//! │  ┌──────────────────────┬──────────┬─────────┬───────────────────┐  │
//! │  │ StateId              │ on_enter │ on_exit │ on_update         │  │
//! │  ├──────────────────────┼──────────┼─────────┼───────────────────┤  │
//! │  │ Active               │ fn(ctx)  │    -    │ fn(ctx)->Option<> │  │
//! │  │ IdleThrottled        │ fn(ctx)  │    -    │ fn(ctx)->Option<> │  │
//! │  │ SleepingConnected    │ fn(ctx)  │    -    │ fn(ctx)->Option<> │  │
//! │  │ SleepingDisconnected │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Option<> │  │
//! │  └──────────────────────┴──────────┴─────────┴───────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  All functions receive `&mut PowerContext` which
//! holds the sampled inputs, the desired outputs and config.

pub mod context;
pub mod states;

use context::PowerContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all power states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Active = 0,
    IdleThrottled = 1,
    SleepingConnected = 2,
    SleepingDisconnected = 3,
}

impl StateId {
    /// Total number of states: used to size the table array.
    pub const COUNT: usize = 4;

    /// Display dark, storage unmounted.
    pub fn is_sleeping(self) -> bool {
        matches!(self, Self::SleepingConnected | Self::SleepingDisconnected)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut PowerContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut PowerContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]); the mutable
/// [`PowerContext`] is threaded through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, s)| s.id as usize == i),
            "state table out of order"
        );
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut PowerContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut PowerContext) {
        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        self.table[self.current].id
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut PowerContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::context::{PowerContext, PowerInputs};
    use super::*;
    use crate::app::ports::AdvertisingProfile;
    use crate::config::WatchConfig;

    fn make_ctx() -> PowerContext {
        PowerContext::new(WatchConfig::default())
    }

    fn make_fsm() -> Fsm {
        Fsm::new(states::build_state_table(), StateId::Active)
    }

    fn started() -> (Fsm, PowerContext) {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        (fsm, ctx)
    }

    fn idle_for(ctx: &mut PowerContext, idle_ms: u64, connected: bool) {
        ctx.inputs = PowerInputs {
            idle_ms,
            connected,
            ..PowerInputs::default()
        };
    }

    /// Start in `Active` and let idle time carry the machine to `target`.
    fn started_in(target: StateId) -> (Fsm, PowerContext) {
        let (mut fsm, mut ctx) = started();
        match target {
            StateId::Active => {}
            StateId::IdleThrottled => {
                idle_for(&mut ctx, 2_000, true);
                fsm.tick(&mut ctx);
            }
            StateId::SleepingConnected => {
                idle_for(&mut ctx, 30_000, true);
                fsm.tick(&mut ctx);
            }
            StateId::SleepingDisconnected => {
                idle_for(&mut ctx, 30_000, false);
                fsm.tick(&mut ctx);
            }
        }
        assert_eq!(fsm.current_state(), target);
        (fsm, ctx)
    }

    const ALL: [StateId; StateId::COUNT] = [
        StateId::Active,
        StateId::IdleThrottled,
        StateId::SleepingConnected,
        StateId::SleepingDisconnected,
    ];

    #[test]
    fn start_runs_active_enter() {
        let (fsm, ctx) = started();
        assert_eq!(fsm.current_state(), StateId::Active);
        assert_eq!(ctx.commands.cpu_mhz, 240);
        assert!(ctx.commands.display_on);
        assert_eq!(ctx.commands.brightness, 50);
        assert!(ctx.commands.storage_mounted);
        assert_eq!(ctx.commands.advertising, AdvertisingProfile::Fast);
        assert!(!ctx.commands.light_sleep);
    }

    #[test]
    fn state_table_is_indexed_by_id() {
        for (i, desc) in states::build_state_table().iter().enumerate() {
            assert_eq!(desc.id as usize, i, "{}", desc.name);
        }
    }

    #[test]
    fn active_stays_under_throttle_threshold() {
        let (mut fsm, mut ctx) = started();
        idle_for(&mut ctx, 1_999, true);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::Active);
    }

    #[test]
    fn active_throttles_after_two_seconds() {
        let (mut fsm, mut ctx) = started();
        idle_for(&mut ctx, 2_000, true);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::IdleThrottled);
        assert_eq!(ctx.commands.cpu_mhz, 160);
        assert!(ctx.commands.display_on);
    }

    #[test]
    fn idle_sleeps_connected_after_timeout() {
        let (mut fsm, mut ctx) = started_in(StateId::IdleThrottled);
        idle_for(&mut ctx, 30_000, true);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::SleepingConnected);
        assert_eq!(ctx.commands.cpu_mhz, 80);
        assert!(!ctx.commands.display_on);
        assert_eq!(ctx.commands.brightness, 0);
        assert!(!ctx.commands.storage_mounted);
        assert_eq!(ctx.commands.advertising, AdvertisingProfile::Slow);
        assert!(!ctx.commands.light_sleep);
    }

    #[test]
    fn idle_sleeps_disconnected_with_light_sleep() {
        let (mut fsm, mut ctx) = started_in(StateId::IdleThrottled);
        idle_for(&mut ctx, 30_000, false);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::SleepingDisconnected);
        assert_eq!(ctx.commands.cpu_mhz, 40);
        assert!(ctx.commands.light_sleep);
    }

    #[test]
    fn active_jumps_straight_to_sleep_on_long_gap() {
        let (mut fsm, mut ctx) = started();
        idle_for(&mut ctx, 45_000, true);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::SleepingConnected);
    }

    #[test]
    fn button_sleeps_awake_watch() {
        for start in [StateId::Active, StateId::IdleThrottled] {
            let (mut fsm, mut ctx) = started_in(start);
            idle_for(&mut ctx, 0, false);
            ctx.inputs.button = true;
            fsm.tick(&mut ctx);
            assert_eq!(fsm.current_state(), StateId::SleepingDisconnected, "from {:?}", start);
        }
    }

    #[test]
    fn button_wakes_sleeping_watch() {
        for start in [StateId::SleepingConnected, StateId::SleepingDisconnected] {
            let (mut fsm, mut ctx) = started_in(start);
            idle_for(&mut ctx, 60_000, start == StateId::SleepingConnected);
            ctx.inputs.button = true;
            fsm.tick(&mut ctx);
            assert_eq!(fsm.current_state(), StateId::Active, "from {:?}", start);
            assert!(ctx.commands.display_on);
            assert_eq!(ctx.commands.cpu_mhz, 240);
        }
    }

    #[test]
    fn activity_always_reaches_active() {
        for start in ALL {
            let (mut fsm, mut ctx) = started_in(start);
            idle_for(&mut ctx, 0, true);
            ctx.inputs.activity = true;
            fsm.tick(&mut ctx);
            assert_eq!(fsm.current_state(), StateId::Active, "from {:?}", start);
            assert_eq!(ctx.commands.cpu_mhz, 240);
        }
    }

    #[test]
    fn traffic_restores_full_speed_only_while_awake() {
        for start in ALL {
            let (mut fsm, mut ctx) = started_in(start);
            let connected = start != StateId::SleepingDisconnected;
            idle_for(&mut ctx, 0, connected);
            ctx.inputs.traffic = true;
            fsm.tick(&mut ctx);
            let expected = if start.is_sleeping() { start } else { StateId::Active };
            assert_eq!(fsm.current_state(), expected, "from {:?}", start);
        }
    }

    #[test]
    fn activity_beats_button_while_awake() {
        let (mut fsm, mut ctx) = started();
        idle_for(&mut ctx, 0, true);
        ctx.inputs.activity = true;
        ctx.inputs.button = true;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::Active);
    }

    #[test]
    fn link_change_switches_sleep_substate_without_waking() {
        let (mut fsm, mut ctx) = started_in(StateId::SleepingConnected);

        idle_for(&mut ctx, 40_000, false);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::SleepingDisconnected);
        assert!(!ctx.commands.display_on);
        assert!(ctx.commands.light_sleep);

        idle_for(&mut ctx, 41_000, true);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::SleepingConnected);
        assert!(!ctx.commands.display_on);
        assert!(!ctx.commands.light_sleep);
    }

    #[test]
    fn sleeping_ignores_idle_time() {
        let (mut fsm, mut ctx) = started_in(StateId::SleepingConnected);
        idle_for(&mut ctx, 0, true);
        for _ in 0..10 {
            fsm.tick(&mut ctx);
        }
        assert_eq!(fsm.current_state(), StateId::SleepingConnected);
    }

    #[test]
    fn wake_restores_user_brightness() {
        let (mut fsm, mut ctx) = started_in(StateId::SleepingDisconnected);
        ctx.user_brightness = 80;
        idle_for(&mut ctx, 0, false);
        ctx.inputs.activity = true;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::Active);
        assert_eq!(ctx.commands.brightness, 80);
        assert!(!ctx.commands.light_sleep);
    }
}
