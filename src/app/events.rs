//! Outbound application events.
//!
//! The [`WatchService`](super::service::WatchService) and the
//! [`PowerManager`](crate::power::PowerManager) emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, refresh the UI,
//! buzz the vibration motor.

use super::store::{CallInfo, MusicInfo, Notification, Weather};
use crate::fsm::StateId;

/// Structured events emitted by the watch core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The engine has started.
    Started,

    /// A phone connected / disconnected.
    Connected,
    Disconnected,

    /// A notification was stored in the ring.
    NotificationReceived(Notification),

    /// A notification was cleared; `local` when dismissed on the watch.
    NotificationDismissed { id: u32, local: bool },

    MusicChanged(MusicInfo),
    WeatherChanged(Weather),
    CallChanged(CallInfo),

    /// The phone asked the watch to make itself noticeable.
    FindWatch(bool),

    /// Wall clock set from a phone time sync.
    TimeSynced { local_epoch: i64 },

    /// The power FSM transitioned between states.
    PowerStateChanged { from: StateId, to: StateId },
}
