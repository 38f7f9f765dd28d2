//! Watch service: the hexagonal core of the protocol engine.
//!
//! [`WatchService`] owns the link state, the line framer and the domain
//! store.  It exposes a hardware-agnostic API; all I/O flows through port
//! traits injected at call sites, making the whole engine testable with
//! mock adapters.
//!
//! ```text
//!  RxBuffer ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!               │       WatchService       │
//! RadioPort ◀───│ Link · Framer · Store    │ ──▶ ClockPort
//!               └──────────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::WatchConfig;
use crate::error::ProtocolError;
use crate::protocol::encoder::{self, CallAction, OutboundMessage};
use crate::protocol::framer::{Line, LineFramer, TimeSync};
use crate::protocol::link::{ConnectionState, Link};
use crate::protocol::message::{self, GbMessage};
use crate::protocol::rx_buffer::{RxBuffer, RX_BUF_SIZE};
use crate::protocol::sanitize::sanitize;

use super::commands::WatchCommand;
use super::events::AppEvent;
use super::ports::{ClockPort, EventSink, RadioPort};
use super::store::{CallInfo, DomainStore, MusicInfo, Notification, Weather};

/// What one protocol cycle means for the power state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboundActivity {
    /// At least one command was framed and dispatched.
    pub traffic: bool,
    /// A new notification or a ringing call: worth waking a dark watch.
    pub wake: bool,
}

/// A fully parsed inbound command awaiting dispatch.
enum Inbound {
    Message(GbMessage),
    Time(TimeSync),
}

// ───────────────────────────────────────────────────────────────
// WatchService
// ───────────────────────────────────────────────────────────────

/// Engine context: one instance per radio link, no globals.
pub struct WatchService<'a> {
    link: Link<'a>,
    framer: LineFramer,
    store: DomainStore,
    flush_delay_ms: u32,
    messages_handled: u64,
    messages_dropped: u64,
}

impl<'a> WatchService<'a> {
    /// Construct the service around the shared inbound buffer.
    pub fn new(rx: &'a RxBuffer, config: &WatchConfig) -> Self {
        Self {
            link: Link::new(rx, config.readvertise_delay_ms),
            framer: LineFramer::new(),
            store: DomainStore::new(),
            flush_delay_ms: config.flush_delay_ms,
            messages_handled: 0,
            messages_dropped: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started);
        info!("WatchService started");
    }

    /// A central connected.
    pub fn on_connected(&mut self, sink: &mut impl EventSink) {
        if self.link.is_connected() {
            return;
        }
        if self.link.on_connect() {
            self.framer.reset();
        }
        sink.emit(&AppEvent::Connected);
    }

    /// The central went away at `now_ms`.
    pub fn on_disconnected(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        if !self.link.is_connected() {
            return;
        }
        self.link.on_disconnect(now_ms);
        sink.emit(&AppEvent::Disconnected);
    }

    /// Append inbound bytes directly (host simulation and tests; on device
    /// the GATT callback writes the shared buffer).
    pub fn receive(&self, bytes: &[u8]) -> usize {
        self.link.receive(bytes)
    }

    // ── Per-loop orchestration ────────────────────────────────

    /// Run one protocol cycle: re-advertise if due, drain inbound bytes,
    /// frame, sanitize, decode and dispatch.
    ///
    /// Every dispatched command counts as traffic; new notifications and
    /// ringing calls also ask to wake the watch.
    pub fn update(
        &mut self,
        now_ms: u64,
        hw: &mut (impl RadioPort + ClockPort + DelayNs),
        sink: &mut impl EventSink,
    ) -> InboundActivity {
        self.link.poll(now_ms, hw);

        let mut buf = [0u8; RX_BUF_SIZE];
        let n = self.link.drain(&mut buf);
        if n == 0 {
            return InboundActivity::default();
        }

        let mut inbound = Vec::new();
        let mut dropped = 0u64;
        self.framer.feed(&buf[..n], |line| match line {
            Ok(Line::Gb(raw)) => match message::decode(&sanitize(raw)) {
                Ok(msg) => inbound.push(Inbound::Message(msg)),
                Err(ProtocolError::MissingType) => {
                    debug!("GB: message without type ignored");
                    dropped += 1;
                }
                Err(e) => {
                    warn!("GB: dropped message: {}", e);
                    dropped += 1;
                }
            },
            Ok(Line::SetTime(t)) => inbound.push(Inbound::Time(t)),
            Ok(Line::Other(text)) => {
                debug!("LINK: ignoring '{}'", String::from_utf8_lossy(text));
            }
            Err(e) => {
                warn!("LINK: dropped line: {}", e);
                dropped += 1;
            }
        });
        self.messages_dropped += dropped;

        let mut activity = InboundActivity::default();
        for item in inbound {
            self.messages_handled += 1;
            activity.traffic = true;
            activity.wake |= match item {
                Inbound::Message(msg) => self.dispatch(msg, hw, sink),
                Inbound::Time(t) => {
                    info!("GB: time sync {} (UTC{:+.1})", t.epoch, t.tz_hours);
                    self.set_clock(t.local_epoch(), hw, sink);
                    false
                }
            };
        }
        activity
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a local action.  Returns `true` if a frame reached the phone.
    pub fn handle_command(
        &mut self,
        cmd: WatchCommand,
        hw: &mut (impl RadioPort + DelayNs),
        sink: &mut impl EventSink,
    ) -> bool {
        match cmd {
            WatchCommand::MusicControl(n) => self.send(hw, &OutboundMessage::Music { n }),
            WatchCommand::DismissNotification(id) => {
                let sent = self.send(hw, &OutboundMessage::DismissAck { id });
                if self.store.notifications.clear_by_id(id) {
                    sink.emit(&AppEvent::NotificationDismissed { id, local: true });
                }
                sent
            }
            WatchCommand::AnswerCall => self.end_call(CallAction::Accept, hw, sink),
            WatchCommand::RejectCall => self.end_call(CallAction::Reject, hw, sink),
            WatchCommand::FindPhone(n) => self.send(hw, &OutboundMessage::FindPhone { n }),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Most recently received notification slot.
    pub fn latest_notification(&self) -> Option<Notification> {
        self.store.notifications.latest()
    }

    pub fn notification_count(&self) -> usize {
        self.store.notifications.count()
    }

    pub fn music(&self) -> MusicInfo {
        self.store.music.clone()
    }

    pub fn weather(&self) -> Weather {
        self.store.weather.clone()
    }

    pub fn call(&self) -> CallInfo {
        self.store.call.clone()
    }

    pub fn store(&self) -> &DomainStore {
        &self.store
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.link.state()
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Messages decoded and dispatched since startup.
    pub fn messages_handled(&self) -> u64 {
        self.messages_handled
    }

    /// Lines or payloads rejected since startup.
    pub fn messages_dropped(&self) -> u64 {
        self.messages_dropped
    }

    // ── Internal ──────────────────────────────────────────────

    /// Apply one decoded message to the store.  Returns whether it should
    /// wake the watch.
    fn dispatch(
        &mut self,
        msg: GbMessage,
        hw: &mut (impl RadioPort + ClockPort + DelayNs),
        sink: &mut impl EventSink,
    ) -> bool {
        debug!("GB: {}", msg.type_tag());
        match msg {
            GbMessage::Notify(n) => {
                info!("GB: notification {} from {}: {}", n.id, n.source, n.title);
                self.store.notifications.push(n.clone());
                sink.emit(&AppEvent::NotificationReceived(n));
                true
            }
            GbMessage::DismissNotification { id } => {
                if self.store.notifications.clear_by_id(id) {
                    info!("GB: notification {} dismissed by phone", id);
                    sink.emit(&AppEvent::NotificationDismissed { id, local: false });
                }
                false
            }
            GbMessage::MusicInfo(m) => {
                info!("GB: music {} - {}", m.artist, m.track);
                self.store.update_track(m);
                sink.emit(&AppEvent::MusicChanged(self.store.music.clone()));
                false
            }
            GbMessage::MusicState { playing } => {
                self.store.music.playing = playing;
                sink.emit(&AppEvent::MusicChanged(self.store.music.clone()));
                false
            }
            GbMessage::SetTime { ts } => {
                if ts > 0 {
                    self.set_clock(ts, hw, sink);
                }
                false
            }
            GbMessage::Weather(w) => {
                info!("GB: weather {}\u{00b0} {}", w.temp_celsius, w.description);
                self.store.weather = w;
                sink.emit(&AppEvent::WeatherChanged(self.store.weather.clone()));
                false
            }
            GbMessage::Call(c) => {
                info!("GB: call {} from {}", c.command, c.name);
                let ringing = c.active;
                self.store.call = c;
                sink.emit(&AppEvent::CallChanged(self.store.call.clone()));
                ringing
            }
            GbMessage::Find { on } => {
                info!("GB: find watch {}", if on { "ON" } else { "OFF" });
                sink.emit(&AppEvent::FindWatch(on));
                false
            }
            GbMessage::GpsQuery => {
                self.send(hw, &OutboundMessage::GpsPower { status: false });
                false
            }
            GbMessage::Unknown(t) => {
                info!("GB: unhandled type '{}'", t);
                false
            }
        }
    }

    fn set_clock(&self, local_epoch: i64, hw: &mut impl ClockPort, sink: &mut impl EventSink) {
        match hw.set_from_epoch(local_epoch) {
            Ok(()) => sink.emit(&AppEvent::TimeSynced { local_epoch }),
            Err(e) => warn!("GB: clock update failed: {}", e),
        }
    }

    fn end_call(
        &mut self,
        action: CallAction,
        hw: &mut (impl RadioPort + DelayNs),
        sink: &mut impl EventSink,
    ) -> bool {
        let sent = self.send(hw, &OutboundMessage::Call { n: action });
        if self.store.call.active {
            self.store.call.active = false;
            sink.emit(&AppEvent::CallChanged(self.store.call.clone()));
        }
        sent
    }

    fn send(&self, hw: &mut (impl RadioPort + DelayNs), msg: &OutboundMessage) -> bool {
        encoder::send(&self.link, hw, self.flush_delay_ms, msg)
    }
}
