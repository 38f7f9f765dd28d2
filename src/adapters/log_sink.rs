//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  The UI collaborator
//! implements the same trait to refresh screens.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | protocol engine up"),
            AppEvent::Connected => info!("LINK | phone connected"),
            AppEvent::Disconnected => info!("LINK | phone disconnected"),
            AppEvent::NotificationReceived(n) => {
                info!(
                    "NOTIFY | id={} src={} sender='{}' title='{}'",
                    n.id, n.source, n.sender, n.title
                );
            }
            AppEvent::NotificationDismissed { id, local } => {
                info!(
                    "NOTIFY | id={} dismissed ({})",
                    id,
                    if *local { "watch" } else { "phone" }
                );
            }
            AppEvent::MusicChanged(m) => {
                info!(
                    "MUSIC | {} - {} [{}] {}/{}s",
                    m.artist,
                    m.track,
                    if m.playing { "play" } else { "pause" },
                    m.position,
                    m.duration
                );
            }
            AppEvent::WeatherChanged(w) => {
                info!(
                    "WEATHER | {}\u{00b0}C hum={}% code={} '{}'",
                    w.temp_celsius, w.humidity, w.code, w.description
                );
            }
            AppEvent::CallChanged(c) => {
                info!(
                    "CALL | {} name='{}' number='{}' active={}",
                    c.command, c.name, c.number, c.active
                );
            }
            AppEvent::FindWatch(on) => info!("FIND | {}", if *on { "ON" } else { "OFF" }),
            AppEvent::TimeSynced { local_epoch } => info!("CLOCK | synced to {}", local_epoch),
            AppEvent::PowerStateChanged { from, to } => {
                info!("POWER | {:?} -> {:?}", from, to);
            }
        }
    }
}
