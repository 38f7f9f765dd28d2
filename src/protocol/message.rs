//! Message decoder: sanitized `GB(...)` payload → [`GbMessage`].
//!
//! The payload must be a JSON object carrying a `t` discriminator.  Every
//! field has a default, so a message with missing or mistyped fields still
//! decodes; only structural problems reject it.  Decoding is side-effect
//! free: a rejected payload never reaches the state store.

use serde_json::{Map, Value};

use crate::app::store::{CallInfo, MusicInfo, Notification, Weather};
use crate::error::ProtocolError;

/// Deepest `{`/`[` nesting accepted.
pub const MAX_DEPTH: usize = 10;

/// Every inbound message type the watch understands.
#[derive(Debug, Clone, PartialEq)]
pub enum GbMessage {
    /// `notify`: a new phone notification.
    Notify(Notification),
    /// `notify-`: the phone dismissed a notification.
    DismissNotification { id: u32 },
    /// `musicinfo`: track metadata and playback position.
    MusicInfo(MusicInfo),
    /// `musicstate`: play/pause.
    MusicState { playing: bool },
    /// `setTime`: legacy JSON time sync.
    SetTime { ts: i64 },
    Weather(Weather),
    Call(CallInfo),
    /// `find`: phone asks the watch to make itself noticeable.
    Find { on: bool },
    /// `is_gps_active`: phone asks whether the watch GPS is running.
    GpsQuery,
    /// Anything else; carries the type tag for logging.
    Unknown(String),
}

impl GbMessage {
    /// Wire type tag, for logging.
    pub fn type_tag(&self) -> &str {
        match self {
            Self::Notify(_) => "notify",
            Self::DismissNotification { .. } => "notify-",
            Self::MusicInfo(_) => "musicinfo",
            Self::MusicState { .. } => "musicstate",
            Self::SetTime { .. } => "setTime",
            Self::Weather(_) => "weather",
            Self::Call(_) => "call",
            Self::Find { .. } => "find",
            Self::GpsQuery => "is_gps_active",
            Self::Unknown(t) => t,
        }
    }
}

/// Decode one sanitized payload.
pub fn decode(payload: &[u8]) -> Result<GbMessage, ProtocolError> {
    if nesting_depth(payload) > MAX_DEPTH {
        return Err(ProtocolError::DepthExceeded);
    }
    let value: Value = serde_json::from_slice(payload).map_err(|_| ProtocolError::InvalidJson)?;
    let Value::Object(obj) = value else {
        return Err(ProtocolError::InvalidStructure);
    };
    let t = obj
        .get("t")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?;

    let msg = match t {
        "notify" => GbMessage::Notify(Notification {
            id: u32_or(&obj, "id", 0),
            source: str_or(&obj, "src", "Unknown"),
            sender: str_or(&obj, "sender", ""),
            title: str_or(&obj, "title", ""),
            body: str_or(&obj, "body", ""),
        }),
        "notify-" => GbMessage::DismissNotification {
            id: u32_or(&obj, "id", 0),
        },
        "musicinfo" => GbMessage::MusicInfo(MusicInfo {
            artist: str_or(&obj, "artist", ""),
            album: str_or(&obj, "album", ""),
            track: str_or(&obj, "track", ""),
            duration: u32_or(&obj, "dur", 0),
            position: u32_or(&obj, "c", 0),
            playing: false,
        }),
        "musicstate" => GbMessage::MusicState {
            playing: str_or(&obj, "state", "pause") == "play",
        },
        "setTime" => GbMessage::SetTime {
            ts: i64_or(&obj, "ts", 0),
        },
        "weather" => GbMessage::Weather(Weather {
            temp_celsius: i32_or(&obj, "temp", 0),
            humidity: i32_or(&obj, "hum", 0),
            description: str_or(&obj, "txt", ""),
            code: i32_or(&obj, "code", 0),
            valid: true,
        }),
        "call" => GbMessage::Call(CallInfo::new(
            str_or(&obj, "cmd", ""),
            str_or(&obj, "name", ""),
            str_or(&obj, "number", ""),
        )),
        "find" => GbMessage::Find {
            on: obj.get("n").and_then(Value::as_bool).unwrap_or(false),
        },
        "is_gps_active" => GbMessage::GpsQuery,
        other => GbMessage::Unknown(other.to_owned()),
    };
    Ok(msg)
}

/// Maximum `{`/`[` nesting, ignoring brackets inside string literals.
fn nesting_depth(payload: &[u8]) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    let mut in_str = false;
    let mut escaped = false;
    for &b in payload {
        if in_str {
            match (escaped, b) {
                (true, _) => escaped = false,
                (false, b'\\') => escaped = true,
                (false, b'"') => in_str = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_str = true,
            b'{' | b'[' => {
                depth += 1;
                max = max.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

// ── Field accessors with defaults ─────────────────────────────

fn str_or(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_owned()
}

fn i64_or(obj: &Map<String, Value>, key: &str, default: i64) -> i64 {
    match obj.get(key) {
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(default),
        None => default,
    }
}

/// Floats truncate toward zero; values outside `i32` fall back to `default`.
fn i32_or(obj: &Map<String, Value>, key: &str, default: i32) -> i32 {
    i32::try_from(i64_or(obj, key, i64::from(default))).unwrap_or(default)
}

fn u32_or(obj: &Map<String, Value>, key: &str, default: u32) -> u32 {
    match obj.get(key) {
        Some(v) => v
            .as_u64()
            .or_else(|| v.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(default),
        None => default,
    }
}
