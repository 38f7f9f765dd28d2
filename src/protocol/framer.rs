//! Line framer: raw inbound bytes → classified command lines.
//!
//! Gadgetbridge writes newline-terminated JavaScript statements, split
//! across arbitrary GATT writes.  The framer accumulates bytes into a
//! bounded line buffer and classifies each completed line:
//!
//! | Line shape                          | Result               |
//! |-------------------------------------|----------------------|
//! | `GB(<json>)`                        | [`Line::Gb`]         |
//! | `setTime(<epoch>);E.setTimeZone(h)` | [`Line::SetTime`]    |
//! | anything else                       | [`Line::Other`]      |
//!
//! Surrounding whitespace and leading control bytes (Espruino's `\x10`
//! echo-off prefix) are stripped first; empty lines are skipped.

use log::warn;

use super::find_bytes;
use crate::error::ProtocolError;

/// Longest line the framer will hold.  Longer lines are discarded whole.
pub const MAX_LINE: usize = 2048;

const GB_PREFIX: &[u8] = b"GB(";
const SET_TIME_PREFIX: &[u8] = b"setTime(";
const SET_TZ_MARKER: &[u8] = b"setTimeZone(";

/// Largest accepted `E.setTimeZone` offset, in hours either side of UTC.
pub const MAX_TZ_HOURS: f32 = 24.0;

/// Time sync carried by a `setTime(...)` line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSync {
    /// UTC seconds since the Unix epoch.
    pub epoch: i64,
    /// Offset from `E.setTimeZone(...)`, 0 when absent.
    pub tz_hours: f32,
}

impl TimeSync {
    /// Local wall-clock seconds: `epoch + tz_hours * 3600`.
    pub fn local_epoch(&self) -> i64 {
        self.epoch.saturating_add(offset_secs(self.tz_hours))
    }
}

fn offset_secs(tz_hours: f32) -> i64 {
    (f64::from(tz_hours) * 3600.0).round() as i64
}

/// A classified, trimmed command line.
#[derive(Debug, PartialEq)]
pub enum Line<'a> {
    /// Inner text of `GB(...)`, not yet sanitized.
    Gb(&'a [u8]),
    SetTime(TimeSync),
    Other(&'a [u8]),
}

pub struct LineFramer {
    line: heapless::Vec<u8, MAX_LINE>,
    /// Set after an overflow; bytes are dropped until the next newline.
    discarding: bool,
}

impl LineFramer {
    pub const fn new() -> Self {
        Self {
            line: heapless::Vec::new(),
            discarding: false,
        }
    }

    /// Drop any partial line.
    pub fn reset(&mut self) {
        self.line.clear();
        self.discarding = false;
    }

    /// Bytes of the line currently being accumulated.
    pub fn pending(&self) -> usize {
        self.line.len()
    }

    /// Feed a chunk of bytes, invoking `on_line` for every completed line.
    ///
    /// Lines whose `setTime` numbers do not parse, and lines that overflowed
    /// the buffer, are reported as `Err`.
    pub fn feed(&mut self, bytes: &[u8], mut on_line: impl FnMut(Result<Line<'_>, ProtocolError>)) {
        for &b in bytes {
            if b == b'\n' {
                if self.discarding {
                    self.discarding = false;
                    on_line(Err(ProtocolError::LineTooLong));
                } else if let Some(line) = classify(&self.line) {
                    on_line(line);
                }
                self.line.clear();
                continue;
            }

            if self.discarding {
                continue;
            }
            if self.line.push(b).is_err() {
                warn!("LINK: line exceeds {} bytes, discarding", MAX_LINE);
                self.line.clear();
                self.discarding = true;
            }
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Trim and classify one raw line.  `None` for lines that are empty after
/// trimming.
pub fn classify(raw: &[u8]) -> Option<Result<Line<'_>, ProtocolError>> {
    let mut line = raw.trim_ascii();
    while let Some((&first, rest)) = line.split_first() {
        if first >= 0x20 {
            break;
        }
        line = rest;
    }
    if line.is_empty() {
        return None;
    }

    if let Some(inner) = line
        .strip_prefix(GB_PREFIX)
        .and_then(|rest| rest.strip_suffix(b")"))
    {
        return Some(Ok(Line::Gb(inner)));
    }
    if line.starts_with(SET_TIME_PREFIX) {
        return Some(parse_set_time(line).map(Line::SetTime));
    }
    Some(Ok(Line::Other(line)))
}

/// Parse `setTime(<epoch>);...E.setTimeZone(<hours>);...`.
fn parse_set_time(line: &[u8]) -> Result<TimeSync, ProtocolError> {
    let args = &line[SET_TIME_PREFIX.len()..];
    let close = args
        .iter()
        .position(|&b| b == b')')
        .ok_or(ProtocolError::MalformedNumber)?;
    let epoch: i64 = parse_num(&args[..close])?;

    let tz_hours = match find_bytes(line, SET_TZ_MARKER) {
        Some(pos) => {
            let tz_args = &line[pos + SET_TZ_MARKER.len()..];
            let close = tz_args
                .iter()
                .position(|&b| b == b')')
                .ok_or(ProtocolError::MalformedNumber)?;
            let tz: f32 = parse_num(&tz_args[..close])?;
            if !tz.is_finite() || tz.abs() > MAX_TZ_HOURS {
                return Err(ProtocolError::MalformedNumber);
            }
            tz
        }
        None => 0.0,
    };
    if epoch.checked_add(offset_secs(tz_hours)).is_none() {
        return Err(ProtocolError::MalformedNumber);
    }

    Ok(TimeSync { epoch, tz_hours })
}

fn parse_num<T: core::str::FromStr>(raw: &[u8]) -> Result<T, ProtocolError> {
    core::str::from_utf8(raw.trim_ascii())
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(ProtocolError::MalformedNumber)
}
