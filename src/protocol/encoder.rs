//! Outbound encoder: watch → phone frames.
//!
//! Each action is a JSON object tagged by `t`.  On the wire a frame is an
//! empty flush line, a short pause, then the payload terminated by `\n`.
//! Delivery is at-most-once: no queue, no retry, dropped while
//! disconnected.

use embedded_hal::delay::DelayNs;
use log::{debug, warn};
use serde::Serialize;

use super::link::Link;
use crate::app::ports::RadioPort;
use crate::error::ProtocolError;

/// Sent ahead of every payload to terminate any partial line on the phone.
pub const FLUSH_FRAME: &[u8] = b"\n";

/// Media transport actions understood by Gadgetbridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicCommand {
    Play,
    Pause,
    Next,
    Previous,
    VolumeUp,
    VolumeDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallAction {
    Accept,
    Reject,
}

/// Every frame the watch sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "t")]
pub enum OutboundMessage {
    /// Tell the phone a notification was dismissed on the watch.
    #[serde(rename = "notify-")]
    DismissAck { id: u32 },
    #[serde(rename = "music")]
    Music { n: MusicCommand },
    #[serde(rename = "call")]
    Call { n: CallAction },
    /// Ring the phone (`true`) or stop ringing.
    #[serde(rename = "findPhone")]
    FindPhone { n: bool },
    /// Reply to `is_gps_active`.
    #[serde(rename = "gps_power")]
    GpsPower { status: bool },
}

/// Serialize to a newline-terminated payload.
pub fn encode(msg: &OutboundMessage) -> Result<Vec<u8>, ProtocolError> {
    let mut payload = serde_json::to_vec(msg).map_err(|_| ProtocolError::EncodeFailed)?;
    payload.push(b'\n');
    Ok(payload)
}

/// Encode and transmit.  Returns `true` if the payload went out.
///
/// `hw` satisfies **both** [`RadioPort`] and [`DelayNs`]; the flush pause
/// sits between two radio writes, so one `&mut` serves both.
pub fn send(
    link: &Link<'_>,
    hw: &mut (impl RadioPort + DelayNs),
    flush_delay_ms: u32,
    msg: &OutboundMessage,
) -> bool {
    if !link.is_connected() {
        debug!("GB: not connected, dropping {:?}", msg);
        return false;
    }
    let payload = match encode(msg) {
        Ok(p) => p,
        Err(e) => {
            warn!("GB: {} for {:?}", e, msg);
            return false;
        }
    };
    if !link.write(hw, FLUSH_FRAME) {
        return false;
    }
    hw.delay_ms(flush_delay_ms);
    link.write(hw, &payload)
}
