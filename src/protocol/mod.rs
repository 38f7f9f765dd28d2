//! Bangle.js / Gadgetbridge protocol engine.
//!
//! ```text
//!  GATT write ──▶ RxBuffer ──▶ LineFramer ──▶ sanitize ──▶ decode ──▶ GbMessage
//!                                   │
//!                                   └──▶ setTime(...) ──▶ TimeSync
//!
//!  OutboundMessage ──▶ encode ──▶ Link (MTU chunks) ──▶ GATT notify
//! ```
//!
//! Everything here is pure or operates on an injected
//! [`RadioPort`](crate::app::ports::RadioPort), so it runs on the host.

pub mod encoder;
pub mod framer;
pub mod link;
pub mod message;
pub mod rx_buffer;
pub mod sanitize;

/// Position of the first occurrence of `needle` in `hay`.
pub(crate) fn find_bytes(hay: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || hay.len() < needle.len() {
        return None;
    }
    hay.windows(needle.len()).position(|w| w == needle)
}
