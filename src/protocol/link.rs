//! Transport state for the NUS link.
//!
//! [`Link`] owns the connection state machine and gates everything that
//! touches the radio:
//!
//! - inbound bytes are appended to the shared [`RxBuffer`] by the GATT
//!   write callback and drained here once per loop;
//! - outbound frames are dropped while disconnected and split into
//!   `mtu - 3` byte notifications otherwise;
//! - advertising is restarted a fixed delay after a disconnect, checked
//!   against timestamps each loop instead of blocking.

use log::{debug, info, warn};

use super::rx_buffer::{RxBuffer, RX_BUF_SIZE};
use crate::app::ports::RadioPort;

/// ATT notification header overhead.
const ATT_OVERHEAD: usize = 3;
/// Smallest usable chunk (default 23-byte MTU).
const MIN_CHUNK: usize = 20;

/// Connection lifecycle as seen by the transport.  Single central.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    /// A central has connected at least once since boot.
    pub previously_connected: bool,
    /// Set on disconnect, cleared once advertising restarts.
    pub disconnect_timestamp: Option<u64>,
}

pub struct Link<'a> {
    rx: &'a RxBuffer,
    state: ConnectionState,
    readvertise_delay_ms: u32,
}

impl<'a> Link<'a> {
    pub fn new(rx: &'a RxBuffer, readvertise_delay_ms: u32) -> Self {
        Self {
            rx,
            state: ConnectionState::default(),
            readvertise_delay_ms,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    /// Central connected.  Returns `true` when a prior session's leftovers
    /// were discarded, so the caller can reset its own partial line.
    pub fn on_connect(&mut self) -> bool {
        if self.state.connected {
            return false;
        }
        let reconnect = self.state.previously_connected;
        if reconnect {
            let stale = self.rx.len();
            self.rx.clear();
            debug!("LINK: reconnect, dropped {} stale bytes", stale);
        }
        self.state.connected = true;
        self.state.previously_connected = true;
        self.state.disconnect_timestamp = None;
        info!("LINK: connected");
        reconnect
    }

    /// Central went away at `now_ms`.
    pub fn on_disconnect(&mut self, now_ms: u64) {
        if !self.state.connected {
            return;
        }
        self.state.connected = false;
        self.state.disconnect_timestamp = Some(now_ms);
        info!("LINK: disconnected");
    }

    /// Append inbound bytes (the callback path does the same on the shared
    /// buffer).  Returns the number of bytes accepted.
    pub fn receive(&self, bytes: &[u8]) -> usize {
        let n = self.rx.append(bytes);
        if n < bytes.len() {
            warn!("LINK: rx buffer full, dropped {} bytes", bytes.len() - n);
        }
        n
    }

    /// Move everything buffered since the last call into `out`.
    pub fn drain(&self, out: &mut [u8; RX_BUF_SIZE]) -> usize {
        self.rx.take(out)
    }

    /// Restart advertising once the post-disconnect delay has elapsed.
    /// Returns `true` when advertising was restarted this call.
    pub fn poll(&mut self, now_ms: u64, radio: &mut impl RadioPort) -> bool {
        let Some(since) = self.state.disconnect_timestamp else {
            return false;
        };
        if self.state.connected || now_ms.saturating_sub(since) < u64::from(self.readvertise_delay_ms) {
            return false;
        }
        self.state.disconnect_timestamp = None;
        match radio.restart_advertising() {
            Ok(()) => {
                info!("LINK: advertising restarted");
                true
            }
            Err(e) => {
                warn!("LINK: advertising restart failed: {}", e);
                false
            }
        }
    }

    /// Write one logical frame, split to the negotiated MTU.  Silently
    /// dropped while disconnected.  Returns `true` if every chunk went out.
    pub fn write(&self, radio: &mut impl RadioPort, frame: &[u8]) -> bool {
        if !self.state.connected {
            debug!("LINK: not connected, dropping {} byte frame", frame.len());
            return false;
        }
        let chunk = (usize::from(radio.mtu()).saturating_sub(ATT_OVERHEAD)).max(MIN_CHUNK);
        for part in frame.chunks(chunk) {
            if let Err(e) = radio.notify(part) {
                warn!("LINK: notify failed: {}", e);
                return false;
            }
        }
        true
    }
}
