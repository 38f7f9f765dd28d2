//! Unified error types for the WizWatch firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! main loop's error handling uniform.  All variants are `Copy` so they can
//! be logged and passed around without allocation.  Nothing in the protocol
//! engine or power machine is fatal: callers log and drop.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Inbound protocol text could not be framed, sanitized or decoded.
    Protocol(ProtocolError),
    /// The radio stack rejected an operation.
    Radio(RadioError),
    /// A hardware collaborator (storage, display, clock) failed.
    Hardware(HwError),
    /// The PMU could not be reached over I2C.
    Pmu(PmuError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Pmu(e) => write!(f, "pmu: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Line exceeded the framer's line buffer and was discarded.
    LineTooLong,
    /// A numeric field in a `setTime(...)` command did not parse.
    MalformedNumber,
    /// Structure nested deeper than the decoder allows.
    DepthExceeded,
    /// Payload was not valid JSON.
    InvalidJson,
    /// Payload parsed but is not a keyed object.
    InvalidStructure,
    /// Object carries no `t` discriminator.
    MissingType,
    /// Outbound payload could not be serialized.
    EncodeFailed,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LineTooLong => write!(f, "line exceeds buffer"),
            Self::MalformedNumber => write!(f, "malformed numeric field"),
            Self::DepthExceeded => write!(f, "nesting depth exceeded"),
            Self::InvalidJson => write!(f, "invalid JSON"),
            Self::InvalidStructure => write!(f, "payload is not an object"),
            Self::MissingType => write!(f, "missing 't' field"),
            Self::EncodeFailed => write!(f, "encode failed"),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Radio errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Controller / host stack failed to come up.
    StackInitFailed(i32),
    /// GAP advertising could not be (re)started.
    AdvertisingFailed(i32),
    /// GATT notify was rejected.
    NotifyFailed(i32),
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackInitFailed(rc) => write!(f, "BLE stack init failed (rc={rc})"),
            Self::AdvertisingFailed(rc) => write!(f, "advertising failed (rc={rc})"),
            Self::NotifyFailed(rc) => write!(f, "notify failed (rc={rc})"),
        }
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware collaborator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwError {
    /// Storage card could not be mounted.
    MountFailed,
    /// Wall clock rejected the new time.
    ClockSetFailed(i32),
    /// CPU frequency change was refused by the power-management driver.
    CpuFreqFailed(i32),
    /// A GPIO could not be configured.
    GpioConfigFailed(i32),
}

impl fmt::Display for HwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MountFailed => write!(f, "storage mount failed"),
            Self::ClockSetFailed(rc) => write!(f, "clock set failed (rc={rc})"),
            Self::CpuFreqFailed(rc) => write!(f, "CPU frequency change failed (rc={rc})"),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={rc})"),
        }
    }
}

impl From<HwError> for Error {
    fn from(e: HwError) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// PMU errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmuError {
    /// The I2C transaction failed (NACK, bus error, arbitration).
    Bus,
    /// Chip ID register did not identify an AXP2101.
    WrongChip(u8),
}

impl fmt::Display for PmuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "I2C bus error"),
            Self::WrongChip(id) => write!(f, "unexpected chip id 0x{id:02X}"),
        }
    }
}

impl From<PmuError> for Error {
    fn from(e: PmuError) -> Self {
        Self::Pmu(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
