//! WizWatch firmware library.
//!
//! Exposes the protocol engine, the power state machine and their adapters
//! for integration testing and fuzzing.  All ESP-IDF-specific code is
//! guarded by `#[cfg(feature = "espidf")]` within each module, so the
//! library builds and tests on the host.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod pins;
pub mod power;
pub mod protocol;

pub mod adapters;
pub mod drivers;
