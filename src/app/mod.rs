//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the watch-side rules of the Gadgetbridge link:
//! message dispatch, the domain store, and local user actions.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod store;
