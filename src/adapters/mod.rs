//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                     | Connects to                 |
//! |------------|--------------------------------|-----------------------------|
//! | `ble`      | RadioPort                      | Bluedroid GATT server (NUS) |
//! | `hardware` | CpuPort, DisplayPort,          | ESP32 PM, GPIO wake, panel  |
//! |            | StoragePort, SleepPort,        | and SD collaborators        |
//! |            | ClockPort, RadioPort, DelayNs  |                             |
//! | `log_sink` | EventSink                      | Serial log output           |
//! | `time`     | ClockPort                      | ESP32 system timer + RTC    |

pub mod ble;
pub mod hardware;
pub mod log_sink;
pub mod time;
