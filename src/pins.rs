//! GPIO / peripheral pin assignments for the WizWatch main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Shared I2C bus (AXP2101 PMU, touch controller, RTC)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 15;
pub const I2C_SCL_GPIO: i32 = 14;
/// 400 kHz fast mode; every device on the bus supports it.
pub const I2C_FREQ_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// Touch controller
// ---------------------------------------------------------------------------

/// Touch interrupt output, active LOW.  Also the light-sleep GPIO wake source.
pub const TOUCH_INT_GPIO: i32 = 21;
