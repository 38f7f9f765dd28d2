//! One-shot peripheral initialization.
//!
//! Configures the touch controller's interrupt line and installs the GPIO
//! ISR service.  The ISR only latches [`events::TOUCH_FLAG`]; touch
//! coordinates are read by the UI side.  Called once from `main()` before
//! the event loop starts.

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(feature = "espidf")]
use log::info;

#[cfg(feature = "espidf")]
use crate::{events, pins};

use crate::error::{Error, HwError};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::GpioConfigFailed(rc) => Error::Hardware(HwError::GpioConfigFailed(rc)),
            HwInitError::IsrInstallFailed(_) => Error::Init("GPIO ISR service"),
        }
    }
}

// ── Touch interrupt ───────────────────────────────────────────

#[cfg(feature = "espidf")]
unsafe extern "C" fn touch_gpio_isr(_arg: *mut core::ffi::c_void) {
    events::TOUCH_FLAG.set();
}

/// Configure the touch INT pin (active-low, pulled up) and hook its
/// falling edge.
#[cfg(feature = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::TOUCH_INT_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
    };
    // SAFETY: called once from main() before the event loop; single-threaded.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    // SAFETY: ESP_ERR_INVALID_STATE means the service is already installed.
    // The handler only stores into an atomic.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        let ret = gpio_isr_handler_add(
            pins::TOUCH_INT_GPIO,
            Some(touch_gpio_isr),
            core::ptr::null_mut(),
        );
        if ret != ESP_OK as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        gpio_intr_enable(pins::TOUCH_INT_GPIO);
    }

    info!("hw_init: touch INT on GPIO{} armed", pins::TOUCH_INT_GPIO);
    Ok(())
}

#[cfg(not(feature = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): touch interrupt skipped");
    Ok(())
}
