//! AXP2101 PMU driver, power-key side only.
//!
//! The board's power button is wired to the PMU, not to a GPIO.  A short
//! press latches an IRQ status bit that the main loop polls over I2C:
//!
//! 1. `init()` masks every IRQ source, clears any stale status and then
//!    unmasks only the short-press source.
//! 2. `poll_short_press()` reads the three status registers; if anything
//!    is latched it clears all of them (write-1-to-clear) and reports
//!    whether the short-press bit was among them.
//!
//! Charger, rails and fuel gauge are left at their OTP defaults.

use embedded_hal::i2c::I2c;
use log::{debug, info};

use crate::error::PmuError;

/// 7-bit I2C address.
pub const AXP2101_ADDR: u8 = 0x34;

const REG_CHIP_ID: u8 = 0x03;
const CHIP_ID_AXP2101: u8 = 0x4A;

/// IRQ enable 0..2.
const REG_IRQ_EN: u8 = 0x40;
/// IRQ status 0..2, write 1 to clear.
const REG_IRQ_STATUS: u8 = 0x48;
const IRQ_REG_COUNT: usize = 3;

/// PKEY short press lives in the second byte of both banks.
const PKEY_SHORT_BYTE: usize = 1;
const PKEY_SHORT_BIT: u8 = 1 << 3;

pub struct Axp2101<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Axp2101<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Verify the chip and arm the power-key short-press IRQ.
    pub fn init(&mut self) -> Result<(), PmuError> {
        let id = self.read_reg(REG_CHIP_ID)?;
        if id != CHIP_ID_AXP2101 {
            return Err(PmuError::WrongChip(id));
        }

        self.write_block(REG_IRQ_EN, [0x00; IRQ_REG_COUNT])?;
        self.clear_status()?;

        let mut enable = [0u8; IRQ_REG_COUNT];
        enable[PKEY_SHORT_BYTE] = PKEY_SHORT_BIT;
        self.write_block(REG_IRQ_EN, enable)?;

        info!("PMU: AXP2101 ready, power-key short press armed");
        Ok(())
    }

    /// `true` when a short press was latched since the last poll.
    pub fn poll_short_press(&mut self) -> Result<bool, PmuError> {
        let status = self.read_status()?;
        if status.iter().all(|&b| b == 0) {
            return Ok(false);
        }

        self.clear_status()?;
        let pressed = status[PKEY_SHORT_BYTE] & PKEY_SHORT_BIT != 0;
        if pressed {
            debug!("PMU: power key short press");
        }
        Ok(pressed)
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, PmuError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(AXP2101_ADDR, &[reg], &mut buf)
            .map_err(|_| PmuError::Bus)?;
        Ok(buf[0])
    }

    fn read_status(&mut self) -> Result<[u8; IRQ_REG_COUNT], PmuError> {
        let mut buf = [0u8; IRQ_REG_COUNT];
        self.i2c
            .write_read(AXP2101_ADDR, &[REG_IRQ_STATUS], &mut buf)
            .map_err(|_| PmuError::Bus)?;
        Ok(buf)
    }

    fn clear_status(&mut self) -> Result<(), PmuError> {
        self.write_block(REG_IRQ_STATUS, [0xFF; IRQ_REG_COUNT])
    }

    fn write_block(&mut self, reg: u8, data: [u8; IRQ_REG_COUNT]) -> Result<(), PmuError> {
        let frame = [reg, data[0], data[1], data[2]];
        self.i2c
            .write(AXP2101_ADDR, &frame)
            .map_err(|_| PmuError::Bus)
    }
}
