//! WizWatch Firmware: Main Entry Point
//!
//! Hexagonal architecture with a cooperative single-task main loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  NusAdapter        WatchHardware         LogEventSink          │
//! │  (RadioPort)       (Cpu/Display/Storage/ (EventSink)           │
//! │                     Sleep/Clock)                               │
//! │  Axp2101 (power key)      Touch ISR (TOUCH_FLAG)               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │      WatchService (protocol engine, pure logic)        │    │
//! │  │      Link · Framer · Sanitize · Decode · Store         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  PowerManager (FSM: Active/Idle/Sleeping × link)               │
//! └────────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

use anyhow::Result;
use embedded_hal::delay::DelayNs;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use wizwatch::adapters::ble::{NusAdapter, NUS_RX};
use wizwatch::adapters::hardware::WatchHardware;
use wizwatch::adapters::log_sink::LogEventSink;
use wizwatch::adapters::time::Esp32TimeAdapter;
use wizwatch::app::service::WatchService;
use wizwatch::config::WatchConfig;
use wizwatch::drivers::{hw_init, pmu::Axp2101};
use wizwatch::events::{self, LinkEvent, POWER_KEY_FLAG, TOUCH_FLAG};
use wizwatch::pins;
use wizwatch::power::{PowerManager, PowerSignals};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  WizWatch v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = WatchConfig::default();

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        warn!("Touch interrupt unavailable: {}", e);
    }

    let peripherals = Peripherals::take()?;
    // GPIO numbers must match pins::I2C_SDA_GPIO / I2C_SCL_GPIO.
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio15,
        peripherals.pins.gpio14,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )?;

    let mut pmu = Axp2101::new(i2c);
    let mut power_key = match pmu.init() {
        Ok(()) => true,
        Err(e) => {
            warn!("PMU init failed ({}), power button disabled", e);
            false
        }
    };

    // ── 3. Radio ──────────────────────────────────────────────
    let mut radio = NusAdapter::new(&config);
    if let Err(e) = radio.start() {
        error!("BLE start failed: {}, running without phone link", e);
    }

    // ── 4. Core ───────────────────────────────────────────────
    let mut hw = WatchHardware::new(radio, Esp32TimeAdapter::new());
    let mut sink = LogEventSink::new();

    let mut service = WatchService::new(&NUS_RX, &config);
    service.start(&mut sink);

    let mut power = PowerManager::new(config.clone());
    power.start(hw.clock().uptime_ms(), &mut hw);

    info!("System ready. Entering main loop.");

    // ── 5. Main loop ──────────────────────────────────────────
    loop {
        let now_ms = hw.clock().uptime_ms();

        events::drain_link_events(|event| match event {
            LinkEvent::Connected => {
                hw.radio_mut().on_link_change(true);
                service.on_connected(&mut sink);
            }
            LinkEvent::Disconnected => {
                hw.radio_mut().on_link_change(false);
                service.on_disconnected(now_ms, &mut sink);
            }
        });

        let inbound = service.update(now_ms, &mut hw, &mut sink);

        if power_key {
            match pmu.poll_short_press() {
                Ok(true) => POWER_KEY_FLAG.set(),
                Ok(false) => {}
                Err(e) => {
                    warn!("PMU poll failed ({}), power button disabled", e);
                    power_key = false;
                }
            }
        }

        let touched = TOUCH_FLAG.take();
        let signals = PowerSignals {
            activity: inbound.wake || touched,
            traffic: inbound.traffic,
            button: POWER_KEY_FLAG.take(),
            connected: service.is_connected(),
        };
        power.tick(now_ms, signals, &mut hw, &mut sink);

        if !power.sleep_if_eligible(&mut hw) {
            hw.delay_ms(power.idle_delay_ms());
        }
    }
}
