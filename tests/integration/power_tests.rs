//! Integration tests for the power manager driving hardware through the
//! port traits, and for the protocol engine waking it.

use crate::mock_hw::{HwCall, MockHw, RecordingSink};

use wizwatch::adapters::ble::NusAdapter;
use wizwatch::adapters::hardware::WatchHardware;
use wizwatch::adapters::time::Esp32TimeAdapter;
use wizwatch::app::events::AppEvent;
use wizwatch::app::ports::AdvertisingProfile;
use wizwatch::app::service::WatchService;
use wizwatch::config::WatchConfig;
use wizwatch::fsm::StateId;
use wizwatch::power::{PowerManager, PowerSignals};
use wizwatch::protocol::rx_buffer::RxBuffer;

const QUIET: PowerSignals = PowerSignals {
    activity: false,
    traffic: false,
    button: false,
    connected: true,
};

fn started() -> (PowerManager, MockHw, RecordingSink) {
    let mut power = PowerManager::new(WatchConfig::default());
    let mut hw = MockHw::new();
    power.start(0, &mut hw);
    (power, hw, RecordingSink::new())
}

fn wake_sequence(user_brightness: u8) -> Vec<HwCall> {
    vec![
        HwCall::Cpu(240),
        HwCall::Display(true),
        HwCall::Delay(50),
        HwCall::Brightness(20),
        HwCall::Delay(50),
        HwCall::Brightness(user_brightness),
        HwCall::Mount,
        HwCall::Advertise(AdvertisingProfile::Fast),
    ]
}

#[test]
fn boot_brings_hardware_up() {
    let (power, hw, _sink) = started();
    assert_eq!(power.state_id(), StateId::Active);
    assert_eq!(hw.calls, wake_sequence(50));
    assert_eq!(power.idle_delay_ms(), 1);
}

#[test]
fn connected_day_cycle() {
    let (mut power, mut hw, mut sink) = started();
    hw.clear();

    assert_eq!(power.tick(1_000, QUIET, &mut hw, &mut sink), StateId::Active);
    assert!(hw.calls.is_empty());

    assert_eq!(power.tick(2_000, QUIET, &mut hw, &mut sink), StateId::IdleThrottled);
    assert_eq!(hw.calls, vec![HwCall::Cpu(160)]);
    assert!(power.state().cpu_throttled);
    hw.clear();

    assert_eq!(power.tick(30_000, QUIET, &mut hw, &mut sink), StateId::SleepingConnected);
    assert_eq!(
        hw.calls,
        vec![
            HwCall::Brightness(0),
            HwCall::Display(false),
            HwCall::Delay(10),
            HwCall::Cpu(80),
            HwCall::Unmount,
            HwCall::Advertise(AdvertisingProfile::Slow),
        ]
    );
    assert!(!power.sleep_if_eligible(&mut hw), "radio link keeps the CPU awake");
    assert_eq!(power.idle_delay_ms(), 100);

    assert_eq!(
        sink.events,
        vec![
            AppEvent::PowerStateChanged { from: StateId::Active, to: StateId::IdleThrottled },
            AppEvent::PowerStateChanged {
                from: StateId::IdleThrottled,
                to: StateId::SleepingConnected
            },
        ]
    );
}

#[test]
fn disconnected_sleep_uses_light_sleep_and_key_wakes() {
    let (mut power, mut hw, mut sink) = started();
    let alone = PowerSignals { connected: false, ..QUIET };
    let key = PowerSignals { button: true, ..alone };

    power.tick(30_000, alone, &mut hw, &mut sink);
    assert_eq!(power.state_id(), StateId::SleepingDisconnected);
    assert_eq!(hw.last_cpu(), Some(40));

    assert!(power.sleep_if_eligible(&mut hw));
    assert!(power.sleep_if_eligible(&mut hw));
    assert_eq!(hw.count(HwCall::ArmWake(1_000)), 1);
    assert_eq!(hw.count(HwCall::LightSleep), 2);
    hw.clear();

    assert_eq!(power.tick(31_000, key, &mut hw, &mut sink), StateId::Active);
    assert_eq!(hw.calls, wake_sequence(50));
    assert!(!power.sleep_if_eligible(&mut hw));

    // Next sleep period re-arms.
    power.tick(31_500, key, &mut hw, &mut sink);
    assert_eq!(power.state_id(), StateId::SleepingDisconnected);
    assert!(power.sleep_if_eligible(&mut hw));
    assert_eq!(hw.count(HwCall::ArmWake(1_000)), 1);
}

#[test]
fn link_change_while_asleep_only_retunes_cpu() {
    let (mut power, mut hw, mut sink) = started();
    power.tick(30_000, QUIET, &mut hw, &mut sink);
    hw.clear();

    let alone = PowerSignals { connected: false, ..QUIET };
    assert_eq!(power.tick(30_100, alone, &mut hw, &mut sink), StateId::SleepingDisconnected);
    assert_eq!(hw.calls, vec![HwCall::Cpu(40)]);

    assert_eq!(power.tick(30_200, QUIET, &mut hw, &mut sink), StateId::SleepingConnected);
    assert!(!power.commands().light_sleep);
}

#[test]
fn brightness_change_applies_now_or_on_wake() {
    let (mut power, mut hw, mut sink) = started();
    hw.clear();

    power.set_user_brightness(80);
    power.tick(100, PowerSignals { activity: true, ..QUIET }, &mut hw, &mut sink);
    assert_eq!(hw.calls, vec![HwCall::Brightness(80)]);

    power.tick(40_000, QUIET, &mut hw, &mut sink);
    power.set_user_brightness(250);
    assert_eq!(power.user_brightness(), 100);
    assert_eq!(hw.last_brightness(), Some(0), "dark panel stays dark");

    power.tick(40_100, PowerSignals { activity: true, ..QUIET }, &mut hw, &mut sink);
    assert_eq!(hw.last_brightness(), Some(100));
}

#[test]
fn notification_wakes_sleeping_watch() {
    let rx = RxBuffer::new();
    let config = WatchConfig::default();
    let mut svc = WatchService::new(&rx, &config);
    let (mut power, mut hw, mut sink) = started();
    svc.on_connected(&mut sink);

    let connected = svc.is_connected();
    power.tick(30_000, PowerSignals { connected, ..QUIET }, &mut hw, &mut sink);
    assert!(power.state().sleeping);
    assert!(!hw.display_on());

    svc.receive(b"GB({\"t\":\"notify\",\"id\":3,\"title\":\"Parcel\"})\n");
    let inbound = svc.update(30_050, &mut hw, &mut sink);
    let signals = PowerSignals {
        activity: inbound.wake,
        traffic: inbound.traffic,
        button: false,
        connected,
    };
    power.tick(30_050, signals, &mut hw, &mut sink);

    assert_eq!(power.state_id(), StateId::Active);
    assert!(hw.display_on());
    assert_eq!(power.state().last_activity_ms, 30_050);
}

#[test]
fn inbound_traffic_restores_full_speed_from_throttle() {
    let rx = RxBuffer::new();
    let config = WatchConfig::default();
    let mut svc = WatchService::new(&rx, &config);
    let (mut power, mut hw, mut sink) = started();
    svc.on_connected(&mut sink);

    power.tick(2_000, QUIET, &mut hw, &mut sink);
    assert_eq!(power.state_id(), StateId::IdleThrottled);
    hw.clear();

    svc.receive(b"GB({\"t\":\"musicinfo\",\"artist\":\"Nils\",\"track\":\"Says\"})\n");
    let inbound = svc.update(2_500, &mut hw, &mut sink);
    assert!(inbound.traffic);
    assert!(!inbound.wake);

    let signals = PowerSignals { activity: inbound.wake, traffic: inbound.traffic, ..QUIET };
    assert_eq!(power.tick(2_500, signals, &mut hw, &mut sink), StateId::Active);
    assert_eq!(hw.calls, vec![HwCall::Cpu(240)]);
    assert_eq!(power.state().last_activity_ms, 2_500);

    // Idle timer restarted from the traffic, not from boot.
    assert_eq!(power.tick(4_000, QUIET, &mut hw, &mut sink), StateId::Active);
    assert_eq!(power.tick(4_500, QUIET, &mut hw, &mut sink), StateId::IdleThrottled);
}

#[test]
fn inbound_traffic_keeps_sleeping_panel_dark() {
    let (mut power, mut hw, mut sink) = started();
    power.tick(30_000, QUIET, &mut hw, &mut sink);
    assert_eq!(power.state_id(), StateId::SleepingConnected);
    hw.clear();

    let traffic = PowerSignals { traffic: true, ..QUIET };
    assert_eq!(power.tick(30_100, traffic, &mut hw, &mut sink), StateId::SleepingConnected);
    assert!(hw.calls.is_empty());
}

#[test]
fn simulated_board_round_trip() {
    let config = WatchConfig::default();
    let mut radio = NusAdapter::new(&config);
    radio.start().unwrap();
    let mut hw = WatchHardware::new(radio, Esp32TimeAdapter::new());
    let mut sink = RecordingSink::new();

    let rx = RxBuffer::new();
    let mut svc = WatchService::new(&rx, &config);
    let mut power = PowerManager::new(config.clone());
    power.start(0, &mut hw);
    assert!(hw.display_on());
    assert_eq!(hw.backlight(), 127);
    assert!(hw.storage_mounted());

    hw.radio_mut().on_link_change(true);
    svc.on_connected(&mut sink);
    svc.receive(b"setTime(1700000000);E.setTimeZone(0)\nGB({\"t\":\"is_gps_active\"})\n");
    svc.update(10, &mut hw, &mut sink);

    assert!(hw.clock().wall_clock().is_some());
    assert_eq!(hw.radio().sim_notified(), 2, "flush frame plus one payload chunk");

    power.tick(30_000, PowerSignals { connected: true, ..QUIET }, &mut hw, &mut sink);
    assert!(!hw.display_on());
    assert_eq!(hw.backlight(), 0);
    assert_eq!(hw.cpu_mhz(), 80);
    assert!(!hw.storage_mounted());
}
