//! Integration tests for the inbound line → store → event pipeline and the
//! outbound command → radio path of `WatchService`.

use crate::mock_hw::{HwCall, MockHw, RecordingSink};

use wizwatch::app::commands::WatchCommand;
use wizwatch::app::events::AppEvent;
use wizwatch::app::service::{InboundActivity, WatchService};
use wizwatch::config::WatchConfig;
use wizwatch::protocol::encoder::MusicCommand;
use wizwatch::protocol::rx_buffer::RxBuffer;

fn connected(rx: &RxBuffer) -> (WatchService<'_>, MockHw, RecordingSink) {
    let mut svc = WatchService::new(rx, &WatchConfig::default());
    let mut sink = RecordingSink::new();
    svc.start(&mut sink);
    svc.on_connected(&mut sink);
    (svc, MockHw::new(), sink)
}

// ── Inbound ───────────────────────────────────────────────────

#[test]
fn notification_split_across_writes_is_stored() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"\x10GB({\"t\":\"notify\",\"id\":1,\"src\":\"Sig");
    assert_eq!(svc.update(10, &mut hw, &mut sink), InboundActivity::default());
    assert_eq!(svc.notification_count(), 0);

    svc.receive(b"nal\",\"sender\":\"Ann\",\"title\":\"Hi\",\"body\":\"Lunch?\"})\n");
    let inbound = svc.update(20, &mut hw, &mut sink);
    assert!(inbound.wake, "notification wakes the watch");
    assert!(inbound.traffic);

    let n = svc.latest_notification().unwrap();
    assert_eq!(n.id, 1);
    assert_eq!(n.source, "Signal");
    assert_eq!(n.sender, "Ann");
    assert_eq!(n.body, "Lunch?");
    assert!(sink.contains(&AppEvent::NotificationReceived(n)));
    assert_eq!(svc.messages_handled(), 1);
}

#[test]
fn atob_and_hex_escapes_are_decoded() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"GB({\"t\":\"notify\",\"id\":2,\"title\":atob(\"SGVsbG8=\"),\"body\":\"\\x41B\"})\n");
    svc.update(0, &mut hw, &mut sink);

    let n = svc.latest_notification().unwrap();
    assert_eq!(n.title, "Hello");
    assert_eq!(n.body, "AB");
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"GB({\"t\":\"notify\",\"id\":9})\n");
    svc.update(0, &mut hw, &mut sink);

    let n = svc.latest_notification().unwrap();
    assert_eq!(n.source, "Unknown");
    assert!(n.title.is_empty());
}

#[test]
fn set_time_line_sets_local_clock() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"\x10setTime(1700000000);E.setTimeZone(2.0);(s=>s&&(s.timezone=2.0))\n");
    let inbound = svc.update(0, &mut hw, &mut sink);
    assert!(inbound.traffic, "time sync is inbound traffic");
    assert!(!inbound.wake);

    assert_eq!(hw.clock, Some(1_700_007_200));
    assert!(sink.contains(&AppEvent::TimeSynced { local_epoch: 1_700_007_200 }));
}

#[test]
fn malformed_set_time_is_dropped() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"setTime(12ab);\n");
    svc.update(0, &mut hw, &mut sink);

    assert_eq!(hw.clock, None);
    assert_eq!(svc.messages_dropped(), 1);
}

#[test]
fn out_of_range_set_time_is_dropped() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"setTime(9223372036854775807);E.setTimeZone(1);\n");
    svc.receive(b"setTime(1700000000);E.setTimeZone(1e30);\n");
    svc.update(0, &mut hw, &mut sink);

    assert_eq!(hw.clock, None);
    assert_eq!(svc.messages_dropped(), 2);
    assert_eq!(svc.messages_handled(), 0);
}

#[test]
fn phone_dismissal_clears_the_slot() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"GB({\"t\":\"notify\",\"id\":5,\"title\":\"Ping\"})\n");
    svc.receive(b"GB({\"t\":\"notify-\",\"id\":5})\n");
    svc.update(0, &mut hw, &mut sink);

    assert!(sink.contains(&AppEvent::NotificationDismissed { id: 5, local: false }));
    let slot = svc.latest_notification().unwrap();
    assert!(slot.title.is_empty());
    assert_eq!(svc.notification_count(), 1, "cleared slot stays in the ring");
}

#[test]
fn music_state_keeps_track_metadata() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"GB({\"t\":\"musicinfo\",\"artist\":\"Nils\",\"track\":\"Says\",\"dur\":480,\"c\":12})\n");
    svc.receive(b"GB({\"t\":\"musicstate\",\"state\":\"play\"})\n");
    svc.update(0, &mut hw, &mut sink);

    let m = svc.music();
    assert_eq!(m.artist, "Nils");
    assert_eq!(m.duration, 480);
    assert_eq!(m.position, 12);
    assert!(m.playing);

    svc.receive(b"GB({\"t\":\"musicinfo\",\"artist\":\"Nils\",\"track\":\"Tristan\"})\n");
    svc.update(0, &mut hw, &mut sink);
    assert!(svc.music().playing, "new track does not reset play state");
}

#[test]
fn weather_is_stored() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"GB({\"t\":\"weather\",\"temp\":-3,\"hum\":81,\"txt\":\"Snow\",\"code\":601})\n");
    svc.update(0, &mut hw, &mut sink);

    let w = svc.weather();
    assert!(w.valid);
    assert_eq!(w.temp_celsius, -3);
    assert_eq!(w.humidity, 81);
    assert_eq!(w.code, 601);
}

#[test]
fn incoming_call_is_activity_and_answer_ends_it() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"GB({\"t\":\"call\",\"cmd\":\"incoming\",\"name\":\"Mum\",\"number\":\"555\"})\n");
    assert!(svc.update(0, &mut hw, &mut sink).wake);
    assert!(svc.call().active);

    assert!(svc.handle_command(WatchCommand::AnswerCall, &mut hw, &mut sink));
    assert!(!svc.call().active);
    assert!(hw.sent_text().ends_with("{\"t\":\"call\",\"n\":\"ACCEPT\"}\n"));
}

#[test]
fn find_and_unknown_types() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"GB({\"t\":\"find\",\"n\":true})\nGB({\"t\":\"act\",\"hrm\":false})\n");
    svc.update(0, &mut hw, &mut sink);

    assert!(sink.contains(&AppEvent::FindWatch(true)));
    assert_eq!(svc.messages_handled(), 2);
    assert_eq!(svc.messages_dropped(), 0);
}

#[test]
fn gps_query_is_answered() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"GB({\"t\":\"is_gps_active\"})\n");
    svc.update(0, &mut hw, &mut sink);

    assert_eq!(hw.sent_text(), "\n{\"t\":\"gps_power\",\"status\":false}\n");
}

#[test]
fn bad_payloads_are_dropped_without_side_effects() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"GB({\"t\":\"notify\",\"id\":1,)\n");
    svc.receive(b"GB([1,2,3])\n");
    svc.receive(b"GB({\"id\":4})\n");
    svc.receive(b"GB({\"t\":\"notify\",\"id\":3\n");
    svc.update(0, &mut hw, &mut sink);

    assert_eq!(svc.notification_count(), 0);
    assert_eq!(svc.messages_dropped(), 3);
    assert_eq!(sink.events.len(), 2, "only Started and Connected");

    svc.receive(b"GB({\"t\":\"notify\",\"id\":8})\n");
    svc.update(0, &mut hw, &mut sink);
    assert_eq!(svc.notification_count(), 1);
}

#[test]
fn overlong_line_is_discarded_whole() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    let filler = [b'a'; 400];
    for _ in 0..6 {
        svc.receive(&filler);
        svc.update(0, &mut hw, &mut sink);
    }
    svc.receive(b")\nGB({\"t\":\"notify\",\"id\":11})\n");
    svc.update(0, &mut hw, &mut sink);

    assert_eq!(svc.messages_dropped(), 1);
    assert_eq!(svc.latest_notification().unwrap().id, 11);
}

// ── Link lifecycle ────────────────────────────────────────────

#[test]
fn reconnect_discards_partial_line() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"GB({\"t\":\"noti");
    svc.update(0, &mut hw, &mut sink);
    svc.on_disconnected(100, &mut sink);
    svc.receive(b"stale");
    svc.on_connected(&mut sink);

    svc.receive(b"GB({\"t\":\"find\",\"n\":true})\n");
    svc.update(200, &mut hw, &mut sink);

    assert!(sink.contains(&AppEvent::FindWatch(true)));
    assert_eq!(svc.messages_dropped(), 0);
    assert!(svc.connection_state().previously_connected);
}

#[test]
fn advertising_restarts_after_delay() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.on_disconnected(1_000, &mut sink);
    assert!(sink.contains(&AppEvent::Disconnected));
    assert_eq!(svc.connection_state().disconnect_timestamp, Some(1_000));

    svc.update(1_499, &mut hw, &mut sink);
    assert_eq!(hw.count(HwCall::RestartAdvertising), 0);
    svc.update(1_500, &mut hw, &mut sink);
    assert_eq!(hw.count(HwCall::RestartAdvertising), 1);
    svc.update(5_000, &mut hw, &mut sink);
    assert_eq!(hw.count(HwCall::RestartAdvertising), 1);
    assert_eq!(svc.connection_state().disconnect_timestamp, None);
}

#[test]
fn duplicate_link_events_are_ignored() {
    let rx = RxBuffer::new();
    let (mut svc, _hw, mut sink) = connected(&rx);

    svc.on_connected(&mut sink);
    svc.on_disconnected(10, &mut sink);
    svc.on_disconnected(20, &mut sink);

    let connects = sink.events.iter().filter(|e| **e == AppEvent::Connected).count();
    let disconnects = sink.events.iter().filter(|e| **e == AppEvent::Disconnected).count();
    assert_eq!((connects, disconnects), (1, 1));
    assert_eq!(svc.connection_state().disconnect_timestamp, Some(10));
}

// ── Outbound ──────────────────────────────────────────────────

#[test]
fn local_dismiss_sends_flush_then_payload() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);

    svc.receive(b"GB({\"t\":\"notify\",\"id\":7})\n");
    svc.update(0, &mut hw, &mut sink);
    hw.clear();

    assert!(svc.handle_command(WatchCommand::DismissNotification(7), &mut hw, &mut sink));
    assert_eq!(hw.frames[0], b"\n");
    assert_eq!(hw.frames[1], b"{\"t\":\"notify-\",\"id\":7}\n");
    assert_eq!(hw.calls, vec![HwCall::Delay(20)]);
    assert!(sink.contains(&AppEvent::NotificationDismissed { id: 7, local: true }));
}

#[test]
fn small_mtu_splits_payload() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);
    hw.mtu = 23;

    svc.handle_command(WatchCommand::MusicControl(MusicCommand::Previous), &mut hw, &mut sink);

    assert!(hw.frames.len() > 2);
    assert!(hw.frames.iter().all(|f| f.len() <= 20));
    assert_eq!(hw.sent_text(), "\n{\"t\":\"music\",\"n\":\"previous\"}\n");
}

#[test]
fn nothing_is_sent_while_disconnected() {
    let rx = RxBuffer::new();
    let mut svc = WatchService::new(&rx, &WatchConfig::default());
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();

    assert!(!svc.handle_command(WatchCommand::FindPhone(true), &mut hw, &mut sink));
    assert!(hw.frames.is_empty());
    assert!(hw.calls.is_empty());
}

#[test]
fn notify_failure_reports_not_sent() {
    let rx = RxBuffer::new();
    let (mut svc, mut hw, mut sink) = connected(&rx);
    hw.notify_fails = true;

    assert!(!svc.handle_command(WatchCommand::RejectCall, &mut hw, &mut sink));
    assert!(hw.calls.is_empty(), "no flush pause after a failed flush frame");
}
