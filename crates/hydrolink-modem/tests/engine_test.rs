//! Dispatch loop behaviour against a scripted transport.

mod common;

use common::{engine, engine_with_config};
use hydrolink_core::{Error, RegistrationStatus};
use hydrolink_modem::EngineConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn probe_completes_on_ok() {
    let (engine, handle) = engine();
    handle.expect("AT\r\n", &["OK\r\n"]);

    engine.probe().await.unwrap();
    assert_eq!(handle.sent(), vec!["AT\r\n".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn probe_treats_error_as_alive() {
    let (engine, handle) = engine();
    handle.expect("AT\r\n", &["ERROR\r\n"]);

    engine.probe().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn registration_reports_home_and_unregistered() {
    let (engine, handle) = engine();

    handle.expect("AT+CEREG?", &["+CEREG: 0,1\r\nOK\r\n"]);
    assert_eq!(engine.registration().await.unwrap(), RegistrationStatus::Home);

    handle.expect("AT+CEREG?", &["+CEREG: 0,0\r\nOK\r\n"]);
    assert_eq!(
        engine.registration().await.unwrap(),
        RegistrationStatus::NotRegistered
    );
}

#[tokio::test(start_paused = true)]
async fn identity_queries_store_their_values() {
    let (engine, handle) = engine();

    handle.expect("AT+CGSN=1", &["+CGSN: 862991234567890\r\nOK\r\n"]);
    assert_eq!(engine.imei().await.unwrap(), "862991234567890");

    handle.expect("AT+MCCID", &["+MCCID: 89860912345678901234\r\n"]);
    assert_eq!(engine.iccid().await.unwrap(), "89860912345678901234");

    let snap = engine.data().snapshot();
    assert_eq!(snap.imei.as_deref(), Some("862991234567890"));
    assert_eq!(snap.iccid.as_deref(), Some("89860912345678901234"));
}

#[tokio::test(start_paused = true)]
async fn clock_and_signal_queries() {
    let (engine, handle) = engine();

    handle.expect("AT+CCLK?", &["+CCLK: \"24/12/23,03:18:05+32\"\r\nOK\r\n"]);
    let clock = engine.clock().await.unwrap();
    assert_eq!(clock.zone_quarters, 32);

    handle.expect("AT+CSQ", &["+CSQ: 20,0\r\nOK\r\n"]);
    let signal = engine.signal_quality().await.unwrap();
    assert_eq!(signal.rssi, 20);
    assert_eq!(signal.dbm(), Some(-73));
}

#[tokio::test(start_paused = true)]
async fn concurrent_commands_serialize() {
    let (engine, handle) = engine();
    handle.expect("AT+CSQ", &["+CSQ: 18,0\r\nOK\r\n"]);
    handle.expect("AT\r\n", &["OK\r\n"]);

    let a = engine.probe();
    let b = engine.signal_quality();
    let (pa, pb) = tokio::join!(a, b);
    pa.unwrap();
    pb.unwrap();

    // One command at a time: both frames out, none interleaved or dropped.
    assert_eq!(handle.sent().len(), 2);
    assert_eq!(handle.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn silence_times_out() {
    let (engine, _handle) = engine();

    let err = engine.probe().await.unwrap_err();
    assert!(matches!(err, Error::ResponseTimeout { ref command, .. } if command == "AT"));
}

#[tokio::test(start_paused = true)]
async fn waiting_verdict_does_not_complete() {
    let (engine, handle) = engine();
    // A bare OK on an HTTP request is an acknowledgement, not a verdict; if
    // the content never arrives the dispatch must time out.
    handle.expect("AT+MHTTPREQUEST", &["OK\r\n"]);

    let cmd = hydrolink_protocol::Command::http_request(
        0,
        hydrolink_protocol::HttpMethod::Get,
        "/v1/status",
    )
    .unwrap();
    let err = engine.execute(&cmd).await.unwrap_err();
    assert!(matches!(err, Error::ResponseTimeout { .. }));
}

#[tokio::test(start_paused = true)]
async fn send_failure_surfaces_and_engine_recovers() {
    let (engine, handle) = engine();
    handle.fail_next_send("uart gone");

    let err = engine.probe().await.unwrap_err();
    assert!(matches!(err, Error::SendFailed(_)));

    handle.expect("AT\r\n", &["OK\r\n"]);
    engine.probe().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unsolicited_chunks_are_dropped() {
    let (engine, handle) = engine();
    handle.inject("+CEREG: 0,1\r\n");
    handle.inject("RDY\r\n");
    // Let the receiver drain the stale chunks before dispatching.
    tokio::time::sleep(Duration::from_millis(1)).await;

    // The stale chunks must not satisfy or corrupt the next dispatch.
    handle.expect("AT\r\n", &["OK\r\n"]);
    engine.probe().await.unwrap();
    assert!(engine.data().registration().is_none());
}

#[tokio::test(start_paused = true)]
async fn late_reply_of_previous_command_is_ignored() {
    let (engine, handle) = engine();
    handle.expect_delayed("AT+CSQ", &["+CSQ: 7,0\r\nOK\r\n"], Duration::from_secs(30));

    // First dispatch times out; its reply lands while nothing is in flight.
    let err = engine.signal_quality().await.unwrap_err();
    assert!(matches!(err, Error::ResponseTimeout { .. }));

    handle.expect("AT\r\n", &["OK\r\n"]);
    engine.probe().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn hard_reset_clears_dispatch_state() {
    let (engine, handle) = engine();
    engine.reboot_hard().await.unwrap();
    assert_eq!(handle.resets(), 1);

    handle.expect("AT\r\n", &["OK\r\n"]);
    engine.probe().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn scheduler_raise_and_restore_balance() {
    use hydrolink_modem::mock::MockTransport;
    use hydrolink_modem::{ModemEngine, SchedulerHook};

    struct Balance(AtomicIsize);
    impl SchedulerHook for Balance {
        fn raise(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn restore(&self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    common::init_tracing();
    let hook = Arc::new(Balance(AtomicIsize::new(0)));
    let (transport, handle, chunks) = MockTransport::new();
    let engine = Arc::new(ModemEngine::with_scheduler(
        transport,
        EngineConfig::fast(),
        Arc::clone(&hook) as Arc<dyn SchedulerHook>,
    ));
    tokio::spawn(Arc::clone(&engine).run_receiver(chunks));

    handle.expect("AT\r\n", &["OK\r\n"]);
    engine.probe().await.unwrap();
    assert_eq!(hook.0.load(Ordering::SeqCst), 0);

    // The timeout path must restore too.
    let _ = engine.probe().await.unwrap_err();
    assert_eq!(hook.0.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn multi_part_response_in_separate_chunks() {
    let (engine, handle) = engine();
    // Information response and final OK arrive as two transport chunks.
    handle.expect("AT+CSQ", &["+CSQ: 25,0\r\n", "OK\r\n"]);

    // The information response alone carries the verdict for CSQ.
    let signal = engine.signal_quality().await.unwrap();
    assert_eq!(signal.rssi, 25);
}

#[tokio::test(start_paused = true)]
async fn custom_slot_count_still_flows() {
    let config = EngineConfig {
        slot_count: 2,
        slot_size: 64,
        ..EngineConfig::fast()
    };
    let (engine, handle) = engine_with_config(config);

    handle.expect("AT\r\n", &["OK\r\n"]);
    engine.probe().await.unwrap();
}
