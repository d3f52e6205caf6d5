//! Display, beep and announcement behavior of the expiration clock.

mod common;

use std::time::Duration;

use common::{DisplayEvent, Harness};
use voxtimer_core::storage::TimersConfig;
use voxtimer_core::timer::TickOutcome;
use voxtimer_core::{Announcement, CancelRequest, StartOutcome, StartRequest, StopOutcome};

fn start(h: &Harness, secs: u64, name: Option<&str>) {
    let outcome = h.engine.start(StartRequest::with_duration(secs, name));
    assert!(matches!(outcome, StartOutcome::Started { .. }), "{outcome:?}");
}

#[test]
fn pending_timer_renders_remaining_time() {
    let h = Harness::new();
    start(&h, 300, None);
    h.advance_and_tick(10);
    assert_eq!(h.display.events(), vec![DisplayEvent::Render { slot: None, secs: 290 }]);
    assert_eq!(h.audio.plays(), 0);
}

#[test]
fn sole_expired_timer_beeps_then_repeats() {
    let h = Harness::new();
    start(&h, 60, None);

    h.advance_and_tick(61);
    assert_eq!(h.display.renders(), vec![(None, -1)]);
    assert_eq!(h.audio.plays(), 1);
    assert!(h.speaker.spoken().is_empty());
    assert!(h.engine.timers()[0].announced);

    for _ in 0..4 {
        h.advance_and_tick(1);
    }
    assert_eq!(h.audio.plays(), 1);

    h.advance_and_tick(1);
    assert_eq!(h.audio.plays(), 2);
    assert_eq!(h.audio.stops(), 1);
}

#[test]
fn announced_flag_reaches_the_snapshot() {
    use voxtimer_core::SnapshotStore;

    let h = Harness::new();
    start(&h, 60, None);
    h.advance_and_tick(61);
    assert!(h.snapshot.load().unwrap()[0].announced);
}

#[test]
fn expiry_among_several_timers_is_announced_first() {
    let h = Harness::with_config(TimersConfig {
        display_cycle_ticks: 100,
        ..TimersConfig::default()
    });
    start(&h, 60, None);
    start(&h, 600, Some("pasta"));

    h.advance_and_tick(61);
    assert_eq!(
        h.speaker.spoken(),
        vec![Announcement::Expired {
            label: "1 minute".into(),
            ordinal: 1
        }]
    );
    assert_eq!(h.audio.plays(), 0);
    assert_eq!(h.display.renders(), vec![(Some(1), -1)]);

    for _ in 0..4 {
        h.advance_and_tick(1);
    }
    assert_eq!(h.audio.plays(), 0);
    h.advance_and_tick(1);
    assert_eq!(h.audio.plays(), 1);
    assert_eq!(h.speaker.spoken().len(), 1);
}

#[test]
fn display_cycles_between_timers() {
    let h = Harness::new();
    start(&h, 300, None);
    start(&h, 600, None);

    for _ in 0..10 {
        h.advance_and_tick(1);
    }
    let slots: Vec<Option<usize>> = h.display.renders().into_iter().map(|(s, _)| s).collect();
    let mut expected = vec![Some(1); 5];
    expected.extend(vec![Some(2); 5]);
    assert_eq!(slots, expected);

    let renders = h.display.renders();
    assert_eq!(renders[0], (Some(1), 299));
    assert_eq!(renders[5], (Some(2), 594));
}

#[test]
fn speech_in_progress_suppresses_rendering() {
    let h = Harness::new();
    start(&h, 300, None);
    h.speaker.set_speaking(true);
    h.advance_and_tick(1);
    assert!(h.display.events().is_empty());

    h.speaker.set_speaking(false);
    h.advance_and_tick(1);
    assert_eq!(h.display.renders(), vec![(None, 298)]);
}

#[test]
fn expired_timers_blink_the_indicator() {
    let h = Harness::new();
    start(&h, 60, None);
    start(&h, 600, None);

    h.advance_and_tick(62);
    assert!(h.display.events().contains(&DisplayEvent::Blink(true)));

    h.advance_and_tick(1);
    assert!(h.display.events().contains(&DisplayEvent::Blink(false)));

    assert!(matches!(h.engine.stop(), StopOutcome::Silenced { .. }));
    h.display.clear();
    h.advance_and_tick(1);
    assert_eq!(h.display.events()[0], DisplayEvent::Blink(false));

    h.display.clear();
    h.advance_and_tick(1);
    assert!(!h
        .display
        .events()
        .iter()
        .any(|e| matches!(e, DisplayEvent::Blink(_))));
}

#[test]
fn mute_silences_only_the_current_alert() {
    let h = Harness::new();
    start(&h, 60, Some("tea"));
    h.advance_and_tick(61);
    assert_eq!(h.audio.plays(), 1);

    h.engine.mute();
    assert!(h.engine.is_muted());
    assert_eq!(h.audio.stops(), 1);

    h.advance_and_tick(10);
    assert_eq!(h.audio.plays(), 1);
    assert_eq!(h.display.renders().last(), Some(&(None, -11)));

    assert!(matches!(h.engine.stop(), StopOutcome::Silenced { .. }));
    assert!(!h.engine.is_muted());

    start(&h, 30, Some("eggs"));
    h.advance_and_tick(31);
    assert_eq!(h.audio.plays(), 2);
}

#[test]
fn mute_stays_with_the_timer_it_silenced() {
    let h = Harness::new();
    start(&h, 60, Some("tea"));
    start(&h, 120, Some("pasta"));

    h.advance_and_tick(61);
    h.engine.mute();
    let tea = h.engine.timers()[0].id;
    assert_eq!(h.engine.muted_timer(), Some(tea));

    h.time.advance(60);
    for _ in 0..20 {
        h.advance_and_tick(1);
    }
    let spoken = h.speaker.spoken();
    assert_eq!(
        spoken,
        vec![
            Announcement::Expired {
                label: "tea".into(),
                ordinal: 1,
            },
            Announcement::Expired {
                label: "pasta".into(),
                ordinal: 1,
            },
        ]
    );
    assert!(h.audio.plays() > 0);

    h.engine.cancel(CancelRequest::from_utterance("cancel the pasta timer"));
    assert_eq!(h.engine.muted_timer(), Some(tea));

    h.engine.cancel(CancelRequest::all());
    assert!(!h.engine.is_muted());
}

#[test]
fn starting_a_timer_clears_mute() {
    let h = Harness::new();
    start(&h, 60, None);
    h.advance_and_tick(61);
    h.engine.mute();
    start(&h, 600, None);
    assert!(!h.engine.is_muted());
}

#[test]
fn empty_store_goes_idle() {
    let h = Harness::new();
    assert_eq!(h.engine.tick(), TickOutcome::Idle);
    assert_eq!(h.display.events(), vec![DisplayEvent::Reset]);
}

#[test]
fn cancelling_the_last_timer_resets_the_display() {
    let h = Harness::new();
    start(&h, 60, None);
    h.advance_and_tick(61);
    h.display.clear();

    h.engine.cancel(CancelRequest::all());
    assert_eq!(h.display.events(), vec![DisplayEvent::Reset]);
    assert_eq!(h.audio.stops(), 1);
    assert_eq!(h.engine.tick(), TickOutcome::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_clock_runs_while_timers_exist() {
    let h = Harness::with_config(TimersConfig {
        tick_interval_ms: 10,
        ..TimersConfig::default()
    });
    assert!(!h.engine.is_clock_running());

    start(&h, 60, None);
    assert!(h.engine.is_clock_running());

    h.time.advance(61);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.audio.plays(), 1);
    assert!(!h.display.renders().is_empty());

    h.engine.cancel(CancelRequest::all());
    assert!(!h.engine.is_clock_running());

    h.display.clear();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.display.renders().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn restored_timers_restart_the_clock() {
    use voxtimer_core::MemorySnapshot;

    let snapshot = MemorySnapshot::new();
    {
        let h = Harness::with_snapshot(snapshot.clone(), TimersConfig::default());
        start(&h, 600, None);
        h.engine.shutdown();
        assert!(!h.engine.is_clock_running());
    }
    let h = Harness::with_snapshot(snapshot, TimersConfig::default());
    assert!(h.engine.is_clock_running());
}
