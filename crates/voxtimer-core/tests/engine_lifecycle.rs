//! Start / status / cancel / stop behavior of the timer engine.

mod common;

use common::Harness;
use voxtimer_core::storage::TimersConfig;
use voxtimer_core::timer::PendingRequest;
use voxtimer_core::{
    CancelOutcome, CancelRequest, MemorySnapshot, SnapshotStore, StartOutcome, StartRequest,
    StatusOutcome, StatusRequest, StopOutcome, Timer,
};

fn started(outcome: StartOutcome) -> Timer {
    match outcome {
        StartOutcome::Started { timer } => timer,
        other => panic!("expected Started, got {other:?}"),
    }
}

fn cancelled_ids(outcome: &CancelOutcome) -> Vec<u32> {
    match outcome {
        CancelOutcome::Cancelled { timers } => timers.iter().map(|t| t.id).collect(),
        other => panic!("expected Cancelled, got {other:?}"),
    }
}

fn status_labels(outcome: &StatusOutcome) -> Vec<String> {
    match outcome {
        StatusOutcome::Timers { timers } => timers.iter().map(|t| t.label.clone()).collect(),
        other => panic!("expected Timers, got {other:?}"),
    }
}

fn pasta_and_plain(h: &Harness) -> (Timer, Timer) {
    let pasta = started(h.engine.start(StartRequest::with_duration(420, Some("pasta"))));
    let plain = started(h.engine.start(StartRequest::with_duration(300, None)));
    (pasta, plain)
}

#[test]
fn start_from_utterance() {
    let h = Harness::new();
    let timer = started(
        h.engine
            .start(StartRequest::from_utterance("set a timer for 7 minutes called pasta")),
    );
    assert_eq!(timer.duration, 420);
    assert_eq!(timer.name.as_deref(), Some("pasta"));
    assert_eq!(timer.id, 1);
    assert_eq!(timer.ordinal, 1);
}

#[test]
fn ordinals_survive_sibling_cancellation() {
    let h = Harness::new();
    for _ in 0..3 {
        h.engine.start(StartRequest::with_duration(300, None));
    }
    let ordinals: Vec<u32> = h.engine.timers().iter().map(|t| t.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3]);

    let outcome = h
        .engine
        .cancel(CancelRequest::from_utterance("cancel the second 5 minute timer"));
    assert_eq!(cancelled_ids(&outcome), vec![2]);

    let ordinals: Vec<u32> = h.engine.timers().iter().map(|t| t.ordinal).collect();
    assert_eq!(ordinals, vec![1, 3]);
    assert!(h.prompter.asked().is_empty());
}

#[test]
fn status_by_name_and_by_duration() {
    let h = Harness::new();
    pasta_and_plain(&h);

    let by_name = h.engine.status(StatusRequest::from_utterance("the pasta timer"));
    assert_eq!(status_labels(&by_name), vec!["pasta"]);

    let by_duration = h.engine.status(StatusRequest::from_utterance("the 5 minute timer"));
    assert_eq!(status_labels(&by_duration), vec!["5 minute"]);
    assert!(h.prompter.asked().is_empty());
}

#[test]
fn vague_status_with_two_timers_reports_both() {
    let h = Harness::new();
    pasta_and_plain(&h);
    let outcome = h.engine.status(StatusRequest::from_utterance("how long is left"));
    assert_eq!(status_labels(&outcome), vec!["pasta", "5 minute"]);
    assert!(h.prompter.asked().is_empty());
}

#[test]
fn vague_cancel_asks_exactly_once() {
    let h = Harness::new();
    let (pasta, _) = pasta_and_plain(&h);
    h.prompter.push(Some("pasta"));

    let outcome = h.engine.cancel(CancelRequest::from_utterance("cancel the timer"));
    assert_eq!(cancelled_ids(&outcome), vec![pasta.id]);
    assert_eq!(h.prompter.asked_keys(), vec!["ask.which.timer"]);
}

#[test]
fn declined_disambiguation_is_user_cancelled() {
    let h = Harness::new();
    pasta_and_plain(&h);
    h.prompter.push(None);

    let outcome = h.engine.cancel(CancelRequest::from_utterance("cancel the timer"));
    assert_eq!(outcome, CancelOutcome::UserCancelled);
    assert_eq!(h.engine.timers().len(), 2);
}

#[test]
fn empty_set_never_prompts() {
    let h = Harness::new();
    h.prompter.push(Some("pasta"));

    assert_eq!(
        h.engine.status(StatusRequest::from_utterance("timer")),
        StatusOutcome::NotFound
    );
    assert_eq!(
        h.engine.cancel(CancelRequest::from_utterance("timer")),
        CancelOutcome::NothingToCancel
    );
    assert!(h.prompter.asked().is_empty());
}

#[test]
fn lone_timer_is_cancelled_without_resolution() {
    let h = Harness::new();
    let only = started(h.engine.start(StartRequest::with_duration(60, Some("tea"))));
    let outcome = h
        .engine
        .cancel(CancelRequest::from_utterance("cancel the banana timer"));
    assert_eq!(cancelled_ids(&outcome), vec![only.id]);
    assert!(h.prompter.asked().is_empty());
}

#[test]
fn unresolved_cancel_reprompts_once() {
    let h = Harness::new();
    started(h.engine.start(StartRequest::with_duration(420, Some("pasta"))));
    let rice = started(h.engine.start(StartRequest::with_duration(300, Some("rice"))));
    h.prompter.push(Some("rice"));

    let outcome = h
        .engine
        .cancel(CancelRequest::from_utterance("cancel the 5 minute pasta timer"));
    assert_eq!(cancelled_ids(&outcome), vec![rice.id]);
    assert_eq!(h.prompter.asked_keys(), vec!["ask.which.timer.cancel"]);
}

#[test]
fn second_cancel_failure_is_not_found() {
    let h = Harness::new();
    started(h.engine.start(StartRequest::with_duration(420, Some("pasta"))));
    started(h.engine.start(StartRequest::with_duration(300, Some("rice"))));
    h.prompter.push(Some("the 7 minute rice timer"));

    let outcome = h
        .engine
        .cancel(CancelRequest::from_utterance("cancel the 5 minute pasta timer"));
    assert_eq!(outcome, CancelOutcome::NotFound);
    assert_eq!(h.engine.timers().len(), 2);
}

#[test]
fn exhausted_disambiguation_is_not_asked_again() {
    let h = Harness::new();
    started(h.engine.start(StartRequest::with_duration(300, None)));
    started(h.engine.start(StartRequest::with_duration(600, None)));
    for _ in 0..5 {
        h.prompter.push(Some("hmm"));
    }

    let outcome = h.engine.cancel(CancelRequest::from_utterance("cancel the timer"));
    assert_eq!(outcome, CancelOutcome::NotFound);
    assert_eq!(h.prompter.asked_keys(), vec!["ask.which.timer"; 3]);
    assert_eq!(h.engine.timers().len(), 2);
}

#[test]
fn cancel_all() {
    let h = Harness::new();
    pasta_and_plain(&h);
    let outcome = h.engine.cancel(CancelRequest::from_utterance("cancel all timers"));
    assert_eq!(cancelled_ids(&outcome), vec![1, 2]);
    assert!(h.engine.timers().is_empty());
}

#[test]
fn missing_duration_is_asked_for() {
    let h = Harness::new();
    h.prompter.push(Some("ten minutes"));
    let timer = started(h.engine.start(StartRequest::from_utterance("start a timer")));
    assert_eq!(timer.duration, 600);
    assert_eq!(h.prompter.asked_keys(), vec!["ask.how.long"]);

    h.prompter.push(None);
    assert_eq!(
        h.engine.start(StartRequest::from_utterance("start a timer")),
        StartOutcome::UserCancelled
    );
}

#[test]
fn zero_duration_is_rejected() {
    let h = Harness::new();
    assert_eq!(
        h.engine.start(StartRequest::with_duration(0, None)),
        StartOutcome::InvalidDuration
    );
    assert!(h.engine.timers().is_empty());
}

#[test]
fn out_of_range_duration_is_rejected() {
    let h = Harness::new();
    let huge = StartRequest {
        confirm_long: true,
        ..StartRequest::with_duration(100_000_000_000_000_000, None)
    };
    assert_eq!(h.engine.start(huge), StartOutcome::InvalidDuration);
    assert_eq!(
        h.engine.start(StartRequest::with_duration(u64::MAX, None)),
        StartOutcome::InvalidDuration
    );
    assert_eq!(
        h.engine
            .start(StartRequest::from_utterance("set a timer for 100000000000 hours")),
        StartOutcome::InvalidDuration
    );
    assert!(h.engine.timers().is_empty());
    assert!(h.prompter.asked().is_empty());
}

#[test]
fn day_long_timer_needs_confirmation() {
    let h = Harness::new();
    let day = 25 * 60 * 60;

    h.prompter.push(Some("no"));
    assert_eq!(
        h.engine.start(StartRequest::with_duration(day, None)),
        StartOutcome::SuggestAlarm { duration: day }
    );

    h.prompter.push(Some("yes"));
    assert_eq!(started(h.engine.start(StartRequest::with_duration(day, None))).duration, day);

    let preconfirmed = StartRequest {
        confirm_long: true,
        ..StartRequest::with_duration(day, None)
    };
    started(h.engine.start(preconfirmed));
    assert_eq!(h.prompter.asked_keys().len(), 2);
}

#[test]
fn duplicate_names_are_refused() {
    let h = Harness::new();
    started(h.engine.start(StartRequest::with_duration(60, Some("Tea"))));
    assert_eq!(
        h.engine.start(StartRequest::with_duration(120, Some("tea"))),
        StartOutcome::DuplicateName { name: "tea".into() }
    );
}

#[test]
fn stop_cancels_only_overtime_timers() {
    let h = Harness::new();
    let short = started(h.engine.start(StartRequest::with_duration(60, None)));
    let long = started(h.engine.start(StartRequest::with_duration(600, None)));
    h.time.advance(61);

    match h.engine.stop() {
        StopOutcome::Silenced { timers } => {
            assert_eq!(timers.iter().map(|t| t.id).collect::<Vec<_>>(), vec![short.id]);
        }
        other => panic!("expected Silenced, got {other:?}"),
    }
    let remaining: Vec<u32> = h.engine.timers().iter().map(|t| t.id).collect();
    assert_eq!(remaining, vec![long.id]);
}

#[test]
fn stop_with_running_timers_queues_confirmation() {
    let h = Harness::new();
    started(h.engine.start(StartRequest::with_duration(600, None)));

    let outcome = h.engine.stop();
    assert_eq!(outcome, StopOutcome::ConfirmationPosted);
    assert!(outcome.is_handled());
    assert!(h.prompter.asked().is_empty());
    assert_eq!(h.engine.timers().len(), 1);
    assert_eq!(h.engine.pending(), Some(PendingRequest::ConfirmCancelRunning));

    h.prompter.push(Some("yes please"));
    let handled = h.engine.process_pending().unwrap();
    assert!(matches!(handled, CancelOutcome::Cancelled { .. }));
    assert!(h.engine.timers().is_empty());
    assert_eq!(h.engine.process_pending(), None);
}

#[test]
fn declined_stop_confirmation_keeps_timers() {
    let h = Harness::new();
    started(h.engine.start(StartRequest::with_duration(600, None)));
    h.engine.stop();
    h.prompter.push(Some("no"));
    assert_eq!(h.engine.process_pending(), Some(CancelOutcome::UserCancelled));
    assert_eq!(h.engine.timers().len(), 1);
}

#[test]
fn stop_without_timers_is_unhandled() {
    let h = Harness::new();
    assert_eq!(h.engine.stop(), StopOutcome::Unhandled);
}

#[test]
fn snapshot_matches_memory_after_each_mutation() {
    let h = Harness::new();
    pasta_and_plain(&h);
    assert_eq!(h.snapshot.load().unwrap(), h.engine.timers());

    h.engine.cancel(CancelRequest::from_utterance("the pasta timer"));
    assert_eq!(h.snapshot.load().unwrap(), h.engine.timers());
}

#[test]
fn restart_reloads_last_snapshot() {
    let snapshot = MemorySnapshot::new();
    let before = {
        let h = Harness::with_snapshot(snapshot.clone(), TimersConfig::default());
        pasta_and_plain(&h);
        h.engine.shutdown();
        assert!(h.engine.timers().is_empty());
        h.snapshot.load().unwrap()
    };
    assert_eq!(before.len(), 2);

    let h = Harness::with_snapshot(snapshot, TimersConfig::default());
    assert_eq!(h.engine.timers(), before);
    let next = started(h.engine.start(StartRequest::with_duration(30, None)));
    assert_eq!(next.id, 3);
}

#[test]
fn corrupt_snapshot_starts_empty() {
    let h = Harness::with_snapshot(MemorySnapshot::with_raw("{oops"), TimersConfig::default());
    assert!(h.engine.timers().is_empty());
    started(h.engine.start(StartRequest::with_duration(30, None)));
}

#[test]
fn unwritable_snapshot_does_not_block_mutations() {
    let h = Harness::new();
    h.snapshot.set_fail_writes(true);
    started(h.engine.start(StartRequest::with_duration(30, None)));
    assert_eq!(h.engine.timers().len(), 1);
    assert!(h.snapshot.raw().is_none());
}

#[test]
fn ids_restart_once_all_timers_are_gone() {
    let h = Harness::new();
    started(h.engine.start(StartRequest::with_duration(30, None)));
    started(h.engine.start(StartRequest::with_duration(60, None)));
    h.engine.cancel(CancelRequest::all());
    let fresh = started(h.engine.start(StartRequest::with_duration(30, None)));
    assert_eq!(fresh.id, 1);
}

#[test]
fn list_reports_remaining_time() {
    let h = Harness::new();
    pasta_and_plain(&h);
    h.time.advance(100);
    let remaining: Vec<i64> = h.engine.list().iter().map(|s| s.remaining_secs).collect();
    assert_eq!(remaining, vec![320, 200]);
}
