use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::error::ErrorCode;
use crate::ports::{NoChime, NoShare};
use crate::testing::{BrokenChime, FakeShare, Outcome, RecordingPresenter};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn handle() -> SessionHandle {
    SessionHandle::new(Session::seeded(12345))
}

fn assert_shape(summary: &SummaryEvent) {
    let values = summary.draw.values();
    assert_eq!(values.len(), DRAW_COUNT);
    assert!(values.windows(2).all(|w| w[0] < w[1]));
    assert!(values.iter().all(|v| (1..=24).contains(v)));
}

// =============================================================================
// guard
// =============================================================================

#[test]
fn new_session_is_idle_with_zero_counter() {
    let h = handle();
    assert_eq!(h.phase(), Phase::Idle);
    assert_eq!(h.counter(), 0);
    assert!(h.last_summary().is_none());
}

#[test]
fn try_begin_rejects_second_trigger() {
    let h = handle();
    h.try_begin().unwrap();
    let err = h.try_begin().unwrap_err();
    assert!(matches!(err, SessionError::Busy { phase: Phase::Drawing }));
    assert_eq!(err.error_code(), "E_BUSY");
    assert!(err.retryable());
}

#[tokio::test(start_paused = true)]
async fn trigger_during_cycle_is_ignored() {
    let h = handle();
    let presenter = Arc::new(RecordingPresenter::new());

    let task = {
        let h = h.clone();
        let presenter = Arc::clone(&presenter);
        tokio::spawn(async move { run_cycle(&h, presenter.as_ref(), &NoChime).await })
    };

    // Let the spawned cycle reach its announce pre-roll.
    tokio::time::sleep(ms(100)).await;
    assert_eq!(h.phase(), Phase::Drawing);
    assert!(matches!(
        run_cycle(&h, &RecordingPresenter::new(), &NoChime).await,
        Err(SessionError::Busy { .. })
    ));

    let summary = task.await.unwrap().unwrap();
    assert_eq!(summary.ordinal, 1);
    assert_eq!(h.counter(), 1);
    assert_eq!(presenter.announced(), 1);
    assert_eq!(presenter.seen().len(), DRAW_COUNT + 1);
}

// =============================================================================
// full cycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn full_cycle_timing_and_counter() {
    let h = handle();
    let presenter = RecordingPresenter::new().watching(h.clone());

    let summary = run_cycle(&h, &presenter, &NoChime).await.unwrap();

    let seen = presenter.seen();
    assert_eq!(seen.len(), 6);

    // Reveal starts after the announce pre-roll.
    let reveal_start = seen[0].at;
    assert!(reveal_start >= ms(1500) && reveal_start <= ms(1502));
    for (i, entry) in seen.iter().take(5).enumerate() {
        let CycleEvent::Reveal(ev) = &entry.event else {
            panic!("event {i} should be a reveal");
        };
        assert_eq!(ev.position, i);
        assert_eq!(ev.value, summary.draw.values()[i]);
        let offset = entry.at - reveal_start;
        let expected = ms(200 * i as u64);
        assert!(offset >= expected && offset <= expected + ms(2), "reveal {i} at {offset:?}");
        assert_eq!(entry.phase, Some(Phase::Revealing { position: i }));
    }

    let CycleEvent::Summary(seen_summary) = &seen[5].event else {
        panic!("last event should be the summary");
    };
    let offset = seen[5].at - reveal_start;
    assert!(offset >= ms(1300) && offset <= ms(1302), "summary at {offset:?}");
    assert_eq!(seen[5].phase, Some(Phase::Summarizing));
    assert_eq!(seen[5].counter, Some(0));
    assert_eq!(seen_summary, &summary);

    assert_shape(&summary);
    assert_eq!(summary.counter, 0);
    assert_eq!(summary.ordinal, 1);
    assert_eq!(h.counter(), 1);
    assert_eq!(h.phase(), Phase::Idle);
    assert_eq!(h.last_summary(), Some(summary));
}

#[tokio::test(start_paused = true)]
async fn counter_waits_for_acknowledgement() {
    let h = handle();
    let presenter = Arc::new(RecordingPresenter::new().acknowledging_after(ms(10_000)));

    let task = {
        let h = h.clone();
        let presenter = Arc::clone(&presenter);
        tokio::spawn(async move { run_cycle(&h, presenter.as_ref(), &NoChime).await })
    };

    // announce 1500 + summary 1300, then well inside the acknowledgement wait.
    tokio::time::sleep(ms(5000)).await;
    assert_eq!(h.phase(), Phase::Summarizing);
    assert_eq!(h.counter(), 0);

    task.await.unwrap().unwrap();
    assert_eq!(h.phase(), Phase::Idle);
    assert_eq!(h.counter(), 1);
}

#[tokio::test(start_paused = true)]
async fn consecutive_cycles_each_hold_invariants() {
    let h = handle();
    let presenter = RecordingPresenter::new();

    let first = run_cycle(&h, &presenter, &NoChime).await.unwrap();
    let second = run_cycle(&h, &presenter, &NoChime).await.unwrap();

    assert_shape(&first);
    assert_shape(&second);
    assert_eq!((first.counter, first.ordinal), (0, 1));
    assert_eq!((second.counter, second.ordinal), (1, 2));
    assert_eq!(h.counter(), 2);
    assert_eq!(h.last_summary(), Some(second));
}

#[tokio::test(start_paused = true)]
async fn same_seed_same_cycle_results() {
    let a = run_cycle(&handle(), &RecordingPresenter::new(), &NoChime).await.unwrap();
    let b = run_cycle(&handle(), &RecordingPresenter::new(), &NoChime).await.unwrap();
    assert_eq!(a.draw, b.draw);
}

#[tokio::test(start_paused = true)]
async fn broken_chime_does_not_disturb_cycle() {
    let h = handle();
    let chime = BrokenChime::new();
    let summary = run_cycle(&h, &RecordingPresenter::new(), &chime).await.unwrap();

    assert_eq!(chime.attempts.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_shape(&summary);
    assert_eq!(h.counter(), 1);
    assert!(h.phase().is_idle());
}

#[tokio::test(start_paused = true)]
async fn abandoned_cycle_returns_to_idle_without_counting() {
    let h = handle();
    let presenter = RecordingPresenter::new();

    // Cut off in the middle of the reveal.
    let result = tokio::time::timeout(ms(1900), run_cycle(&h, &presenter, &NoChime)).await;
    assert!(result.is_err());

    assert_eq!(h.phase(), Phase::Idle);
    assert_eq!(h.counter(), 0);
    assert!(h.last_summary().is_none());
    assert!(h.try_begin().is_ok());
}

// =============================================================================
// share
// =============================================================================

#[tokio::test]
async fn share_before_any_draw_fails() {
    let chain = ShareChain::new().with(FakeShare::new("console", Outcome::Ok));
    let err = share_last(&handle(), &chain).await.unwrap_err();
    assert!(matches!(err, SessionError::NothingToShare));
}

#[tokio::test(start_paused = true)]
async fn share_uses_summary_ordinal() {
    let h = handle();
    run_cycle(&h, &RecordingPresenter::new(), &NoChime).await.unwrap();
    let summary = run_cycle(&h, &RecordingPresenter::new(), &NoChime).await.unwrap();

    let console = FakeShare::new("console", Outcome::Ok);
    let chain = ShareChain::new().with(NoShare).with(console.clone());

    assert_eq!(share_last(&h, &chain).await.unwrap(), Some("console"));
    let received = console.received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    let (title, text) = &received[0];
    assert_eq!(title, crate::export::SHARE_TITLE);
    assert!(text.contains(&summary.draw.to_string()));
    assert!(text.ends_with("Draw #2"));
}

#[tokio::test(start_paused = true)]
async fn share_failure_leaves_session_untouched() {
    let h = handle();
    run_cycle(&h, &RecordingPresenter::new(), &NoChime).await.unwrap();

    let chain = ShareChain::new().with(FakeShare::new("clipboard", Outcome::Fail));
    assert_eq!(share_last(&h, &chain).await.unwrap(), None);
    assert_eq!(h.counter(), 1);
    assert!(h.phase().is_idle());
}
