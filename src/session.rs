//! Session — draw counter, cycle state machine, and trigger guard.
//!
//! DESIGN
//! ======
//! One `Session` per user session, shared through a cloneable
//! `SessionHandle` (`Arc<Mutex<_>>`). The lock is never held across an
//! await; each transition is a short critical section.
//!
//! Cycle: `Idle → Drawing → Revealing(0..K-1) → Summarizing → Idle`.
//! `try_begin` is the only way out of `Idle`, so a trigger arriving
//! mid-cycle is rejected with `Busy` instead of queueing. The counter
//! increments on re-entry to `Idle`, after the summary is acknowledged.
//!
//! A cycle future dropped before completion (the caller gave up, the
//! process is shutting down) returns the session to `Idle` without
//! counting the draw.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::draw::{self, DRAW_COUNT, DrawError, POOL_SIZE};
use crate::export;
use crate::ports::{self, Chime, Presenter, ShareChain};
use crate::reveal::{self, CycleEvent, Pacing, Reveal, SummaryEvent};

// =============================================================================
// PHASE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Drawing,
    Revealing { position: usize },
    Summarizing,
}

impl Phase {
    #[must_use]
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a draw is already in progress ({phase:?})")]
    Busy { phase: Phase },
    #[error("nothing to share yet: no draw has completed")]
    NothingToShare,
    #[error(transparent)]
    Draw(#[from] DrawError),
}

impl crate::error::ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Busy { .. } => "E_BUSY",
            Self::NothingToShare => "E_NOTHING_TO_SHARE",
            Self::Draw(e) => crate::error::ErrorCode::error_code(e),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

// =============================================================================
// SESSION
// =============================================================================

pub struct Session {
    rng: StdRng,
    counter: u64,
    phase: Phase,
    last_summary: Option<SummaryEvent>,
}

impl Session {
    #[must_use]
    pub fn new(rng: StdRng) -> Self {
        Self { rng, counter: 0, phase: Phase::Idle, last_summary: None }
    }

    /// Reproducible session: the same seed yields the same sequence of draws.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
    pacing: Pacing,
}

impl SessionHandle {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { inner: Arc::new(Mutex::new(session)), pacing: Pacing::REFERENCE }
    }

    #[must_use]
    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// Completed draws so far.
    #[must_use]
    pub fn counter(&self) -> u64 {
        self.lock().counter
    }

    #[must_use]
    pub fn last_summary(&self) -> Option<SummaryEvent> {
        self.lock().last_summary.clone()
    }

    /// Trigger guard: move `Idle → Drawing` or report the phase in the way.
    ///
    /// # Errors
    ///
    /// `SessionError::Busy` when a cycle is already running.
    pub fn try_begin(&self) -> Result<(), SessionError> {
        let mut session = self.lock();
        if !session.phase.is_idle() {
            return Err(SessionError::Busy { phase: session.phase });
        }
        session.phase = Phase::Drawing;
        Ok(())
    }

    /// Make the draw and enter `Revealing`. Returns the draw's schedule.
    fn draw(&self) -> Result<Reveal, DrawError> {
        let mut session = self.lock();
        let made = draw::draw(POOL_SIZE, DRAW_COUNT, &mut session.rng)?;
        session.phase = Phase::Revealing { position: 0 };
        Ok(Reveal::new(made, session.counter, self.pacing))
    }

    fn observe(&self, event: &CycleEvent) {
        let mut session = self.lock();
        session.phase = match event {
            CycleEvent::Reveal(ev) => Phase::Revealing { position: ev.position },
            CycleEvent::Summary(_) => Phase::Summarizing,
        };
    }

    fn finish(&self, summary: &SummaryEvent) {
        let mut session = self.lock();
        session.counter = session.counter.saturating_add(1);
        session.phase = Phase::Idle;
        session.last_summary = Some(summary.clone());
    }

    fn abandon(&self) {
        let mut session = self.lock();
        session.phase = Phase::Idle;
    }
}

/// Resets the phase if a cycle is dropped midway.
struct CycleGuard<'a> {
    handle: &'a SessionHandle,
    done: bool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            warn!(phase = ?self.handle.phase(), "draw cycle abandoned");
            self.handle.abandon();
        }
    }
}

// =============================================================================
// CYCLE
// =============================================================================

/// Run one full draw cycle: announce, draw, reveal, summary, acknowledge.
///
/// # Errors
///
/// `SessionError::Busy` if a cycle is already running; the draw error if
/// the draw itself is rejected (the session returns to `Idle`).
pub async fn run_cycle(
    handle: &SessionHandle,
    presenter: &dyn Presenter,
    chime: &dyn Chime,
) -> Result<SummaryEvent, SessionError> {
    handle.try_begin()?;
    let mut guard = CycleGuard { handle, done: false };
    let pacing = handle.pacing();

    presenter.announce(&pacing).await;
    tokio::time::sleep(pacing.announce).await;

    let schedule = handle.draw()?;
    ports::chime_best_effort(chime);

    let summary = reveal::play(schedule, presenter, |event| handle.observe(event)).await;

    handle.finish(&summary);
    guard.done = true;
    info!(ordinal = summary.ordinal, draw = %summary.draw, "draw complete");

    Ok(summary)
}

/// Export the most recent summary through `chain`.
///
/// Returns the name of the share target that took it, or `None` when every
/// target failed (already logged).
///
/// # Errors
///
/// `SessionError::NothingToShare` before the first completed draw.
pub async fn share_last(handle: &SessionHandle, chain: &ShareChain) -> Result<Option<&'static str>, SessionError> {
    let summary = handle.last_summary().ok_or(SessionError::NothingToShare)?;
    let text = export::share_text(&summary.draw, summary.counter);
    Ok(chain.share(export::share_title(), &text).await)
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
