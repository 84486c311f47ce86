//! Test doubles for the capability ports.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::ports::{Chime, PortError, Presenter, ShareTarget};
use crate::reveal::{CycleEvent, Pacing, RevealEvent, SummaryEvent};
use crate::session::{Phase, SessionHandle};

/// What a presenter saw, when, and what the session looked like at that moment.
#[derive(Debug, Clone)]
pub struct Seen {
    pub at: Duration,
    pub event: CycleEvent,
    pub phase: Option<Phase>,
    pub counter: Option<u64>,
}

pub struct RecordingPresenter {
    origin: Instant,
    seen: Mutex<Vec<Seen>>,
    announced: AtomicUsize,
    session: Option<SessionHandle>,
    ack_delay: Duration,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            seen: Mutex::new(Vec::new()),
            announced: AtomicUsize::new(0),
            session: None,
            ack_delay: Duration::ZERO,
        }
    }

    /// Snapshot this session's phase and counter on every event.
    pub fn watching(mut self, session: SessionHandle) -> Self {
        self.session = Some(session);
        self
    }

    /// Hold the summary unacknowledged for `delay`.
    pub fn acknowledging_after(mut self, delay: Duration) -> Self {
        self.ack_delay = delay;
        self
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn origin_elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    pub fn announced(&self) -> usize {
        self.announced.load(Ordering::SeqCst)
    }

    fn record(&self, event: CycleEvent) {
        let entry = Seen {
            at: self.origin.elapsed(),
            event,
            phase: self.session.as_ref().map(SessionHandle::phase),
            counter: self.session.as_ref().map(SessionHandle::counter),
        };
        self.seen.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn announce(&self, _pacing: &Pacing) {
        self.announced.fetch_add(1, Ordering::SeqCst);
    }

    async fn present_reveal(&self, event: &RevealEvent) {
        self.record(CycleEvent::Reveal(event.clone()));
    }

    async fn present_summary(&self, event: &SummaryEvent) {
        self.record(CycleEvent::Summary(event.clone()));
        if !self.ack_delay.is_zero() {
            tokio::time::sleep(self.ack_delay).await;
        }
    }
}

pub struct BrokenChime {
    pub attempts: AtomicUsize,
}

impl BrokenChime {
    pub fn new() -> Self {
        Self { attempts: AtomicUsize::new(0) }
    }
}

impl Chime for BrokenChime {
    fn play(&self) -> Result<(), PortError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(PortError::Failed { target: "chime", message: "no audio device".into() })
    }
}

#[derive(Clone, Copy)]
pub enum Outcome {
    Ok,
    Unsupported,
    Fail,
}

/// Share target with a scripted outcome that records what it was given.
#[derive(Clone)]
pub struct FakeShare {
    pub name: &'static str,
    pub outcome: Outcome,
    pub received: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeShare {
    pub fn new(name: &'static str, outcome: Outcome) -> Self {
        Self { name, outcome, received: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn calls(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

#[async_trait]
impl ShareTarget for FakeShare {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn share(&self, title: &str, text: &str) -> Result<(), PortError> {
        self.received.lock().unwrap().push((title.to_string(), text.to_string()));
        match self.outcome {
            Outcome::Ok => Ok(()),
            Outcome::Unsupported => Err(PortError::Unsupported("fake")),
            Outcome::Fail => Err(PortError::Failed { target: self.name, message: "boom".into() }),
        }
    }
}
