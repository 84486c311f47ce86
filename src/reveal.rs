//! Reveal — the paced, ordered presentation of a draw.
//!
//! DESIGN
//! ======
//! `Reveal` is a finite, one-shot iterator of scheduled events: one
//! `RevealEvent` per drawn value in ascending position order, then exactly
//! one `SummaryEvent`. Each event carries its offset from the start of the
//! reveal; the iterator itself never sleeps.
//!
//! `play` is the single scheduler loop. It sleeps until `start + offset`
//! for each event in turn and presents it before pulling the next one, so
//! events are never reordered or overlapped. Offsets are absolute against
//! the start instant, so slow presenters do not push later events out.

use std::iter::FusedIterator;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tokio::time::Instant;

use crate::draw::Draw;
use crate::ports::Presenter;

const ANNOUNCE_MS: u64 = 1500;
const INTERVAL_MS: u64 = 200;
const SETTLE_MS: u64 = 500;

// =============================================================================
// PACING
// =============================================================================

/// Fixed delays of one draw cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// "Drawing..." pre-roll before the draw is made.
    pub announce: Duration,
    /// Gap between consecutive reveal events.
    pub interval: Duration,
    /// Extra wait after the last reveal before the summary.
    pub settle: Duration,
}

impl Pacing {
    pub const REFERENCE: Self = Self {
        announce: Duration::from_millis(ANNOUNCE_MS),
        interval: Duration::from_millis(INTERVAL_MS),
        settle: Duration::from_millis(SETTLE_MS),
    };

    /// Offset of the reveal at `position`.
    #[must_use]
    pub fn reveal_offset(&self, position: usize) -> Duration {
        self.interval.saturating_mul(u32::try_from(position).unwrap_or(u32::MAX))
    }

    /// Offset of the summary for a draw of `len` values.
    #[must_use]
    pub fn summary_offset(&self, len: usize) -> Duration {
        self.reveal_offset(len.saturating_sub(1)).saturating_add(self.settle)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::REFERENCE
    }
}

// =============================================================================
// EVENTS
// =============================================================================

fn as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// One drawn value made visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevealEvent {
    pub value: u32,
    /// Zero-based position within the draw.
    pub position: usize,
    /// Cumulative delay from the start of the reveal.
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

/// Terminal event of a draw cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEvent {
    pub draw: Draw,
    /// Draw counter at summary time, before this cycle's increment.
    pub counter: u64,
    /// 1-based number of this draw (`counter + 1`).
    pub ordinal: u64,
}

impl SummaryEvent {
    #[must_use]
    pub fn new(draw: Draw, counter: u64) -> Self {
        Self { draw, counter, ordinal: counter.saturating_add(1) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CycleEvent {
    Reveal(RevealEvent),
    Summary(SummaryEvent),
}

/// An event plus the offset at which it becomes observable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub offset: Duration,
    pub event: CycleEvent,
}

// =============================================================================
// REVEAL SEQUENCE
// =============================================================================

/// One-shot schedule for a single draw. Not restartable.
#[derive(Debug)]
pub struct Reveal {
    draw: Draw,
    counter: u64,
    pacing: Pacing,
    position: usize,
    finished: bool,
}

impl Reveal {
    #[must_use]
    pub fn new(draw: Draw, counter: u64, pacing: Pacing) -> Self {
        Self { draw, counter, pacing, position: 0, finished: false }
    }

    /// The summary this sequence ends with, independent of how far it has run.
    #[must_use]
    pub fn summary(&self) -> SummaryEvent {
        SummaryEvent::new(self.draw.clone(), self.counter)
    }

    fn remaining(&self) -> usize {
        if self.finished {
            0
        } else {
            self.draw.len() - self.position + 1
        }
    }
}

impl Iterator for Reveal {
    type Item = ScheduledEvent;

    fn next(&mut self) -> Option<ScheduledEvent> {
        if self.finished {
            return None;
        }

        if let Some(&value) = self.draw.values().get(self.position) {
            let position = self.position;
            self.position += 1;
            let offset = self.pacing.reveal_offset(position);
            return Some(ScheduledEvent {
                offset,
                event: CycleEvent::Reveal(RevealEvent { value, position, elapsed: offset }),
            });
        }

        self.finished = true;
        Some(ScheduledEvent {
            offset: self.pacing.summary_offset(self.draw.len()),
            event: CycleEvent::Summary(self.summary()),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Reveal {}

impl FusedIterator for Reveal {}

// =============================================================================
// DRIVER
// =============================================================================

/// Drive `reveal` on the current task, presenting each event at its offset.
///
/// `observe` runs just before each event is handed to the presenter, which
/// lets the caller track which phase the cycle is in. Returns once the
/// presenter has acknowledged the summary.
pub async fn play<F>(mut reveal: Reveal, presenter: &dyn Presenter, mut observe: F) -> SummaryEvent
where
    F: FnMut(&CycleEvent) + Send,
{
    let start = Instant::now();

    for scheduled in reveal.by_ref() {
        tokio::time::sleep_until(start + scheduled.offset).await;
        observe(&scheduled.event);

        match scheduled.event {
            CycleEvent::Reveal(ev) => {
                tracing::debug!(position = ev.position, value = ev.value, "reveal");
                presenter.present_reveal(&ev).await;
            }
            CycleEvent::Summary(summary) => {
                tracing::debug!(ordinal = summary.ordinal, "summary");
                presenter.present_summary(&summary).await;
                return summary;
            }
        }
    }

    // Already drained by an earlier caller: the summary is still well defined.
    reveal.summary()
}

#[cfg(test)]
#[path = "reveal_test.rs"]
mod tests;
