//! Capability ports — presentation, audio cue, and share targets.
//!
//! DESIGN
//! ======
//! The draw cycle talks to the outside world only through these traits.
//! `Presenter` is required; `Chime` and `ShareTarget` are best-effort. Their
//! failures are logged and swallowed and never reach the session's state.
//!
//! `ShareChain` mirrors the "native share → clipboard → show the text"
//! fallback: targets are tried in order until one succeeds.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::reveal::{Pacing, RevealEvent, SummaryEvent};

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("{0} is not available here")]
    Unsupported(&'static str),
    #[error("{target} failed: {message}")]
    Failed { target: &'static str, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl crate::error::ErrorCode for PortError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unsupported(_) => "E_UNSUPPORTED",
            Self::Failed { .. } => "E_PORT_FAILED",
            Self::Io(_) => "E_IO",
        }
    }
}

// =============================================================================
// TRAITS
// =============================================================================

/// Renders cycle events to the user.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Called when a cycle starts, before the announce pre-roll.
    async fn announce(&self, _pacing: &Pacing) {}

    async fn present_reveal(&self, event: &RevealEvent);

    /// Resolves once the summary has been acknowledged (or dismissed).
    async fn present_summary(&self, event: &SummaryEvent);
}

/// Audio cue played when the reveal begins.
pub trait Chime: Send + Sync {
    /// # Errors
    ///
    /// Any failure; callers log and ignore it.
    fn play(&self) -> Result<(), PortError>;
}

/// One way of handing share text to the user.
#[async_trait]
pub trait ShareTarget: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// `PortError::Unsupported` when the capability is absent; anything else
    /// when it was attempted and failed.
    async fn share(&self, title: &str, text: &str) -> Result<(), PortError>;
}

// =============================================================================
// NULL OBJECTS
// =============================================================================

/// Presenter that discards everything and acknowledges immediately.
pub struct SilentPresenter;

#[async_trait]
impl Presenter for SilentPresenter {
    async fn present_reveal(&self, _event: &RevealEvent) {}

    async fn present_summary(&self, _event: &SummaryEvent) {}
}

pub struct NoChime;

impl Chime for NoChime {
    fn play(&self) -> Result<(), PortError> {
        Ok(())
    }
}

/// Stand-in for a platform share sheet; never available.
pub struct NoShare;

#[async_trait]
impl ShareTarget for NoShare {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn share(&self, _title: &str, _text: &str) -> Result<(), PortError> {
        Err(PortError::Unsupported("native share"))
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Play the chime, logging instead of failing.
pub fn chime_best_effort(chime: &dyn Chime) {
    if let Err(e) = chime.play() {
        warn!(error = %e, "chime failed");
    }
}

// =============================================================================
// SHARE CHAIN
// =============================================================================

#[derive(Default)]
pub struct ShareChain {
    targets: Vec<Box<dyn ShareTarget>>,
}

impl ShareChain {
    #[must_use]
    pub fn new() -> Self {
        Self { targets: Vec::new() }
    }

    #[must_use]
    pub fn with(mut self, target: impl ShareTarget + 'static) -> Self {
        self.targets.push(Box::new(target));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Try each target in order. Returns the name of the first that succeeded.
    pub async fn share(&self, title: &str, text: &str) -> Option<&'static str> {
        for target in &self.targets {
            match target.share(title, text).await {
                Ok(()) => {
                    debug!(target = target.name(), "shared");
                    return Some(target.name());
                }
                Err(PortError::Unsupported(what)) => {
                    debug!(target = target.name(), %what, "share target unsupported, falling back");
                }
                Err(e) => {
                    warn!(target = target.name(), error = %e, "share target failed, falling back");
                }
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "ports_test.rs"]
mod tests;
