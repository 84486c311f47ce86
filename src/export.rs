//! Share text for a completed draw. Pure formatting, no side effects.

use crate::draw::Draw;

pub const SHARE_TITLE: &str = "Cleaning duty draw result";

#[must_use]
pub fn share_title() -> &'static str {
    SHARE_TITLE
}

/// Human-readable summary of `draw`.
///
/// `counter` is the draw counter at summary time, before the cycle's own
/// increment; the text shows the 1-based ordinal `counter + 1`.
#[must_use]
pub fn share_text(draw: &Draw, counter: u64) -> String {
    format!(
        "{SHARE_TITLE}\nSelected numbers: {draw}\nDraw #{}",
        counter.saturating_add(1)
    )
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
