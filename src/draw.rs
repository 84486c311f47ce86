//! Draw — sampling without replacement from the pool `1..=N`.
//!
//! DESIGN
//! ======
//! A working set starts as the full pool. Each pick takes a uniform index
//! into what remains and removes that element, so no value can repeat.
//! Removal is O(N) per pick; N and K are small constants, so the simple
//! `Vec::remove` beats anything cleverer. The picks are sorted before the
//! `Draw` is handed out.
//!
//! `Draw` can only be built here, so every value of the type upholds the
//! invariant: exactly K distinct values in `[1, N]`, ascending.

use std::fmt;

use rand::Rng;
use serde::Serialize;

/// Size of the reference pool: candidates are `1..=24`.
pub const POOL_SIZE: usize = 24;

/// Number of values picked per draw in the reference setup.
pub const DRAW_COUNT: usize = 5;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error("invalid argument: cannot draw {count} from a pool of {pool_size} (need 1 <= count <= pool size)")]
    InvalidArgument { pool_size: usize, count: usize },
}

impl crate::error::ErrorCode for DrawError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "E_INVALID_ARGUMENT",
        }
    }
}

// =============================================================================
// DRAW
// =============================================================================

/// One completed selection, sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Draw(Vec<u32>);

impl Draw {
    #[must_use]
    pub fn values(&self) -> &[u32] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

#[cfg(test)]
impl Draw {
    /// Build a draw from known values. Callers must pass sorted, distinct values.
    pub(crate) fn fixed(values: &[u32]) -> Self {
        Self(values.to_vec())
    }
}

impl fmt::Display for Draw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

/// Pick `count` distinct values from `1..=pool_size`, sorted ascending.
///
/// # Errors
///
/// Returns [`DrawError::InvalidArgument`] when `count` is zero or exceeds
/// `pool_size`. No partial draw is produced.
pub fn draw<R>(pool_size: usize, count: usize, rng: &mut R) -> Result<Draw, DrawError>
where
    R: Rng + ?Sized,
{
    if count == 0 || count > pool_size {
        return Err(DrawError::InvalidArgument { pool_size, count });
    }
    let Ok(top) = u32::try_from(pool_size) else {
        return Err(DrawError::InvalidArgument { pool_size, count });
    };

    let mut available: Vec<u32> = (1..=top).collect();
    let mut picked = Vec::with_capacity(count);
    for _ in 0..count {
        let idx = rng.random_range(0..available.len());
        picked.push(available.remove(idx));
    }
    picked.sort_unstable();

    Ok(Draw(picked))
}

#[cfg(test)]
#[path = "draw_test.rs"]
mod tests;
