//! dutydraw — fair random cleaning-duty draw.
//!
//! Picks 5 distinct numbers from 1..=24, reveals them one at a time on a
//! fixed beat, and ends each cycle with a summary that can be shared.
//!
//! - [`draw`]: sampling without replacement.
//! - [`reveal`]: the paced reveal schedule and its driver.
//! - [`session`]: draw counter, cycle state machine, trigger guard.
//! - [`export`]: share text.
//! - [`ports`]: presenter, chime, and share-target traits.
//! - [`terminal`]: terminal implementations of the ports.

pub mod config;
pub mod draw;
pub mod error;
pub mod export;
pub mod ports;
pub mod reveal;
pub mod session;
pub mod terminal;

#[cfg(test)]
mod testing;
