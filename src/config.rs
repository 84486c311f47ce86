//! Runtime configuration parsed from environment variables.
//!
//! Pool size, draw count, and pacing are fixed; only the surroundings of the
//! draw are configurable. Unparseable values fall back to the default
//! rather than failing startup.

use std::path::PathBuf;

pub const ENV_SEED: &str = "DUTYDRAW_SEED";
pub const ENV_CHIME: &str = "DUTYDRAW_CHIME";
pub const ENV_SHARE_FILE: &str = "DUTYDRAW_SHARE_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Fixed RNG seed for reproducible draws; OS entropy when absent.
    pub seed: Option<u64>,
    /// Ring the terminal bell when the reveal begins.
    pub chime: bool,
    /// Extra share target: write the share text to this file.
    pub share_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self { seed: None, chime: true, share_file: None }
    }
}

impl Config {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `DUTYDRAW_SEED`: `u64` seed
    /// - `DUTYDRAW_CHIME`: `1/true/yes/on` or `0/false/no/off` (default on)
    /// - `DUTYDRAW_SHARE_FILE`: path for the file share target
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let seed = lookup(ENV_SEED).and_then(|v| v.trim().parse::<u64>().ok());
        let chime = lookup(ENV_CHIME)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.chime);
        let share_file = lookup(ENV_SHARE_FILE)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self { seed, chime, share_file }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
