//! Stable error codes shared by every error enum in the crate.
//!
//! Codes are grepable (`E_INVALID_ARGUMENT`) and survive message rewording,
//! so the front end prints them alongside the human-readable text.

/// Grepable error code and retryable flag.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Render an error as `E_CODE: message`.
pub fn describe(err: &dyn ErrorCode) -> String {
    format!("{}: {err}", err.error_code())
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
