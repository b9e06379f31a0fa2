//! OTP extraction from raw message bodies.
//!
//! Uses the `lazy-regex` crate so the pattern is validated at compile time
//! and initialized on first use.

// Allow non_std_lazy_statics because the lazy_regex! macro uses once_cell internally
#![allow(clippy::non_std_lazy_statics)]

use lazy_regex::lazy_regex;

/// First run of 4-8 consecutive ASCII digits.
static RE_OTP: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"[0-9]{4,8}");

/// Returns the first run of 4-8 consecutive ASCII digits in `message`.
///
/// Matching is greedy and unanchored: a run of nine or more digits yields
/// its first eight, and a long number early in the text (say, a ten-digit
/// phone number) wins over a shorter code appearing later. Runs under four
/// digits never match. Whether the message looks OTP-related at all is the
/// caller's decision; this function only pulls digits.
#[must_use]
pub fn extract_otp(message: &str) -> Option<&str> {
    RE_OTP.find(message).map(|m| m.as_str())
}
