use regex::Regex;
use std::sync::LazyLock;

/// A whole field of digits, nothing else.
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("digit pattern compiles"));

/// Decoration the fan-count label carries around its number.
const FAN_NOISE: &[&str] = &[",", ".", "+", "-", ">", "<", "(", ")", "人", "ォ", "fans"];

fn parse_digits(text: &str) -> Option<i32> {
    let text = text.trim();
    if DIGITS.is_match(text) {
        text.parse().ok()
    } else {
        None
    }
}

/// Parses a failure-chance label such as `"12%"`.
///
/// Unreadable text counts as 0; only a missing anchor yields -1 upstream.
pub fn parse_percentage(text: &str) -> i32 {
    parse_digits(&text.replace('%', "")).unwrap_or(0)
}

/// Parses a fan-gain label such as `"+1,800 fans"`. Returns -1 if unreadable.
pub fn parse_fans(text: &str) -> i32 {
    let mut cleaned = text.to_string();
    for noise in FAN_NOISE {
        cleaned = cleaned.replace(noise, "");
    }
    parse_digits(&cleaned).unwrap_or(-1)
}

/// Parses a bare integer field (day number, skill points). Returns -1 if unreadable.
pub fn parse_count(text: &str) -> i32 {
    parse_digits(text).unwrap_or(-1)
}
