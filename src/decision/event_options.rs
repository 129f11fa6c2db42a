//! Reward-text scoring for training event options.

use regex::Regex;
use std::sync::LazyLock;

use super::Stat;

static LETTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]+").expect("letter pattern compiles"));

/// Energy lines that cannot be parsed still count for this much.
const ENERGY_FALLBACK: i32 = 10;
const CHAIN_ENDED_PENALTY: i32 = -50;
const RANDOM_OPTIONS_BONUS: i32 = 50;
const PRIORITY_MULTIPLIER: i32 = 4;
const DEFAULT_MULTIPLIER: i32 = 2;

/// Strips words, parentheses and a leading plus, leaving the signed number(s).
fn numeric_part(line: &str) -> String {
    let stripped = LETTERS.replace_all(line, "").replace(['(', ')'], "");
    let trimmed = stripped.trim();
    trimmed.strip_prefix('+').unwrap_or(trimmed).trim().to_string()
}

/// Parses `"10"`, `"-5"` or slash-separated alternatives such as `"5/10"` (summed).
fn parse_value(text: &str) -> Option<i32> {
    let parse_one = |s: &str| {
        let s = s.trim();
        let s = s.strip_prefix('+').unwrap_or(s);
        s.replace(' ', "").parse::<i32>().ok()
    };
    if text.contains('/') {
        text.split('/').map(parse_one).sum()
    } else {
        parse_one(text)
    }
}

/// Weight contributed by one line of reward text.
pub fn score_line(line: &str, priority: &[Stat]) -> i32 {
    let lower = line.to_lowercase();

    if lower.contains("energy") {
        return parse_value(&numeric_part(line)).unwrap_or(ENERGY_FALLBACK);
    }
    if lower.contains("event chain ended") {
        return CHAIN_ENDED_PENALTY;
    }
    if lower.contains("randomly") {
        return RANDOM_OPTIONS_BONUS;
    }
    if lower.contains("skill") || lower.contains("hint") {
        return 0;
    }

    let Some(value) = parse_value(&numeric_part(line)) else {
        return 0;
    };
    let multiplier = if priority.iter().any(|s| s.mentioned_in(line)) {
        PRIORITY_MULTIPLIER
    } else {
        DEFAULT_MULTIPLIER
    };
    value * multiplier
}

/// Sum of line weights for one option's reward text.
pub fn score_option(rewards: &str, priority: &[Stat]) -> i32 {
    rewards
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| score_line(l, priority))
        .sum()
}

/// Picks the option to tap.
///
/// Falls back to option 0 when nothing was resolved, the resolver was not
/// confident enough, or the best option has no on-screen slot.
pub fn choose_event_option(
    weights: &[i32],
    slots: usize,
    confidence: f64,
    minimum_confidence: f64,
) -> usize {
    if weights.is_empty() || confidence < minimum_confidence {
        return 0;
    }

    let mut best = 0;
    for (idx, weight) in weights.iter().enumerate() {
        if *weight > weights[best] {
            best = idx;
        }
    }

    if best >= slots { 0 } else { best }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prioritized_stat_weighs_double() {
        assert_eq!(score_option("Speed +10\nPower +5", &[Stat::Speed]), 50);
    }

    #[test]
    fn test_special_lines() {
        let p = [Stat::Speed];
        assert_eq!(score_line("Energy +10", &p), 10);
        assert_eq!(score_line("Energy -20", &p), -20);
        assert_eq!(score_line("Energy up", &p), ENERGY_FALLBACK);
        assert_eq!(score_line("Event chain ended", &p), -50);
        assert_eq!(score_line("Randomly either", &p), 50);
        assert_eq!(score_line("Skill points +30", &p), 0);
        assert_eq!(score_line("Swinging Maestro hint +1", &p), 0);
    }

    #[test]
    fn test_stat_line_parsing() {
        let p = [Stat::Guts];
        assert_eq!(score_line("Stamina -10", &p), -20);
        assert_eq!(score_line("(Guts +5)", &p), 20);
        assert_eq!(score_line("Wit +5/+5", &p), 20);
        assert_eq!(score_line("Mood up", &p), 0);
    }

    #[test]
    fn test_choose_highest_first_on_tie() {
        assert_eq!(choose_event_option(&[10, 30, 30], 3, 0.9, 0.8), 1);
    }

    #[test]
    fn test_choose_falls_back_to_first() {
        assert_eq!(choose_event_option(&[], 2, 1.0, 0.8), 0);
        assert_eq!(choose_event_option(&[10, 90], 2, 0.5, 0.8), 0);
        // More scored options than slots on screen.
        assert_eq!(choose_event_option(&[10, 20, 90], 2, 0.9, 0.8), 0);
    }
}
