//! Maps noisy OCR text onto the closest known event title.

use strsim::jaro_winkler;

use super::corpus::{EventCorpus, EventEntry};
use crate::automation::config::EventConfig;
use crate::error::BotResult;

/// Threshold step applied between recognition attempts.
pub const THRESHOLD_STEP: u8 = 5;

/// Where a resolved event came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventSource {
    Character(String),
    Shared,
    Support(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub title: String,
    pub options: Vec<String>,
    /// Similarity in [0, 1]. Zero when nothing matched.
    pub confidence: f64,
    pub source: Option<EventSource>,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            title: String::new(),
            options: Vec::new(),
            confidence: 0.0,
            source: None,
        }
    }
}

/// Which parts of the corpus are searched.
#[derive(Clone, Debug, Default)]
pub struct ResolverScope {
    /// `None` searches every character
    pub character: Option<String>,
    /// `None` searches every support card
    pub support_cards: Option<Vec<String>>,
}

impl ResolverScope {
    pub fn from_config(events: &EventConfig) -> Self {
        let character = if events.select_all_characters || events.character.is_empty() {
            None
        } else {
            Some(events.character.clone())
        };
        let support_cards = if events.select_all_support_cards {
            None
        } else {
            Some(events.support_cards.clone())
        };
        Self {
            character,
            support_cards,
        }
    }
}

/// How repeated recognition attempts are bounded.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub base_threshold: u8,
    pub automatic_retry: bool,
    pub minimum_confidence: f64,
}

/// Applies the known OCR misreads and strips whitespace.
pub fn normalize(raw: &str) -> String {
    let mut text: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '(' => '（',
            ')' => '）',
            other => other,
        })
        .collect();
    if text.ends_with('/') {
        text.pop();
        text.push('！');
    }
    text
}

/// Keeps the highest score seen, replacing on ties.
///
/// Later candidates with a score equal to the current best take its place.
pub fn pick_best<T, I>(scored: I) -> Option<(T, f64)>
where
    I: IntoIterator<Item = (T, f64)>,
{
    let mut best: Option<(T, f64)> = None;
    let mut best_score = 0.0;
    for (item, score) in scored {
        if score >= best_score {
            best_score = score;
            best = Some((item, score));
        }
    }
    best
}

pub struct EventResolver<'a> {
    corpus: &'a EventCorpus,
    scope: ResolverScope,
}

impl<'a> EventResolver<'a> {
    pub fn new(corpus: &'a EventCorpus, scope: ResolverScope) -> Self {
        Self { corpus, scope }
    }

    /// Candidate events in scan order: characters, shared, then support cards.
    fn candidates(&self) -> Vec<(EventSource, &'a EventEntry)> {
        let corpus = self.corpus;
        let mut out = Vec::new();

        for group in &corpus.characters {
            if let Some(name) = &self.scope.character {
                if &group.owner != name {
                    continue;
                }
            }
            for event in &group.events {
                out.push((EventSource::Character(group.owner.clone()), event));
            }
        }

        for event in &corpus.shared {
            out.push((EventSource::Shared, event));
        }

        for group in &corpus.supports {
            if let Some(cards) = &self.scope.support_cards {
                if !cards.contains(&group.owner) {
                    continue;
                }
            }
            for event in &group.events {
                out.push((EventSource::Support(group.owner.clone()), event));
            }
        }
        out
    }

    /// Resolves raw recognized text against the scoped corpus.
    pub fn resolve(&self, raw: &str) -> Resolution {
        let text = normalize(raw);
        if text.is_empty() {
            return Resolution::default();
        }

        let scored = self.candidates().into_iter().map(|(source, event)| {
            let score = jaro_winkler(&text, &event.title);
            ((source, event), score)
        });

        match pick_best(scored) {
            Some(((source, event), confidence)) => Resolution {
                title: event.title.clone(),
                options: event.options.clone(),
                confidence,
                source: Some(source),
            },
            None => Resolution::default(),
        }
    }

    /// Reads and resolves with increasing binarization thresholds.
    ///
    /// `read` receives the threshold increment and returns the recognized text.
    /// The best resolution across attempts is returned.
    pub fn resolve_with_retries<F>(&self, policy: RetryPolicy, mut read: F) -> BotResult<Resolution>
    where
        F: FnMut(u8) -> BotResult<String>,
    {
        let mut best = Resolution::default();
        let mut increment: u8 = 0;

        while 255 - i32::from(policy.base_threshold) - i32::from(increment) > 0 {
            let text = read(increment)?;
            if !text.is_empty() {
                let attempt = self.resolve(&text);
                if attempt.confidence >= best.confidence {
                    best = attempt;
                }
            }

            let needs_retry = text.is_empty() || best.confidence < policy.minimum_confidence;
            if !(policy.automatic_retry && needs_retry) {
                break;
            }
            increment = increment.saturating_add(THRESHOLD_STEP);
        }

        Ok(best)
    }
}
