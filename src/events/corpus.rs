//! Reference event corpus loaded once before a run.
//!
//! `characters.json` maps a character to `{ "event title": ["option rewards", ...] }`.
//! The `"Shared"` key holds character-agnostic events. `supports.json` has the
//! same shape keyed by support card. Document order is preserved.

use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::error::{BotError, BotResult};

pub const SHARED_KEY: &str = "Shared";
pub const CHARACTERS_FILE: &str = "characters.json";
pub const SUPPORTS_FILE: &str = "supports.json";

#[derive(Debug, Clone, PartialEq)]
pub struct EventEntry {
    pub title: String,
    /// Reward text per option, one line per reward
    pub options: Vec<String>,
}

/// Events belonging to one character or one support card.
#[derive(Debug, Clone, PartialEq)]
pub struct EventGroup {
    pub owner: String,
    pub events: Vec<EventEntry>,
}

#[derive(Debug, Default)]
pub struct EventCorpus {
    pub characters: Vec<EventGroup>,
    pub shared: Vec<EventEntry>,
    pub supports: Vec<EventGroup>,
}

impl EventCorpus {
    /// Loads both corpus files from `dir`. Either file missing is a configuration error.
    pub fn load(dir: &Path) -> BotResult<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path).map_err(|e| {
                BotError::ConfigurationMissing(format!("{}: {}", path.display(), e))
            })
        };
        let characters = read(CHARACTERS_FILE)?;
        let supports = read(SUPPORTS_FILE)?;

        let corpus = Self::from_json(&characters, &supports)
            .map_err(|e| BotError::ConfigurationMissing(format!("event corpus: {:#}", e)))?;
        crate::log(&format!(
            "Loaded event corpus: {} characters, {} shared events, {} support cards",
            corpus.characters.len(),
            corpus.shared.len(),
            corpus.supports.len()
        ));
        Ok(corpus)
    }

    pub fn from_json(characters: &str, supports: &str) -> Result<Self> {
        let mut character_groups =
            parse_groups(characters).context("Failed to parse character events")?;
        let supports = parse_groups(supports).context("Failed to parse support card events")?;

        let shared = match character_groups.iter().position(|g| g.owner == SHARED_KEY) {
            Some(idx) => character_groups.remove(idx).events,
            None => Vec::new(),
        };

        Ok(Self {
            characters: character_groups,
            shared,
            supports,
        })
    }

    pub fn event_count(&self) -> usize {
        self.characters.iter().map(|g| g.events.len()).sum::<usize>()
            + self.shared.len()
            + self.supports.iter().map(|g| g.events.len()).sum::<usize>()
    }
}

fn parse_groups(json: &str) -> Result<Vec<EventGroup>> {
    let root: Map<String, Value> = serde_json::from_str(json)?;
    root.into_iter()
        .map(|(owner, events)| {
            let events = parse_events(&owner, events)?;
            Ok(EventGroup { owner, events })
        })
        .collect()
}

fn parse_events(owner: &str, value: Value) -> Result<Vec<EventEntry>> {
    let Value::Object(events) = value else {
        return Err(anyhow!("events for {} are not an object", owner));
    };
    events
        .into_iter()
        .map(|(title, options)| {
            let Value::Array(options) = options else {
                return Err(anyhow!("options for {} / {} are not a list", owner, title));
            };
            let options = options
                .into_iter()
                .map(|o| match o {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect();
            Ok(EventEntry { title, options })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;

    pub(crate) const CHARACTERS: &str = r#"{
        "Special Week": {
            "Special Dreamer": ["Speed +10\nSkill points +15", "Stamina +10"],
            "Hard Worker": ["Power +5"]
        },
        "Shared": {
            "Extra Training": ["Energy -5\nSpeed +5", "Energy +5"]
        },
        "Silence Suzuka": {
            "Silent Runner": ["Speed +20"]
        }
    }"#;

    pub(crate) const SUPPORTS: &str = r#"{
        "Kitasan Black": {
            "Festival Spirit": ["Guts +10", "Wit +10"]
        }
    }"#;

    #[test]
    fn test_shared_is_split_out() {
        let corpus = EventCorpus::from_json(CHARACTERS, SUPPORTS).unwrap();
        assert_eq!(corpus.characters.len(), 2);
        assert_eq!(corpus.shared.len(), 1);
        assert_eq!(corpus.shared[0].title, "Extra Training");
        assert_eq!(corpus.supports.len(), 1);
        assert_eq!(corpus.event_count(), 5);
    }

    #[test]
    fn test_document_order_is_preserved() {
        let corpus = EventCorpus::from_json(CHARACTERS, SUPPORTS).unwrap();
        let owners: Vec<&str> = corpus.characters.iter().map(|g| g.owner.as_str()).collect();
        assert_eq!(owners, vec!["Special Week", "Silence Suzuka"]);
        let titles: Vec<&str> = corpus.characters[0]
            .events
            .iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Special Dreamer", "Hard Worker"]);
    }

    #[test]
    fn test_malformed_corpus_is_rejected() {
        assert!(EventCorpus::from_json(r#"{"A": ["not", "an", "object"]}"#, "{}").is_err());
        assert!(EventCorpus::from_json(r#"{"A": {"E": "not a list"}}"#, "{}").is_err());
    }

    #[test]
    fn test_load_missing_file_is_configuration_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CHARACTERS_FILE), CHARACTERS).unwrap();
        let result = EventCorpus::load(dir.path());
        assert!(matches!(result, Err(BotError::ConfigurationMissing(_))));
    }

    #[test]
    fn test_load_reads_both_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CHARACTERS_FILE), CHARACTERS).unwrap();
        std::fs::write(dir.path().join(SUPPORTS_FILE), SUPPORTS).unwrap();
        let corpus = EventCorpus::load(dir.path()).unwrap();
        assert_eq!(corpus.supports[0].owner, "Kitasan Black");
    }
}
