//! Scoring for training, event options and races.

pub mod event_options;
pub mod race;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use event_options::{choose_event_option, score_option};
pub use race::{select_race, RaceCandidate};
pub use training::{should_abort, TrainingCycle, TrainingObservation, TrainingRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Speed,
    Stamina,
    Power,
    Guts,
    #[serde(alias = "Intelligence")]
    Wit,
}

impl Stat {
    /// Default ranking, also the on-screen order of the training buttons.
    pub const ALL: [Stat; 5] = [Stat::Speed, Stat::Stamina, Stat::Power, Stat::Guts, Stat::Wit];

    pub fn name(&self) -> &'static str {
        match self {
            Stat::Speed => "Speed",
            Stat::Stamina => "Stamina",
            Stat::Power => "Power",
            Stat::Guts => "Guts",
            Stat::Wit => "Wit",
        }
    }

    /// Spellings that may appear in reward text.
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Stat::Wit => &["wit", "intelligence", "int"],
            Stat::Speed => &["speed"],
            Stat::Stamina => &["stamina"],
            Stat::Power => &["power"],
            Stat::Guts => &["guts"],
        }
    }

    /// True if `line` names this stat.
    pub fn mentioned_in(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        lower
            .split(|c: char| !c.is_ascii_alphabetic())
            .any(|word| self.aliases().contains(&word))
    }

    fn key(&self) -> &'static str {
        match self {
            Stat::Speed => "speed",
            Stat::Stamina => "stamina",
            Stat::Power => "power",
            Stat::Guts => "guts",
            Stat::Wit => "wit",
        }
    }

    /// Training button template for this stat.
    pub fn training_template(&self) -> String {
        format!("training_{}", self.key())
    }

    /// Stat-gain block template shown on a selected training.
    pub fn block_template(&self) -> String {
        format!("stat_{}_block", self.key())
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
