//! Configuration types for a career run.
//!
//! Loads settings from config.json at startup. Every field carries a default,
//! so a partial file (or no file at all) still yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::decision::Stat;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<BotConfig> = OnceLock::new();

/// Which campaign ruleset drives the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Campaign {
    #[default]
    #[serde(alias = "URA Finale")]
    Normal,
    #[serde(alias = "Ao Haru")]
    AoHaru,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Stats that are never trained
    #[serde(default)]
    pub blacklist: Vec<Stat>,
    /// Ranked stats, highest first. Empty means the default ranking.
    #[serde(default)]
    pub stat_priority: Vec<Stat>,
    /// Speed failure chance (%) above which the cycle recovers energy instead
    #[serde(default = "default_maximum_failure_chance")]
    pub maximum_failure_chance: i32,
}

fn default_maximum_failure_chance() -> i32 {
    15
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            blacklist: Vec::new(),
            stat_priority: Vec::new(),
            maximum_failure_chance: default_maximum_failure_chance(),
        }
    }
}

impl TrainingConfig {
    /// Priority list with the default ranking applied when unset.
    pub fn effective_priority(&self) -> Vec<Stat> {
        if self.stat_priority.is_empty() {
            Stat::ALL.to_vec()
        } else {
            self.stat_priority.clone()
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(default)]
    pub character: String,
    #[serde(default = "default_true")]
    pub select_all_characters: bool,
    #[serde(default)]
    pub support_cards: Vec<String>,
    #[serde(default = "default_true")]
    pub select_all_support_cards: bool,
    /// Minimum resolver confidence in percent
    #[serde(default = "default_minimum_confidence")]
    pub minimum_confidence: u8,
}

fn default_minimum_confidence() -> u8 {
    80
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            character: String::new(),
            select_all_characters: true,
            support_cards: Vec::new(),
            select_all_support_cards: true,
            minimum_confidence: default_minimum_confidence(),
        }
    }
}

impl EventConfig {
    pub fn minimum_confidence_ratio(&self) -> f64 {
        f64::from(self.minimum_confidence) / 100.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Base binarization threshold (0-255)
    #[serde(default = "default_ocr_threshold")]
    pub threshold: u8,
    #[serde(default = "default_true")]
    pub enable_automatic_retry: bool,
    /// Tesseract language code
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_ocr_threshold() -> u8 {
    230
}

fn default_language() -> String {
    "eng".to_string()
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            threshold: default_ocr_threshold(),
            enable_automatic_retry: true,
            language: default_language(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RacingConfig {
    #[serde(default)]
    pub enable_farming_fans: bool,
    /// Run an extra race whenever the remaining day count is a multiple of this
    #[serde(default = "default_days_to_run_extra_races")]
    pub days_to_run_extra_races: i32,
    /// Shared retry budget for failed races
    #[serde(default = "default_race_retries")]
    pub race_retries: u32,
}

fn default_days_to_run_extra_races() -> i32 {
    4
}

fn default_race_retries() -> u32 {
    3
}

impl Default for RacingConfig {
    fn default() -> Self {
        Self {
            enable_farming_fans: false,
            days_to_run_extra_races: default_days_to_run_extra_races(),
            race_retries: default_race_retries(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StopConfig {
    #[serde(default)]
    pub enable_skill_point_check: bool,
    #[serde(default = "default_skill_point_check")]
    pub skill_point_check: i32,
    #[serde(default)]
    pub enable_popup_check: bool,
    #[serde(default)]
    pub enable_stop_on_mandatory_race: bool,
}

fn default_skill_point_check() -> i32 {
    750
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            enable_skill_point_check: false,
            skill_point_check: default_skill_point_check(),
            enable_popup_check: false,
            enable_stop_on_mandatory_race: false,
        }
    }
}

/// Device connection and capture settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_adb_path")]
    pub adb_path: String,
    /// adb serial, if more than one device is attached
    #[serde(default)]
    pub serial: Option<String>,
    /// Template scale for devices that are not 1080 pixels wide
    #[serde(default = "default_template_scale")]
    pub template_scale: f32,
}

fn default_adb_path() -> String {
    "adb".to_string()
}

fn default_template_scale() -> f32 {
    1.0
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: default_adb_path(),
            serial: None,
            template_scale: default_template_scale(),
        }
    }
}

/// Complete bot configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub campaign: Campaign,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub events: EventConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub racing: RacingConfig,
    #[serde(default)]
    pub stops: StopConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    /// Log every probe
    #[serde(default)]
    pub debug_mode: bool,
}

fn default_true() -> bool {
    true
}

impl BotConfig {
    /// Lines describing the effective settings, printed at the start of a run.
    pub fn summary_lines(&self) -> Vec<String> {
        let names = |stats: &[Stat]| {
            stats
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let character = if self.events.select_all_characters {
            "All Characters".to_string()
        } else {
            self.events.character.clone()
        };
        let supports = if self.events.select_all_support_cards {
            "All Support Cards".to_string()
        } else {
            self.events.support_cards.join(", ")
        };

        vec![
            format!("Campaign: {:?}", self.campaign),
            format!("Character: {}", character),
            format!("Support(s): {}", supports),
            format!("Training Blacklist: [{}]", names(&self.training.blacklist)),
            format!(
                "Stat Prioritization: [{}]",
                names(&self.training.effective_priority())
            ),
            format!(
                "Maximum Failure Chance Allowed: {}%",
                self.training.maximum_failure_chance
            ),
            format!("Minimum Confidence: {}%", self.events.minimum_confidence),
            format!(
                "OCR Threshold: {} (automatic retry: {})",
                self.ocr.threshold, self.ocr.enable_automatic_retry
            ),
            format!(
                "Farming Fans: {} (every {} days)",
                self.racing.enable_farming_fans, self.racing.days_to_run_extra_races
            ),
            format!(
                "Skill Point Stop: {} ({} points)",
                self.stops.enable_skill_point_check, self.stops.skill_point_check
            ),
            format!("Popup Check: {}", self.stops.enable_popup_check),
            format!(
                "Stop on Mandatory Race: {}",
                self.stops.enable_stop_on_mandatory_race
            ),
            format!("Template Scale: {}", self.device.template_scale),
        ]
    }
}

/// Loads configuration from config.json or returns defaults.
/// Looks for config.json in the same directory as the executable.
fn load_config() -> BotConfig {
    let config_path = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("config.json")))
        .unwrap_or_else(|| Path::new("config.json").to_path_buf());

    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(&config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    BotConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config());
}

/// Returns the global configuration, falling back to defaults if
/// `init_config()` was never called.
pub fn get_config() -> &'static BotConfig {
    CONFIG.get_or_init(BotConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: BotConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.campaign, Campaign::Normal);
        assert_eq!(config.training.maximum_failure_chance, 15);
        assert_eq!(config.events.minimum_confidence, 80);
        assert_eq!(config.ocr.threshold, 230);
        assert!(config.ocr.enable_automatic_retry);
        assert_eq!(config.racing.days_to_run_extra_races, 4);
        assert_eq!(config.racing.race_retries, 3);
        assert_eq!(config.stops.skill_point_check, 750);
        assert!(config.events.select_all_characters);
        assert!(config.events.select_all_support_cards);
        assert_eq!(config.device.template_scale, 1.0);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let json = r#"{ "training": { "blacklist": ["Guts"] }, "campaign": "Ao Haru" }"#;
        let config: BotConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.training.blacklist, vec![Stat::Guts]);
        assert_eq!(config.training.maximum_failure_chance, 15);
        assert_eq!(config.campaign, Campaign::AoHaru);
    }

    #[test]
    fn test_effective_priority_defaults_when_empty() {
        let training = TrainingConfig::default();
        assert_eq!(
            training.effective_priority(),
            vec![Stat::Speed, Stat::Stamina, Stat::Power, Stat::Guts, Stat::Wit]
        );
    }

    #[test]
    fn test_intelligence_alias() {
        let json = r#"{ "stat_priority": ["Intelligence", "Speed"] }"#;
        let training: TrainingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(training.effective_priority(), vec![Stat::Wit, Stat::Speed]);
    }

    #[test]
    fn test_summary_mentions_priority() {
        let config = BotConfig::default();
        let lines = config.summary_lines();
        assert!(lines
            .iter()
            .any(|l| l == "Stat Prioritization: [Speed, Stamina, Power, Guts, Wit]"));
    }
}
