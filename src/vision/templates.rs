//! Named reference images loaded once from the asset directory.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use image::GrayImage;

use crate::error::{BotError, BotResult};

/// Template ids the run cannot proceed without.
pub const REQUIRED_TEMPLATES: &[&str] = &[
    "tazuna",
    "energy",
    "shift",
    "training_option",
    "training_option_circular",
    "training_failure_chance",
    "training_event_active",
    "training_speed",
    "training_stamina",
    "training_power",
    "training_guts",
    "training_wit",
    "speed_training_header",
    "stat_speed",
    "stat_speed_block",
    "stat_stamina_block",
    "stat_power_block",
    "stat_guts_block",
    "stat_wit_block",
    "back",
    "ok",
    "cancel",
    "next",
    "inheritance",
    "complete_career",
    "connecting",
    "now_loading",
    "skill_points",
    "recover_energy",
    "recover_energy_summer",
    "recover_injury",
    "recover_injury_header",
    "recover_mood",
    "recover_mood_date",
    "mood_normal",
    "mood_good",
    "mood_great",
    "race_select_mandatory",
    "race_select_mandatory_goal",
    "race_select_extra",
    "race_select_extra_locked",
    "race_select_extra_locked_uma_finals",
    "race_repeat_warning",
    "race_status",
    "race_selection_fans",
    "race_extra_selection",
    "race_extra_double_prediction",
    "race_confirm",
    "race_change_strategy",
    "race_skip",
    "race_skip_locked",
    "race_skip_manual",
    "race_manual",
    "race_retry",
    "race_accept_trophy",
    "race_end",
    "afk_check",
    "crane_game",
    "connection_error",
];

/// Extra templates needed only by the Ao Haru campaign.
pub const AO_HARU_TEMPLATES: &[&str] = &[
    "aoharu_stat_speed",
    "aoharu_tutorial_header",
    "aoharu_set_initial_team_header",
    "aoharu_race_header",
    "aoharu_race",
    "aoharu_race_option",
    "aoharu_select_race",
    "aoharu_run_race",
    "aoharu_special_training",
    "aoharu_spirit_explosion",
    "race_prediction_double_circle",
];

/// Grayscale templates keyed by file stem.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: HashMap<String, GrayImage>,
}

impl TemplateStore {
    /// Loads every `.png` under `dir` and checks that `required` are all present.
    pub fn load(dir: &Path, required: &[&str]) -> BotResult<Self> {
        let entries = fs::read_dir(dir).map_err(|e| {
            BotError::ConfigurationMissing(format!(
                "template directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut templates = HashMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_png = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            if !is_png {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match image::open(&path) {
                Ok(img) => {
                    templates.insert(stem.to_string(), img.to_luma8());
                }
                Err(e) => {
                    crate::log(&format!("Skipping unreadable template {}: {}", path.display(), e));
                }
            }
        }

        let store = Self { templates };
        store.require(required)?;
        crate::log(&format!(
            "Loaded {} templates from {}",
            store.len(),
            dir.display()
        ));
        Ok(store)
    }

    pub fn from_images<I, S>(images: I) -> Self
    where
        I: IntoIterator<Item = (S, GrayImage)>,
        S: Into<String>,
    {
        Self {
            templates: images.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Fails with the list of every missing id.
    pub fn require(&self, ids: &[&str]) -> BotResult<()> {
        let missing: Vec<&str> = ids
            .iter()
            .copied()
            .filter(|id| !self.templates.contains_key(*id))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BotError::ConfigurationMissing(format!(
                "missing templates: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn get(&self, id: &str) -> Option<&GrayImage> {
        self.templates.get(id)
    }

    /// Width and height of a template, used to bound tap jitter.
    pub fn dimensions(&self, id: &str) -> Option<(u32, u32)> {
        self.templates.get(id).map(|t| t.dimensions())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }
}
