//! Training event handling.

use crate::automation::journal::DecisionKind;
use crate::automation::state::CareerRun;
use crate::decision::{choose_event_option, score_option};
use crate::error::BotResult;
use crate::events::RetryPolicy;
use crate::vision::Region;

/// Horizontal offset from the option marker to its label.
const OPTION_LABEL_OFFSET: i32 = 100;

impl CareerRun<'_> {
    /// Reads the event title, scores its options and taps the best one.
    pub(crate) fn handle_training_event(&mut self) -> BotResult<()> {
        self.print("\n[TRAINING-EVENT] Starting Training Event process...");
        let config = self.config;

        let policy = RetryPolicy {
            base_threshold: config.ocr.threshold,
            automatic_retry: config.ocr.enable_automatic_retry,
            minimum_confidence: config.events.minimum_confidence_ratio(),
        };
        let vision = self.vision;
        let resolution = self
            .resolver
            .resolve_with_retries(policy, |increment| vision.read_event_title(increment))?;

        // The event may have closed on its own while the title was being read.
        if self.check_main_screen()? {
            return Ok(());
        }

        if resolution.options.is_empty() {
            self.print("[TRAINING-EVENT] First option will be selected since OCR failed to detect anything.");
        } else {
            self.print(&format!(
                "[TRAINING-EVENT] Detected \"{}\" with {:.2}% confidence.",
                resolution.title,
                resolution.confidence * 100.0
            ));
        }

        let priority = config.training.effective_priority();
        let weights: Vec<i32> = resolution
            .options
            .iter()
            .map(|rewards| score_option(rewards, &priority))
            .collect();
        for (idx, weight) in weights.iter().enumerate() {
            self.print(&format!("Option {}: {}", idx + 1, weight));
        }

        let g = self.geometry();
        let slots = self.vision.find_all("training_event_active", Region::FULL)?;
        let minimum = config.events.minimum_confidence_ratio();
        let selected = choose_event_option(&weights, slots.len(), resolution.confidence, minimum);
        if !weights.is_empty() && resolution.confidence < minimum {
            self.print("[TRAINING-EVENT] Since the confidence was less than the set minimum, first option will be selected.");
        } else if let Some(rewards) = resolution.options.get(selected) {
            self.print(&format!(
                "[TRAINING-EVENT] The bot will select Option {}: \"{}\" with a selection weight of {}.",
                selected + 1,
                rewards,
                weights[selected]
            ));
        }

        let location = match slots.get(selected).or(slots.first()) {
            Some(point) => Some(*point),
            None => self.vision.find("training_event_active", 5, g.middle())?,
        };
        if let Some(point) = location {
            self.tap(
                point.offset(g.rel(OPTION_LABEL_OFFSET), 0),
                "training_event_active",
                1,
            )?;
            self.journal.record(
                DecisionKind::EventOption,
                &(selected + 1).to_string(),
                weights.get(selected).copied().unwrap_or(0),
                &resolution.title,
            );
        }

        self.print("[TRAINING-EVENT] Process to handle detected Training Event completed.");
        Ok(())
    }
}
