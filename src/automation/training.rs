//! Training selection and the recovery actions taken from the Main screen.

use std::fmt;
use std::time::Duration;

use crate::automation::config::Campaign;
use crate::automation::journal::DecisionKind;
use crate::automation::state::CareerRun;
use crate::decision::{should_abort, Stat, TrainingCycle, TrainingObservation};
use crate::error::BotResult;
use crate::vision::{Point, ScreenGeometry};

/// Infirmary button tint when an injury can actually be treated.
const INJURY_TINT: [u8; 3] = [151, 105, 243];
const INJURY_TINT_TOLERANCE: u8 = 10;
/// Vertical distance from each training's stat label to its button.
const TRAINING_BUTTON_DY: f64 = 319.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Bad,
    Normal,
    Good,
    Great,
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mood::Bad => write!(f, "Bad/Awful"),
            Mood::Normal => write!(f, "Normal"),
            Mood::Good => write!(f, "Good"),
            Mood::Great => write!(f, "Great"),
        }
    }
}

/// Where the training button for `stat` sits relative to the Speed stat label.
fn training_button(g: ScreenGeometry, anchor: Point, stat: Stat) -> Point {
    let dx = match stat {
        Stat::Speed => 0.0,
        Stat::Stamina => 280.0,
        Stat::Power => 402.0,
        Stat::Guts => 591.0,
        Stat::Wit => 779.0,
    };
    let (sx, sy) = match (g.is_wide(), stat) {
        (false, _) => (1.0, 1.0),
        (true, Stat::Stamina) => (1.05, 1.5),
        (true, _) => (1.36, 1.5),
    };
    anchor.offset(
        g.rel((dx * sx) as i32),
        g.rel_y((TRAINING_BUTTON_DY * sy) as i32),
    )
}

impl CareerRun<'_> {
    pub(crate) fn handle_training(&mut self) -> BotResult<()> {
        self.print("\n[TRAINING] Starting Training process...");
        let g = self.geometry();
        if !self.find_and_tap("training_option", 3, g.bottom_half())? {
            self.print("[ERROR] Cannot start the Training process. Moving on...");
            return Ok(());
        }

        let cycle = self.observe_trainings()?;
        if cycle.is_empty() {
            self.print("[TRAINING] Backing out of Training and returning on the Main screen.");
            self.find_and_tap("back", 3, g.bottom_half())?;
            self.wait(Duration::from_secs(1))?;
            if self.check_main_screen()? {
                self.print("[TRAINING] Will recover energy due to either failure chance was high enough to do so or no failure chances were detected via OCR.");
                self.recover_energy()?;
            } else {
                self.print("[ERROR] Could not head back to the Main screen in order to recover energy.");
            }
        } else {
            self.execute_training(&cycle)?;
            self.session.first_training_cycle = false;
        }

        self.session.race_repeat_warning = false;
        self.print("\n[TRAINING] Training process completed.");
        Ok(())
    }

    /// Reads failure chance and gain for every allowed training.
    ///
    /// Empty when the Speed check aborts the cycle.
    fn observe_trainings(&mut self) -> BotResult<TrainingCycle> {
        let config = self.config;
        let g = self.geometry();
        let campaign = config.campaign;

        let label = match campaign {
            Campaign::AoHaru => "aoharu_stat_speed",
            Campaign::Normal => "stat_speed",
        };
        let Some(anchor) = self.vision.find(label, 3, g.bottom_half())? else {
            self.print("[ERROR] Unable to find the Speed stat label on the Training screen.");
            return Ok(TrainingCycle::default());
        };

        if !self.vision.confirm("speed_training", 5, g.top_half())? {
            self.find_and_tap("training_speed", 3, g.bottom_half())?;
        }

        let speed_failure = self.vision.read_failure_chance()?;
        let maximum = config.training.maximum_failure_chance;
        if speed_failure == -1 {
            self.print("[WARNING] Skipping training due to not being able to confirm whether or not the bot is at the Training screen.");
            return Ok(TrainingCycle::default());
        }
        if should_abort(speed_failure, maximum) {
            self.print(&format!(
                "[TRAINING] {}% is not within acceptable range of {}%. Proceeding to recover energy.",
                speed_failure, maximum
            ));
            return Ok(TrainingCycle::default());
        }
        self.print(&format!(
            "[TRAINING] {}% within acceptable range of {}%. Proceeding to acquire all other percentages and total stat increases...",
            speed_failure, maximum
        ));

        let blacklist = &config.training.blacklist;
        let mut observations = Vec::new();
        for stat in Stat::ALL {
            if blacklist.contains(&stat) {
                continue;
            }
            let failure_chance = if stat == Stat::Speed {
                speed_failure
            } else {
                self.tap(training_button(g, anchor, stat), "training_option_circular", 1)?;
                self.vision.read_failure_chance()?
            };
            let stat_gain = self.vision.stat_gain(stat, campaign)?;
            self.print(&format!(
                "[TRAINING] {} can gain ~{} with {}% to fail.",
                stat, stat_gain, failure_chance
            ));
            observations.push(TrainingObservation {
                stat,
                failure_chance,
                stat_gain,
            });
        }

        Ok(TrainingCycle::score(
            &observations,
            &config.training.effective_priority(),
            blacklist,
            self.session.previously_selected,
        ))
    }

    fn execute_training(&mut self, cycle: &TrainingCycle) -> BotResult<()> {
        let Some(best) = cycle.select().copied() else {
            return Ok(());
        };

        self.print("\n[INFO] Calculated Stat Weight by Training:");
        for record in &cycle.records {
            self.print(&format!(
                "{}: {} for {}%",
                record.stat, record.weight, record.failure_chance
            ));
        }

        self.print(&format!("[TRAINING] Executing the {} Training.", best.stat));
        let g = self.geometry();
        self.find_and_tap_times(&best.stat.training_template(), 3, g.bottom_half(), 3)?;
        self.session.previously_selected = Some(best.stat);
        self.journal.record(
            DecisionKind::Training,
            best.stat.name(),
            best.weight,
            &format!("failure {}%, gain {}", best.failure_chance, best.stat_gain),
        );
        Ok(())
    }

    /// Rests at the infirmary when the injury button is lit.
    pub(crate) fn check_injury(&mut self) -> BotResult<bool> {
        let g = self.geometry();
        let lit = match self.vision.find("recover_injury", 1, g.bottom_half())? {
            Some(button) => self
                .vision
                .color_matches(button.offset(0, 15), INJURY_TINT, INJURY_TINT_TOLERANCE)?,
            None => false,
        };
        if !lit {
            self.print("\n[INFO] No injury detected.");
            return Ok(false);
        }

        if !self.find_and_tap("recover_injury", 1, g.bottom_half())? {
            self.print("\n[WARNING] Injury detected but attempt to rest failed.");
            return Ok(false);
        }
        self.wait(Duration::from_millis(300))?;
        if self.vision.confirm("recover_injury", 1, g.middle())? {
            self.print("\n[INFO] Injury detected and attempted to heal.");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn detect_mood(&self) -> BotResult<Mood> {
        let top = self.geometry().top_half();
        for (template, mood) in [
            ("mood_normal", Mood::Normal),
            ("mood_good", Mood::Good),
            ("mood_great", Mood::Great),
        ] {
            if self.visible(template, top)? {
                return Ok(mood);
            }
        }
        Ok(Mood::Bad)
    }

    /// Keeps mood above Normal outside of summer.
    pub(crate) fn recover_mood(&mut self) -> BotResult<bool> {
        self.print("\n[MOOD] Detecting current mood.");
        let mood = self.detect_mood()?;
        self.print(&format!("[MOOD] Detected mood to be {}.", mood));

        let g = self.geometry();
        let summer = self.visible("recover_energy_summer", g.bottom_half())?;
        if self.session.first_training_cycle && mood == Mood::Normal && !summer {
            self.print("[MOOD] Current mood is Normal. Not recovering mood until the first training is done.");
            return Ok(false);
        }
        if !matches!(mood, Mood::Bad | Mood::Normal) || summer {
            self.print("[MOOD] Current mood is good enough or its the Summer event. Moving on...");
            return Ok(false);
        }

        self.print("[MOOD] Current mood is not good. Recovering mood now.");
        if !self.find_and_tap("recover_mood", 1, g.bottom_half())? {
            self.find_and_tap("recover_energy_summer", 1, g.bottom_half())?;
        }
        if self.find_and_tap("recover_mood_date", 1, g.middle())? {
            self.wait(Duration::from_secs(1))?;
        }
        self.find_and_tap("ok", 3, g.middle())?;
        self.session.race_repeat_warning = false;
        Ok(true)
    }

    pub(crate) fn recover_energy(&mut self) -> BotResult<bool> {
        self.print("\n[ENERGY] Now starting attempt to recover energy.");
        let g = self.geometry();
        for (template, note) in [("recover_energy", ""), ("recover_energy_summer", " for the Summer")] {
            if self.find_and_tap(template, 1, g.bottom_half())? {
                self.find_and_tap("ok", 3, g.middle())?;
                self.print(&format!("[ENERGY] Successfully recovered energy{}.", note));
                self.session.race_repeat_warning = false;
                return Ok(true);
            }
        }
        self.print("[ENERGY] Failed to recover energy. Moving on...");
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::config::BotConfig;
    use crate::automation::run_log::RunLog;
    use crate::automation::state::tests::{Fixture, LOW, TOP};

    /// Main screen with the training screen reachable and readable.
    fn training_fixture(failures: &[i32]) -> Fixture {
        let f = Fixture::new(BotConfig::default());
        f.screen
            .show("tazuna", TOP)
            .show("mood_great", Point::new(800, 200))
            .show("training_option", LOW)
            .show("stat_speed", Point::new(100, 1500))
            .show("training_speed", LOW)
            .show("training_power", LOW)
            .header("speed_training");
        f.screen.failure_chances.borrow_mut().extend(failures.iter().copied());
        f
    }

    #[test]
    fn test_training_buttons_follow_speed_label() {
        let g = ScreenGeometry::new(1080, 1920);
        let anchor = Point::new(100, 1500);
        assert_eq!(training_button(g, anchor, Stat::Stamina), Point::new(380, 1819));
        assert_eq!(training_button(g, anchor, Stat::Wit), Point::new(879, 1819));

        let wide = ScreenGeometry::new(1600, 2560);
        let p = training_button(wide, anchor, Stat::Power);
        assert_eq!(p.x, 100 + wide.rel((402.0 * 1.36) as i32));
    }

    #[test]
    fn test_executes_best_weighted_training() {
        let f = training_fixture(&[8, 10, 12, 5, 9]);
        f.screen.stat_gains.borrow_mut().insert(Stat::Power, 30);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert!(run.step().unwrap());

        assert_eq!(run.session.previously_selected, Some(Stat::Power));
        assert!(!run.session.first_training_cycle);
        // Four non-Speed buttons were inspected, Power was executed three times over.
        assert_eq!(f.input.tapped("training_option_circular"), 4);
        let gestures = f.input.gestures.borrow();
        assert!(gestures.iter().any(|g| matches!(
            g,
            crate::automation::input::tests::Gesture::Tap { template, taps: 3, .. } if template == "training_power"
        )));
    }

    #[test]
    fn test_blacklisted_training_not_inspected() {
        let mut f = training_fixture(&[8, 10, 12, 5]);
        f.config.training.blacklist = vec![Stat::Guts];
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        run.handle_training().unwrap();
        assert_eq!(f.input.tapped("training_option_circular"), 3);
    }

    #[test]
    fn test_high_failure_recovers_energy() {
        let f = training_fixture(&[20]);
        f.screen.show("back", LOW).show("recover_energy", LOW).show("ok", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        run.handle_training().unwrap();
        drop(run);

        assert_eq!(f.input.tapped("training_option_circular"), 0);
        assert_eq!(f.input.tapped("back"), 1);
        assert_eq!(f.input.tapped("recover_energy"), 1);
        assert!(log.contains("20% is not within acceptable range of 15%"));
    }

    #[test]
    fn test_unreadable_failure_skips_cycle() {
        let f = training_fixture(&[]);
        f.screen.show("back", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        run.handle_training().unwrap();
        assert!(run.session.previously_selected.is_none());
        assert_eq!(f.input.tapped("training_option_circular"), 0);
    }

    #[test]
    fn test_missing_speed_header_taps_speed_training() {
        let f = training_fixture(&[30]);
        f.screen.headers.borrow_mut().clear();
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        run.handle_training().unwrap();
        assert_eq!(f.input.tapped("training_speed"), 1);
    }

    #[test]
    fn test_injury_needs_lit_button() {
        let f = Fixture::new(BotConfig::default());
        f.screen.show("recover_injury", LOW).header("recover_injury");
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert!(!run.check_injury().unwrap());

        f.screen.injury_tint.set(true);
        assert!(run.check_injury().unwrap());
        assert_eq!(f.input.tapped("recover_injury"), 1);
    }

    #[test]
    fn test_normal_mood_tolerated_before_first_training() {
        let f = Fixture::new(BotConfig::default());
        f.screen
            .show("mood_normal", TOP)
            .show("recover_mood", LOW)
            .show("ok", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert!(!run.recover_mood().unwrap());

        run.session.first_training_cycle = false;
        run.session.race_repeat_warning = true;
        assert!(run.recover_mood().unwrap());
        assert!(!run.session.race_repeat_warning);
        assert_eq!(f.input.tapped("recover_mood"), 1);
    }

    #[test]
    fn test_no_mood_recovery_during_summer() {
        let f = Fixture::new(BotConfig::default());
        f.screen.show("recover_energy_summer", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert!(!run.recover_mood().unwrap());
        assert!(f.input.gestures.borrow().is_empty());
    }

    #[test]
    fn test_recover_energy_prefers_regular_button() {
        let f = Fixture::new(BotConfig::default());
        f.screen
            .show("recover_energy", LOW)
            .show("recover_energy_summer", LOW)
            .show("ok", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert!(run.recover_energy().unwrap());
        assert_eq!(f.input.tapped("recover_energy"), 1);
        assert_eq!(f.input.tapped("recover_energy_summer"), 0);
        assert_eq!(f.input.tapped("ok"), 1);
    }

    #[test]
    fn test_mood_display() {
        assert_eq!(Mood::Bad.to_string(), "Bad/Awful");
    }
}
