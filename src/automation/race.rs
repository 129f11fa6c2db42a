//! Race flows.
//!
//! Mandatory, extra and standalone races all end in the same skip-or-manual
//! sub-flow. A visible retry prompt after either path spends one unit of the
//! run-wide retry budget; running out is fatal for the run.

use std::time::Duration;

use crate::automation::journal::DecisionKind;
use crate::automation::state::CareerRun;
use crate::decision::select_race;
use crate::error::{BotError, BotResult};
use crate::vision::{Point, Region, ScreenGeometry};

const RESULT_SETTLE: Duration = Duration::from_secs(2);
const RETRY_COOLDOWN: Duration = Duration::from_secs(5);
/// Dialogue plays before a goal popup after non-extra races.
const GOAL_POPUP_DELAY: Duration = Duration::from_secs(5);
const LIST_SWIPE: Duration = Duration::from_millis(500);
const SHORT_PAUSE: Duration = Duration::from_millis(500);
/// Extra races inspected per list, fewer on wide screens.
const MAX_CANDIDATES: usize = 3;
const MAX_CANDIDATES_WIDE: usize = 2;
/// Stages of a manual race that can be skipped one tap at a time.
const MANUAL_SKIP_STAGES: [&str; 5] = [
    "name reveal of the race",
    "walkthrough of the starting gate",
    "start of the race",
    "lead up to the finish line",
    "results screen",
];

/// Selection cursor position for the entry below `current`.
fn next_entry(g: ScreenGeometry, current: Point) -> Point {
    if g.is_wide() {
        current.offset(-g.rel(136), g.rel_y(225))
    } else {
        current.offset(-g.rel(100), g.rel_y(150))
    }
}

/// Tap target that opens the entry whose cursor is at `location`.
fn entry_target(g: ScreenGeometry, location: Point) -> Point {
    location.offset(-g.rel(136), -g.rel_y(70))
}

/// Fixed tap that advances the result screens.
fn screen_point(g: ScreenGeometry, x: i32, y: i32) -> Point {
    Point::new(g.rel(x), g.rel_y(y))
}

impl CareerRun<'_> {
    /// Extra race day with racing currently allowed.
    pub(crate) fn extra_race_available(&mut self) -> BotResult<bool> {
        let config = self.config;
        let racing = &config.racing;
        if !racing.enable_farming_fans {
            return Ok(false);
        }

        let day = self.vision.read_day_number(config.campaign)?;
        self.print(&format!(
            "\n[INFO] Current remaining number of days before the next mandatory race: {}.",
            day
        ));
        if day.checked_rem(racing.days_to_run_extra_races) != Some(0) || self.session.race_repeat_warning {
            return Ok(false);
        }

        let bottom = self.geometry().bottom_half();
        for blocker in [
            "race_select_extra_locked_uma_finals",
            "race_select_extra_locked",
            "recover_energy_summer",
        ] {
            if self.visible(blocker, bottom)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Runs the mandatory race if one is waiting, otherwise tries an extra race.
    ///
    /// False when nothing was raced.
    pub(crate) fn handle_race_events(&mut self) -> BotResult<bool> {
        self.print("\n[RACE] Starting Racing process...");
        let bottom = self.geometry().bottom_half();

        if self.session.failed_fan_check {
            // Confirming the fans popup leads straight to the race list.
            self.find_and_tap("race_confirm", 1, bottom)?;
            self.session.failed_fan_check = false;
            self.wait(Duration::from_secs(1))?;
        }

        if self.find_and_tap("race_select_mandatory", 1, bottom)? {
            self.print("\n[RACE] Starting process for handling a mandatory race.");
            if self.config.stops.enable_stop_on_mandatory_race {
                self.session.mandatory_race_detected = true;
                return Ok(false);
            }

            self.wait(RESULT_SETTLE)?;
            self.print("[RACE] Confirming the mandatory race selection.");
            self.find_and_tap("race_confirm", 3, bottom)?;
            self.wait(Duration::from_secs(1))?;
            self.print("[RACE] Confirming any popup from the mandatory race selection.");
            self.find_and_tap("race_confirm", 3, bottom)?;
            self.wait(RESULT_SETTLE)?;

            self.run_race(false)?;
            self.print("[RACE] Racing process for Mandatory Race is completed.");
            return Ok(true);
        }

        if self.find_and_tap("race_select_extra", 1, bottom)? {
            return self.run_extra_race();
        }
        Ok(false)
    }

    /// The race screen was already open when the step began.
    pub(crate) fn handle_standalone_race(&mut self) -> BotResult<()> {
        self.print("\n[RACE] Starting Standalone Racing process...");
        self.run_race(false)?;
        self.print("[RACE] Racing process for Standalone Race is completed.");
        Ok(())
    }

    fn run_extra_race(&mut self) -> BotResult<bool> {
        self.print("\n[RACE] Starting process for handling a extra race.");
        let g = self.geometry();
        let bottom = g.bottom_half();

        if self.visible("race_repeat_warning", Region::FULL)? {
            self.session.race_repeat_warning = true;
            self.print("\n[RACE] Closing popup warning of doing more than 3+ races and setting flag to prevent racing for now.");
            self.find_and_tap("cancel", 3, bottom)?;
            return Ok(false);
        }

        let Some(status) = self.vision.find("race_status", 3, Region::FULL)? else {
            self.print("[WARNING] Unable to determine existence of list of extra races.");
            return Ok(false);
        };
        // Scroll the list back to its top entry.
        let (from, to) = (status.offset(0, 300), status.offset(0, 888));
        if !self.input.swipe(from, to, LIST_SWIPE) {
            crate::log(&format!("Swipe from {} to {} was not delivered", from, to));
        }
        self.wait(SHORT_PAUSE)?;

        let listed = self.vision.find_all("race_selection_fans", bottom)?.len();
        if listed == 0 {
            self.print("[WARNING] Was unable to find any extra races to select. Moving on...");
            return Ok(false);
        }
        self.print(&format!(
            "[RACE] There are {} extra race options currently on screen.",
            listed
        ));

        let cap = if g.is_wide() { MAX_CANDIDATES_WIDE } else { MAX_CANDIDATES };
        let mut candidates = Vec::new();
        for _ in 0..(listed - 1).min(cap) {
            let Some(cursor) = self.vision.find("race_extra_selection", 3, bottom)? else {
                self.print("[ERROR] Unable to find the location of the selected extra race.");
                break;
            };
            candidates.push(self.vision.evaluate_race_candidate(cursor)?);
            self.tap(next_entry(g, cursor), "race_extra_selection", 1)?;
            self.wait(SHORT_PAUSE)?;
        }

        let fans: Vec<String> = candidates.iter().map(|c| c.fan_gain.to_string()).collect();
        self.print(&format!(
            "[RACE] Number of fans detected for each extra race are: {}",
            fans.join(", ")
        ));

        let Some(index) = select_race(&candidates) else {
            self.print("[WARNING] No extra race has a double prediction with readable fans.");
            self.find_and_tap("back", 5, bottom)?;
            return Ok(false);
        };
        let chosen = candidates[index];
        self.print(&format!("[RACE] Selecting the extra race at option #{}.", index + 1));
        self.tap(entry_target(g, chosen.location), "race_extra_selection", 1)?;
        self.journal.record(
            DecisionKind::Race,
            &(index + 1).to_string(),
            chosen.fan_gain,
            &format!("{} candidates", candidates.len()),
        );

        self.find_and_tap("race_confirm", 30, bottom)?;
        self.find_and_tap("race_confirm", 10, bottom)?;
        self.wait(RESULT_SETTLE)?;

        self.run_race(true)?;
        self.print("[RACE] Racing process for Extra Race is completed.");
        Ok(true)
    }

    /// Skips the race when allowed, otherwise plays it, then closes the results.
    fn run_race(&mut self, extra: bool) -> BotResult<()> {
        let bottom = self.geometry().bottom_half();
        let completed = if self.vision.find("race_skip_locked", 5, bottom)?.is_none() {
            self.skip_race()?
        } else {
            self.manual_race()?
        };
        if !completed {
            return Err(BotError::RetryBudgetExhausted {
                attempts: self.session.failed_race_attempts,
            });
        }
        self.finish_race(extra)
    }

    fn skip_race(&mut self) -> BotResult<bool> {
        let g = self.geometry();
        let bottom = g.bottom_half();
        while self.session.race_retries_remaining >= 0 {
            self.print("[RACE] Skipping race...");
            self.wait(RESULT_SETTLE)?;
            if self.find_and_tap("race_skip", 30, bottom)? {
                self.print("[RACE] Race was able to be skipped.");
            }
            self.wait(RESULT_SETTLE)?;
            self.tap(screen_point(g, 350, 450), "ok", 3)?;

            if !self.race_needs_retry()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn manual_race(&mut self) -> BotResult<bool> {
        let g = self.geometry();
        let bottom = g.bottom_half();
        while self.session.race_retries_remaining >= 0 {
            self.print("[RACE] Skipping manual race...");
            if self.find_and_tap("race_manual", 30, bottom)? {
                self.print("[RACE] Started the manual race.");
            }
            self.wait(RESULT_SETTLE)?;

            if self.find_and_tap("ok", 1, g.middle())? {
                self.print("[RACE] Confirmed the Race Playback popup.");
                self.wait(Duration::from_secs(5))?;
            }

            if self.find_and_tap("race_confirm", 30, bottom)? {
                self.print("[RACE] Dismissed the list of participants.");
            }
            self.wait(Duration::from_secs(1))?;
            self.wait(Duration::from_secs(1))?;

            for (stage, stage_name) in MANUAL_SKIP_STAGES.iter().enumerate() {
                if self.find_and_tap("race_skip_manual", 30, bottom)? {
                    self.print(&format!("[RACE] Skipped the {}.", stage_name));
                }
                match stage {
                    1 => self.wait(Duration::from_secs(3))?,
                    3 | 4 => self.wait(RESULT_SETTLE)?,
                    _ => {}
                }
            }
            self.wait(Duration::from_secs(1))?;

            if !self.race_needs_retry()? {
                if self.find_and_tap("race_accept_trophy", 5, bottom)? {
                    self.print("[RACE] Closing popup to claim trophy...");
                }
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Taps the retry prompt if shown, spending one unit of the budget.
    fn race_needs_retry(&mut self) -> BotResult<bool> {
        let bottom = self.geometry().bottom_half();
        if !self.find_and_tap("race_retry", 5, bottom)? {
            return Ok(false);
        }
        self.session.race_retries_remaining -= 1;
        self.session.failed_race_attempts += 1;
        self.print(&format!(
            "[RACE] The race failed and needs to be run again. {} retries left.",
            self.session.race_retries_remaining.max(0)
        ));
        self.wait(RETRY_COOLDOWN)?;
        Ok(true)
    }

    /// Closes the result screens and any goal popup that follows.
    pub(crate) fn finish_race(&mut self, extra: bool) -> BotResult<()> {
        self.print("\n[RACE] Now performing cleanup and finishing the race.");
        let g = self.geometry();
        let bottom = g.bottom_half();

        self.tap(screen_point(g, 450, 850), "ok", 3)?;
        if !self.find_and_tap("next", 30, bottom)? {
            self.print("[ERROR] Cannot start the cleanup process for finishing the race. Moving on...");
            return Ok(());
        }
        self.wait(SHORT_PAUSE)?;
        self.tap(screen_point(g, 350, 750), "ok", 3)?;
        self.find_and_tap("race_end", 30, bottom)?;

        if !extra {
            self.print("[RACE] Seeing if a Training Goal popup will appear.");
            self.wait(GOAL_POPUP_DELAY)?;
        }
        if self.find_and_tap("next", 10, bottom)? {
            self.wait(RESULT_SETTLE)?;
            self.print("[RACE] There was a Training Goal popup. Confirming it now.");
            self.find_and_tap("race_end", 10, bottom)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::config::BotConfig;
    use crate::automation::input::tests::Gesture;
    use crate::automation::run_log::RunLog;
    use crate::automation::state::tests::{Fixture, LOW, TOP};
    use crate::decision::RaceCandidate;
    use crate::error::RunOutcome;

    fn farming() -> BotConfig {
        let mut config = BotConfig::default();
        config.racing.enable_farming_fans = true;
        config
    }

    fn candidate(fan_gain: i32) -> RaceCandidate {
        RaceCandidate {
            location: Point::default(),
            fan_gain,
            has_double_prediction: fan_gain != -1,
        }
    }

    /// Main screen on an extra race day with a populated race list.
    fn extra_race_fixture(fans: &[i32]) -> Fixture {
        let f = Fixture::new(farming());
        f.screen.day.set(8);
        f.screen
            .show("tazuna", TOP)
            .show("mood_great", Point::new(800, 200))
            .show("race_select_extra", LOW)
            .show("race_status", Point::new(540, 600))
            .show("race_extra_selection", Point::new(800, 1200))
            .show("race_confirm", LOW);
        for y in [1000, 1200, 1400, 1600] {
            f.screen.show("race_selection_fans", Point::new(300, y));
        }
        f.screen
            .candidates
            .borrow_mut()
            .extend(fans.iter().map(|fans| candidate(*fans)));
        f
    }

    #[test]
    fn test_retry_budget_allows_exactly_four_attempts() {
        let f = Fixture::new(BotConfig::default());
        f.screen
            .show("race_change_strategy", LOW)
            .show("race_skip", LOW)
            .show("race_retry", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);

        let err = run.step().unwrap_err();
        assert!(matches!(err, BotError::RetryBudgetExhausted { attempts: 4 }));
        assert_eq!(f.input.tapped("race_skip"), 4);
        assert_eq!(f.input.tapped("race_retry"), 4);
        assert_eq!(run.session.race_retries_remaining, -1);
    }

    #[test]
    fn test_retry_budget_is_shared_across_races() {
        let f = Fixture::new(BotConfig::default());
        f.screen.show("race_skip", LOW).show("race_retry", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        run.session.race_retries_remaining = 1;
        run.session.failed_race_attempts = 2;

        let err = run.handle_standalone_race().unwrap_err();
        assert!(matches!(err, BotError::RetryBudgetExhausted { attempts: 4 }));
        assert_eq!(f.input.tapped("race_retry"), 2);
    }

    #[test]
    fn test_skipped_race_closes_goal_popup() {
        let f = Fixture::new(BotConfig::default());
        f.screen
            .show("race_skip", LOW)
            .show("next", LOW)
            .show("race_end", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        run.handle_standalone_race().unwrap();

        assert_eq!(run.session.race_retries_remaining, 3);
        assert_eq!(f.input.tapped("next"), 2);
        assert_eq!(f.input.tapped("race_end"), 2);
        assert!(f.pacer.elapsed.get() >= GOAL_POPUP_DELAY);
    }

    #[test]
    fn test_locked_skip_runs_manually() {
        let f = Fixture::new(BotConfig::default());
        f.screen
            .show("race_skip_locked", LOW)
            .show("race_manual", LOW)
            .show("race_confirm", LOW)
            .show("race_skip_manual", LOW)
            .show("race_accept_trophy", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        run.handle_standalone_race().unwrap();

        assert_eq!(f.input.tapped("race_manual"), 1);
        assert_eq!(f.input.tapped("race_skip_manual"), 5);
        assert_eq!(f.input.tapped("race_accept_trophy"), 1);
        assert_eq!(f.input.tapped("race_skip"), 0);
    }

    #[test]
    fn test_mandatory_race_stops_when_configured() {
        let mut config = BotConfig::default();
        config.stops.enable_stop_on_mandatory_race = true;
        let f = Fixture::new(config);
        f.screen.show("race_select_mandatory", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);

        assert!(!run.step().unwrap());
        assert_eq!(run.outcome(), Some(&RunOutcome::MandatoryRaceDetected));
        assert_eq!(f.input.tapped("race_select_mandatory"), 1);
        assert_eq!(f.input.tapped("race_confirm"), 0);
    }

    #[test]
    fn test_extra_race_day_uses_modulus() {
        let f = Fixture::new(farming());
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        f.screen.day.set(7);
        assert!(!run.extra_race_available().unwrap());
        f.screen.day.set(8);
        assert!(run.extra_race_available().unwrap());
        f.screen.show("race_select_extra_locked", LOW);
        assert!(!run.extra_race_available().unwrap());
    }

    #[test]
    fn test_zero_day_interval_never_races() {
        let mut f = Fixture::new(farming());
        f.config.racing.days_to_run_extra_races = 0;
        f.screen.day.set(8);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert!(!run.extra_race_available().unwrap());
    }

    #[test]
    fn test_extra_race_picks_most_fans() {
        let f = extra_race_fixture(&[1200, -1, 1800]);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert!(run.step().unwrap());
        drop(run);

        let gestures = f.input.gestures.borrow();
        assert_eq!(
            gestures[1],
            Gesture::Swipe {
                from: Point::new(540, 900),
                to: Point::new(540, 1488)
            }
        );
        // Three entries stepped through, then the chosen one opened.
        assert_eq!(f.input.tapped("race_extra_selection"), 4);
        assert!(gestures.iter().any(|g| matches!(
            g,
            Gesture::Tap { point, template, .. }
                if template == "race_extra_selection" && *point == Point::new(664, 1130)
        )));
        assert!(log.contains("option #3"));
    }

    #[test]
    fn test_no_eligible_extra_race_trains_instead() {
        let f = extra_race_fixture(&[-1, -1, -1]);
        f.screen.show("back", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert!(run.step().unwrap());
        drop(run);

        assert_eq!(f.input.tapped("back"), 1);
        assert!(log.contains("Training instead"));
    }

    #[test]
    fn test_repeat_warning_blocks_extra_races() {
        let f = Fixture::new(farming());
        f.screen
            .show("race_select_extra", LOW)
            .show("race_repeat_warning", Point::new(540, 700))
            .show("cancel", LOW);
        f.screen.day.set(8);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);

        assert!(!run.handle_race_events().unwrap());
        assert!(run.session.race_repeat_warning);
        assert_eq!(f.input.tapped("cancel"), 1);
        assert!(!run.extra_race_available().unwrap());
    }

    #[test]
    fn test_fan_popup_confirmed_before_racing() {
        let f = Fixture::new(BotConfig::default());
        f.screen.show("race_confirm", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        run.session.failed_fan_check = true;

        assert!(!run.handle_race_events().unwrap());
        assert!(!run.session.failed_fan_check);
        assert_eq!(f.input.tapped("race_confirm"), 1);
    }

    #[test]
    fn test_entry_offsets() {
        let g = ScreenGeometry::new(1080, 1920);
        assert_eq!(next_entry(g, Point::new(800, 1200)), Point::new(700, 1350));
        assert_eq!(entry_target(g, Point::new(800, 1200)), Point::new(664, 1130));
    }
}
