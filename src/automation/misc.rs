//! End-of-step sweep over stray popups.

use std::time::Duration;

use crate::automation::state::CareerRun;
use crate::error::{BotResult, RunOutcome};
use crate::vision::Region;

impl CareerRun<'_> {
    /// Handles the first leftover popup found, in fixed order.
    ///
    /// Returns the outcome when the popup means the run cannot continue.
    pub(crate) fn misc_checks(&mut self) -> BotResult<Option<RunOutcome>> {
        let config = self.config;
        let g = self.geometry();
        let (bottom, middle) = (g.bottom_half(), g.middle());

        if config.stops.enable_popup_check
            && self.visible("cancel", bottom)?
            && !self.visible("recover_mood_date", middle)?
        {
            return Ok(Some(RunOutcome::PopupAbort));
        }

        if self.find_and_tap("next", 1, Region::FULL)? {
            self.wait(Duration::from_secs(2))?;
            self.find_and_tap("next", 1, Region::FULL)?;
            self.wait(Duration::from_secs(1))?;
        } else if self.visible("afk_check", middle)? {
            self.print("[INFO] Dismissing the inactivity check.");
            self.find_and_tap("ok", 3, middle)?;
        } else if self.visible("crane_game", bottom)? {
            return Ok(Some(RunOutcome::MinigameInterruption));
        } else if self.find_and_tap("race_retry", 1, Region::FULL)? {
            self.print("[WARNING] Tapped a leftover race retry prompt.");
            self.wait(Duration::from_secs(5))?;
        } else if self.visible("race_accept_trophy", bottom)? {
            self.print("[RACE] There is a possible trophy to accept. Finishing the race now.");
            self.finish_race(true)?;
        } else if self.find_and_tap("race_end", 1, Region::FULL)? {
            self.print("[INFO] Ended a leftover race.");
        } else if self.visible("connection_error", middle)? {
            return Ok(Some(RunOutcome::ConnectionError));
        } else if config.debug_mode {
            self.print("[DEBUG] Did not detect any popups or the Crane Game on the screen. Moving on...");
        } else {
            self.print("[INFO] Did not detect any popups or the Crane Game on the screen. Moving on...");
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::config::BotConfig;
    use crate::automation::run_log::RunLog;
    use crate::automation::state::tests::{Fixture, LOW};
    use crate::vision::Point;

    #[test]
    fn test_popup_abort_needs_popup_check() {
        let mut config = BotConfig::default();
        config.stops.enable_popup_check = true;
        let f = Fixture::new(config);
        f.screen.show("cancel", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert_eq!(run.misc_checks().unwrap(), Some(RunOutcome::PopupAbort));

        f.screen.show("recover_mood_date", Point::new(540, 700));
        assert_eq!(run.misc_checks().unwrap(), None);
    }

    #[test]
    fn test_cancel_ignored_without_popup_check() {
        let f = Fixture::new(BotConfig::default());
        f.screen.show("cancel", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert_eq!(run.misc_checks().unwrap(), None);
        drop(run);
        assert!(log.contains("Did not detect any popups"));
    }

    #[test]
    fn test_next_tapped_twice() {
        let f = Fixture::new(BotConfig::default());
        f.screen.show("next", LOW).show("crane_game", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        // Only the first matching popup is handled per step.
        assert_eq!(run.misc_checks().unwrap(), None);
        assert_eq!(f.input.tapped("next"), 2);
    }

    #[test]
    fn test_afk_check_dismissed() {
        let f = Fixture::new(BotConfig::default());
        f.screen.show("afk_check", LOW).show("ok", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert_eq!(run.misc_checks().unwrap(), None);
        assert_eq!(f.input.tapped("ok"), 1);
    }

    #[test]
    fn test_crane_game_stops_run() {
        let f = Fixture::new(BotConfig::default());
        f.screen.show("crane_game", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert!(!run.step().unwrap());
        assert_eq!(run.outcome(), Some(&RunOutcome::MinigameInterruption));
    }

    #[test]
    fn test_leftover_retry_waits() {
        let f = Fixture::new(BotConfig::default());
        f.screen.show("race_retry", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert_eq!(run.misc_checks().unwrap(), None);
        assert_eq!(f.input.tapped("race_retry"), 1);
        assert!(f.pacer.elapsed.get() >= Duration::from_secs(5));
    }

    #[test]
    fn test_trophy_finishes_race() {
        let f = Fixture::new(BotConfig::default());
        f.screen.show("race_accept_trophy", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert_eq!(run.misc_checks().unwrap(), None);
        drop(run);
        assert!(log.contains("Cannot start the cleanup process"));
    }

    #[test]
    fn test_leftover_race_end() {
        let f = Fixture::new(BotConfig::default());
        f.screen.show("race_end", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert_eq!(run.misc_checks().unwrap(), None);
        drop(run);
        assert!(log.contains("Ended a leftover race."));
    }

    #[test]
    fn test_connection_error_stops_run() {
        let f = Fixture::new(BotConfig::default());
        f.screen.show("connection_error", Point::new(540, 800));
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert_eq!(run.misc_checks().unwrap(), Some(RunOutcome::ConnectionError));
    }
}
