//! Career run state machine.
//!
//! Every step classifies the screen from fresh probes in a fixed priority
//! order, runs the handler for that screen and finishes with a pass over stray
//! popups. The per-screen handlers live in the sibling `training`, `event`,
//! `race` and `misc` modules as further `impl CareerRun` blocks.

use std::fmt;
use std::time::Duration;

use crate::automation::campaign::CampaignRules;
use crate::automation::config::BotConfig;
use crate::automation::input::InputSurface;
use crate::automation::journal::DecisionJournal;
use crate::automation::pacing::Pacer;
use crate::automation::run_log::RunLog;
use crate::decision::Stat;
use crate::error::{BotResult, RunOutcome};
use crate::events::EventResolver;
use crate::vision::{Perception, Point, Region, ScreenGeometry};

/// Pause after every tap while the game reacts.
const TAP_SETTLE: Duration = Duration::from_millis(200);
/// Poll interval while a loading indicator is visible.
const LOADING_POLL: Duration = Duration::from_millis(500);
/// Inheritance events accepted per run.
const INHERITANCE_CAP: u32 = 2;
/// Training events checked for the Ao Haru tutorial before giving up on it.
const TUTORIAL_CHANCES: u32 = 3;

/// Screens the run knows how to act on, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Main,
    TrainingEvent,
    Inheritance,
    MandatoryRacePrep,
    StandaloneRaceReady,
    End,
    Unrecognized,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Main => write!(f, "Main"),
            Screen::TrainingEvent => write!(f, "Training Event"),
            Screen::Inheritance => write!(f, "Inheritance"),
            Screen::MandatoryRacePrep => write!(f, "Mandatory Race Preparation"),
            Screen::StandaloneRaceReady => write!(f, "Racing"),
            Screen::End => write!(f, "Career End"),
            Screen::Unrecognized => write!(f, "Unrecognized"),
        }
    }
}

/// Counters and flags that live for one run and are only touched by the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Shared by every race of the run. Goes negative once exhausted.
    pub race_retries_remaining: i32,
    /// Races that needed a retry so far.
    pub failed_race_attempts: u32,
    pub inheritances_accepted: u32,
    pub mandatory_race_detected: bool,
    pub previously_selected: Option<Stat>,
    pub first_training_cycle: bool,
    /// Insufficient-fans popup seen; forces the race branch on the next Main.
    pub failed_fan_check: bool,
    /// Race-repeat popup seen; cleared by training or recovery.
    pub race_repeat_warning: bool,
    pub tutorial_chances: u32,
    pub team_race_first_time: bool,
    pub steps: u64,
}

impl SessionState {
    pub fn new(race_retries: u32) -> Self {
        Self {
            race_retries_remaining: race_retries as i32,
            failed_race_attempts: 0,
            inheritances_accepted: 0,
            mandatory_race_detected: false,
            previously_selected: None,
            first_training_cycle: true,
            failed_fan_check: false,
            race_repeat_warning: false,
            tutorial_chances: TUTORIAL_CHANCES,
            team_race_first_time: true,
            steps: 0,
        }
    }
}

/// One career run, from the first screen check to a terminal outcome.
pub struct CareerRun<'a> {
    pub(crate) config: &'a BotConfig,
    pub(crate) vision: &'a dyn Perception,
    pub(crate) input: &'a dyn InputSurface,
    pub(crate) pacer: &'a dyn Pacer,
    pub(crate) resolver: EventResolver<'a>,
    pub(crate) journal: &'a DecisionJournal,
    log: &'a mut RunLog,
    rules: CampaignRules,
    pub session: SessionState,
    outcome: Option<RunOutcome>,
}

impl<'a> CareerRun<'a> {
    pub fn new(
        config: &'a BotConfig,
        vision: &'a dyn Perception,
        input: &'a dyn InputSurface,
        pacer: &'a dyn Pacer,
        resolver: EventResolver<'a>,
        log: &'a mut RunLog,
        journal: &'a DecisionJournal,
    ) -> Self {
        Self {
            config,
            vision,
            input,
            pacer,
            resolver,
            journal,
            log,
            rules: CampaignRules::for_campaign(config.campaign),
            session: SessionState::new(config.racing.race_retries),
            outcome: None,
        }
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Prints the effective settings at the top of the run log.
    pub fn announce_settings(&mut self) {
        self.print(&format!("[INFO] Starting {} career run.", self.rules.name));
        for line in self.config.summary_lines() {
            self.print(&line);
        }
    }

    /// Runs one detection and handling cycle.
    ///
    /// Returns `Ok(true)` to keep going, `Ok(false)` once an outcome is set.
    pub fn step(&mut self) -> BotResult<bool> {
        self.pacer.check_stop()?;
        if self.outcome.is_some() {
            return Ok(false);
        }
        self.session.steps += 1;

        let screen = self.detect_screen()?;
        match screen {
            Screen::Main => self.handle_main()?,
            Screen::TrainingEvent => {
                self.print("[INFO] Detected a Training Event on screen.");
                (self.rules.handle_training_event)(self)?;
            }
            Screen::Inheritance => self.accept_inheritance()?,
            Screen::MandatoryRacePrep => {
                self.print("[INFO] There is a Mandatory race to be run.");
                if !(self.rules.handle_race_events)(self)? && self.session.mandatory_race_detected {
                    self.finish(RunOutcome::MandatoryRaceDetected);
                }
            }
            Screen::StandaloneRaceReady => {
                self.print("[INFO] There is a standalone race ready to be run.");
                self.handle_standalone_race()?;
            }
            Screen::End => self.finish(RunOutcome::EndScreenReached),
            Screen::Unrecognized => {
                if (self.rules.check_special_conditions)(self)? {
                    self.print(&format!("[INFO] {} checks complete.", self.rules.name));
                    return Ok(true);
                }
                self.print(
                    "[INFO] Did not detect the bot being at the following screens: Main, Training Event, \
                     Inheritance, Mandatory Race Preparation, Racing and Career End.",
                );
            }
        }

        if self.outcome.is_some() {
            return Ok(false);
        }
        if let Some(outcome) = self.misc_checks()? {
            self.finish(outcome);
            return Ok(false);
        }
        Ok(true)
    }

    /// First screen in priority order whose markers are visible.
    pub fn detect_screen(&mut self) -> BotResult<Screen> {
        let g = self.geometry();
        if self.check_main_screen()? {
            return Ok(Screen::Main);
        }
        if self.visible("training_event_active", g.middle())? {
            return Ok(Screen::TrainingEvent);
        }
        if self.session.inheritances_accepted < INHERITANCE_CAP
            && self.visible("inheritance", g.bottom_half())?
        {
            return Ok(Screen::Inheritance);
        }
        if self.check_mandatory_race_prep()? {
            return Ok(Screen::MandatoryRacePrep);
        }
        if self.visible("race_change_strategy", g.bottom_half())? {
            return Ok(Screen::StandaloneRaceReady);
        }
        if self.visible("complete_career", g.bottom_half())? {
            return Ok(Screen::End);
        }
        Ok(Screen::Unrecognized)
    }

    /// Main screen, or the insufficient-fans popup that sits on top of it.
    pub(crate) fn check_main_screen(&mut self) -> BotResult<bool> {
        let g = self.geometry();
        if self.visible("tazuna", g.top_half())?
            && !self.visible("race_select_mandatory", g.bottom_half())?
        {
            self.print("\n[INFO] Current bot location is at Main screen.");
            return Ok(true);
        }
        if !self.config.stops.enable_popup_check
            && self.visible("cancel", g.bottom_half())?
            && self.visible("race_confirm", g.bottom_half())?
        {
            self.print("[INFO] There is a possible insufficient fans or maiden race popup.");
            self.session.failed_fan_check = true;
            return Ok(true);
        }
        Ok(false)
    }

    fn check_mandatory_race_prep(&mut self) -> BotResult<bool> {
        let g = self.geometry();
        if self.visible("race_select_mandatory", g.bottom_half())? {
            self.print("\n[INFO] Current bot location is at the preparation screen with a mandatory race.");
            return Ok(true);
        }
        if self.visible("race_select_mandatory_goal", g.middle())? {
            // Race list opened straight from the goal banner; walk back to preparation.
            self.wait(Duration::from_secs(2))?;
            self.print("\n[INFO] Current bot location is at the Race Selection screen with a mandatory race.");
            self.find_and_tap("back", 1, g.bottom_half())?;
            self.wait(Duration::from_secs(1))?;
            return Ok(true);
        }
        Ok(false)
    }

    fn handle_main(&mut self) -> BotResult<()> {
        let config = self.config;
        let stops = &config.stops;
        if stops.enable_skill_point_check {
            let points = self.vision.read_skill_points()?;
            if points >= stops.skill_point_check {
                self.finish(RunOutcome::SkillPointGoalReached);
                return Ok(());
            }
        }

        let g = self.geometry();
        let fan_check = self.session.failed_fan_check;
        if !fan_check && self.check_injury()? {
            self.print("[INFO] A infirmary visit was attempted in order to heal an injury.");
            self.find_and_tap("ok", 3, g.middle())?;
            self.wait(Duration::from_secs(3))?;
        } else if !fan_check && self.recover_mood()? {
            self.print("[INFO] Mood has recovered.");
        } else if !fan_check && !self.extra_race_available()? {
            self.print("[INFO] Training due to it not being an extra race day.");
            self.handle_training()?;
        } else {
            self.print("[INFO] Racing by default.");
            if !(self.rules.handle_race_events)(self)? {
                if self.session.mandatory_race_detected {
                    self.finish(RunOutcome::MandatoryRaceDetected);
                    return Ok(());
                }
                self.print("[INFO] Racing by default failed due to not detecting any eligible extra races. Training instead...");
                self.handle_training()?;
            }
        }
        Ok(())
    }

    fn accept_inheritance(&mut self) -> BotResult<()> {
        let g = self.geometry();
        if self.find_and_tap("inheritance", 1, g.bottom_half())? {
            self.session.inheritances_accepted += 1;
            self.print("[INFO] Accepted the Inheritance.");
        }
        Ok(())
    }

    /// Records the terminal outcome. The loop stops after the current step.
    pub(crate) fn finish(&mut self, outcome: RunOutcome) {
        self.print(&format!("\n[END] {}", outcome));
        self.outcome = Some(outcome);
    }

    pub(crate) fn print(&mut self, message: &str) {
        self.log.print(message);
    }

    pub(crate) fn log_summary(&self) -> String {
        self.log.summary()
    }

    pub(crate) fn geometry(&self) -> ScreenGeometry {
        self.vision.geometry()
    }

    /// Single-try presence probe.
    pub(crate) fn visible(&self, template: &str, region: Region) -> BotResult<bool> {
        Ok(self.vision.find(template, 1, region)?.is_some())
    }

    /// Waits, then keeps waiting for as long as the game shows a loading indicator.
    pub(crate) fn wait(&self, duration: Duration) -> BotResult<()> {
        self.pacer.wait(duration)?;
        self.wait_for_loading()
    }

    pub(crate) fn wait_for_loading(&self) -> BotResult<()> {
        while self.is_loading()? {
            self.pacer.wait(LOADING_POLL)?;
        }
        Ok(())
    }

    fn is_loading(&self) -> BotResult<bool> {
        let g = self.geometry();
        Ok(self.visible("connecting", g.top_half())? || self.visible("now_loading", g.bottom_half())?)
    }

    /// Taps `point`, then lets the game settle.
    pub(crate) fn tap(&self, point: Point, template: &str, taps: u32) -> BotResult<()> {
        if !self.input.tap(point, template, taps, false) {
            crate::log(&format!("Tap on {} at {} was not delivered", template, point));
        }
        self.wait(TAP_SETTLE)
    }

    pub(crate) fn find_and_tap(&mut self, template: &str, tries: u32, region: Region) -> BotResult<bool> {
        self.find_and_tap_times(template, tries, region, 1)
    }

    pub(crate) fn find_and_tap_times(
        &mut self,
        template: &str,
        tries: u32,
        region: Region,
        taps: u32,
    ) -> BotResult<bool> {
        if self.config.debug_mode {
            self.print(&format!("[DEBUG] Now attempting to find and click the \"{}\" button.", template));
        }
        match self.vision.find(template, tries, region)? {
            Some(point) => {
                self.tap(point, template, taps)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
