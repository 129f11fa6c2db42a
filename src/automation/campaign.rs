//! Per-campaign hooks.
//!
//! The run calls every campaign-dependent step through a `CampaignRules`
//! table picked once at start. Normal uses the base handlers throughout; Ao
//! Haru adds the tutorial dismissal and the team race.

use std::time::Duration;

use crate::automation::config::Campaign;
use crate::automation::state::CareerRun;
use crate::error::BotResult;
use crate::vision::Region;

pub type EventHandler = fn(&mut CareerRun<'_>) -> BotResult<()>;
pub type RaceHandler = fn(&mut CareerRun<'_>) -> BotResult<bool>;
pub type SpecialCheck = fn(&mut CareerRun<'_>) -> BotResult<bool>;

/// Matchups need this many double-circle predictions to be worth running.
const TEAM_RACE_MIN_DOUBLE_CIRCLES: usize = 3;

#[derive(Clone, Copy)]
pub struct CampaignRules {
    pub name: &'static str,
    pub handle_training_event: EventHandler,
    pub handle_race_events: RaceHandler,
    /// Runs when no known screen matched. True when it handled something.
    pub check_special_conditions: SpecialCheck,
}

impl CampaignRules {
    pub const NORMAL: CampaignRules = CampaignRules {
        name: "URA Finale",
        handle_training_event: base_training_event,
        handle_race_events: base_race_events,
        check_special_conditions: no_special_conditions,
    };

    pub const AO_HARU: CampaignRules = CampaignRules {
        name: "Ao Haru",
        handle_training_event: ao_haru_training_event,
        handle_race_events: base_race_events,
        check_special_conditions: ao_haru_team_race,
    };

    pub fn for_campaign(campaign: Campaign) -> Self {
        match campaign {
            Campaign::Normal => Self::NORMAL,
            Campaign::AoHaru => Self::AO_HARU,
        }
    }
}

fn base_training_event(run: &mut CareerRun<'_>) -> BotResult<()> {
    run.handle_training_event()
}

fn base_race_events(run: &mut CareerRun<'_>) -> BotResult<bool> {
    run.handle_race_events()
}

fn no_special_conditions(_run: &mut CareerRun<'_>) -> BotResult<bool> {
    Ok(false)
}

/// Dismisses the team-race tutorial with its second option while it can still appear.
fn ao_haru_training_event(run: &mut CareerRun<'_>) -> BotResult<()> {
    if run.session.tutorial_chances == 0 {
        return run.handle_training_event();
    }

    if run.vision.confirm("aoharu_tutorial", 2, Region::FULL)? {
        let options = run.vision.find_all("training_event_active", Region::FULL)?;
        if let Some(second) = options.get(1) {
            run.print("[AOHARU] Closing the Ao Haru tutorial.");
            run.tap(*second, "training_event_active", 1)?;
        }
        run.session.tutorial_chances = 0;
        Ok(())
    } else {
        run.session.tutorial_chances -= 1;
        run.handle_training_event()
    }
}

/// Runs the team race when its screen is up.
fn ao_haru_team_race(run: &mut CareerRun<'_>) -> BotResult<bool> {
    let mut handled = false;
    if run.session.team_race_first_time && run.vision.confirm("aoharu_set_initial_team", 5, Region::FULL)? {
        run.print("[AOHARU] Accepting the initial team.");
        run.find_and_tap("race_accept_trophy", 3, Region::FULL)?;
        handled = true;
    }
    run.session.team_race_first_time = false;

    if !run.vision.confirm("aoharu_race", 5, Region::FULL)? {
        return Ok(handled);
    }

    run.print("\n[AOHARU] Starting the team race.");
    run.find_and_tap("aoharu_race", 3, Region::FULL)?;
    run.wait(Duration::from_secs(1))?;

    let options = run.vision.find_all("aoharu_race_option", Region::FULL)?;
    let Some(first) = options.first().copied() else {
        run.print("[WARNING] No team race matchups were found.");
        return Ok(true);
    };
    run.tap(first, "aoharu_race_option", 1)?;
    run.find_and_tap("aoharu_select_race", 3, Region::FULL)?;
    run.wait(Duration::from_secs(2))?;

    let double_circles = run
        .vision
        .find_all("race_prediction_double_circle", Region::FULL)?
        .len();
    if double_circles >= TEAM_RACE_MIN_DOUBLE_CIRCLES {
        run.print(&format!(
            "[AOHARU] First matchup has {} double circle predictions. Running it.",
            double_circles
        ));
        run.find_and_tap("aoharu_select_race", 3, Region::FULL)?;
    } else {
        run.print("[AOHARU] First matchup looks weak. Running the second one instead.");
        run.find_and_tap("cancel", 3, Region::FULL)?;
        run.wait(Duration::from_millis(500))?;
        if let Some(second) = options.get(1) {
            run.tap(*second, "aoharu_race_option", 1)?;
        }
        run.find_and_tap("aoharu_select_race", 3, Region::FULL)?;
        run.wait(Duration::from_secs(2))?;
        run.find_and_tap("aoharu_select_race", 3, Region::FULL)?;
    }

    run.wait(Duration::from_secs(3))?;
    run.find_and_tap("aoharu_run_race", 10, Region::FULL)?;
    run.wait(Duration::from_secs(1))?;
    run.find_and_tap("race_skip_manual", 10, Region::FULL)?;
    run.wait(Duration::from_secs(3))?;
    run.find_and_tap("race_end", 10, Region::FULL)?;
    run.print("[AOHARU] Team race completed.");
    Ok(true)
}
