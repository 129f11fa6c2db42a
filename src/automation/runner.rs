//! Run driver - loops the state machine and reports how the run ended.
//!
//! The operator stops a run from the console. A listener thread reads stdin and
//! sets the shared stop flag; the run notices it at the next wait or step.

use std::io::BufRead;
use std::thread::{self, JoinHandle};

use crate::automation::pacing::StopToken;
use crate::automation::state::CareerRun;
use crate::error::{BotError, BotResult, RunOutcome};

/// Console commands that request a stop.
const STOP_COMMANDS: &[&str] = &["stop", "q", "quit"];

/// Steps `run` until it reaches an outcome, then reports it along with a
/// tally of the run log.
///
/// An operator stop is a normal outcome. Any other error is fatal for the run
/// and is returned after being reported.
pub fn run_career(run: &mut CareerRun<'_>) -> BotResult<RunOutcome> {
    run.announce_settings();

    let result = loop {
        match run.step() {
            Ok(true) => {}
            Ok(false) => {
                break Ok(run
                    .outcome()
                    .cloned()
                    .unwrap_or(RunOutcome::EndScreenReached));
            }
            Err(BotError::Stopped) => {
                run.finish(RunOutcome::OperatorStop);
                break Ok(RunOutcome::OperatorStop);
            }
            Err(e) => break Err(e),
        }
    };

    match &result {
        Ok(outcome) => crate::log(&format!(
            "Career run ended after {} steps: {}",
            run.session.steps, outcome
        )),
        Err(e) => {
            run.print(&format!("\n[ERROR] {}", e));
            crate::log(&format!("Career run failed: {}", e));
        }
    }

    let summary = run.log_summary();
    run.print(&format!("[INFO] Run summary: {}.", summary));
    crate::log(&format!("Run summary: {}", summary));
    result
}

/// Requests a stop on the first stop command or at end of input.
pub fn listen_for_stop<R: BufRead>(reader: R, stop: &StopToken) {
    for line in reader.lines() {
        let Ok(line) = line else { break };
        let command = line.trim().to_lowercase();
        if STOP_COMMANDS.contains(&command.as_str()) {
            crate::log("Stop requested from the console");
            stop.request_stop();
            return;
        }
        if !command.is_empty() {
            crate::log(&format!("Unknown command \"{}\". Type \"stop\" to end the run.", command));
        }
    }
    crate::log("Console closed, requesting stop");
    stop.request_stop();
}

/// Spawns the stdin listener thread.
pub fn spawn_stop_listener(stop: StopToken) -> JoinHandle<()> {
    thread::spawn(move || listen_for_stop(std::io::stdin().lock(), &stop))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    use crate::automation::config::BotConfig;
    use crate::automation::run_log::RunLog;
    use crate::automation::state::tests::{Fixture, LOW};

    #[test]
    fn test_runs_until_end_screen() {
        let f = Fixture::new(BotConfig::default());
        f.screen.show("complete_career", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert_eq!(run_career(&mut run).unwrap(), RunOutcome::EndScreenReached);
        drop(run);
        assert!(log.contains("Starting URA Finale career run."));
        assert!(log.contains("[END] Bot has reached the end of the run."));
        assert!(log.contains("[INFO] Run summary:"));
        assert!(log.contains("errors: 0."));
    }

    #[test]
    fn test_stop_is_not_a_failure() {
        let mut f = Fixture::new(BotConfig::default());
        // Nothing recognizable on screen, so the run idles until the stop lands.
        f.pacer.stop_at = Some(Duration::from_secs(10));
        f.screen.show("next", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        assert_eq!(run_career(&mut run).unwrap(), RunOutcome::OperatorStop);
        assert_eq!(run.outcome(), Some(&RunOutcome::OperatorStop));
        drop(run);
        assert!(log.contains("stopped by the operator"));
    }

    #[test]
    fn test_retry_exhaustion_reported_verbatim() {
        let f = Fixture::new(BotConfig::default());
        f.screen
            .show("race_change_strategy", LOW)
            .show("race_skip", LOW)
            .show("race_retry", LOW);
        let mut log = RunLog::in_memory();
        let mut run = f.run(&mut log);
        let err = run_career(&mut run).unwrap_err();
        assert!(matches!(err, BotError::RetryBudgetExhausted { attempts: 4 }));
        drop(run);
        assert!(log.contains("[ERROR] ran out of race retry attempts after 4 attempts"));
        assert!(log.contains("[INFO] Run summary:"));
        assert!(!log.contains("errors: 0."));
    }

    #[test]
    fn test_stop_command() {
        let stop = StopToken::new();
        listen_for_stop(Cursor::new("status\n  STOP \nmore\n"), &stop);
        assert!(stop.is_stopped());
    }

    #[test]
    fn test_end_of_input_stops() {
        let stop = StopToken::new();
        listen_for_stop(Cursor::new(""), &stop);
        assert!(stop.is_stopped());
    }
}
