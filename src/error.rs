//! Failure taxonomy for a career run.
//!
//! Probe misses and empty recognitions are not errors; they surface as
//! `Option`, empty strings, or the `-1` sentinel at the call site. Only the
//! conditions below cross component boundaries.

use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// A template or reference file the run depends on is absent.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Every race attempt failed and the shared retry budget ran out.
    #[error("ran out of race retry attempts after {attempts} attempts")]
    RetryBudgetExhausted { attempts: u32 },

    /// Cooperative stop observed. Not a failure.
    #[error("stopped by operator")]
    Stopped,
}

pub type BotResult<T> = std::result::Result<T, BotError>;

/// Why a run ended normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    SkillPointGoalReached,
    MandatoryRaceDetected,
    EndScreenReached,
    PopupAbort,
    MinigameInterruption,
    ConnectionError,
    OperatorStop,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::SkillPointGoalReached => {
                write!(f, "Bot has acquired the set amount of skill points.")
            }
            RunOutcome::MandatoryRaceDetected => {
                write!(f, "Stopping bot due to detection of Mandatory Race.")
            }
            RunOutcome::EndScreenReached => write!(f, "Bot has reached the end of the run."),
            RunOutcome::PopupAbort => write!(f, "Bot may have encountered a warning popup."),
            RunOutcome::MinigameInterruption => write!(
                f,
                "Bot will stop due to the detection of the Crane Game Event. Please complete it and restart the bot."
            ),
            RunOutcome::ConnectionError => {
                write!(f, "Bot will stop due to detecting a connection error.")
            }
            RunOutcome::OperatorStop => write!(f, "Bot was stopped by the operator."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_exhaustion_message() {
        let err = BotError::RetryBudgetExhausted { attempts: 4 };
        assert_eq!(
            err.to_string(),
            "ran out of race retry attempts after 4 attempts"
        );
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            RunOutcome::EndScreenReached.to_string(),
            "Bot has reached the end of the run."
        );
        assert!(RunOutcome::OperatorStop.to_string().contains("operator"));
    }
}
