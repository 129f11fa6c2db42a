//! Career automation.
//!
//! This module provides:
//! - The career state machine and its per-screen handlers
//! - Campaign-specific hooks
//! - Device input, pacing and cooperative stop
//! - The run log and the decision journal

pub mod campaign;
pub mod config;
mod event;
pub mod input;
pub mod journal;
mod misc;
pub mod pacing;
mod race;
pub mod run_log;
pub mod runner;
pub mod state;
mod training;

pub use config::{get_config, init_config, Campaign};
pub use input::AdbInput;
pub use journal::DecisionJournal;
pub use pacing::{RealPacer, StopToken};
pub use run_log::RunLog;
pub use runner::{run_career, spawn_stop_listener};
pub use state::CareerRun;
