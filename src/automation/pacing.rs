//! UI pacing waits and cooperative stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{BotError, BotResult};

/// Sleep granularity; a stop is noticed within one slice.
const SLICE: Duration = Duration::from_millis(100);

/// Shared stop flag, set by the operator and checked by the run.
#[derive(Clone, Debug, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Stopped)` once a stop was requested.
    pub fn check(&self) -> BotResult<()> {
        if self.is_stopped() {
            Err(BotError::Stopped)
        } else {
            Ok(())
        }
    }
}

/// Waits between dependent UI actions.
pub trait Pacer {
    /// Blocks for `duration`, returning `Err(Stopped)` early if a stop arrives.
    fn wait(&self, duration: Duration) -> BotResult<()>;

    fn check_stop(&self) -> BotResult<()>;
}

/// Wall-clock pacer.
pub struct RealPacer {
    stop: StopToken,
}

impl RealPacer {
    pub fn new(stop: StopToken) -> Self {
        Self { stop }
    }
}

impl Pacer for RealPacer {
    fn wait(&self, duration: Duration) -> BotResult<()> {
        let mut remaining = duration;
        while !remaining.is_zero() {
            self.stop.check()?;
            let slice = remaining.min(SLICE);
            std::thread::sleep(slice);
            remaining -= slice;
        }
        self.stop.check()
    }

    fn check_stop(&self) -> BotResult<()> {
        self.stop.check()
    }
}
