use log::{debug, info};

use super::status::{IdleCountdown, ServerStatus, StopOutcome};

/// What one tick did to the idle countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// No countdown is active.
    Inactive,
    Remaining(u32),
    /// Activity resumed, status is back to `Running`.
    Canceled,
    /// The countdown reached zero; the workload has to be stopped.
    Expired,
}

/// Idle-to-stop countdown, advanced once per controller tick.
///
/// The timer holds no state of its own: the countdown lives in
/// [`ServerStatus::WaitingToStop`], which the controller owns.
#[derive(Debug, Clone, Copy)]
pub struct IdleTimer {
    total_ticks: u32,
}

impl IdleTimer {
    pub fn new(total_ticks: u32) -> Self {
        Self { total_ticks: total_ticks.max(1) }
    }

    pub fn total_ticks(&self) -> u32 {
        self.total_ticks
    }

    /// Starts a countdown unless one is already active.
    ///
    /// Returns `Some(StopOutcome::AlreadyRunning)` without touching the
    /// countdown when one is active. `None` means a fresh countdown was
    /// started and its outcome will be reported by [`IdleTimer::tick`].
    pub fn start(&self, status: &mut ServerStatus) -> Option<StopOutcome> {
        if status.countdown().is_some() {
            debug!("Idle timer already running");
            return Some(StopOutcome::AlreadyRunning);
        }

        info!("No active clients, stopping in {} ticks", self.total_ticks);
        *status = ServerStatus::WaitingToStop(IdleCountdown { remaining_ticks: self.total_ticks });
        None
    }

    /// Advances an active countdown with the latest activity observation.
    pub fn tick(&self, status: &mut ServerStatus, active_count: u32) -> Countdown {
        let remaining = match status.remaining_ticks() {
            Some(remaining) => remaining,
            None => return Countdown::Inactive,
        };

        if active_count > 0 {
            info!("{} clients active, idle timer canceled", active_count);
            *status = ServerStatus::Running;
            return Countdown::Canceled;
        }

        let remaining = remaining.saturating_sub(1);
        *status = ServerStatus::WaitingToStop(IdleCountdown { remaining_ticks: remaining });

        if remaining == 0 {
            info!("Idle timer expired");
            Countdown::Expired
        } else {
            debug!("Idle timer: {} ticks left", remaining);
            Countdown::Remaining(remaining)
        }
    }
}
