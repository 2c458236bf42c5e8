use serde::Serialize;

/// Lifecycle state of the managed workload.
///
/// The idle countdown only exists inside `WaitingToStop`, so a countdown
/// without the status (or the status without a countdown) can't be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServerStatus {
    #[default]
    Stopped,
    Starting,
    Running,
    WaitingToStop(IdleCountdown),
}

impl ServerStatus {
    /// The workload is meant to be up, whether or not a countdown runs.
    pub fn is_up(&self) -> bool {
        matches!(self, ServerStatus::Running | ServerStatus::WaitingToStop(_))
    }

    pub fn countdown(&self) -> Option<&IdleCountdown> {
        match self {
            ServerStatus::WaitingToStop(countdown) => Some(countdown),
            _ => None,
        }
    }

    pub fn remaining_ticks(&self) -> Option<u32> {
        self.countdown().map(|c| c.remaining_ticks)
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStatus::Stopped => write!(f, "stopped"),
            ServerStatus::Starting => write!(f, "starting"),
            ServerStatus::Running => write!(f, "running"),
            ServerStatus::WaitingToStop(c) => write!(f, "waiting to stop ({} ticks left)", c.remaining_ticks),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdleCountdown {
    pub remaining_ticks: u32,
}

/// Last known ground truth about the workload from the deployment API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadSnapshot {
    pub id: u64,
    pub name: String,
    pub deployed: bool,
}

/// Result of one idle timer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    Success,
    Canceled,
    AlreadyRunning,
}

/// Result of an operator start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    AlreadyStarting,
    AlreadyRunning,
}
