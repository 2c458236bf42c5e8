use std::time::Duration;

use crate::activity::ActivityError;
use crate::deploy::DeployError;
use crate::notify::NotifyError;

#[derive(Debug)]
pub enum ControllerError {
    /// The workload has not been resolved by a refresh yet.
    NotReady,
    WorkloadNotFound(String),
    Deployment(DeployError),
    Activity(ActivityError),
    Notification(NotifyError),
    StartTimeout(Duration),
}

impl ControllerError {
    /// Failure of one of the external collaborators.
    pub fn is_adapter_error(&self) -> bool {
        matches!(
            self,
            ControllerError::Deployment(_) | ControllerError::Activity(_) | ControllerError::Notification(_)
        )
    }
}

impl From<DeployError> for ControllerError {
    fn from(e: DeployError) -> Self {
        ControllerError::Deployment(e)
    }
}

impl From<ActivityError> for ControllerError {
    fn from(e: ActivityError) -> Self {
        ControllerError::Activity(e)
    }
}

impl From<NotifyError> for ControllerError {
    fn from(e: NotifyError) -> Self {
        ControllerError::Notification(e)
    }
}

impl std::fmt::Display for ControllerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerError::NotReady => write!(f, "Workload not resolved yet"),
            ControllerError::WorkloadNotFound(name) => write!(f, "No workload named {:?}", name),
            ControllerError::Deployment(e) => write!(f, "{}", e),
            ControllerError::Activity(e) => write!(f, "{}", e),
            ControllerError::Notification(e) => write!(f, "{}", e),
            ControllerError::StartTimeout(d) => write!(f, "Workload not reachable {}s after start", d.as_secs()),
        }
    }
}

impl std::error::Error for ControllerError {}
