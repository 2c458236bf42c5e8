use async_trait::async_trait;
use serde::Deserialize;

use crate::controller::status::WorkloadSnapshot;

pub mod config;
mod portainer;
pub use portainer::PortainerApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum WorkloadStatus {
    Deployed,
    Stopped,
}

impl TryFrom<u8> for WorkloadStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(WorkloadStatus::Deployed),
            2 => Ok(WorkloadStatus::Stopped),
            n => Err(format!("unknown stack status {}", n)),
        }
    }
}

/// A stack as reported by the deployment API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Workload {
    #[serde(rename = "Id")]
    pub id: u64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Status")]
    pub status: WorkloadStatus,
}

impl From<&Workload> for WorkloadSnapshot {
    fn from(workload: &Workload) -> Self {
        WorkloadSnapshot {
            id: workload.id,
            name: workload.name.clone(),
            deployed: workload.status == WorkloadStatus::Deployed,
        }
    }
}

/// Query, start and stop a named workload.
#[async_trait]
pub trait DeploymentClient: Send + Sync {
    async fn list_workloads(&self) -> Result<Vec<Workload>, DeployError>;

    async fn get_workload(&self, id: u64) -> Result<Workload, DeployError>;

    async fn start(&self, id: u64) -> Result<(), DeployError>;

    async fn stop(&self, id: u64) -> Result<(), DeployError>;
}

#[derive(Debug)]
pub enum DeployError {
    Http(ureq::Error),
    Task(tokio::task::JoinError),
}

impl From<ureq::Error> for DeployError {
    fn from(e: ureq::Error) -> Self {
        DeployError::Http(e)
    }
}

impl From<tokio::task::JoinError> for DeployError {
    fn from(e: tokio::task::JoinError) -> Self {
        DeployError::Task(e)
    }
}

impl std::fmt::Display for DeployError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeployError::Http(e) => write!(f, "Deployment API request failed: {}", e),
            DeployError::Task(e) => write!(f, "Deployment API task failed: {}", e),
        }
    }
}

impl std::error::Error for DeployError {}
