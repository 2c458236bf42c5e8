use async_trait::async_trait;
use log::{error, info};
use serde::Serialize;

pub mod board;
pub mod config;
mod pushover;

pub use board::StatusBoard;
pub use pushover::Pushover;

/// Status snapshot pushed after every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_ticks_remaining: Option<u32>,
}

impl StatusReport {
    pub fn offline() -> Self {
        Self { online: false, active_count: None, idle_ticks_remaining: None }
    }

    pub fn online(active_count: u32, idle_ticks_remaining: Option<u32>) -> Self {
        Self { online: true, active_count: Some(active_count), idle_ticks_remaining }
    }
}

/// A one-off notification, distinct from the regular status push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub title: String,
    pub body: String,
}

impl Event {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { title: title.into(), body: body.into() }
    }
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn publish_status(&self, report: &StatusReport) -> Result<(), NotifyError>;

    async fn publish_event(&self, event: &Event) -> Result<(), NotifyError>;
}

#[derive(Debug)]
pub enum NotifyError {
    Http(ureq::Error),
    Task(tokio::task::JoinError),
}

impl From<ureq::Error> for NotifyError {
    fn from(e: ureq::Error) -> Self {
        NotifyError::Http(e)
    }
}

impl From<tokio::task::JoinError> for NotifyError {
    fn from(e: tokio::task::JoinError) -> Self {
        NotifyError::Task(e)
    }
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::Http(e) => write!(f, "Notification request failed: {}", e),
            NotifyError::Task(e) => write!(f, "Notification task failed: {}", e),
        }
    }
}

impl std::error::Error for NotifyError {}

/// Writes status to the [`StatusBoard`] and forwards events to Pushover.
pub struct Notifier {
    board: StatusBoard,
    pushover: Option<Pushover>,
}

impl Notifier {
    pub fn new(board: StatusBoard, pushover: Option<Pushover>) -> Self {
        Self { board, pushover }
    }
}

#[async_trait]
impl NotificationChannel for Notifier {
    async fn publish_status(&self, report: &StatusReport) -> Result<(), NotifyError> {
        self.board.set_report(report.clone()).await;
        Ok(())
    }

    async fn publish_event(&self, event: &Event) -> Result<(), NotifyError> {
        info!("{}: {}", event.title, event.body);
        self.board.push_event(event.clone()).await;

        // push delivery is best effort
        if let Some(pushover) = &self.pushover {
            if let Err(e) = pushover.send(event).await {
                error!("Sending push notification: {}", e);
            }
        }
        Ok(())
    }
}
