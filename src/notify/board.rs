use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use super::{Event, StatusReport};

const EVENT_HISTORY: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardView {
    pub report: Option<StatusReport>,
    pub updated: Option<DateTime<Utc>>,
    /// Newest first.
    pub events: VecDeque<EventRecord>,
}

/// Latest published status and recent events, served on `/status`.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<RwLock<BoardView>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_report(&self, report: StatusReport) {
        let mut inner = self.inner.write().await;
        inner.report = Some(report);
        inner.updated = Some(Utc::now());
    }

    pub async fn push_event(&self, event: Event) {
        let mut inner = self.inner.write().await;
        inner.events.push_front(EventRecord { at: Utc::now(), event });
        inner.events.truncate(EVENT_HISTORY);
    }

    pub async fn view(&self) -> BoardView {
        self.inner.read().await.clone()
    }
}
