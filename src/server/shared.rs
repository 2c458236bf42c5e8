use std::sync::Arc;

use crate::controller::Controller;
use crate::notify::StatusBoard;

/// Handles shared between the HTTP routes and the tick task.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Controller>,
    pub board: StatusBoard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Shutdown,
}
