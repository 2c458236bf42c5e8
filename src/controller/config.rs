use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    workload: String,
    idle_timeout: u32,
    tick_interval: Option<u64>,
    start_timeout: Option<u64>,
}

impl ControllerConfig {
    /// Name of the stack to supervise.
    pub fn workload(&self) -> &str {
        self.workload.as_ref()
    }

    /// Idle ticks before the workload gets stopped.
    pub fn idle_timeout(&self) -> u32 {
        self.idle_timeout
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval.unwrap_or(60))
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout.unwrap_or(600))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.workload.is_empty() {
            return Err(String::from("controller.workload must not be empty"));
        }
        if self.idle_timeout == 0 {
            return Err(String::from("controller.idle_timeout must be at least 1 tick"));
        }
        if self.tick_interval == Some(0) {
            return Err(String::from("controller.tick_interval must be at least 1 second"));
        }
        Ok(())
    }
}
