use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{oneshot, Mutex};
use tokio::time::timeout;

use crate::activity::ActivityOracle;
use crate::deploy::DeploymentClient;
use crate::notify::{Event, NotificationChannel, StatusReport};

pub mod config;
pub mod error;
pub mod status;
pub mod timer;

use self::config::ControllerConfig;
pub use self::error::ControllerError;
use self::status::{ServerStatus, StartOutcome, StopOutcome, WorkloadSnapshot};
use self::timer::{Countdown, IdleTimer};

#[derive(Debug, Default)]
struct ControllerState {
    status: ServerStatus,
    workload: Option<WorkloadSnapshot>,
    /// Bumped each time a start sets `Starting`.
    start_attempt: u64,
}

/// Sole owner of the workload's [`ServerStatus`].
///
/// `refresh`, `request_stop` and the deployment phases of `request_start`
/// run under one operation lock, so at most one of them touches the
/// adapters at a time. A start waiting for the session holds neither lock.
pub struct Controller {
    workload_name: String,
    timer: IdleTimer,
    start_timeout: Duration,
    deploy: Arc<dyn DeploymentClient>,
    activity: Arc<dyn ActivityOracle>,
    notifier: Arc<dyn NotificationChannel>,
    state: Mutex<ControllerState>,
    operation: Mutex<()>,
}

impl Controller {
    pub fn new(
        config: &ControllerConfig,
        deploy: Arc<dyn DeploymentClient>,
        activity: Arc<dyn ActivityOracle>,
        notifier: Arc<dyn NotificationChannel>,
    ) -> Self {
        Self {
            workload_name: config.workload().to_owned(),
            timer: IdleTimer::new(config.idle_timeout()),
            start_timeout: config.start_timeout(),
            deploy,
            activity,
            notifier,
            state: Mutex::new(ControllerState::default()),
            operation: Mutex::new(()),
        }
    }

    pub async fn status(&self) -> ServerStatus {
        self.state.lock().await.status
    }

    pub async fn workload(&self) -> Option<WorkloadSnapshot> {
        self.state.lock().await.workload.clone()
    }

    pub fn idle_timeout(&self) -> u32 {
        self.timer.total_ticks()
    }

    /// One periodic observation.
    ///
    /// Returns the outcome of an idle countdown that finished during this
    /// tick. On error the status is left as it was and nothing is published.
    pub async fn refresh(&self) -> Result<Option<StopOutcome>, ControllerError> {
        let _operation = self.operation.lock().await;
        self.refresh_locked().await
    }

    pub async fn request_start(&self) -> Result<StartOutcome, ControllerError> {
        self.start_workload(None, None).await
    }

    /// Like [`Controller::request_start`], but reports the outcome on
    /// `accepted` as soon as the start has been issued, before the workload
    /// is confirmed up.
    pub async fn request_start_acked(
        &self,
        requested_by: Option<&str>,
        accepted: oneshot::Sender<StartOutcome>,
    ) -> Result<StartOutcome, ControllerError> {
        self.start_workload(requested_by, Some(accepted)).await
    }

    pub async fn request_stop(&self) -> Result<(), ControllerError> {
        let _operation = self.operation.lock().await;
        let workload = self.known_workload().await?;

        info!("Stop requested for {}", workload.name);
        self.stop_locked(&workload).await?;

        if let Err(e) = self.refresh_locked().await {
            warn!("Refresh after stop failed: {}", e);
        }
        Ok(())
    }

    async fn known_workload(&self) -> Result<WorkloadSnapshot, ControllerError> {
        self.state.lock().await.workload.clone().ok_or(ControllerError::NotReady)
    }

    async fn start_workload(
        &self,
        requested_by: Option<&str>,
        accepted: Option<oneshot::Sender<StartOutcome>>,
    ) -> Result<StartOutcome, ControllerError> {
        let (workload, attempt) = {
            let _operation = self.operation.lock().await;
            let workload = self.known_workload().await?;

            let (previous, attempt) = {
                let mut state = self.state.lock().await;
                let early = match state.status {
                    ServerStatus::Starting => Some(StartOutcome::AlreadyStarting),
                    s if s.is_up() => Some(StartOutcome::AlreadyRunning),
                    _ => None,
                };
                if let Some(outcome) = early {
                    debug!("Start of {} ignored: {}", workload.name, state.status);
                    acknowledge(accepted, outcome);
                    return Ok(outcome);
                }

                state.start_attempt += 1;
                (std::mem::replace(&mut state.status, ServerStatus::Starting), state.start_attempt)
            };

            if let Err(e) = self.deploy.start(workload.id).await {
                error!("Starting {} failed: {}", workload.name, e);
                self.state.lock().await.status = previous;
                return Err(e.into());
            }
            (workload, attempt)
        };
        acknowledge(accepted, StartOutcome::Started);

        let body = match requested_by {
            Some(who) => format!("{} is starting. Requested by {}", workload.name, who),
            None => format!("{} is starting.", workload.name),
        };
        self.publish_event(Event::new("Server starting", body)).await;

        let confirmed = match timeout(self.start_timeout, self.activity.wait_until_connected()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ControllerError::from(e)),
            Err(_) => Err(ControllerError::StartTimeout(self.start_timeout)),
        };

        let _operation = self.operation.lock().await;
        {
            let mut state = self.state.lock().await;
            // a stop, or a stop followed by a newer start, took over
            if state.start_attempt != attempt || state.status != ServerStatus::Starting {
                info!("Start of {} superseded, now {}", workload.name, state.status);
                let stopped = state.status == ServerStatus::Stopped;
                drop(state);
                if stopped {
                    self.activity.disconnect().await?;
                }
                return Ok(StartOutcome::Started);
            }
            if confirmed.is_ok() {
                state.status = ServerStatus::Running;
            }
        }

        if let Err(e) = confirmed {
            error!("{} did not come up: {}", workload.name, e);
            self.abandon_start(&workload).await;
            self.publish_event(Event::new("Server start failed", format!("{}: {}", workload.name, e))).await;
            return Err(e);
        }
        info!("{} is running", workload.name);

        if let Err(e) = self.refresh_locked().await {
            warn!("Refresh after start failed: {}", e);
        }
        Ok(StartOutcome::Started)
    }

    /// Takes down a workload that was deployed but never became reachable.
    ///
    /// If that fails too the workload is treated as running, so ticks keep
    /// polling it and the idle timer can still stop it.
    async fn abandon_start(&self, workload: &WorkloadSnapshot) {
        match self.stop_locked(workload).await {
            Ok(()) => info!("{} stopped after failed start", workload.name),
            Err(e) => {
                warn!("Stopping {} after failed start failed: {}", workload.name, e);
                self.state.lock().await.status = ServerStatus::Running;
            }
        }
    }

    async fn refresh_locked(&self) -> Result<Option<StopOutcome>, ControllerError> {
        let workload = self.fetch_workload().await?;
        let status = self.status().await;

        if !(workload.deployed && status.is_up()) {
            if status.is_up() {
                warn!("{} is no longer deployed", workload.name);
                self.activity.disconnect().await?;
            }
            self.notifier.publish_status(&StatusReport::offline()).await?;
            if status.is_up() {
                self.state.lock().await.status = ServerStatus::Stopped;
            }
            return Ok(None);
        }

        self.activity.connect().await?;
        let active = self.activity.active_count().await?;

        let mut next = status;
        if next == ServerStatus::Running && active == 0 {
            self.timer.start(&mut next);
        }
        let outcome = match self.timer.tick(&mut next, active) {
            Countdown::Canceled => Some(StopOutcome::Canceled),
            // a failed stop keeps the previous status, so the next tick expires again
            Countdown::Expired => return self.stop_idle_workload(&workload).await.map(Some),
            Countdown::Inactive | Countdown::Remaining(_) => None,
        };

        self.notifier
            .publish_status(&StatusReport::online(active, next.remaining_ticks()))
            .await?;
        self.state.lock().await.status = next;
        Ok(outcome)
    }

    /// Fetches the snapshot, resolving the workload by name on first use.
    async fn fetch_workload(&self) -> Result<WorkloadSnapshot, ControllerError> {
        if let Some(known) = self.workload().await {
            let snapshot = WorkloadSnapshot::from(&self.deploy.get_workload(known.id).await?);
            self.state.lock().await.workload = Some(snapshot.clone());
            return Ok(snapshot);
        }

        let snapshot = self
            .deploy
            .list_workloads()
            .await?
            .iter()
            .find(|w| w.name == self.workload_name)
            .map(WorkloadSnapshot::from)
            .ok_or_else(|| ControllerError::WorkloadNotFound(self.workload_name.clone()))?;

        let mut state = self.state.lock().await;
        state.status = if snapshot.deployed { ServerStatus::Running } else { ServerStatus::Stopped };
        state.workload = Some(snapshot.clone());
        info!("Resolved {} as stack {}, initially {}", snapshot.name, snapshot.id, state.status);

        Ok(snapshot)
    }

    async fn stop_idle_workload(&self, workload: &WorkloadSnapshot) -> Result<StopOutcome, ControllerError> {
        self.stop_locked(workload).await?;
        info!("{} stopped by idle timer", workload.name);

        self.publish_event(Event::new(
            "Server stopped by idle timer",
            format!("{} was stopped because no clients were active for {} ticks", workload.name, self.timer.total_ticks()),
        )).await;
        self.notifier.publish_status(&StatusReport::offline()).await?;

        Ok(StopOutcome::Success)
    }

    async fn stop_locked(&self, workload: &WorkloadSnapshot) -> Result<(), ControllerError> {
        self.activity.disconnect().await?;
        self.deploy.stop(workload.id).await?;
        self.state.lock().await.status = ServerStatus::Stopped;
        Ok(())
    }

    async fn publish_event(&self, event: Event) {
        if let Err(e) = self.notifier.publish_event(&event).await {
            warn!("Publishing event {:?} failed: {}", event.title, e);
        }
    }
}

fn acknowledge(accepted: Option<oneshot::Sender<StartOutcome>>, outcome: StartOutcome) {
    if let Some(accepted) = accepted {
        let _ = accepted.send(outcome);
    }
}
