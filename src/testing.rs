//! In-memory adapters for exercising the controller.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::activity::{ActivityError, ActivityOracle};
use crate::controller::config::ControllerConfig;
use crate::controller::Controller;
use crate::deploy::{DeployError, DeploymentClient, Workload, WorkloadStatus};
use crate::notify::{Event, NotificationChannel, NotifyError, StatusReport};

pub const WORKLOAD_ID: u64 = 7;
pub const WORKLOAD_NAME: &str = "minecraft-server";

#[derive(Default)]
pub struct FakeDeploy {
    pub deployed: AtomicBool,
    pub fail_get: AtomicBool,
    pub fail_start: AtomicBool,
    pub fail_stop: AtomicBool,
    pub gets: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    /// When set, `stop` blocks until `stop_released` is notified.
    pub hold_stop: AtomicBool,
    pub stop_released: Notify,
}

impl FakeDeploy {
    pub fn new(deployed: bool) -> Arc<Self> {
        let deploy = Self::default();
        deploy.deployed.store(deployed, Ordering::SeqCst);
        Arc::new(deploy)
    }

    fn workload(&self) -> Workload {
        Workload {
            id: WORKLOAD_ID,
            name: WORKLOAD_NAME.to_owned(),
            status: if self.deployed.load(Ordering::SeqCst) { WorkloadStatus::Deployed } else { WorkloadStatus::Stopped },
        }
    }

    fn failure() -> DeployError {
        DeployError::Http(ureq::Error::StatusCode(500))
    }
}

#[async_trait]
impl DeploymentClient for FakeDeploy {
    async fn list_workloads(&self) -> Result<Vec<Workload>, DeployError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        let other = Workload { id: 1, name: String::from("other"), status: WorkloadStatus::Deployed };
        Ok(vec![other, self.workload()])
    }

    async fn get_workload(&self, id: u64) -> Result<Workload, DeployError> {
        assert_eq!(id, WORKLOAD_ID);
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self.workload())
    }

    async fn start(&self, id: u64) -> Result<(), DeployError> {
        assert_eq!(id, WORKLOAD_ID);
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        self.deployed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self, id: u64) -> Result<(), DeployError> {
        assert_eq!(id, WORKLOAD_ID);
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.hold_stop.load(Ordering::SeqCst) {
            self.stop_released.notified().await;
        }
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        self.deployed.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Reports active counts from a script; the last value repeats.
#[derive(Default)]
pub struct FakeActivity {
    counts: Mutex<VecDeque<u32>>,
    last: Mutex<u32>,
    pub connected: AtomicBool,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    /// When set, `wait_until_connected` blocks until `ready` is notified.
    pub gated: AtomicBool,
    pub ready: Notify,
}

impl FakeActivity {
    pub fn new(counts: &[u32]) -> Arc<Self> {
        let activity = Self::default();
        activity.script(counts);
        Arc::new(activity)
    }

    pub fn script(&self, counts: &[u32]) {
        *self.counts.lock().unwrap() = counts.iter().copied().collect();
    }
}

#[async_trait]
impl ActivityOracle for FakeActivity {
    async fn connect(&self) -> Result<(), ActivityError> {
        if !self.connected.swap(true, Ordering::SeqCst) {
            self.connects.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn wait_until_connected(&self) -> Result<(), ActivityError> {
        if self.gated.load(Ordering::SeqCst) {
            self.ready.notified().await;
        }
        self.connect().await
    }

    async fn active_count(&self) -> Result<u32, ActivityError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ActivityError::NotConnected);
        }
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.counts.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(*last)
    }

    async fn disconnect(&self) -> Result<(), ActivityError> {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub reports: Mutex<Vec<StatusReport>>,
    pub events: Mutex<Vec<Event>>,
    pub fail_publish: AtomicBool,
}

impl FakeNotifier {
    pub fn last_report(&self) -> Option<StatusReport> {
        self.reports.lock().unwrap().last().cloned()
    }

    pub fn event_titles(&self) -> Vec<String> {
        self.events.lock().unwrap().iter().map(|e| e.title.clone()).collect()
    }
}

#[async_trait]
impl NotificationChannel for FakeNotifier {
    async fn publish_status(&self, report: &StatusReport) -> Result<(), NotifyError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(NotifyError::Http(ureq::Error::StatusCode(503)));
        }
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn publish_event(&self, event: &Event) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub struct Harness {
    pub controller: Arc<Controller>,
    pub deploy: Arc<FakeDeploy>,
    pub activity: Arc<FakeActivity>,
    pub notifier: Arc<FakeNotifier>,
}

pub fn controller_config(idle_timeout: u32) -> ControllerConfig {
    serde_yaml_ng::from_str(&format!(
        "workload: {}\nidle_timeout: {}\ntick_interval: 1\nstart_timeout: 30\n",
        WORKLOAD_NAME, idle_timeout
    )).unwrap()
}

pub fn harness(idle_timeout: u32, deployed: bool, counts: &[u32]) -> Harness {
    let deploy = FakeDeploy::new(deployed);
    let activity = FakeActivity::new(counts);
    let notifier = Arc::new(FakeNotifier::default());
    let controller = Arc::new(Controller::new(
        &controller_config(idle_timeout),
        deploy.clone(),
        activity.clone(),
        notifier.clone(),
    ));

    Harness { controller, deploy, activity, notifier }
}
