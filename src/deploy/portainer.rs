use async_trait::async_trait;
use log::{debug, info};
use ureq::{tls::TlsConfig, Agent};

use super::{config::PortainerConfig, DeployError, DeploymentClient, Workload};

/// Portainer stack API client.
///
/// ureq is blocking, every request runs on the blocking thread pool.
pub struct PortainerApi {
    config: PortainerConfig,
    agent: Agent,
}

impl PortainerApi {
    pub fn new(config: &PortainerConfig) -> Self {
        let config = config.clone();

        let agent: Agent = Agent::config_builder()
            .tls_config(TlsConfig::builder().disable_verification(config.insecure()).build())
            .timeout_global(Some(config.timeout()))
            .build()
            .into();

        Self { config, agent }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.apiurl(), path)
    }

    async fn blocking<T, F>(&self, request: F) -> Result<T, DeployError>
    where
        F: FnOnce(&Agent, &str) -> Result<T, ureq::Error> + Send + 'static,
        T: Send + 'static,
    {
        let agent = self.agent.clone();
        let api_key = self.config.api_key().to_owned();
        Ok(tokio::task::spawn_blocking(move || request(&agent, &api_key)).await??)
    }

    async fn stack_action(&self, id: u64, action: &'static str) -> Result<(), DeployError> {
        let url = self.url(&format!("stacks/{}/{}", id, action));
        let endpoint_id = self.config.endpoint_id().to_string();

        debug!("POST {:?}", url);
        self.blocking(move |agent, api_key| {
            agent.post(&url)
                .header("X-API-Key", api_key)
                .query("endpointId", &endpoint_id)
                .send_empty()?;
            Ok(())
        }).await
    }
}

#[async_trait]
impl DeploymentClient for PortainerApi {
    async fn list_workloads(&self) -> Result<Vec<Workload>, DeployError> {
        let url = self.url("stacks");

        debug!("Fetch stacks from {:?}", url);
        self.blocking(move |agent, api_key| {
            agent.get(&url)
                .header("X-API-Key", api_key)
                .call()?
                .body_mut()
                .read_json::<Vec<Workload>>()
        }).await
    }

    async fn get_workload(&self, id: u64) -> Result<Workload, DeployError> {
        let url = self.url(&format!("stacks/{}", id));

        debug!("Fetch stack from {:?}", url);
        self.blocking(move |agent, api_key| {
            agent.get(&url)
                .header("X-API-Key", api_key)
                .call()?
                .body_mut()
                .read_json::<Workload>()
        }).await
    }

    async fn start(&self, id: u64) -> Result<(), DeployError> {
        info!("Starting stack {}", id);
        self.stack_action(id, "start").await?;
        info!("Stack {} started", id);
        Ok(())
    }

    async fn stop(&self, id: u64) -> Result<(), DeployError> {
        info!("Stopping stack {}", id);
        self.stack_action(id, "stop").await?;
        info!("Stack {} stopped", id);
        Ok(())
    }
}
