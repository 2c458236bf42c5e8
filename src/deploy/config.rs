use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct PortainerConfig {
    apiurl: String,
    api_key: String,
    endpoint_id: Option<u32>,
    #[serde(default)]
    insecure: bool,
    timeout: Option<u64>,
}

impl PortainerConfig {
    pub fn apiurl(&self) -> &str {
        self.apiurl.as_ref()
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_ref()
    }

    pub fn endpoint_id(&self) -> u32 {
        self.endpoint_id.unwrap_or(2)
    }

    pub fn insecure(&self) -> bool {
        self.insecure
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout.unwrap_or(30))
    }
}
