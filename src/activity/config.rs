use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct RconConfig {
    address: String,
    password: String,
    retry_delay: Option<u64>,
    timeout: Option<u64>,
}

impl RconConfig {
    pub fn address(&self) -> &str {
        self.address.as_ref()
    }

    pub fn password(&self) -> &str {
        self.password.as_ref()
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay.unwrap_or(10))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_rcon_config() {
        let cfg = serde_yaml_ng::from_str::<RconConfig>(r#"---
        address: 192.168.1.252:25575
        password: SECRET
        "#);
        assert!(cfg.is_ok());
        let cfg = cfg.unwrap();
        assert_eq!(cfg.address(), "192.168.1.252:25575");
        assert_eq!(cfg.password(), "SECRET");
        assert_eq!(cfg.retry_delay(), Duration::from_secs(10));
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
    }
}
