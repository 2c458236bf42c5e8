use std::{net::SocketAddr, path::PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub listen: SocketAddr,
    pub tls: Option<WebTlsConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebTlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}
