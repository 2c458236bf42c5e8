use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::activity::config::RconConfig;
use crate::controller::config::ControllerConfig;
use crate::deploy::config::PortainerConfig;
use crate::logging::LogConfig;
use crate::notify::config::PushoverConfig;
use crate::server::config::WebConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub controller: ControllerConfig,
    pub portainer: PortainerConfig,
    pub rcon: RconConfig,
    pub web: WebConfig,
    pub pushover: Option<PushoverConfig>,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    const CONFIG_FILE: &str = concat!(
        "/etc/",
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_NAME"),
        ".cfg"
    );
    const CONFIG_FILE_LOCAL: &str = concat!("./", env!("CARGO_PKG_NAME"), ".cfg");

    pub fn load_from_file(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let file = match path {
            Some(path) => File::open(path)?,
            None => File::open(Self::CONFIG_FILE).or_else(|_| File::open(Self::CONFIG_FILE_LOCAL))?,
        };

        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Box<dyn Error>> {
        let config = serde_yaml_ng::from_reader::<R, Config>(reader)?;
        config.controller.validate()?;

        Ok(config)
    }
}
