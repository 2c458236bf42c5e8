use std::error::Error;
use std::path::PathBuf;

use log::LevelFilter;
use log4rs::{
    append::{
        console::ConsoleAppender,
        rolling_file::{
            policy::compound::{roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy},
            RollingFileAppender,
        },
    },
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    Config, Handle,
};
use serde::Deserialize;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}";

#[derive(Debug, Deserialize, Default)]
pub struct LogConfig {
    level: Option<LevelFilter>,
    file: Option<PathBuf>,
    /// Rotate once the file reaches this many bytes.
    max_size: Option<u64>,
    keep: Option<u32>,
}

impl LogConfig {
    pub fn level(&self) -> LevelFilter {
        self.level.unwrap_or(LevelFilter::Info)
    }

    pub fn max_size(&self) -> u64 {
        self.max_size.unwrap_or(10 * 1024 * 1024)
    }

    pub fn keep(&self) -> u32 {
        self.keep.unwrap_or(5)
    }

    pub fn setup(&self, name: &str) -> Result<Handle, Box<dyn Error>> {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build();

        let mut config = Config::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .logger(Logger::builder().build("rustls", LevelFilter::Warn))
            .logger(Logger::builder().build("ureq", LevelFilter::Warn));
        let mut root = Root::builder().appender("stdout");

        if let Some(file) = &self.file {
            let pattern = format!("{}.{}.{{}}.log", file.with_extension("").display(), name);
            let roller = FixedWindowRoller::builder().build(&pattern, self.keep())?;
            let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(self.max_size())), Box::new(roller));
            let logfile = RollingFileAppender::builder()
                .encoder(Box::new(PatternEncoder::new(PATTERN)))
                .build(file, Box::new(policy))?;

            config = config.appender(Appender::builder().build("logfile", Box::new(logfile)));
            root = root.appender("logfile");
        }

        let config = config.build(root.build(self.level()))?;
        Ok(log4rs::init_config(config)?)
    }
}
