pub mod activity;
pub mod cli;
pub mod config;
pub use config::Config;
pub mod controller;
pub mod deploy;
pub mod logging;
pub mod notify;
pub mod server;
#[cfg(test)]
mod testing;
