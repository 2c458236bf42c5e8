pub mod config;
mod interval;
mod shared;
mod signal;
mod web;

use log::{debug, info};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::{
    activity::RconOracle,
    controller::Controller,
    deploy::PortainerApi,
    notify::{Notifier, Pushover, StatusBoard},
    Config,
};

use self::shared::AppState;

pub fn run(config: Config) -> std::io::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            let board = StatusBoard::new();
            let notifier = Notifier::new(board.clone(), config.pushover.as_ref().map(Pushover::new));
            let controller = Arc::new(Controller::new(
                &config.controller,
                Arc::new(PortainerApi::new(&config.portainer)),
                Arc::new(RconOracle::new(&config.rcon)),
                Arc::new(notifier),
            ));
            info!(
                "Supervising {}: stop after {} idle ticks of {}s",
                config.controller.workload(),
                config.controller.idle_timeout(),
                config.controller.tick_interval().as_secs()
            );

            let (message_tx, _message_rx) = broadcast::channel(16);

            let _signal_handle = self::signal::spawn(&message_tx);
            let interval_handle = self::interval::spawn(config.controller.tick_interval(), &controller, &message_tx);

            self::web::server(&config.web, AppState { controller, board }, &message_tx).await;

            debug!("Web server stopped, waiting for refresh loop");
            let _ = interval_handle.await;
            info!("Shutdown complete");
        });

    Ok(())
}
