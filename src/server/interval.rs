use std::{sync::Arc, time::Duration};

use log::{debug, error, info};
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::controller::Controller;

use super::shared::Message;

/// Runs `Controller::refresh` once per tick until shutdown.
///
/// A failed refresh is logged; the next tick still happens on schedule.
pub fn spawn(tick: Duration, controller: &Arc<Controller>, message_tx: &broadcast::Sender<Message>) -> JoinHandle<()> {
    let controller = controller.clone();
    let mut message_rx = message_tx.subscribe();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {},
                msg = message_rx.recv() => match msg {
                    Ok(Message::Shutdown) | Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(_)) => continue,
                },
            }

            debug!("Refresh tick");
            match controller.refresh().await {
                Ok(Some(outcome)) => info!("Idle timer finished: {:?}", outcome),
                Ok(None) => {},
                Err(e) => error!("Refresh failed: {}", e),
            }
        }
        info!("Refresh loop ended");
    })
}
