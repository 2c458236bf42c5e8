use log::{error, info};
use tokio::{sync::broadcast, task::JoinHandle};

use super::shared::Message;

pub fn spawn(message_tx: &broadcast::Sender<Message>) -> JoinHandle<()> {
    let message_tx = message_tx.clone();

    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(name) => info!("Received {}, shutting down.", name),
            Err(e) => {
                error!("Listening for shutdown signals: {}", e);
                return;
            }
        }
        let _ = message_tx.send(Message::Shutdown);
    })
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| "Ctrl+C"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "Ctrl+C")
}
