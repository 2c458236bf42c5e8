use log::debug;
use serde::Serialize;
use ureq::Agent;

use super::{config::PushoverConfig, Event, NotifyError};

const PUSHOVER_API: &str = "https://api.pushover.net/1/messages.json";

#[derive(Debug, Serialize)]
struct PushoverMessage<'a> {
    token: &'a str,
    user: &'a str,
    title: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

pub struct Pushover {
    config: PushoverConfig,
    agent: Agent,
}

impl Pushover {
    pub fn new(config: &PushoverConfig) -> Self {
        Self { config: config.clone(), agent: Agent::new_with_defaults() }
    }

    pub async fn send(&self, event: &Event) -> Result<(), NotifyError> {
        let agent = self.agent.clone();
        let config = self.config.clone();
        let event = event.clone();

        debug!("Push notification: {}", event.title);
        tokio::task::spawn_blocking(move || {
            let message = PushoverMessage {
                token: config.token(),
                user: config.user(),
                title: &event.title,
                message: &event.body,
                url: config.url(),
            };
            agent.post(PUSHOVER_API).send_json(&message).map(|_| ())
        }).await??;

        Ok(())
    }
}
