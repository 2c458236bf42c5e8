use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct PushoverConfig {
    token: String,
    user: String,
    url: Option<String>,
}

impl PushoverConfig {
    pub fn token(&self) -> &str {
        self.token.as_ref()
    }

    pub fn user(&self) -> &str {
        self.user.as_ref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}
