use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

pub mod config;
pub mod packet;
mod rcon;
pub use rcon::RconOracle;

/// Reports how many clients are connected to the workload.
///
/// The session is shared: `connect` and `disconnect` are no-ops when
/// already in the requested state.
#[async_trait]
pub trait ActivityOracle: Send + Sync {
    async fn connect(&self) -> Result<(), ActivityError>;

    /// Retries `connect` on a fixed delay until a session is authenticated.
    async fn wait_until_connected(&self) -> Result<(), ActivityError>;

    /// Fails with [`ActivityError::NotConnected`] without a session.
    async fn active_count(&self) -> Result<u32, ActivityError>;

    async fn disconnect(&self) -> Result<(), ActivityError>;
}

#[derive(Debug)]
pub enum ActivityError {
    Io(std::io::Error),
    NotConnected,
    Disconnected,
    Timeout,
    AuthFailed,
    Malformed(String),
    UnexpectedReply(String),
}

impl ActivityError {
    /// Errors worth retrying the connection for.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ActivityError::Io(_) | ActivityError::Disconnected | ActivityError::Timeout
        )
    }
}

impl From<std::io::Error> for ActivityError {
    fn from(e: std::io::Error) -> Self {
        ActivityError::Io(e)
    }
}

impl std::fmt::Display for ActivityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityError::Io(e) => write!(f, "RCON io::Error {}", e),
            ActivityError::NotConnected => write!(f, "RCON is not connected"),
            ActivityError::Disconnected => write!(f, "RCON connection closed"),
            ActivityError::Timeout => write!(f, "RCON request timed out"),
            ActivityError::AuthFailed => write!(f, "RCON authentication failed"),
            ActivityError::Malformed(s) => write!(f, "Malformed RCON packet: {}", s),
            ActivityError::UnexpectedReply(s) => write!(f, "Unexpected RCON reply: {:?}", s),
        }
    }
}

impl std::error::Error for ActivityError {}

static PLAYER_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"There are (\d+)(?: of a max of |/)(\d+)").expect("valid player count regex")
});

/// Parses the reply of the `list` command into `(online, max)`.
pub fn parse_player_count(reply: &str) -> Result<(u32, u32), ActivityError> {
    let captures = PLAYER_COUNT
        .captures(reply)
        .ok_or_else(|| ActivityError::UnexpectedReply(reply.to_owned()))?;

    let number = |idx: usize| {
        captures[idx]
            .parse::<u32>()
            .map_err(|_| ActivityError::UnexpectedReply(reply.to_owned()))
    };

    Ok((number(1)?, number(2)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_the_player_list() {
        let count = parse_player_count("There are 3 of a max of 20 players online: alice, bob, carol");
        assert_eq!(count.unwrap(), (3, 20));
    }

    #[test]
    fn it_parses_the_legacy_player_list() {
        let count = parse_player_count("There are 0/10 players online:");
        assert_eq!(count.unwrap(), (0, 10));
    }

    #[test]
    fn it_rejects_other_replies() {
        let count = parse_player_count("Unknown command");
        assert!(matches!(count, Err(ActivityError::UnexpectedReply(_))));
    }

    #[test]
    fn only_transport_errors_are_retried() {
        assert!(ActivityError::Timeout.is_connection_error());
        assert!(ActivityError::Disconnected.is_connection_error());
        assert!(!ActivityError::AuthFailed.is_connection_error());
        assert!(!ActivityError::NotConnected.is_connection_error());
    }
}
