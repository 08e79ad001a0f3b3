//! Status-message domain: the snapshot model, rendering, the action-link
//! table, and the lifecycle manager that owns the single managed message.

pub mod lifecycle;
pub mod links;
pub mod render;

use async_trait::async_trait;

use crate::config::DEFAULT_MAX_PLAYERS;

/// One point-in-time read of the game server's player/capacity data.
/// Produced fresh every cycle; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub online_players: u32,
    pub max_players: u32,
    pub online: bool,
    pub fetch_error: Option<String>,
}

impl StatusSnapshot {
    pub fn online(online_players: u32, max_players: u32) -> Self {
        Self {
            online_players,
            max_players,
            online: true,
            fetch_error: None,
        }
    }

    /// The degraded shape every fetch failure collapses to.
    pub fn offline(reason: impl Into<String>) -> Self {
        Self {
            online_players: 0,
            max_players: DEFAULT_MAX_PLAYERS,
            online: false,
            fetch_error: Some(reason.into()),
        }
    }
}

/// Source of status snapshots. The FiveM API implements this; tests feed
/// the lifecycle manager canned snapshots through it.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Never fails: transport problems degrade to an offline snapshot.
    async fn fetch(&self) -> StatusSnapshot;
}
