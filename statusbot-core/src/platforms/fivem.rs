//! FiveM status endpoints (players.json / info.json).
//!
//! The fetch contract is deliberately infallible: a status poll that cannot
//! reach the server *is* the answer — the server is offline as far as the
//! status message is concerned. Errors are folded into the snapshot instead
//! of propagating.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::config::DEFAULT_MAX_PLAYERS;
use crate::http::HttpClient;
use crate::status::{StatusSnapshot, StatusSource};
use crate::Error;

pub struct FivemApi {
    client: Arc<dyn HttpClient<Error = Error>>,
    /// host:port of the server's status listener.
    base: String,
}

impl FivemApi {
    pub fn new(client: Arc<dyn HttpClient<Error = Error>>, host: &str, port: u16) -> Self {
        Self {
            client,
            base: format!("{host}:{port}"),
        }
    }

    /// Both endpoint reads run concurrently; each is bounded by the client's
    /// request timeout. No retries here — the poll timer is the retry.
    pub async fn fetch(&self) -> StatusSnapshot {
        let players_url = format!("http://{}/players.json", self.base);
        let info_url = format!("http://{}/info.json", self.base);

        let (players, info) = tokio::join!(
            self.client.get(players_url),
            self.client.get(info_url),
        );

        match build_snapshot(players, info) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("FiveM status fetch failed: {e}");
                StatusSnapshot::offline(e.to_string())
            }
        }
    }
}

#[async_trait]
impl StatusSource for FivemApi {
    async fn fetch(&self) -> StatusSnapshot {
        FivemApi::fetch(self).await
    }
}

fn build_snapshot(
    players: Result<String, Error>,
    info: Result<String, Error>,
) -> Result<StatusSnapshot, Error> {
    let players: serde_json::Value = serde_json::from_str(&players?)?;
    let info: serde_json::Value = serde_json::from_str(&info?)?;

    let online_players = players
        .as_array()
        .map(|a| a.len() as u32)
        .ok_or_else(|| Error::Parse("players.json is not an array".into()))?;

    Ok(StatusSnapshot::online(
        online_players,
        max_clients(&info).unwrap_or(DEFAULT_MAX_PLAYERS),
    ))
}

/// info.json reports vars as strings, but be tolerant of a bare number too.
fn max_clients(info: &serde_json::Value) -> Option<u32> {
    let raw = info.get("vars")?.get("sv_maxClients")?;
    match raw {
        serde_json::Value::Number(n) => n.as_u64().map(|n| n as u32),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockHttpClient;

    fn api_with(players: &'static str, info: &'static str) -> FivemApi {
        let mut mock = MockHttpClient::new();
        mock.expect_get().returning(move |url| {
            if url.ends_with("/players.json") {
                Ok(players.to_string())
            } else {
                Ok(info.to_string())
            }
        });
        FivemApi::new(Arc::new(mock), "127.0.0.1", 30120)
    }

    #[tokio::test]
    async fn healthy_server_produces_online_snapshot() {
        let api = api_with(
            r#"[{"id":1},{"id":2},{"id":3}]"#,
            r#"{"vars":{"sv_maxClients":"48"}}"#,
        );
        let snapshot = api.fetch().await;
        assert_eq!(snapshot, StatusSnapshot::online(3, 48));
    }

    #[tokio::test]
    async fn numeric_max_clients_is_accepted() {
        let api = api_with("[]", r#"{"vars":{"sv_maxClients":64}}"#);
        let snapshot = api.fetch().await;
        assert_eq!(snapshot.max_players, 64);
        assert!(snapshot.online);
    }

    #[tokio::test]
    async fn missing_max_clients_falls_back_to_default() {
        let api = api_with("[]", r#"{"vars":{}}"#);
        let snapshot = api.fetch().await;
        assert_eq!(snapshot.max_players, DEFAULT_MAX_PLAYERS);
    }

    #[tokio::test]
    async fn transport_error_degrades_to_offline() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .returning(|_| Err(Error::Platform("connection refused".into())));
        let api = FivemApi::new(Arc::new(mock), "127.0.0.1", 30120);

        let snapshot = api.fetch().await;
        assert!(!snapshot.online);
        assert_eq!(snapshot.online_players, 0);
        assert_eq!(snapshot.max_players, DEFAULT_MAX_PLAYERS);
        assert!(snapshot
            .fetch_error
            .as_deref()
            .is_some_and(|e| e.contains("connection refused")));
    }

    #[tokio::test]
    async fn malformed_body_degrades_to_offline() {
        let api = api_with("<html>not json</html>", r#"{"vars":{}}"#);
        let snapshot = api.fetch().await;
        assert!(!snapshot.online);
        assert!(snapshot.fetch_error.is_some());
    }

    #[tokio::test]
    async fn non_array_players_document_degrades_to_offline() {
        let api = api_with(r#"{"unexpected":"object"}"#, r#"{"vars":{}}"#);
        let snapshot = api.fetch().await;
        assert!(!snapshot.online);
    }
}
