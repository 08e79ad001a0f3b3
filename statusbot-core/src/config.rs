//! Bot configuration, loaded from a TOML file.
//!
//! Every field is operator-edited except `message_id`, which tracks the
//! currently-managed status message and is rewritten at runtime. Updates go
//! through [`ConfigStore::set_message_id`], which re-serializes the whole
//! structure and replaces the file atomically so a crash mid-write cannot
//! truncate the rest of the config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Error;

pub const DEFAULT_SERVER_PORT: u16 = 30120;
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 2500;
/// Capacity shown when info.json lacks `vars.sv_maxClients`.
pub const DEFAULT_MAX_PLAYERS: u32 = 150;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Discord bot token.
    pub token: String,

    /// FiveM server host and status port (players.json / info.json).
    pub server_ip: String,
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Display name used as the embed title and footer.
    pub server_name: String,
    /// cfx.re join code embedded in the connect instruction.
    pub cfx_code: String,

    /// Channel that holds the managed status message.
    pub status_channel_id: String,

    /// Refresh period in milliseconds.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,

    /// Icon shown in the embed author and footer blocks.
    #[serde(default)]
    pub icon_url: String,

    /// Id of the last managed status message. Runtime-owned; leave unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    pub urls: ActionUrls,
}

/// Static outbound URLs for the non-connect buttons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionUrls {
    pub store: String,
    pub devops: String,
    pub forums: String,
    pub cad: String,
}

fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}

fn default_update_interval_ms() -> u64 {
    DEFAULT_UPDATE_INTERVAL_MS
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Ok(toml::from_str(&content)?)
    }
}

/// Owns the config file path plus the parsed document, and keeps the two in
/// sync when the managed message id changes.
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let config = Config::load(&path)?;
        Ok(Self { path, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn message_id(&self) -> Option<&str> {
        self.config.message_id.as_deref()
    }

    /// Read-modify-write of the full document: only `message_id` changes,
    /// every other field survives verbatim. Written to a temp sibling and
    /// renamed into place.
    pub fn set_message_id(&mut self, id: Option<String>) -> Result<(), Error> {
        self.config.message_id = id;
        self.persist()
    }

    fn persist(&self) -> Result<(), Error> {
        let serialized = toml::to_string_pretty(&self.config)?;
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Config persisted to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
token = "abc123"
server_ip = "127.0.0.1"
server_name = "Test Roleplay"
cfx_code = "le6gq5"
status_channel_id = "1272611488649183374"
icon_url = "https://cdn.example.com/logo.png"

[urls]
store = "https://store.example.com"
devops = "https://devops.example.com"
forums = "https://forums.example.com"
cad = "https://cad.example.com"
"#;

    fn write_sample(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("statusbot.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        path
    }

    #[test]
    fn load_applies_defaults_for_omitted_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir);

        let store = ConfigStore::load(&path).unwrap();
        let cfg = store.config();
        assert_eq!(cfg.server_port, DEFAULT_SERVER_PORT);
        assert_eq!(cfg.update_interval_ms, DEFAULT_UPDATE_INTERVAL_MS);
        assert!(cfg.message_id.is_none());
        assert_eq!(cfg.urls.store, "https://store.example.com");
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(ConfigStore::load(&path).is_err());
    }

    #[test]
    fn load_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statusbot.toml");
        std::fs::write(&path, "not toml ][[[").unwrap();
        assert!(ConfigStore::load(&path).is_err());
    }

    #[test]
    fn set_message_id_survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir);

        let mut store = ConfigStore::load(&path).unwrap();
        store.set_message_id(Some("99887766".into())).unwrap();

        let reloaded = ConfigStore::load(&path).unwrap();
        assert_eq!(reloaded.message_id(), Some("99887766"));
    }

    #[test]
    fn set_message_id_preserves_every_other_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir);

        let mut store = ConfigStore::load(&path).unwrap();
        store.set_message_id(Some("1".into())).unwrap();
        store.set_message_id(None).unwrap();

        let reloaded = ConfigStore::load(&path).unwrap();
        let cfg = reloaded.config();
        assert!(cfg.message_id.is_none());
        assert_eq!(cfg.token, "abc123");
        assert_eq!(cfg.server_ip, "127.0.0.1");
        assert_eq!(cfg.server_name, "Test Roleplay");
        assert_eq!(cfg.cfx_code, "le6gq5");
        assert_eq!(cfg.status_channel_id, "1272611488649183374");
        assert_eq!(cfg.icon_url, "https://cdn.example.com/logo.png");
        assert_eq!(cfg.urls.devops, "https://devops.example.com");
        assert_eq!(cfg.urls.forums, "https://forums.example.com");
        assert_eq!(cfg.urls.cad, "https://cad.example.com");
    }

    #[test]
    fn persist_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir);

        let mut store = ConfigStore::load(&path).unwrap();
        store.set_message_id(Some("42".into())).unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
