//! The fixed table of action links exposed as buttons under the status
//! message. Five keys, fixed order. `Connect` is synthesized from the join
//! code; the other four come verbatim from the configured URL map.

use crate::config::{ActionUrls, Config};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKey {
    Connect,
    Store,
    Devops,
    Forums,
    Cad,
}

/// Button order is part of the message contract.
pub const ACTION_ORDER: [ActionKey; 5] = [
    ActionKey::Connect,
    ActionKey::Store,
    ActionKey::Devops,
    ActionKey::Forums,
    ActionKey::Cad,
];

impl ActionKey {
    pub fn custom_id(self) -> &'static str {
        match self {
            ActionKey::Connect => "connect_button",
            ActionKey::Store => "store_button",
            ActionKey::Devops => "devops_button",
            ActionKey::Forums => "forums_button",
            ActionKey::Cad => "cad_button",
        }
    }

    /// Unknown ids resolve to `None` and are ignored by callers.
    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        ACTION_ORDER.into_iter().find(|k| k.custom_id() == custom_id)
    }

    pub fn label(self) -> &'static str {
        match self {
            ActionKey::Connect => "Connect",
            ActionKey::Store => "Store",
            ActionKey::Devops => "DevOps",
            ActionKey::Forums => "Forums",
            ActionKey::Cad => "CAD",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            ActionKey::Store => "🎁",
            ActionKey::Devops => "🛠️",
            _ => "🌐",
        }
    }
}

/// Deep-link a FiveM client straight into the server.
pub fn connect_uri(cfx_code: &str) -> String {
    format!("fivem://connect/cfx.re/join/{cfx_code}")
}

/// Static key → URL table, built once from configuration.
#[derive(Debug, Clone)]
pub struct LinkTable {
    cfx_code: String,
    urls: ActionUrls,
}

impl LinkTable {
    pub fn new(cfx_code: impl Into<String>, urls: ActionUrls) -> Self {
        Self {
            cfx_code: cfx_code.into(),
            urls,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cfx_code.clone(), config.urls.clone())
    }

    pub fn resolve(&self, key: ActionKey) -> String {
        match key {
            ActionKey::Connect => connect_uri(&self.cfx_code),
            ActionKey::Store => self.urls.store.clone(),
            ActionKey::Devops => self.urls.devops.clone(),
            ActionKey::Forums => self.urls.forums.clone(),
            ActionKey::Cad => self.urls.cad.clone(),
        }
    }

    /// Resolve a raw button custom id, or `None` for ids this bot never
    /// issued.
    pub fn resolve_custom_id(&self, custom_id: &str) -> Option<String> {
        ActionKey::from_custom_id(custom_id).map(|key| self.resolve(key))
    }
}
