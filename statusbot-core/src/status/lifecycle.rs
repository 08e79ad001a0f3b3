//! Lifecycle manager for the single managed status message.
//!
//! Owns the message identity end to end: restoring it from the persisted
//! config at startup, editing it in place each cycle, recreating it when the
//! edit target is gone, and reacting to external deletion notices. The
//! invariant it protects: at most one status message is live, and the
//! persisted id matches the in-memory one after every transition.
//!
//! All methods take `&mut self` and are expected to be driven from a single
//! consumer (see `tasks::status_loop`), which is what serializes cycles
//! against deletion notices.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::status::render::{render, DisplaySettings, StatusPayload};
use crate::status::StatusSource;
use crate::Error;

/// How many recent channel messages are scanned for stale bot messages
/// before a fresh send.
pub const PURGE_SCAN_LIMIT: u16 = 10;

/// Remote message operations the manager needs from the chat platform.
/// Implemented by the Discord layer; faked in tests.
#[async_trait]
pub trait ChannelGateway: Send + Sync {
    /// Probe that a message id still exists in the status channel.
    async fn fetch_message(&self, message_id: &str) -> Result<(), Error>;
    /// Send a fresh status message, returning its id.
    async fn send_status(&self, payload: &StatusPayload) -> Result<String, Error>;
    /// Edit an existing status message in place.
    async fn edit_status(&self, message_id: &str, payload: &StatusPayload) -> Result<(), Error>;
    /// Delete this bot's messages among the channel's last `limit`.
    async fn purge_recent(&self, limit: u16) -> Result<(), Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageState {
    NoMessage,
    Live(String),
}

pub struct LifecycleManager {
    gateway: Arc<dyn ChannelGateway>,
    source: Arc<dyn StatusSource>,
    display: DisplaySettings,
    store: ConfigStore,
    state: MessageState,
}

impl LifecycleManager {
    pub fn new(
        gateway: Arc<dyn ChannelGateway>,
        source: Arc<dyn StatusSource>,
        display: DisplaySettings,
        store: ConfigStore,
    ) -> Self {
        Self {
            gateway,
            source,
            display,
            store,
            state: MessageState::NoMessage,
        }
    }

    pub fn state(&self) -> &MessageState {
        &self.state
    }

    /// Startup transition: adopt the persisted message id if it still points
    /// at a real message, otherwise clear it and start from `NoMessage`.
    pub async fn restore(&mut self) {
        let Some(id) = self.store.message_id().map(str::to_owned) else {
            return;
        };
        match self.gateway.fetch_message(&id).await {
            Ok(()) => {
                info!("Found existing status message with ID: {id}");
                self.state = MessageState::Live(id);
            }
            Err(e) => {
                info!("Could not find message with ID {id} ({e}), will create a new one");
                self.persist_id(None);
            }
        }
    }

    /// One refresh cycle: fetch, render, apply. Never fails; every remote
    /// error is absorbed into a state transition.
    pub async fn refresh(&mut self) {
        let snapshot = self.source.fetch().await;
        let payload = render(&snapshot, &self.display, Utc::now());
        self.apply(&payload).await;
    }

    async fn apply(&mut self, payload: &StatusPayload) {
        if let MessageState::Live(id) = self.state.clone() {
            match self.gateway.edit_status(&id, payload).await {
                Ok(()) => return,
                Err(e) => {
                    // Message gone or API error either way: drop the
                    // reference and create a replacement in this same cycle.
                    warn!("Error editing status message {id}, creating a new one: {e}");
                    self.state = MessageState::NoMessage;
                    self.persist_id(None);
                }
            }
        }
        self.create(payload).await;
    }

    async fn create(&mut self, payload: &StatusPayload) {
        // Stale bot messages from earlier runs; failure here is cosmetic.
        if let Err(e) = self.gateway.purge_recent(PURGE_SCAN_LIMIT).await {
            warn!("Could not bulk delete old status messages: {e}");
        }

        match self.gateway.send_status(payload).await {
            Ok(new_id) => {
                // State at send completion is authoritative: a competing
                // handler must not leave a stale id behind the new message.
                if let MessageState::Live(existing) = &self.state {
                    debug!("Replacing message reference {existing} adopted mid-send");
                }
                info!("New status message created with ID: {new_id}");
                self.state = MessageState::Live(new_id.clone());
                self.persist_id(Some(new_id));
            }
            Err(e) => {
                // Stay in NoMessage; the next tick is the retry.
                warn!("Error sending status message: {e}");
            }
        }
    }

    /// Inbound deletion notice. Only a notice for the currently-held id
    /// changes anything.
    pub fn handle_deletion(&mut self, deleted_id: &str) {
        if matches!(&self.state, MessageState::Live(id) if id == deleted_id) {
            info!("Status message was deleted, will create a new one on next update");
            self.state = MessageState::NoMessage;
            self.persist_id(None);
        }
    }

    /// Best effort: the in-memory transition already happened, and the next
    /// successful write heals any drift.
    fn persist_id(&mut self, id: Option<String>) {
        if let Err(e) = self.store.set_message_id(id) {
            warn!("Failed to persist status message id: {e}");
        }
    }
}
