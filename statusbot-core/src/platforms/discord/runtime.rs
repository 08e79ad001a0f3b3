use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn};

use twilight_gateway::{
    self as gateway,
    CloseFrame,
    Config,
    Event,
    EventTypeFlags,
    Intents,
    Shard,
    MessageSender,
    StreamExt,
};
use twilight_http::client::ClientBuilder;
use twilight_http::Client as HttpClient;
use twilight_model::application::interaction::{Interaction, InteractionData, InteractionType};
use twilight_model::channel::message::MessageFlags;
use twilight_model::gateway::payload::incoming::Ready as ReadyPayload;
use twilight_model::http::interaction::{
    InteractionResponse, InteractionResponseData, InteractionResponseType,
};
use twilight_model::id::marker::{ChannelMarker, MessageMarker, UserMarker};
use twilight_model::id::Id;

use crate::config::Config as BotConfig;
use crate::platforms::{ConnectionStatus, PlatformAuth, PlatformIntegration};
use crate::status::lifecycle::ChannelGateway;
use crate::status::links::LinkTable;
use crate::status::render::StatusPayload;
use crate::Error;

/// Inbound platform notifications the lifecycle loop consumes.
#[derive(Debug, Clone)]
pub enum StatusBotEvent {
    MessageDeleted {
        channel_id: String,
        message_id: String,
    },
}

/// Per-shard event loop:
///   - forwards deletions in the status channel to `tx`
///   - answers button activations inline with an ephemeral link reply.
async fn shard_runner(
    mut shard: Shard,
    tx: UnboundedSender<StatusBotEvent>,
    http: Arc<HttpClient>,
    links: Arc<LinkTable>,
    status_channel: Id<ChannelMarker>,
) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        match item {
            Ok(event) => match &event {
                Event::Ready(ready) => {
                    let data: &ReadyPayload = ready.as_ref();
                    info!(
                        "Shard {shard_id} => READY as {}#{} (ID={})",
                        data.user.name, data.user.discriminator, data.user.id
                    );
                }
                Event::MessageDelete(deleted) => {
                    if deleted.channel_id != status_channel {
                        continue;
                    }
                    let _ = tx.send(StatusBotEvent::MessageDeleted {
                        channel_id: deleted.channel_id.to_string(),
                        message_id: deleted.id.to_string(),
                    });
                }
                Event::InteractionCreate(interaction) => {
                    handle_interaction(&http, &links, interaction).await;
                }
                _ => {
                    trace!("Shard {shard_id} => unhandled event: {event:?}");
                }
            },
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

/// Button activations resolve against the static link table; anything we
/// never issued is silently ignored.
async fn handle_interaction(http: &Arc<HttpClient>, links: &LinkTable, interaction: &Interaction) {
    if interaction.kind != InteractionType::MessageComponent {
        return;
    }
    let Some(InteractionData::MessageComponent(data)) = &interaction.data else {
        return;
    };
    let Some(url) = links.resolve_custom_id(&data.custom_id) else {
        trace!("Ignoring unknown button custom id: {}", data.custom_id);
        return;
    };

    let response = InteractionResponse {
        kind: InteractionResponseType::ChannelMessageWithSource,
        data: Some(InteractionResponseData {
            content: Some(format!("Here's your link: {url}")),
            flags: Some(MessageFlags::EPHEMERAL),
            ..Default::default()
        }),
    };
    if let Err(e) = http
        .interaction(interaction.application_id)
        .create_response(interaction.id, &interaction.token, &response)
        .await
    {
        warn!("Error responding to button {}: {e:?}", data.custom_id);
    }
}

pub struct DiscordPlatform {
    token: String,
    status_channel: Id<ChannelMarker>,
    links: Arc<LinkTable>,
    connection_status: ConnectionStatus,

    /// Receiver for inbound events; taken by the run loop after `connect`.
    rx: Mutex<Option<UnboundedReceiver<StatusBotEvent>>>,

    shard_tasks: Vec<JoinHandle<()>>,
    shard_senders: Vec<MessageSender>,

    gateway: Option<Arc<DiscordGateway>>,
}

impl DiscordPlatform {
    pub fn new(config: &BotConfig) -> Result<Self, Error> {
        let channel_id: u64 = config.status_channel_id.parse().map_err(|_| {
            Error::Config(format!(
                "Invalid status_channel_id: {}",
                config.status_channel_id
            ))
        })?;
        Ok(Self {
            token: config.token.clone(),
            status_channel: Id::<ChannelMarker>::new(channel_id),
            links: Arc::new(LinkTable::from_config(config)),
            connection_status: ConnectionStatus::Disconnected,
            rx: Mutex::new(None),
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
            gateway: None,
        })
    }

    /// Channel operations handle, available once connected.
    pub fn gateway(&self) -> Result<Arc<DiscordGateway>, Error> {
        self.gateway
            .clone()
            .ok_or_else(|| Error::Platform("Discord platform is not connected".into()))
    }

    /// Hand the inbound event stream to its single consumer.
    pub async fn take_event_receiver(&self) -> Option<UnboundedReceiver<StatusBotEvent>> {
        self.rx.lock().await.take()
    }
}

#[async_trait]
impl PlatformAuth for DiscordPlatform {
    async fn authenticate(&mut self) -> Result<(), Error> {
        if self.token.is_empty() {
            return Err(Error::Auth("Discord token is empty".into()));
        }
        Ok(())
    }

    async fn is_authenticated(&self) -> Result<bool, Error> {
        Ok(!self.token.is_empty())
    }
}

#[async_trait]
impl PlatformIntegration for DiscordPlatform {
    async fn connect(&mut self) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }

        let (tx, rx) = unbounded_channel::<StatusBotEvent>();
        {
            let mut guard = self.rx.lock().await;
            *guard = Some(rx);
        }

        let http_client = Arc::new(
            ClientBuilder::new()
                .token(self.token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        );

        // Resolving our own user doubles as the startup auth check; a bad
        // token must fail hard here rather than limp along.
        let bot_user = http_client
            .current_user()
            .await
            .map_err(|e| Error::Auth(format!("current_user failed: {e}")))?
            .model()
            .await
            .map_err(|e| Error::Auth(format!("current_user parse failed: {e}")))?;
        info!("Logged in as {}#{}", bot_user.name, bot_user.discriminator);

        self.gateway = Some(Arc::new(DiscordGateway {
            http: http_client.clone(),
            channel_id: self.status_channel,
            bot_user_id: bot_user.id,
        }));

        let config = Config::new(
            self.token.clone(),
            Intents::GUILDS | Intents::GUILD_MESSAGES,
        );

        let shards = gateway::create_recommended(&http_client, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?;

        for shard in shards {
            self.shard_senders.push(shard.sender());

            let tx_for_shard = tx.clone();
            let http_for_shard = http_client.clone();
            let links_for_shard = self.links.clone();
            let channel_for_shard = self.status_channel;

            let handle = tokio::spawn(async move {
                shard_runner(
                    shard,
                    tx_for_shard,
                    http_for_shard,
                    links_for_shard,
                    channel_for_shard,
                )
                .await;
            });
            self.shard_tasks.push(handle);
        }

        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;

        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        for task in &mut self.shard_tasks {
            let _ = task.await;
        }

        self.shard_senders.clear();
        self.shard_tasks.clear();

        {
            let mut guard = self.rx.lock().await;
            *guard = None;
        }

        Ok(())
    }

    async fn get_connection_status(&self) -> Result<ConnectionStatus, Error> {
        Ok(self.connection_status.clone())
    }
}

/// Message operations against the status channel over twilight-http.
pub struct DiscordGateway {
    http: Arc<HttpClient>,
    channel_id: Id<ChannelMarker>,
    bot_user_id: Id<UserMarker>,
}

fn parse_message_id(message_id: &str) -> Result<Id<MessageMarker>, Error> {
    let raw: u64 = message_id
        .parse()
        .map_err(|_| Error::Platform(format!("Invalid message ID: {message_id}")))?;
    Ok(Id::<MessageMarker>::new(raw))
}

#[async_trait]
impl ChannelGateway for DiscordGateway {
    async fn fetch_message(&self, message_id: &str) -> Result<(), Error> {
        let id = parse_message_id(message_id)?;
        self.http
            .message(self.channel_id, id)
            .await
            .map_err(|e| Error::Platform(format!("Error fetching message {message_id}: {e}")))?;
        Ok(())
    }

    async fn send_status(&self, payload: &StatusPayload) -> Result<String, Error> {
        let embeds = [payload.embed.clone()];
        let message = self
            .http
            .create_message(self.channel_id)
            .embeds(&embeds)
            .components(&payload.components)
            .await
            .map_err(|e| Error::Platform(format!("Error sending status message: {e}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("Error parsing sent message: {e}")))?;
        Ok(message.id.to_string())
    }

    async fn edit_status(&self, message_id: &str, payload: &StatusPayload) -> Result<(), Error> {
        let id = parse_message_id(message_id)?;
        let embeds = [payload.embed.clone()];
        self.http
            .update_message(self.channel_id, id)
            .embeds(Some(&embeds))
            .components(Some(&payload.components))
            .await
            .map_err(|e| Error::Platform(format!("Error editing message {message_id}: {e}")))?;
        Ok(())
    }

    async fn purge_recent(&self, limit: u16) -> Result<(), Error> {
        let messages = self
            .http
            .channel_messages(self.channel_id)
            .limit(limit)
            .await
            .map_err(|e| Error::Platform(format!("Error listing channel messages: {e}")))?
            .models()
            .await
            .map_err(|e| Error::Platform(format!("Error parsing channel messages: {e}")))?;

        let own: Vec<Id<MessageMarker>> = messages
            .iter()
            .filter(|m| m.author.id == self.bot_user_id)
            .map(|m| m.id)
            .collect();

        match own.as_slice() {
            [] => Ok(()),
            // Bulk delete rejects a single message; delete it directly.
            [only] => self
                .http
                .delete_message(self.channel_id, *only)
                .await
                .map(|_| ())
                .map_err(|e| Error::Platform(format!("Error deleting message: {e}"))),
            many => self
                .http
                .delete_messages(self.channel_id, many)
                .await
                .map(|_| ())
                .map_err(|e| Error::Platform(format!("Error bulk deleting messages: {e}"))),
        }
    }
}
