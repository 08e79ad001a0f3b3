//! Pure rendering of a status snapshot into the Discord payload (embed plus
//! one row of action buttons). Deterministic for a given snapshot, display
//! settings, and wall-clock instant — the instant only feeds the footer and
//! embed timestamp.

use chrono::{DateTime, Utc};

use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle};
use twilight_model::channel::message::{Component, EmojiReactionType};
use twilight_model::channel::message::Embed;
use twilight_model::util::Timestamp;
use twilight_util::builder::embed::{
    EmbedAuthorBuilder, EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder, ImageSource,
};

use crate::config::Config;
use crate::status::links::ACTION_ORDER;
use crate::status::StatusSnapshot;

pub const COLOR_ONLINE: u32 = 0x0099ff;
pub const COLOR_OFFLINE: u32 = 0xff0000;

pub const FIELD_PLAYERS: &str = "Players";
pub const FIELD_DEVELOPMENT: &str = "Development";
pub const FIELD_SERVER_STATUS: &str = "Server Status";
pub const FIELD_CFX_STATUS: &str = "Cfx.re Status";
pub const FIELD_CONNECT: &str = "Connect";

/// The static parts of the rendered message.
#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub server_name: String,
    pub cfx_code: String,
    pub icon_url: String,
}

impl DisplaySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            server_name: config.server_name.clone(),
            cfx_code: config.cfx_code.clone(),
            icon_url: config.icon_url.clone(),
        }
    }
}

/// Everything needed to send or edit the managed message.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPayload {
    pub embed: Embed,
    pub components: Vec<Component>,
}

/// Two-valued status line. There is no "degraded" variant: the server either
/// answered or it did not.
fn status_line(online: bool) -> &'static str {
    if online {
        "🟢 Online & Operational"
    } else {
        "🔴 Offline"
    }
}

pub fn render(
    snapshot: &StatusSnapshot,
    display: &DisplaySettings,
    now: DateTime<Utc>,
) -> StatusPayload {
    let status = status_line(snapshot.online);
    let players = format!(
        "{}/{} in server",
        snapshot.online_players, snapshot.max_players
    );
    let connect = format!("```connect cfx.re/join/{}```", display.cfx_code);

    let icon = if display.icon_url.is_empty() {
        None
    } else {
        ImageSource::url(display.icon_url.as_str()).ok()
    };

    let mut author = EmbedAuthorBuilder::new("System Status");
    if let Some(icon) = icon.clone() {
        author = author.icon_url(icon);
    }

    let mut footer = EmbedFooterBuilder::new(format!(
        "{} • Today at {}",
        display.server_name,
        now.format("%H:%M")
    ));
    if let Some(icon) = icon {
        footer = footer.icon_url(icon);
    }

    let mut embed = EmbedBuilder::new()
        .color(if snapshot.online { COLOR_ONLINE } else { COLOR_OFFLINE })
        .author(author)
        .title(display.server_name.clone())
        .description(
            "This embed is updated periodically with the current player \
             population, server, and Cfx.re status.",
        )
        .field(EmbedFieldBuilder::new(FIELD_PLAYERS, players).inline())
        .field(EmbedFieldBuilder::new(FIELD_DEVELOPMENT, status).inline())
        .field(EmbedFieldBuilder::new(FIELD_SERVER_STATUS, status))
        .field(EmbedFieldBuilder::new(FIELD_CFX_STATUS, status))
        .field(EmbedFieldBuilder::new(FIELD_CONNECT, connect))
        .footer(footer);

    if let Ok(ts) = Timestamp::from_secs(now.timestamp()) {
        embed = embed.timestamp(ts);
    }

    StatusPayload {
        embed: embed.build(),
        components: vec![action_row()],
    }
}

/// One row of five secondary buttons, fixed order.
fn action_row() -> Component {
    let buttons = ACTION_ORDER
        .into_iter()
        .map(|key| {
            Component::Button(Button {
                custom_id: Some(key.custom_id().to_string()),
                disabled: false,
                emoji: Some(EmojiReactionType::Unicode {
                    name: key.emoji().to_string(),
                }),
                label: Some(key.label().to_string()),
                style: ButtonStyle::Secondary,
                url: None,
                sku_id: None,
            })
        })
        .collect();

    Component::ActionRow(ActionRow {
        components: buttons,
    })
}
