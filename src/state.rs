//! Point-in-time guild snapshot handed to an invocation.
//!
//! Read-only from the sandbox's point of view; it is not refreshed while an
//! invocation runs, so concurrent external changes are not observed.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub type GuildId = i64;
pub type ChannelId = i64;
pub type RoleId = i64;
pub type UserId = i64;
pub type MessageId = i64;

/// Platform epoch for snowflake ids (2015-01-01T00:00:00Z), in milliseconds.
const SNOWFLAKE_EPOCH_MS: i64 = 1_420_070_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    GuildText,
    GuildVoice,
    GuildCategory,
    GuildNews,
    Dm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
    pub id: ChannelId,
    pub guild_id: GuildId,
    pub name: String,
    pub kind: ChannelKind,
    #[serde(default)]
    pub topic: Option<String>,
}

impl ChannelState {
    pub fn is_dm(&self) -> bool {
        self.kind == ChannelKind::Dm
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberState {
    pub user: User,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

impl MemberState {
    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}

/// The message that fired the trigger, when there is one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
}

/// A message as returned by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub content: String,
    #[serde(default)]
    pub author: Option<User>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildSnapshot {
    pub id: GuildId,
    pub name: String,
    #[serde(default)]
    pub channels: Vec<ChannelState>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub members: Vec<MemberState>,
}

impl GuildSnapshot {
    pub fn channel(&self, id: ChannelId) -> Option<&ChannelState> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Case-insensitive lookup among text channels only.
    pub fn text_channel_by_name(&self, name: &str) -> Option<&ChannelState> {
        self.channels
            .iter()
            .find(|c| c.kind == ChannelKind::GuildText && c.name.eq_ignore_ascii_case(name))
    }

    pub fn role(&self, id: RoleId) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    pub fn role_by_name(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name.eq_ignore_ascii_case(name))
    }

    pub fn member(&self, user: UserId) -> Option<&MemberState> {
        self.members.iter().find(|m| m.user.id == user)
    }
}

/// Creation time encoded in a snowflake id.
pub fn snowflake_time(id: i64) -> DateTime<Utc> {
    let ms = (id >> 22) + SNOWFLAKE_EPOCH_MS;
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or_default()
}
