//! Normalizes the argument shapes scripts pass to host functions.
//!
//! Scripts refer to channels, users and roles by numeric id, by id-as-text,
//! by name, or not at all ("the current one"). Each family has one closed
//! enum and one resolver, and every resolved id is verified against the
//! guild snapshot before it is handed to the transport.

use crate::sandbox::InvocationContext;
use crate::state::{ChannelId, Role, RoleId, User, UserId};

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelRef {
    /// No channel given: use the current frame's channel
    Current,
    Id(ChannelId),
    /// Numeric id as text, or a text-channel name (case-insensitive)
    Text(String),
}

impl From<ChannelId> for ChannelRef {
    fn from(id: ChannelId) -> Self {
        ChannelRef::Id(id)
    }
}

impl From<&str> for ChannelRef {
    fn from(s: &str) -> Self {
        ChannelRef::Text(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserRef {
    User(User),
    Id(UserId),
    /// Numeric id as text, or a mention token like `<@123>` / `<@!123>`
    Text(String),
}

impl From<UserId> for UserRef {
    fn from(id: UserId) -> Self {
        UserRef::Id(id)
    }
}

impl From<&str> for UserRef {
    fn from(s: &str) -> Self {
        UserRef::Text(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoleRef {
    Id(RoleId),
    /// Numeric id as text, or a role name (case-insensitive)
    Text(String),
}

impl From<RoleId> for RoleRef {
    fn from(id: RoleId) -> Self {
        RoleRef::Id(id)
    }
}

impl From<&str> for RoleRef {
    fn from(s: &str) -> Self {
        RoleRef::Text(s.to_string())
    }
}

/// Extracts a user id. Returns `None` for anything that is not a non-zero id.
pub fn target_user_id(arg: &UserRef) -> Option<UserId> {
    let id = match arg {
        UserRef::User(user) => user.id,
        UserRef::Id(id) => *id,
        UserRef::Text(text) => {
            let mut s = text.trim();
            if s.len() > 4 && s.starts_with("<@") && s.ends_with('>') {
                s = &s[2..s.len() - 1];
                s = s.strip_prefix('!').unwrap_or(s);
            }
            s.parse().ok()?
        }
    };
    (id != 0).then_some(id)
}

impl InvocationContext {
    /// Resolves a channel argument to an id that exists in the guild.
    ///
    /// [`ChannelRef::Current`] returns the current frame's channel as-is,
    /// which may be a direct-message channel.
    pub fn resolve_channel(&self, arg: &ChannelRef) -> Option<ChannelId> {
        match arg {
            ChannelRef::Current => self.channel().map(|c| c.id),
            other => self.resolve_guild_channel(other),
        }
    }

    /// Like [`resolve_channel`](Self::resolve_channel) but never yields a
    /// direct-message channel, including when falling back to the current one.
    pub fn resolve_channel_no_dm(&self, arg: &ChannelRef) -> Option<ChannelId> {
        match arg {
            ChannelRef::Current => {
                let current = self.channel()?.id;
                self.resolve_guild_channel(&ChannelRef::Id(current))
            }
            other => self.resolve_guild_channel(other),
        }
    }

    fn resolve_guild_channel(&self, arg: &ChannelRef) -> Option<ChannelId> {
        let id = match arg {
            ChannelRef::Current => return None,
            ChannelRef::Id(id) => *id,
            ChannelRef::Text(text) => match text.parse::<ChannelId>() {
                Ok(id) => id,
                Err(_) => return self.guild.text_channel_by_name(text).map(|c| c.id),
            },
        };

        self.guild
            .channel(id)
            .filter(|c| !c.is_dm())
            .map(|c| c.id)
    }

    /// Resolves a role by id, id-as-text or name. Unknown roles yield `None`.
    pub fn resolve_role(&self, arg: &RoleRef) -> Option<&Role> {
        match arg {
            RoleRef::Id(id) => self.guild.role(*id),
            RoleRef::Text(text) => match text.trim().parse::<RoleId>() {
                Ok(id) => self.guild.role(id),
                Err(_) => self.guild.role_by_name(text),
            },
        }
    }
}
