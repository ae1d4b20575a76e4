//! Collaborators the sandbox consumes.
//!
//! The evaluator, the chat transport and the delayed-action scheduler are
//! all external. They are held as trait objects so one process can mix
//! real and fake implementations, and so every invocation can share them.

#[cfg(test)]
pub(crate) mod fakes;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ExecError;
use crate::program::Program;
use crate::sandbox::InvocationContext;
use crate::state::{ChannelId, GuildId, Message, MessageId, RoleId, UserId};

/// Mention categories the platform is allowed to resolve in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionKind {
    Users,
    Roles,
    Everyone,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllowedMentions {
    pub parse: Vec<MentionKind>,
    /// Explicitly allowed role ids (used when `Roles` is not parsed wholesale)
    pub roles: Vec<RoleId>,
}

impl AllowedMentions {
    /// Users only: no role or everyone/here pings.
    pub fn users_only() -> Self {
        Self {
            parse: vec![MentionKind::Users],
            roles: Vec::new(),
        }
    }

    pub fn all() -> Self {
        Self {
            parse: vec![MentionKind::Users, MentionKind::Roles, MentionKind::Everyone],
            roles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub content: String,
    pub allowed_mentions: AllowedMentions,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelEdit {
    pub name: Option<String>,
    pub topic: Option<String>,
}

/// Renders a compiled program.
///
/// The evaluator receives the invocation context as its environment and
/// calls back into it for every host function, including nested calls
/// which re-enter `evaluate` one level deeper.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        program: &Program,
        ctx: &mut InvocationContext,
    ) -> Result<String, ExecError>;
}

/// Outbound chat-platform actions.
///
/// Every method may fail; the sandbox never retries.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> anyhow::Result<MessageId>;

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        edit: OutgoingMessage,
    ) -> anyhow::Result<()>;

    async fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> anyhow::Result<Option<Message>>;

    /// Opens (or reuses) the direct-message channel with a user.
    async fn open_direct_channel(&self, user: UserId) -> anyhow::Result<ChannelId>;

    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> anyhow::Result<()>;

    /// Removes one user's reaction.
    async fn remove_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
        user: UserId,
    ) -> anyhow::Result<()>;

    /// Removes every reaction of one emoji.
    async fn remove_emoji_reactions(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> anyhow::Result<()>;

    async fn remove_all_reactions(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> anyhow::Result<()>;

    async fn edit_channel(&self, channel: ChannelId, edit: ChannelEdit) -> anyhow::Result<()>;

    async fn add_member_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> anyhow::Result<()>;

    async fn remove_member_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> anyhow::Result<()>;

    /// Replaces a member's whole role list.
    async fn set_member_roles(
        &self,
        guild: GuildId,
        user: UserId,
        roles: Vec<RoleId>,
    ) -> anyhow::Result<()>;

    async fn edit_nickname(&self, guild: GuildId, user: UserId, nick: &str)
        -> anyhow::Result<()>;
}

/// Fire-and-forget delayed actions.
///
/// The sandbox does not track the outcome of a scheduled action.
#[async_trait]
pub trait ActionScheduler: Send + Sync {
    async fn schedule_role_removal(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    async fn schedule_message_deletion(
        &self,
        guild: GuildId,
        channel: ChannelId,
        message: MessageId,
        after: Duration,
    ) -> anyhow::Result<()>;
}

/// Handles to every collaborator, shared by all invocations.
#[derive(Clone)]
pub struct Host {
    pub evaluator: Arc<dyn Evaluator>,
    pub transport: Arc<dyn MessageTransport>,
    pub scheduler: Arc<dyn ActionScheduler>,
}

impl Host {
    pub fn new(
        evaluator: Arc<dyn Evaluator>,
        transport: Arc<dyn MessageTransport>,
        scheduler: Arc<dyn ActionScheduler>,
    ) -> Self {
        Self {
            evaluator,
            transport,
            scheduler,
        }
    }
}
