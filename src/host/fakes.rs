//! Recording collaborators and a line-oriented evaluator for tests.
//!
//! `ScriptEvaluator` runs one command per line and joins the produced text
//! with newlines. A line prefixed with `try ` turns an error into the text
//! `error: <message>` instead of aborting the program.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    ActionScheduler, AllowedMentions, ChannelEdit, Evaluator, Host, MessageTransport,
    OutgoingMessage,
};
use crate::args::{ChannelRef, RoleRef};
use crate::config::LimitsConfig;
use crate::error::ExecError;
use crate::program::{Program, ProgramSet};
use crate::sandbox::InvocationContext;
use crate::state::{
    ChannelId, ChannelKind, ChannelState, GuildId, GuildSnapshot, MemberState, Message,
    MessageId, Role, RoleId, TriggerMessage, User, UserId,
};
use crate::value::Value;

pub const GUILD_ID: GuildId = 1;
pub const CHANNEL_GENERAL: ChannelId = 10;
pub const CHANNEL_LOGS: ChannelId = 11;
pub const CHANNEL_VOICE: ChannelId = 12;
pub const ROLE_MOD: RoleId = 200;
pub const ROLE_MEMBER: RoleId = 201;
pub const ROLE_VIP: RoleId = 202;
pub const MEMBER_ID: UserId = 300;
pub const OTHER_ID: UserId = 301;
pub const TRIGGER_ID: MessageId = 400;

const FIRST_MESSAGE_ID: MessageId = 5000;
const DM_CHANNEL_BASE: ChannelId = 9000;

// ── Transport ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send {
        channel: ChannelId,
        content: String,
        allowed_mentions: AllowedMentions,
    },
    Edit {
        channel: ChannelId,
        message: MessageId,
        content: String,
    },
    Fetch {
        channel: ChannelId,
        message: MessageId,
    },
    OpenDm {
        user: UserId,
    },
    AddReaction {
        channel: ChannelId,
        message: MessageId,
        emoji: String,
    },
    RemoveReaction {
        channel: ChannelId,
        message: MessageId,
        emoji: String,
        user: UserId,
    },
    RemoveEmoji {
        channel: ChannelId,
        message: MessageId,
        emoji: String,
    },
    RemoveAll {
        channel: ChannelId,
        message: MessageId,
    },
    EditChannel {
        channel: ChannelId,
        edit: ChannelEdit,
    },
    AddRole {
        user: UserId,
        role: RoleId,
    },
    RemoveRole {
        user: UserId,
        role: RoleId,
    },
    SetRoles {
        user: UserId,
        roles: Vec<RoleId>,
    },
    EditNick {
        user: UserId,
        nick: String,
    },
}

#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI64,
    fail_sends: AtomicBool,
    fail_reactions: AtomicBool,
}

impl RecordingTransport {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Successfully sent messages as (channel, content).
    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send {
                    channel, content, ..
                } => Some((channel, content)),
                _ => None,
            })
            .collect()
    }

    /// Makes sends and edits fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reactions(&self, fail: bool) {
        self.fail_reactions.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> anyhow::Result<MessageId> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(anyhow!("send rejected"));
        }
        self.record(Call::Send {
            channel,
            content: message.content,
            allowed_mentions: message.allowed_mentions,
        });
        Ok(FIRST_MESSAGE_ID + self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        edit: OutgoingMessage,
    ) -> anyhow::Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(anyhow!("edit rejected"));
        }
        self.record(Call::Edit {
            channel,
            message,
            content: edit.content,
        });
        Ok(())
    }

    async fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> anyhow::Result<Option<Message>> {
        self.record(Call::Fetch { channel, message });
        Ok(Some(Message {
            id: message,
            channel_id: channel,
            content: "fetched".to_string(),
            author: None,
        }))
    }

    async fn open_direct_channel(&self, user: UserId) -> anyhow::Result<ChannelId> {
        self.record(Call::OpenDm { user });
        Ok(DM_CHANNEL_BASE + user)
    }

    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> anyhow::Result<()> {
        if self.fail_reactions.load(Ordering::SeqCst) {
            return Err(anyhow!("unknown emoji"));
        }
        self.record(Call::AddReaction {
            channel,
            message,
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn remove_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
        user: UserId,
    ) -> anyhow::Result<()> {
        self.record(Call::RemoveReaction {
            channel,
            message,
            emoji: emoji.to_string(),
            user,
        });
        Ok(())
    }

    async fn remove_emoji_reactions(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> anyhow::Result<()> {
        self.record(Call::RemoveEmoji {
            channel,
            message,
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn remove_all_reactions(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> anyhow::Result<()> {
        self.record(Call::RemoveAll { channel, message });
        Ok(())
    }

    async fn edit_channel(&self, channel: ChannelId, edit: ChannelEdit) -> anyhow::Result<()> {
        self.record(Call::EditChannel { channel, edit });
        Ok(())
    }

    async fn add_member_role(
        &self,
        _guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> anyhow::Result<()> {
        self.record(Call::AddRole { user, role });
        Ok(())
    }

    async fn remove_member_role(
        &self,
        _guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> anyhow::Result<()> {
        self.record(Call::RemoveRole { user, role });
        Ok(())
    }

    async fn set_member_roles(
        &self,
        _guild: GuildId,
        user: UserId,
        roles: Vec<RoleId>,
    ) -> anyhow::Result<()> {
        self.record(Call::SetRoles { user, roles });
        Ok(())
    }

    async fn edit_nickname(
        &self,
        _guild: GuildId,
        user: UserId,
        nick: &str,
    ) -> anyhow::Result<()> {
        self.record(Call::EditNick {
            user,
            nick: nick.to_string(),
        });
        Ok(())
    }
}

// ── Scheduler ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Scheduled {
    RoleRemoval {
        user: UserId,
        role: RoleId,
        at: DateTime<Utc>,
    },
    Deletion {
        channel: ChannelId,
        message: MessageId,
        after: Duration,
    },
}

#[derive(Default)]
pub struct RecordingScheduler {
    scheduled: Mutex<Vec<Scheduled>>,
}

impl RecordingScheduler {
    pub fn scheduled(&self) -> Vec<Scheduled> {
        self.scheduled.lock().unwrap().clone()
    }

    /// Scheduled deletions as (channel, message, delay in seconds).
    pub fn deletions(&self) -> Vec<(ChannelId, MessageId, u64)> {
        self.scheduled()
            .into_iter()
            .filter_map(|s| match s {
                Scheduled::Deletion {
                    channel,
                    message,
                    after,
                } => Some((channel, message, after.as_secs())),
                _ => None,
            })
            .collect()
    }

    /// Scheduled role removals as (user, role, when).
    pub fn removals(&self) -> Vec<(UserId, RoleId, DateTime<Utc>)> {
        self.scheduled()
            .into_iter()
            .filter_map(|s| match s {
                Scheduled::RoleRemoval { user, role, at } => Some((user, role, at)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ActionScheduler for RecordingScheduler {
    async fn schedule_role_removal(
        &self,
        _guild: GuildId,
        user: UserId,
        role: RoleId,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.scheduled
            .lock()
            .unwrap()
            .push(Scheduled::RoleRemoval { user, role, at });
        Ok(())
    }

    async fn schedule_message_deletion(
        &self,
        _guild: GuildId,
        channel: ChannelId,
        message: MessageId,
        after: Duration,
    ) -> anyhow::Result<()> {
        self.scheduled.lock().unwrap().push(Scheduled::Deletion {
            channel,
            message,
            after,
        });
        Ok(())
    }
}

// ── Evaluator ────────────────────────────────────────────

pub struct ScriptEvaluator;

#[async_trait]
impl Evaluator for ScriptEvaluator {
    async fn evaluate(
        &self,
        program: &Program,
        ctx: &mut InvocationContext,
    ) -> Result<String, ExecError> {
        let mut output = Vec::new();
        for raw in program.source.lines() {
            let line = raw.trim();
            let (tolerant, line) = match line.strip_prefix("try ") {
                Some(rest) => (true, rest.trim()),
                None => (false, line),
            };
            match run_line(ctx, line).await {
                Ok(Some(text)) => output.push(text),
                Ok(None) => {}
                Err(e) if tolerant => output.push(format!("error: {e}")),
                Err(e) => return Err(e),
            }
        }
        Ok(output.join("\n"))
    }
}

async fn run_line(ctx: &mut InvocationContext, line: &str) -> Result<Option<String>, ExecError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, rest)) = words.split_first() else {
        return Ok(None);
    };
    let first = rest.first().copied().unwrap_or("");
    let tail = rest.get(1..).unwrap_or(&[]);

    let produced = match command {
        "text" => Some(line["text".len()..].trim().to_string()),
        "fail" => return Err(ExecError::Evaluation(rest.join(" "))),
        "args" => Some(match ctx.args() {
            Some(value) => serde_json::to_string(value).unwrap(),
            None => "nil".to_string(),
        }),
        "depth" => Some(ctx.frame_depth().to_string()),
        "channel" => Some(
            ctx.channel()
                .map(|c| format!("{:?}", c.kind))
                .unwrap_or_else(|| "none".to_string()),
        ),
        "nest" => {
            let sent = ctx
                .send_template(ChannelRef::Current, first, payload(tail))
                .await?;
            Some(sent.map(|id| id.to_string()).unwrap_or_default())
        }
        "nest_in" => {
            let name = tail.first().copied().unwrap_or("");
            let sent = ctx.send_template(first.into(), name, vec![]).await?;
            Some(sent.map(|id| id.to_string()).unwrap_or_default())
        }
        "nest_dm" => {
            let sent = ctx.send_template_dm(first, payload(tail)).await?;
            Some(sent.map(|id| id.to_string()).unwrap_or_default())
        }
        "nest_all" => {
            let env = Value::Map(ctx.data().clone());
            ctx.send_template(ChannelRef::Current, first, vec![env])
                .await?;
            None
        }
        "mention_everyone" => Some(ctx.mention_everyone().to_string()),
        "mention_here" => Some(ctx.mention_here().to_string()),
        "mention_role" => Some(ctx.mention_role(&role_ref(first))?),
        "react_response" => {
            let emojis: Vec<String> = rest.iter().map(|s| s.to_string()).collect();
            ctx.add_response_reactions(&emojis)?;
            None
        }
        "delete_response" => {
            ctx.delete_response(first.parse().ok());
            None
        }
        "sleep" => {
            ctx.sleep(first.parse().unwrap_or(0)).await?;
            None
        }
        _ => Some(line.to_string()),
    };
    Ok(produced)
}

fn payload(words: &[&str]) -> Vec<Value> {
    words
        .iter()
        .map(|w| match serde_json::from_str::<serde_json::Value>(w) {
            Ok(json) => Value::from(json),
            Err(_) => Value::from(*w),
        })
        .collect()
}

fn role_ref(arg: &str) -> RoleRef {
    match arg.parse::<RoleId>() {
        Ok(id) => RoleRef::Id(id),
        Err(_) => RoleRef::Text(arg.to_string()),
    }
}

// ── Fixtures ─────────────────────────────────────────────

fn channel(id: ChannelId, name: &str, kind: ChannelKind) -> ChannelState {
    ChannelState {
        id,
        guild_id: GUILD_ID,
        name: name.to_string(),
        kind,
        topic: None,
    }
}

fn member(id: UserId, username: &str, nick: Option<&str>, roles: Vec<RoleId>) -> MemberState {
    MemberState {
        user: User {
            id,
            username: username.to_string(),
            bot: false,
        },
        nick: nick.map(str::to_string),
        roles,
    }
}

pub fn guild() -> GuildSnapshot {
    GuildSnapshot {
        id: GUILD_ID,
        name: "Test Guild".to_string(),
        channels: vec![
            channel(CHANNEL_GENERAL, "general", ChannelKind::GuildText),
            channel(CHANNEL_LOGS, "logs", ChannelKind::GuildText),
            channel(CHANNEL_VOICE, "Lounge", ChannelKind::GuildVoice),
        ],
        roles: vec![
            Role {
                id: ROLE_MOD,
                name: "Moderator".to_string(),
            },
            Role {
                id: ROLE_MEMBER,
                name: "Member".to_string(),
            },
            Role {
                id: ROLE_VIP,
                name: "VIP".to_string(),
            },
        ],
        members: vec![
            alice(),
            member(OTHER_ID, "bob", Some("bobby"), vec![ROLE_MOD]),
        ],
    }
}

/// The triggering member.
pub fn alice() -> MemberState {
    member(MEMBER_ID, "alice", None, vec![ROLE_MEMBER])
}

pub fn context(
    script: &str,
) -> (
    InvocationContext,
    Arc<RecordingTransport>,
    Arc<RecordingScheduler>,
) {
    context_with(script, &[])
}

/// Builds a context whose root program is `script`, with extra named programs.
pub fn context_with(
    script: &str,
    programs: &[(&str, &str)],
) -> (
    InvocationContext,
    Arc<RecordingTransport>,
    Arc<RecordingScheduler>,
) {
    let transport = Arc::new(RecordingTransport::default());
    let scheduler = Arc::new(RecordingScheduler::default());
    let host = Host::new(Arc::new(ScriptEvaluator), transport.clone(), scheduler.clone());

    let mut set = ProgramSet::new(Program::new("main", script));
    for (name, source) in programs {
        set = set.with(Program::new(*name, *source));
    }

    let guild = guild();
    let current = guild.channel(CHANNEL_GENERAL).cloned();
    let data = BTreeMap::from([
        ("User".to_string(), Value::from("alice")),
        ("Channel".to_string(), Value::from("general")),
    ]);

    let ctx = InvocationContext::new(
        host,
        LimitsConfig::default(),
        Arc::new(guild),
        Arc::new(set),
        current,
    )
    .with_member(alice())
    .with_trigger(TriggerMessage {
        id: TRIGGER_ID,
        channel_id: CHANNEL_GENERAL,
    })
    .with_data(data);

    (ctx, transport, scheduler)
}
