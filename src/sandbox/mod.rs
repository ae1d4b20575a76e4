//! Execution sandbox for one trigger firing.
//!
//! An [`InvocationContext`] owns everything a run may consume: call
//! counters, the sleep budget, the compiled-pattern cache and the frame
//! stack. It is handed to the evaluator as its environment and is never
//! shared between invocations, so none of it is locked.

pub mod cycle;
pub mod frame;
pub mod governor;
pub mod nested;
pub mod patterns;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::LimitsConfig;
use crate::error::ExecError;
use crate::host::{AllowedMentions, Host, MentionKind, OutgoingMessage};
use crate::program::ProgramSet;
use crate::state::{ChannelState, GuildSnapshot, MemberState, MessageId, TriggerMessage};
use crate::value::Value;

pub use frame::{Frame, FrameStack, MentionState, ResponseRouting};
pub use governor::{Action, ResourceGovernor, MAX_SECONDS_SLEPT};
pub use nested::NestedTarget;
pub use patterns::{PatternCache, PATTERN_CACHE_CAPACITY};

pub struct InvocationContext {
    pub(crate) governor: ResourceGovernor,
    pub(crate) patterns: PatternCache,
    pub(crate) frames: FrameStack,
    pub(crate) limits: LimitsConfig,
    pub(crate) data: BTreeMap<String, Value>,
    pub(crate) programs: Arc<ProgramSet>,
    pub(crate) guild: Arc<GuildSnapshot>,
    pub(crate) member: Option<MemberState>,
    pub(crate) trigger: Option<TriggerMessage>,
    pub(crate) host: Host,
}

impl InvocationContext {
    /// Creates the context and pushes the root frame for `programs.root()`.
    pub fn new(
        host: Host,
        limits: LimitsConfig,
        guild: Arc<GuildSnapshot>,
        programs: Arc<ProgramSet>,
        channel: Option<ChannelState>,
    ) -> Self {
        let root = Frame::root(channel, programs.root());
        Self {
            governor: ResourceGovernor::new(limits.api_calls),
            patterns: PatternCache::new(),
            frames: FrameStack::new(root),
            limits,
            data: BTreeMap::new(),
            programs,
            guild,
            member: None,
            trigger: None,
            host,
        }
    }

    /// Sets the member whose action fired the trigger.
    pub fn with_member(mut self, member: MemberState) -> Self {
        self.member = Some(member);
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerMessage) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Sets the initial data environment visible to the program.
    pub fn with_data(mut self, data: BTreeMap<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Delivers the root response to the triggering member by DM.
    pub fn respond_in_dm(mut self, enabled: bool) -> Self {
        self.frames.current_mut().routing.send_in_dm = enabled;
        self
    }

    // ── Accessors ────────────────────────────────────────

    pub fn current_frame(&self) -> &Frame {
        self.frames.current()
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.depth()
    }

    /// Channel of the current frame, if any.
    pub fn channel(&self) -> Option<&ChannelState> {
        self.frames.current().channel.as_ref()
    }

    pub fn guild(&self) -> &GuildSnapshot {
        &self.guild
    }

    pub fn member(&self) -> Option<&MemberState> {
        self.member.as_ref()
    }

    pub fn trigger(&self) -> Option<&TriggerMessage> {
        self.trigger.as_ref()
    }

    /// Input handed over by the caller of the current (nested) program.
    pub fn args(&self) -> Option<&Value> {
        self.frames.current().args.as_ref()
    }

    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.data
    }

    pub fn governor(&self) -> &ResourceGovernor {
        &self.governor
    }

    pub fn pattern_cache(&self) -> &PatternCache {
        &self.patterns
    }

    // ── Budget checks ────────────────────────────────────

    /// Charges one use of a dedicated counter.
    pub(crate) fn charge(&mut self, action: Action) -> Result<(), ExecError> {
        let key = action.key();
        let limit = action.limit(&self.limits);
        if self.governor.check_and_increment(&key, limit) {
            warn!("Rejected {key}: limit of {limit} per invocation reached");
            return Err(ExecError::TooManyCalls { action: key, limit });
        }
        Ok(())
    }

    /// Charges one outbound call against the shared ceiling.
    pub(crate) fn charge_api_call(&mut self) -> Result<(), ExecError> {
        if self.governor.check_generic_api_call() {
            let limit = self.governor.generic_api_limit();
            warn!("Rejected api call: ceiling of {limit} per invocation reached");
            return Err(ExecError::TooManyApiCalls { limit });
        }
        Ok(())
    }

    // ── Running programs ─────────────────────────────────

    /// Evaluates the root program and sends its response.
    pub async fn execute(&mut self) -> Result<Option<MessageId>, ExecError> {
        let program = Arc::clone(&self.frames.current().program);
        let evaluator = Arc::clone(&self.host.evaluator);
        info!("Executing '{}' in guild {}", program.name, self.guild.id);

        let rendered = evaluator.evaluate(&program, self).await?;
        self.send_response(&rendered).await
    }

    /// Sends a rendered program output using the current frame's routing.
    ///
    /// Blank output sends nothing. Queued reactions and scheduled deletion
    /// are best-effort: their failures are logged, not returned.
    pub async fn send_response(&mut self, rendered: &str) -> Result<Option<MessageId>, ExecError> {
        if rendered.trim().is_empty() {
            debug!("Empty response, nothing to send");
            return Ok(None);
        }

        let frame = self.frames.current();
        let routing = frame.routing.clone();
        let mentions = frame.mentions.clone();
        let in_dm_already = frame.channel.as_ref().is_some_and(|c| c.is_dm());

        let channel_id = if routing.send_in_dm && !in_dm_already {
            let Some(member) = &self.member else {
                debug!("Response routed to DM but there is no member, dropping it");
                return Ok(None);
            };
            self.host
                .transport
                .open_direct_channel(member.user.id)
                .await
                .map_err(ExecError::Transport)?
        } else {
            match &frame.channel {
                Some(channel) => channel.id,
                None => {
                    debug!("No channel in the current frame, dropping response");
                    return Ok(None);
                }
            }
        };

        let mut parse = vec![MentionKind::Users];
        if mentions.everyone || mentions.here {
            parse.push(MentionKind::Everyone);
        }
        let message = OutgoingMessage {
            content: rendered.to_string(),
            allowed_mentions: AllowedMentions {
                parse,
                roles: mentions.roles().to_vec(),
            },
        };

        let message_id = self
            .host
            .transport
            .send_message(channel_id, message)
            .await
            .map_err(ExecError::Transport)?;
        debug!("Sent response {message_id} to channel {channel_id}");

        for emoji in &routing.reactions {
            if let Err(e) = self
                .host
                .transport
                .add_reaction(channel_id, message_id, emoji)
                .await
            {
                warn!("Failed to add response reaction {emoji}: {e}");
            }
        }

        if routing.delete_response {
            let after = std::time::Duration::from_secs(routing.delete_delay_secs);
            if let Err(e) = self
                .host
                .scheduler
                .schedule_message_deletion(self.guild.id, channel_id, message_id, after)
                .await
            {
                warn!("Failed to schedule response deletion: {e}");
            }
        }

        Ok(Some(message_id))
    }
}
