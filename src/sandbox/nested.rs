//! Script-to-script calls.
//!
//! A program may render another program from its set, one level deep. The
//! callee runs in its own frame (own channel, own mention state, own
//! response routing) and sends its own response; the caller gets the id of
//! that response back.

use std::sync::Arc;

use tracing::{debug, warn};

use super::cycle;
use super::frame::{Frame, FrameGuard};
use super::governor::Action;
use super::InvocationContext;
use crate::args::ChannelRef;
use crate::error::ExecError;
use crate::state::MessageId;
use crate::value::Value;

/// Where a nested program's response goes.
#[derive(Debug, Clone, PartialEq)]
pub enum NestedTarget {
    /// A guild channel; [`ChannelRef::Current`] inherits the caller's channel
    /// and DM routing.
    Channel(ChannelRef),
    /// The triggering member's direct-message channel.
    DirectMessage,
}

impl InvocationContext {
    pub async fn send_template(
        &mut self,
        channel: ChannelRef,
        name: &str,
        payload: Vec<Value>,
    ) -> Result<Option<MessageId>, ExecError> {
        self.invoke_nested(NestedTarget::Channel(channel), name, payload)
            .await
    }

    pub async fn send_template_dm(
        &mut self,
        name: &str,
        payload: Vec<Value>,
    ) -> Result<Option<MessageId>, ExecError> {
        self.invoke_nested(NestedTarget::DirectMessage, name, payload)
            .await
    }

    /// Runs program `name` in a fresh nested frame and sends its output.
    ///
    /// `payload` becomes the callee's args: nothing for an empty payload,
    /// the item itself for a single item, and a mapping built from
    /// key/value pairs otherwise. The frame is popped before this returns,
    /// whatever the outcome.
    pub async fn invoke_nested(
        &mut self,
        target: NestedTarget,
        name: &str,
        payload: Vec<Value>,
    ) -> Result<Option<MessageId>, ExecError> {
        self.charge(Action::ExecChild)?;
        if name.is_empty() {
            return Err(ExecError::MissingProgramName);
        }
        if self.frames.current().is_nested {
            warn!("Rejected nested call to '{name}' from within a nested program");
            return Err(ExecError::NestedCallInNested);
        }

        let program = self
            .programs
            .lookup(name)
            .ok_or_else(|| ExecError::UnknownProgram(name.to_string()))?;

        let parent_dm = self.frames.current().routing.send_in_dm;
        let (channel, send_in_dm) = match target {
            NestedTarget::Channel(ChannelRef::Current) => (self.channel().cloned(), parent_dm),
            NestedTarget::Channel(channel) => {
                let id = self
                    .resolve_channel(&channel)
                    .ok_or(ExecError::UnknownChannel)?;
                let state = self
                    .guild
                    .channel(id)
                    .cloned()
                    .ok_or(ExecError::UnknownChannel)?;
                (Some(state), false)
            }
            NestedTarget::DirectMessage if parent_dm => (self.channel().cloned(), parent_dm),
            NestedTarget::DirectMessage => (Some(self.open_member_dm().await?), parent_dm),
        };

        let args = self.nested_args(payload)?;

        let mut frame = Frame::nested(channel, Arc::clone(&program));
        frame.routing.send_in_dm = send_in_dm;
        frame.args = args;

        let evaluator = Arc::clone(&self.host.evaluator);
        let mut guard = FrameGuard::enter(self, frame);
        let rendered = evaluator.evaluate(&program, &mut *guard).await?;
        let sent = guard.send_response(&rendered).await?;
        debug!("Nested program '{name}' finished (response {sent:?})");
        Ok(sent)
    }

    fn nested_args(&self, payload: Vec<Value>) -> Result<Option<Value>, ExecError> {
        let args = match payload.len() {
            0 => return Ok(None),
            1 => payload.into_iter().next(),
            _ => Some(Value::dict_from_pairs(payload)?),
        };

        if let Some(value) = &args {
            if !cycle::is_safe(value, &self.data, 0) {
                warn!("Rejected nested call payload containing the whole data environment");
                return Err(ExecError::UnsafePayload);
            }
        }
        Ok(args)
    }
}
