use std::time::Duration;

use tracing::{debug, warn};

use super::{DEFAULT_DELETE_DELAY_SECS, MAX_DELETE_DELAY_SECS};
use crate::args::ChannelRef;
use crate::error::ExecError;
use crate::sandbox::InvocationContext;
use crate::state::MessageId;

fn clamp_delay(delay_secs: Option<i64>) -> u64 {
    delay_secs
        .unwrap_or(DEFAULT_DELETE_DELAY_SECS)
        .clamp(0, MAX_DELETE_DELAY_SECS) as u64
}

impl InvocationContext {
    /// Marks the current frame's response for deletion after it is sent.
    pub fn delete_response(&mut self, delay_secs: Option<i64>) {
        let routing = &mut self.frames.current_mut().routing;
        routing.delete_response = true;
        routing.delete_delay_secs = clamp_delay(delay_secs);
    }

    /// Deletes the message that fired the trigger, if there is one.
    pub async fn delete_trigger(&mut self, delay_secs: Option<i64>) -> Result<(), ExecError> {
        let Some((channel, message)) = self.trigger.as_ref().map(|t| (t.channel_id, t.id)) else {
            return Ok(());
        };
        self.delete_message(&ChannelRef::Id(channel), message, delay_secs)
            .await
    }

    /// Schedules deletion of a message after `delay_secs` (default 10, at most a day).
    pub async fn delete_message(
        &mut self,
        channel: &ChannelRef,
        message: MessageId,
        delay_secs: Option<i64>,
    ) -> Result<(), ExecError> {
        let channel = self
            .resolve_channel_no_dm(channel)
            .ok_or(ExecError::UnknownChannel)?;
        let after = Duration::from_secs(clamp_delay(delay_secs));

        debug!("Deleting message {message} in {}s", after.as_secs());
        if let Err(e) = self
            .host
            .scheduler
            .schedule_message_deletion(self.guild.id, channel, message, after)
            .await
        {
            warn!("Failed to schedule deletion of message {message}: {e}");
        }
        Ok(())
    }
}
