use crate::args::{target_user_id, ChannelRef, UserRef};
use crate::error::ExecError;
use crate::sandbox::{Action, InvocationContext};
use crate::state::{ChannelId, MessageId};

impl InvocationContext {
    /// Reacts to the triggering message, one counted call per emoji.
    pub async fn add_reactions(&mut self, emojis: &[String]) -> Result<(), ExecError> {
        let Some((channel, message)) = self.trigger.as_ref().map(|t| (t.channel_id, t.id)) else {
            return Ok(());
        };
        for emoji in emojis {
            self.charge(Action::AddReactionTrigger)?;
            self.host
                .transport
                .add_reaction(channel, message, emoji)
                .await
                .map_err(ExecError::Transport)?;
        }
        Ok(())
    }

    /// Queues reactions for the current frame's response.
    pub fn add_response_reactions(&mut self, emojis: &[String]) -> Result<(), ExecError> {
        for emoji in emojis {
            self.charge(Action::AddReactionResponse)?;
            self.frames
                .current_mut()
                .routing
                .reactions
                .push(emoji.clone());
        }
        Ok(())
    }

    pub async fn add_message_reactions(
        &mut self,
        channel: &ChannelRef,
        message: MessageId,
        emojis: &[String],
    ) -> Result<(), ExecError> {
        let channel = self.reaction_channel(channel)?;
        for emoji in emojis {
            self.charge(Action::AddReactionMessage)?;
            self.host
                .transport
                .add_reaction(channel, message, emoji)
                .await
                .map_err(ExecError::Transport)?;
        }
        Ok(())
    }

    /// Removes one user's reactions for each emoji.
    pub async fn delete_message_reactions(
        &mut self,
        channel: &ChannelRef,
        message: MessageId,
        user: &UserRef,
        emojis: &[String],
    ) -> Result<(), ExecError> {
        let channel = self.reaction_channel(channel)?;
        let user = target_user_id(user).ok_or(ExecError::UnknownUser)?;
        for emoji in emojis {
            self.charge(Action::DelReactionMessage)?;
            self.host
                .transport
                .remove_reaction(channel, message, emoji, user)
                .await
                .map_err(ExecError::Transport)?;
        }
        Ok(())
    }

    /// Removes every reaction of the given emojis, or every reaction at all
    /// when `emojis` is empty.
    pub async fn delete_all_message_reactions(
        &mut self,
        channel: &ChannelRef,
        message: MessageId,
        emojis: &[String],
    ) -> Result<(), ExecError> {
        let channel = self.reaction_channel(channel)?;
        if emojis.is_empty() {
            self.charge_api_call()?;
            return self
                .host
                .transport
                .remove_all_reactions(channel, message)
                .await
                .map_err(ExecError::Transport);
        }

        for emoji in emojis {
            self.charge(Action::DelReactionMessage)?;
            self.host
                .transport
                .remove_emoji_reactions(channel, message, emoji)
                .await
                .map_err(ExecError::Transport)?;
        }
        Ok(())
    }

    /// Reactions work in direct-message channels too.
    fn reaction_channel(&self, channel: &ChannelRef) -> Result<ChannelId, ExecError> {
        self.resolve_channel(channel)
            .ok_or(ExecError::UnknownChannel)
    }
}
