use tracing::debug;

use crate::args::ChannelRef;
use crate::error::ExecError;
use crate::host::{AllowedMentions, OutgoingMessage};
use crate::sandbox::{Action, InvocationContext};
use crate::state::{ChannelKind, ChannelState, Message, MessageId};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SendOptions {
    /// Only user mentions ping; role and everyone/here mentions stay inert
    pub filter_special_mentions: bool,
    /// Return the id of the sent message
    pub return_id: bool,
}

impl SendOptions {
    fn allowed_mentions(&self) -> AllowedMentions {
        if self.filter_special_mentions {
            AllowedMentions::users_only()
        } else {
            AllowedMentions::all()
        }
    }
}

impl InvocationContext {
    /// Sends `content` to the triggering member by DM, prefixed with the guild name.
    pub async fn send_dm(&mut self, content: &str) -> Result<(), ExecError> {
        self.charge(Action::SendDm)?;
        if self.member.is_none() || content.trim().is_empty() {
            return Ok(());
        }

        let dm = self.open_member_dm().await?;
        let message = OutgoingMessage {
            content: format!(
                "Custom Command DM from the server **{}**\n{content}",
                self.guild.name
            ),
            allowed_mentions: AllowedMentions::users_only(),
        };
        self.host
            .transport
            .send_message(dm.id, message)
            .await
            .map_err(ExecError::Transport)?;
        debug!("Sent DM to channel {}", dm.id);
        Ok(())
    }

    pub async fn send_message(
        &mut self,
        channel: &ChannelRef,
        content: &str,
        options: SendOptions,
    ) -> Result<Option<MessageId>, ExecError> {
        self.charge_api_call()?;
        let channel_id = self
            .resolve_channel(channel)
            .ok_or(ExecError::UnknownChannel)?;

        let message = OutgoingMessage {
            content: content.to_string(),
            allowed_mentions: options.allowed_mentions(),
        };
        let id = self
            .host
            .transport
            .send_message(channel_id, message)
            .await
            .map_err(ExecError::Transport)?;
        debug!("Sent message {id} to channel {channel_id}");

        Ok(options.return_id.then_some(id))
    }

    pub async fn edit_message(
        &mut self,
        channel: &ChannelRef,
        message: MessageId,
        content: &str,
        filter_special_mentions: bool,
    ) -> Result<(), ExecError> {
        self.charge_api_call()?;
        let channel_id = self
            .resolve_channel_no_dm(channel)
            .ok_or(ExecError::UnknownChannel)?;

        let options = SendOptions {
            filter_special_mentions,
            return_id: false,
        };
        let edit = OutgoingMessage {
            content: content.to_string(),
            allowed_mentions: options.allowed_mentions(),
        };
        self.host
            .transport
            .edit_message(channel_id, message, edit)
            .await
            .map_err(ExecError::Transport)
    }

    /// Fetches a message. An unknown channel yields `None`.
    pub async fn get_message(
        &mut self,
        channel: &ChannelRef,
        message: MessageId,
    ) -> Result<Option<Message>, ExecError> {
        self.charge_api_call()?;
        let Some(channel_id) = self.resolve_channel_no_dm(channel) else {
            return Ok(None);
        };
        self.host
            .transport
            .fetch_message(channel_id, message)
            .await
            .map_err(ExecError::Transport)
    }

    /// Opens the DM channel with the triggering member.
    pub(crate) async fn open_member_dm(&self) -> Result<ChannelState, ExecError> {
        let member = self.member.as_ref().ok_or_else(|| {
            ExecError::InvalidArgument("no member to send a direct message to".to_string())
        })?;
        let id = self
            .host
            .transport
            .open_direct_channel(member.user.id)
            .await
            .map_err(ExecError::Transport)?;

        Ok(ChannelState {
            id,
            guild_id: self.guild.id,
            name: member.user.username.clone(),
            kind: ChannelKind::Dm,
            topic: None,
        })
    }
}
