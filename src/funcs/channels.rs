use tracing::debug;

use crate::args::{target_user_id, ChannelRef, UserRef};
use crate::error::ExecError;
use crate::host::ChannelEdit;
use crate::sandbox::{Action, InvocationContext};
use crate::state::{ChannelState, MemberState};

impl InvocationContext {
    /// Looks up a guild channel. Unknown channels yield `None`.
    pub fn get_channel(&mut self, channel: &ChannelRef) -> Result<Option<ChannelState>, ExecError> {
        self.charge_api_call()?;
        let Some(id) = self.resolve_channel(channel) else {
            return Ok(None);
        };
        Ok(self.guild.channel(id).cloned())
    }

    pub fn get_member(&mut self, target: &UserRef) -> Result<Option<MemberState>, ExecError> {
        self.charge_api_call()?;
        let Some(user) = target_user_id(target) else {
            return Ok(None);
        };
        Ok(self.guild.member(user).cloned())
    }

    pub async fn edit_channel_name(
        &mut self,
        channel: &ChannelRef,
        name: &str,
    ) -> Result<(), ExecError> {
        let edit = ChannelEdit {
            name: Some(name.to_string()),
            ..ChannelEdit::default()
        };
        self.edit_channel(channel, edit).await
    }

    pub async fn edit_channel_topic(
        &mut self,
        channel: &ChannelRef,
        topic: &str,
    ) -> Result<(), ExecError> {
        let edit = ChannelEdit {
            topic: Some(topic.to_string()),
            ..ChannelEdit::default()
        };
        self.edit_channel(channel, edit).await
    }

    /// Charges the global channel-edit counter, then the counter of the
    /// resolved channel.
    async fn edit_channel(&mut self, channel: &ChannelRef, edit: ChannelEdit) -> Result<(), ExecError> {
        self.charge(Action::EditChannel)?;
        let id = self
            .resolve_channel_no_dm(channel)
            .ok_or(ExecError::UnknownChannel)?;
        self.charge(Action::EditChannelTarget(id))?;

        self.host
            .transport
            .edit_channel(id, edit)
            .await
            .map_err(ExecError::Transport)
    }

    /// Sets the triggering member's nickname. Unchanged nicknames cost no call.
    pub async fn edit_nickname(&mut self, nick: &str) -> Result<(), ExecError> {
        self.charge(Action::EditNick)?;
        let Some(member) = &self.member else {
            return Ok(());
        };
        if member.nick.as_deref().unwrap_or("") == nick {
            debug!("Nickname unchanged, skipping edit");
            return Ok(());
        }

        let user = member.user.id;
        self.host
            .transport
            .edit_nickname(self.guild.id, user, nick)
            .await
            .map_err(ExecError::Transport)?;
        if let Some(member) = self.member.as_mut() {
            member.nick = Some(nick.to_string());
        }
        Ok(())
    }
}
