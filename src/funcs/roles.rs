//! Role queries and role mutation.
//!
//! Queries read the guild snapshot and charge the state-lookup counter.
//! Mutations go through the transport, or through the scheduler when a
//! positive delay is given.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use super::MAX_ROLES;
use crate::args::{target_user_id, RoleRef, UserRef};
use crate::error::ExecError;
use crate::sandbox::{Action, InvocationContext};
use crate::state::{RoleId, UserId};

impl InvocationContext {
    /// Whether the triggering member has the role.
    pub fn has_role(&mut self, role: &RoleRef) -> Result<bool, ExecError> {
        self.charge(Action::StateLookup)?;
        let Some(role) = self.resolve_role(role).map(|r| r.id) else {
            return Ok(false);
        };
        Ok(self.member.as_ref().is_some_and(|m| m.has_role(role)))
    }

    /// Whether another member has the role. Unknown users or roles yield false.
    pub fn target_has_role(&mut self, target: &UserRef, role: &RoleRef) -> Result<bool, ExecError> {
        self.charge(Action::StateLookup)?;
        let Some(user) = target_user_id(target) else {
            return Ok(false);
        };
        let Some(role) = self.resolve_role(role).map(|r| r.id) else {
            return Ok(false);
        };
        Ok(self.guild.member(user).is_some_and(|m| m.has_role(role)))
    }

    /// Grants a role to a member. Unknown roles, unknown members and members
    /// that already have the role are left alone.
    pub async fn give_role(&mut self, target: &UserRef, role: &RoleRef) -> Result<(), ExecError> {
        self.charge_api_call()?;
        let user = target_user_id(target).ok_or(ExecError::UnknownUser)?;
        let Some(role) = self.resolve_role(role).map(|r| r.id) else {
            debug!("give_role: role not found, skipping");
            return Ok(());
        };
        match self.guild.member(user) {
            Some(member) if !member.has_role(role) => {}
            Some(_) => return Ok(()),
            None => {
                debug!("give_role: user {user} is not a member of guild {}", self.guild.id);
                return Ok(());
            }
        }

        self.host
            .transport
            .add_member_role(self.guild.id, user, role)
            .await
            .map_err(ExecError::Transport)
    }

    /// Revokes a role from a member, after `delay_secs` when positive.
    pub async fn take_role(
        &mut self,
        target: &UserRef,
        role: &RoleRef,
        delay_secs: i64,
    ) -> Result<(), ExecError> {
        self.charge_api_call()?;
        let user = target_user_id(target).ok_or(ExecError::UnknownUser)?;
        let Some(role) = self.resolve_role(role).map(|r| r.id) else {
            debug!("take_role: role not found, skipping");
            return Ok(());
        };
        if !self.guild.member(user).is_some_and(|m| m.has_role(role)) {
            return Ok(());
        }

        self.revoke(user, role, delay_secs).await
    }

    /// Replaces a member's whole role list.
    pub async fn set_roles(&mut self, target: &UserRef, roles: &[RoleRef]) -> Result<(), ExecError> {
        self.charge_api_call()?;
        let user = target_user_id(target).ok_or(ExecError::UnknownUser)?;
        self.charge(Action::SetRolesTarget(user))?;
        if roles.len() > MAX_ROLES {
            return Err(ExecError::TooManyRoles {
                count: roles.len(),
                max: MAX_ROLES,
            });
        }

        let ids = roles
            .iter()
            .map(|r| self.resolve_role(r).map(|r| r.id).ok_or(ExecError::UnknownRole))
            .collect::<Result<Vec<RoleId>, _>>()?;

        self.host
            .transport
            .set_member_roles(self.guild.id, user, ids)
            .await
            .map_err(ExecError::Transport)
    }

    /// Grants a role to the triggering member.
    pub async fn add_role(&mut self, role: &RoleRef) -> Result<(), ExecError> {
        self.charge_api_call()?;
        let Some(member) = &self.member else {
            return Ok(());
        };
        let role = self
            .resolve_role(role)
            .map(|r| r.id)
            .ok_or(ExecError::UnknownRole)?;
        if member.has_role(role) {
            return Ok(());
        }

        let user = member.user.id;
        self.host
            .transport
            .add_member_role(self.guild.id, user, role)
            .await
            .map_err(ExecError::Transport)?;
        if let Some(member) = self.member.as_mut() {
            member.roles.push(role);
        }
        Ok(())
    }

    /// Revokes a role from the triggering member, after `delay_secs` when positive.
    ///
    /// A delayed removal is scheduled even if the snapshot says the role is
    /// not held, since it may be granted before the delay runs out.
    pub async fn remove_role(&mut self, role: &RoleRef, delay_secs: i64) -> Result<(), ExecError> {
        self.charge_api_call()?;
        let Some(member) = &self.member else {
            return Ok(());
        };
        let role = self
            .resolve_role(role)
            .map(|r| r.id)
            .ok_or(ExecError::UnknownRole)?;
        if delay_secs <= 0 && !member.has_role(role) {
            return Ok(());
        }

        let user = member.user.id;
        self.revoke(user, role, delay_secs).await?;
        if delay_secs <= 0 {
            if let Some(member) = self.member.as_mut() {
                member.roles.retain(|r| *r != role);
            }
        }
        Ok(())
    }

    async fn revoke(&self, user: UserId, role: RoleId, delay_secs: i64) -> Result<(), ExecError> {
        if delay_secs <= 0 {
            return self
                .host
                .transport
                .remove_member_role(self.guild.id, user, role)
                .await
                .map_err(ExecError::Transport);
        }

        let at = chrono::Duration::from_std(Duration::from_secs(delay_secs as u64))
            .ok()
            .and_then(|delay| Utc::now().checked_add_signed(delay))
            .ok_or_else(|| ExecError::InvalidArgument(format!("delay of {delay_secs}s is out of range")))?;

        if let Err(e) = self
            .host
            .scheduler
            .schedule_role_removal(self.guild.id, user, role, at)
            .await
        {
            warn!("Failed to schedule removal of role {role} from {user}: {e}");
        }
        Ok(())
    }
}
