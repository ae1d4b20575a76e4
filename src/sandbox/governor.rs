//! Per-invocation call budgets.
//!
//! Every check is check-and-increment in one step: the counter moves on each
//! attempt, including rejected ones, so counters never decrease. A governor
//! belongs to exactly one invocation and is never shared.

use std::collections::HashMap;

use crate::config::LimitsConfig;
use crate::state::{ChannelId, UserId};

/// Cumulative pause budget for one invocation.
pub const MAX_SECONDS_SLEPT: u64 = 60;

/// A host-function call site that has its own counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SendDm,
    ExecChild,
    DelReactionMessage,
    AddReactionTrigger,
    AddReactionResponse,
    AddReactionMessage,
    EditChannel,
    EditChannelTarget(ChannelId),
    EditNick,
    SetRolesTarget(UserId),
    StateLookup,
}

impl Action {
    /// Counter key, e.g. `"exec_child"` or `"edit_channel:42"`.
    pub fn key(&self) -> String {
        match self {
            Action::SendDm => "send_dm".to_string(),
            Action::ExecChild => "exec_child".to_string(),
            Action::DelReactionMessage => "del_reaction_message".to_string(),
            Action::AddReactionTrigger => "add_reaction_trigger".to_string(),
            Action::AddReactionResponse => "add_reaction_response".to_string(),
            Action::AddReactionMessage => "add_reaction_message".to_string(),
            Action::EditChannel => "edit_channel".to_string(),
            Action::EditChannelTarget(id) => format!("edit_channel:{id}"),
            Action::EditNick => "edit_nick".to_string(),
            Action::SetRolesTarget(id) => format!("set_roles:{id}"),
            Action::StateLookup => "state_lookup".to_string(),
        }
    }

    pub fn limit(&self, limits: &LimitsConfig) -> u32 {
        match self {
            Action::SendDm => limits.send_dm,
            Action::ExecChild => limits.exec_child,
            Action::DelReactionMessage => limits.del_reaction_message,
            Action::AddReactionTrigger => limits.add_reaction_trigger,
            Action::AddReactionResponse => limits.add_reaction_response,
            Action::AddReactionMessage => limits.add_reaction_message,
            Action::EditChannel => limits.edit_channel,
            Action::EditChannelTarget(_) => limits.edit_channel_per_channel,
            Action::EditNick => limits.edit_nick,
            Action::SetRolesTarget(_) => limits.set_roles_per_user,
            Action::StateLookup => limits.state_lookups,
        }
    }
}

pub struct ResourceGovernor {
    counters: HashMap<String, u32>,
    generic_api_calls: u32,
    generic_api_limit: u32,
    seconds_slept: u64,
}

impl ResourceGovernor {
    pub fn new(generic_api_limit: u32) -> Self {
        Self {
            counters: HashMap::new(),
            generic_api_calls: 0,
            generic_api_limit,
            seconds_slept: 0,
        }
    }

    /// Counts one attempt against `key`. Returns true when the limit is now exceeded.
    pub fn check_and_increment(&mut self, key: &str, limit: u32) -> bool {
        let count = self.counters.entry(key.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count > limit
    }

    /// Counts one outbound call against the shared ceiling.
    /// Returns true when the ceiling is now exceeded.
    pub fn check_generic_api_call(&mut self) -> bool {
        self.generic_api_calls = self.generic_api_calls.saturating_add(1);
        self.generic_api_calls > self.generic_api_limit
    }

    /// Reserves `seconds` of the pause budget.
    ///
    /// Returns `(exceeded, total)`. A rejected request leaves the total untouched.
    pub fn check_sleep(&mut self, seconds: u64) -> (bool, u64) {
        let total = self.seconds_slept.saturating_add(seconds);
        if total > MAX_SECONDS_SLEPT {
            return (true, self.seconds_slept);
        }
        self.seconds_slept = total;
        (false, total)
    }

    pub fn count(&self, key: &str) -> u32 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    pub fn generic_api_calls(&self) -> u32 {
        self.generic_api_calls
    }

    pub fn generic_api_limit(&self) -> u32 {
        self.generic_api_limit
    }

    pub fn seconds_slept(&self) -> u64 {
        self.seconds_slept
    }
}
