use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Per-invocation call thresholds.
///
/// These are product tuning values, not architectural constants: each host
/// function declares which key it charges and the threshold comes from here.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LimitsConfig {
    /// Shared ceiling for host functions without a dedicated counter
    #[serde(default = "default_api_calls")]
    pub api_calls: u32,
    /// Guild-state lookups (role mentions, role membership checks)
    #[serde(default = "default_state_lookups")]
    pub state_lookups: u32,
    #[serde(default = "default_send_dm")]
    pub send_dm: u32,
    /// Nested template invocations
    #[serde(default = "default_exec_child")]
    pub exec_child: u32,
    #[serde(default = "default_del_reaction_message")]
    pub del_reaction_message: u32,
    #[serde(default = "default_reactions")]
    pub add_reaction_trigger: u32,
    #[serde(default = "default_reactions")]
    pub add_reaction_response: u32,
    #[serde(default = "default_reactions")]
    pub add_reaction_message: u32,
    /// Channel edits across all channels
    #[serde(default = "default_edit_channel")]
    pub edit_channel: u32,
    /// Channel edits for one specific channel
    #[serde(default = "default_edit_channel_per_channel")]
    pub edit_channel_per_channel: u32,
    #[serde(default = "default_edit_nick")]
    pub edit_nick: u32,
    /// Role-list replacements for one specific user
    #[serde(default = "default_set_roles_per_user")]
    pub set_roles_per_user: u32,
}

fn default_api_calls() -> u32 {
    100
}

fn default_state_lookups() -> u32 {
    500
}

fn default_send_dm() -> u32 {
    1
}

fn default_exec_child() -> u32 {
    3
}

fn default_del_reaction_message() -> u32 {
    10
}

fn default_reactions() -> u32 {
    20
}

fn default_edit_channel() -> u32 {
    10
}

fn default_edit_channel_per_channel() -> u32 {
    2
}

fn default_edit_nick() -> u32 {
    2
}

fn default_set_roles_per_user() -> u32 {
    1
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            api_calls: default_api_calls(),
            state_lookups: default_state_lookups(),
            send_dm: default_send_dm(),
            exec_child: default_exec_child(),
            del_reaction_message: default_del_reaction_message(),
            add_reaction_trigger: default_reactions(),
            add_reaction_response: default_reactions(),
            add_reaction_message: default_reactions(),
            edit_channel: default_edit_channel(),
            edit_channel_per_channel: default_edit_channel_per_channel(),
            edit_nick: default_edit_nick(),
            set_roles_per_user: default_set_roles_per_user(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses TOML content, expanding environment variables like `${CC_API_CALLS}`.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let expanded = shellexpand::env(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }
}
