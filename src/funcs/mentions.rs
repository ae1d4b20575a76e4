use tracing::debug;

use crate::args::RoleRef;
use crate::error::ExecError;
use crate::sandbox::{Action, InvocationContext};

/// Returned in place of a mention token when the role does not exist.
pub const ROLE_NOT_FOUND: &str = "(role not found)";

impl InvocationContext {
    /// Lets the current frame's response ping everyone.
    pub fn mention_everyone(&mut self) -> &'static str {
        self.frames.current_mut().mentions.everyone = true;
        "@everyone"
    }

    pub fn mention_here(&mut self) -> &'static str {
        self.frames.current_mut().mentions.here = true;
        "@here"
    }

    /// Returns the mention token for a role and allows it to ping in the
    /// current frame's response. Mentioning the same role again returns the
    /// same token without recording it twice.
    pub fn mention_role(&mut self, role: &RoleRef) -> Result<String, ExecError> {
        self.charge(Action::StateLookup)?;
        let Some(id) = self.resolve_role(role).map(|r| r.id) else {
            return Ok(ROLE_NOT_FOUND.to_string());
        };

        if !self.frames.current_mut().mentions.add_role(id) {
            debug!("Role {id} already mentioned in this frame");
        }
        Ok(format!("<@&{id}>"))
    }
}
