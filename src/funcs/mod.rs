//! Host functions exposed to the evaluator.
//!
//! Each function consults the governor before performing any side effect.
//! They are grouped by concern and all implemented on
//! [`InvocationContext`](crate::sandbox::InvocationContext).

pub mod channels;
pub mod deletion;
pub mod mentions;
pub mod messages;
pub mod patterns;
pub mod reactions;
pub mod roles;
pub mod timing;

pub use messages::SendOptions;

/// Hard platform ceiling on a member's role list.
pub const MAX_ROLES: usize = 250;

/// Delay before deleting a message when the script gives none, in seconds.
pub const DEFAULT_DELETE_DELAY_SECS: i64 = 10;

/// Longest deletion delay a script may request, in seconds.
pub const MAX_DELETE_DELAY_SECS: i64 = 86_400;
