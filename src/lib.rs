//! Execution governor for user-authored custom command scripts.
//!
//! One [`InvocationContext`] is created per trigger firing. It meters every
//! side effect a script can cause (chat API calls, sleeps, compiled
//! patterns, nested script calls) and keeps the per-level frame state that
//! decides where and how responses are sent. Evaluation itself, the chat
//! transport and delayed actions are external collaborators, see [`host`].
//!
//! ```ignore
//! let mut ctx = InvocationContext::new(host, config.limits, guild, programs, channel)
//!     .with_member(member)
//!     .with_data(data);
//! let response = ctx.execute().await?;
//! ```

pub mod args;
pub mod config;
pub mod error;
pub mod funcs;
pub mod host;
pub mod program;
pub mod sandbox;
pub mod state;
pub mod value;

pub use args::{ChannelRef, RoleRef, UserRef};
pub use config::{Config, LimitsConfig};
pub use error::{ErrorKind, ExecError};
pub use funcs::SendOptions;
pub use host::{ActionScheduler, Evaluator, Host, MessageTransport};
pub use program::{Program, ProgramSet};
pub use sandbox::{InvocationContext, NestedTarget};
pub use value::Value;
