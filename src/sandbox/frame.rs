use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::debug;

use super::InvocationContext;
use crate::program::Program;
use crate::state::{ChannelState, RoleId};
use crate::value::Value;

/// Mentions accumulated by one frame's program, applied when its response is sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MentionState {
    pub everyone: bool,
    pub here: bool,
    roles: Vec<RoleId>,
}

impl MentionState {
    /// Records a role mention. Returns false if the role was already recorded.
    pub fn add_role(&mut self, role: RoleId) -> bool {
        if self.roles.contains(&role) {
            return false;
        }
        self.roles.push(role);
        true
    }

    pub fn roles(&self) -> &[RoleId] {
        &self.roles
    }
}

/// How a frame's eventual response is delivered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseRouting {
    pub send_in_dm: bool,
    pub delete_response: bool,
    pub delete_delay_secs: u64,
    pub reactions: Vec<String>,
}

/// Execution state of one program level (root or nested).
#[derive(Debug, Clone)]
pub struct Frame {
    pub channel: Option<ChannelState>,
    pub is_nested: bool,
    pub mentions: MentionState,
    pub routing: ResponseRouting,
    pub program: Arc<Program>,
    /// Named input handed over by the caller of a nested program
    pub args: Option<Value>,
}

impl Frame {
    pub fn root(channel: Option<ChannelState>, program: Arc<Program>) -> Self {
        Self {
            channel,
            is_nested: false,
            mentions: MentionState::default(),
            routing: ResponseRouting::default(),
            program,
            args: None,
        }
    }

    /// A fresh nested frame: empty mention state, default routing.
    pub fn nested(channel: Option<ChannelState>, program: Arc<Program>) -> Self {
        Self {
            is_nested: true,
            ..Self::root(channel, program)
        }
    }
}

/// Stack of frames; the top is current. Never empty.
#[derive(Debug)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    pub fn new(root: Frame) -> Self {
        Self { frames: vec![root] }
    }

    pub fn current(&self) -> &Frame {
        // The root frame is pushed at construction and never popped.
        &self.frames[self.frames.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut Frame {
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    pub fn root(&self) -> &Frame {
        &self.frames[0]
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Pops the current frame. The root frame is never popped.
    pub fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() <= 1 {
            return None;
        }
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Keeps a pushed frame on the stack for as long as it lives.
///
/// Dropping the guard pops the frame, so the caller's frame is restored on
/// every exit path: normal return, `?`, panic, or the enclosing future
/// being dropped mid-await.
pub(crate) struct FrameGuard<'a> {
    ctx: &'a mut InvocationContext,
}

impl<'a> FrameGuard<'a> {
    pub(crate) fn enter(ctx: &'a mut InvocationContext, frame: Frame) -> Self {
        debug!(
            "Entering frame for '{}' (depth {})",
            frame.program.name,
            ctx.frames.depth() + 1
        );
        ctx.frames.push(frame);
        Self { ctx }
    }
}

impl Deref for FrameGuard<'_> {
    type Target = InvocationContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if let Some(frame) = self.ctx.frames.pop() {
            debug!(
                "Leaving frame for '{}' (depth {})",
                frame.program.name,
                self.ctx.frames.depth()
            );
        }
    }
}
