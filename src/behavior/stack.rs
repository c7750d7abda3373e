//! The behavior stack: push/pop with tagged response-id frames and a
//! retained erase-buffer (§3 "Behavior stack", §4.3).

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::behavior::Behavior;
use crate::util::CorrelationId;

/// Tag on a [`Frame`] (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// The default kind, runtime-installed by `become`.
    Async,
    /// Installed for a pending request id via `install_response_handler`.
    Response(CorrelationId),
}

/// One entry in the [`BehaviorStack`].
pub struct Frame {
    pub kind: FrameKind,
    pub behavior: Behavior,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame").field("kind", &self.kind).finish()
    }
}

/// A stack whose top is the active behavior (§3).
///
/// Response frames are not necessarily at the top: a response envelope's
/// correlation id is resolved directly via [`BehaviorStack::sync_handler`]
/// rather than by scanning only the literal top, matching §4.3 ("its
/// correlation id selects the response frame"). Plain (non-response)
/// envelopes always dispatch against the literal top frame.
#[derive(Default)]
pub struct BehaviorStack {
    frames: Vec<Frame>,
    /// Frames removed by `erase`/`pop_async_back` but retained until the
    /// next [`BehaviorStack::cleanup`] call, so that references a currently
    /// running handler took out of the old frame stay valid (§3 invariant).
    graveyard: Vec<Frame>,
}

impl BehaviorStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The literal top frame's behavior, used for ordinary dispatch.
    pub fn top(&self) -> Option<&Behavior> {
        self.frames.last().map(|f| &f.behavior)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn push(&mut self, kind: FrameKind, behavior: Behavior) {
        self.frames.push(Frame { kind, behavior });
    }

    /// `become(behavior, keep_old)` (§4.3).
    pub fn become_behavior(&mut self, behavior: Behavior, keep_old: bool) {
        if !keep_old {
            self.pop_async_back();
        }
        self.push(FrameKind::Async, behavior);
    }

    /// `unbecome()`: pop the top asynchronous frame (§4.3).
    pub fn unbecome(&mut self) {
        self.pop_async_back();
    }

    /// Remove the nearest asynchronous frame scanning from the top down,
    /// retaining it in the graveyard (§3: "`pop_async_back` removes only
    /// asynchronous frames").
    pub fn pop_async_back(&mut self) -> bool {
        if let Some(pos) = self
            .frames
            .iter()
            .rposition(|frame| matches!(frame.kind, FrameKind::Async))
        {
            let frame = self.frames.remove(pos);
            self.graveyard.push(frame);
            true
        } else {
            false
        }
    }

    /// `install_response_handler(id, behavior)`: push a response frame
    /// tagged with `id` (§4.3).
    pub fn install_response_handler(&mut self, id: CorrelationId, behavior: Behavior) {
        self.push(FrameKind::Response(id), behavior);
    }

    /// `sync_handler(id)`: look up the response frame for `id`, most
    /// recently installed first.
    pub fn sync_handler(&self, id: CorrelationId) -> Option<&Behavior> {
        self.frames
            .iter()
            .rev()
            .find(|frame| frame.kind == FrameKind::Response(id))
            .map(|frame| &frame.behavior)
    }

    /// `erase(id)`: remove the response frame with that id, and any response
    /// frames installed above it (§4.3: "that frame (and any response frames
    /// installed under it) is erased" — "under" here means nested beneath it
    /// in call order, i.e. pushed afterward and thus above it on the stack).
    pub fn erase(&mut self, id: CorrelationId) -> bool {
        let Some(pos) = self.frames.iter().position(|frame| frame.kind == FrameKind::Response(id)) else {
            return false;
        };
        let removed: Vec<Frame> = self.frames.drain(pos..).collect();
        self.graveyard.extend(removed);
        true
    }

    /// Drop everything accumulated in the erase-buffer. Call at a cleanup
    /// point between envelope dispatches, never mid-handler (§3 invariant).
    pub fn cleanup(&mut self) {
        self.graveyard.clear();
    }

    pub fn graveyard_len(&self) -> usize {
        self.graveyard.len()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Debug for BehaviorStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorStack")
            .field("depth", &self.frames.len())
            .field("graveyard", &self.graveyard.len())
            .finish()
    }
}
