//! Playback coordination for placed sound sources.
//!
//! Two independent producers can ask for "pause everything": the foreground preview player and
//! the global mute toggle. They may overlap in time and end in either order, so each request is a
//! frame on a LIFO stack that records which sources were playing when it began.
//!
//! Rules:
//!
//! - Beginning the scope that is already on top is a no-op.
//! - A frame pushed while nothing is playing inherits the snapshot of the frame below it.
//! - Ending the top frame resumes its snapshot only if the stack is then empty.
//! - Ending a scope that is not on top removes its most recent frame without resuming anything.
//!
//! The coordinator never fails; operations on unknown or released controllers are no-ops.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Weak},
};

use tracing::debug;

use crate::foundation::core::ObjectId;

/// Transport controls for one sound source, owned by the playback collaborator.
///
/// The coordinator only keeps weak references, so dropping the last `Arc` unregisters the source
/// implicitly.
pub trait PlaybackController {
    /// Start or resume playback.
    fn play(&self);
    /// Pause, keeping the playhead.
    fn pause(&self);
    /// Stop and rewind.
    fn stop(&self);
    /// Set linear gain in `[0, 1]`.
    fn set_volume(&self, volume: f32);
}

/// Reason for suppressing placed sound sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterruptionScope {
    /// A sound is being auditioned in the foreground.
    ForegroundPreview,
    /// The user muted the scene.
    GlobalMute,
}

#[derive(Clone, Debug)]
struct InterruptionFrame {
    scope: InterruptionScope,
    snapshot: BTreeSet<ObjectId>,
}

/// Registry of placed sound sources plus the interruption stack.
#[derive(Default)]
pub struct AudioCoordinator {
    registry: BTreeMap<ObjectId, Weak<dyn PlaybackController>>,
    playing: BTreeSet<ObjectId>,
    stack: Vec<InterruptionFrame>,
}

impl std::fmt::Debug for AudioCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioCoordinator")
            .field("registered", &self.registry.len())
            .field("playing", &self.playing)
            .field("stack", &self.stack)
            .finish()
    }
}

impl AudioCoordinator {
    /// Empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `controller` under `id`, replacing any previous registration.
    ///
    /// While muted the controller is paused, and with `autoplay` it is recorded so that it starts
    /// when the mute ends.
    pub fn register(
        &mut self,
        id: ObjectId,
        controller: &Arc<dyn PlaybackController>,
        autoplay: bool,
    ) {
        self.prune();
        self.registry.insert(id, Arc::downgrade(controller));
        if self.is_muted() {
            controller.pause();
            self.playing.remove(&id);
            if autoplay {
                for frame in &mut self.stack {
                    frame.snapshot.insert(id);
                }
            }
        } else if autoplay {
            controller.play();
            self.playing.insert(id);
        }
    }

    /// Stop and forget `id`.
    pub fn unregister(&mut self, id: ObjectId) {
        self.prune();
        if let Some(controller) = self.registry.remove(&id).and_then(|w| w.upgrade()) {
            controller.stop();
        }
        self.playing.remove(&id);
        for frame in &mut self.stack {
            frame.snapshot.remove(&id);
        }
    }

    /// Start `id`. Ignored while muted.
    pub fn play(&mut self, id: ObjectId) {
        self.prune();
        let Some(controller) = self.controller(id) else {
            return;
        };
        if self.is_muted() {
            self.playing.remove(&id);
            return;
        }
        controller.play();
        self.playing.insert(id);
    }

    /// Pause `id`.
    pub fn pause(&mut self, id: ObjectId) {
        self.prune();
        if let Some(controller) = self.controller(id) {
            controller.pause();
        }
        self.playing.remove(&id);
    }

    /// Stop `id`.
    pub fn stop(&mut self, id: ObjectId) {
        self.prune();
        if let Some(controller) = self.controller(id) {
            controller.stop();
        }
        self.playing.remove(&id);
    }

    /// Forward a gain change to `id`, clamped to `[0, 1]`.
    pub fn set_volume(&mut self, id: ObjectId, volume: f32) {
        self.prune();
        if let Some(controller) = self.controller(id) {
            controller.set_volume(volume.clamp(0.0, 1.0));
        }
    }

    /// Push an interruption frame and pause every source.
    pub fn begin_interruption(&mut self, scope: InterruptionScope) {
        self.prune();
        if self.stack.last().is_some_and(|f| f.scope == scope) {
            return;
        }
        let snapshot = if self.playing.is_empty() {
            self.stack
                .last()
                .map(|f| f.snapshot.clone())
                .unwrap_or_default()
        } else {
            std::mem::take(&mut self.playing)
        };
        for controller in self.registry.values().filter_map(Weak::upgrade) {
            controller.pause();
        }
        self.playing.clear();
        debug!(?scope, snapshot = snapshot.len(), depth = self.stack.len() + 1, "interruption began");
        self.stack.push(InterruptionFrame { scope, snapshot });
    }

    /// End the most recent interruption for `scope`.
    pub fn end_interruption(&mut self, scope: InterruptionScope) {
        self.prune();
        let Some(top) = self.stack.last() else {
            return;
        };
        if top.scope == scope {
            let Some(frame) = self.stack.pop() else {
                return;
            };
            if self.stack.is_empty() {
                for id in frame.snapshot {
                    if let Some(controller) = self.controller(id) {
                        controller.play();
                        self.playing.insert(id);
                    }
                }
            }
            debug!(?scope, depth = self.stack.len(), resumed = self.playing.len(), "interruption ended");
        } else if let Some(pos) = self.stack.iter().rposition(|f| f.scope == scope) {
            self.stack.remove(pos);
            debug!(?scope, depth = self.stack.len(), "interruption removed out of order");
        }
    }

    /// Toggle the global mute scope. Repeating the current state is a no-op.
    pub fn set_global_mute(&mut self, muted: bool) {
        if muted == self.is_muted() {
            return;
        }
        if muted {
            self.begin_interruption(InterruptionScope::GlobalMute);
        } else {
            self.end_interruption(InterruptionScope::GlobalMute);
        }
    }

    /// Return `true` while a global mute frame is on the stack.
    pub fn is_muted(&self) -> bool {
        self.stack
            .iter()
            .any(|f| f.scope == InterruptionScope::GlobalMute)
    }

    /// Return `true` when `id` is live and marked playing.
    pub fn is_playing(&self, id: ObjectId) -> bool {
        self.playing.contains(&id) && self.controller(id).is_some()
    }

    /// Live ids currently marked playing.
    pub fn playing(&self) -> BTreeSet<ObjectId> {
        self.playing
            .iter()
            .copied()
            .filter(|id| self.controller(*id).is_some())
            .collect()
    }

    /// Number of active interruption frames.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Scope of the innermost interruption.
    pub fn top_scope(&self) -> Option<InterruptionScope> {
        self.stack.last().map(|f| f.scope)
    }

    /// Return `true` when `id` has a live controller.
    pub fn is_registered(&self, id: ObjectId) -> bool {
        self.controller(id).is_some()
    }

    fn controller(&self, id: ObjectId) -> Option<Arc<dyn PlaybackController>> {
        self.registry.get(&id).and_then(Weak::upgrade)
    }

    fn prune(&mut self) {
        self.registry.retain(|_, w| w.strong_count() > 0);
        let registry = &self.registry;
        self.playing.retain(|id| registry.contains_key(id));
        for frame in &mut self.stack {
            frame.snapshot.retain(|id| registry.contains_key(id));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/coordinator.rs"]
mod tests;
