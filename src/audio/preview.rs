use std::sync::Arc;

use tracing::debug;

use crate::{
    audio::coordinator::{AudioCoordinator, InterruptionScope, PlaybackController},
    foundation::core::AssetId,
};

/// The single foreground player used to audition library and catalog sounds.
///
/// While a preview is active every placed source is suspended through a
/// [`InterruptionScope::ForegroundPreview`] frame. Switching from one preview to another keeps
/// the same frame.
#[derive(Default)]
pub struct PreviewPlayer {
    current: Option<(AssetId, Arc<dyn PlaybackController>)>,
}

impl PreviewPlayer {
    /// Idle player.
    pub fn new() -> Self {
        Self::default()
    }

    /// Audition `asset` through `controller`.
    ///
    /// The controller is not started while the scene is muted.
    pub fn start(
        &mut self,
        asset: AssetId,
        controller: Arc<dyn PlaybackController>,
        audio: &mut AudioCoordinator,
    ) {
        match self.current.take() {
            Some((_, previous)) => previous.stop(),
            None => audio.begin_interruption(InterruptionScope::ForegroundPreview),
        }
        if !audio.is_muted() {
            controller.play();
        }
        debug!(asset = %asset, "preview started");
        self.current = Some((asset, controller));
    }

    /// Stop the preview and lift its interruption. No-op when idle.
    pub fn stop(&mut self, audio: &mut AudioCoordinator) {
        let Some((asset, controller)) = self.current.take() else {
            return;
        };
        controller.stop();
        audio.end_interruption(InterruptionScope::ForegroundPreview);
        debug!(asset = %asset, "preview stopped");
    }

    /// Asset currently being auditioned.
    pub fn current(&self) -> Option<&AssetId> {
        self.current.as_ref().map(|(id, _)| id)
    }

    /// Return `true` while a preview is active.
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }
}

impl std::fmt::Debug for PreviewPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewPlayer")
            .field("current", &self.current())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/preview.rs"]
mod tests;
