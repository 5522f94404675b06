//! Sound playback coordination: placed sources, interruptions, and the preview player.

/// Controller registry and the interruption stack.
pub mod coordinator;
/// Foreground audition player.
pub mod preview;
