use flare_core::SignalError;

/// Handle on the local capture tracks. Toggles flip the enabled flag
/// without renegotiation and are idempotent; `switch_camera` is a
/// best-effort facing-mode swap.
pub trait LocalMedia: Send + Sync {
    fn audio_enabled(&self) -> bool;
    fn video_enabled(&self) -> bool;
    fn set_audio_enabled(&self, enabled: bool);
    fn set_video_enabled(&self, enabled: bool);

    /// Flips the audio track and returns the new enabled state.
    fn toggle_audio(&self) -> bool {
        let enabled = !self.audio_enabled();
        self.set_audio_enabled(enabled);
        enabled
    }

    /// Flips the video track and returns the new enabled state.
    fn toggle_video(&self) -> bool {
        let enabled = !self.video_enabled();
        self.set_video_enabled(enabled);
        enabled
    }

    /// Requests a facing-mode swap on the video track. A
    /// [`SignalError::State`] means the capture source does not support
    /// it; callers treat that as a non-fatal no-op.
    fn switch_camera(&self) -> Result<(), SignalError>;

    /// Releases the capture tracks.
    fn stop(&self);
}
