use restwell_core::coaching::{Speaker, VoiceSettings};
use restwell_core::SinkError;

/// Prints spoken lines to stderr.
pub struct ConsoleSpeaker;

impl Speaker for ConsoleSpeaker {
    fn speak(&self, text: &str) -> Result<(), SinkError> {
        eprintln!("🔊 {text}");
        Ok(())
    }

    fn apply_voice(&self, settings: &VoiceSettings) {
        tracing::debug!(
            speech_rate = settings.speech_rate,
            pitch = settings.pitch,
            "voice configured"
        );
    }
}
