//! The coaching sink seam.
//!
//! A [`CoachingSink`] is the audio/voice collaborator that turns cue tokens
//! and free-text messages into output. The engine queues output through a
//! [`CueDispatcher`](super::CueDispatcher), so a slow or failing sink cannot
//! hold up the countdown.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

use super::cue::Cue;
use crate::error::SinkError;

pub const MIN_VOICE_FACTOR: f32 = 0.5;
pub const MAX_VOICE_FACTOR: f32 = 2.0;

/// Voice language for spoken cues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceLanguage {
    #[default]
    En,
    De,
}

/// Speech rate and pitch, both within [0.5, 2.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub speech_rate: f32,
    pub pitch: f32,
}

impl VoiceSettings {
    /// Clamp both factors into range; non-finite values fall back to 1.0.
    pub fn new(speech_rate: f32, pitch: f32) -> Self {
        Self {
            speech_rate: clamp_factor(speech_rate),
            pitch: clamp_factor(pitch),
        }
    }
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

fn clamp_factor(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(MIN_VOICE_FACTOR, MAX_VOICE_FACTOR)
    } else {
        1.0
    }
}

/// Receiver of coaching output.
///
/// Queued calls (`initialize`, `emit_*`, `configure`, `release`) arrive one
/// at a time, in emission order, on a blocking thread; they may block while
/// audio plays. `stop` and `is_speaking` are called directly from the
/// engine's caller and must return promptly.
pub trait CoachingSink: Send + Sync {
    /// Bring up the audio/voice backend. Sinks that need no setup are
    /// always ready.
    fn initialize(&self) -> Result<(), SinkError> {
        Ok(())
    }

    fn emit_cue(&self, cue: Cue) -> Result<(), SinkError>;

    fn emit_message(&self, text: &str) -> Result<(), SinkError>;

    fn configure(&self, _settings: &VoiceSettings) {}

    /// Cut off whatever is playing right now.
    fn stop(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }

    /// Free underlying audio resources. Called once, last.
    fn release(&self) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl CoachingSink for NullSink {
    fn emit_cue(&self, _cue: Cue) -> Result<(), SinkError> {
        Ok(())
    }

    fn emit_message(&self, _text: &str) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Logs cues and messages through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl CoachingSink for TracingSink {
    fn emit_cue(&self, cue: Cue) -> Result<(), SinkError> {
        tracing::info!(cue = cue.token(), "coaching cue");
        Ok(())
    }

    fn emit_message(&self, text: &str) -> Result<(), SinkError> {
        tracing::info!(message = text, "coaching message");
        Ok(())
    }

    fn release(&self) {
        tracing::debug!("tracing sink released");
    }
}

/// One call observed by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkRecord {
    Initialized,
    Cue(Cue),
    Message(String),
    Configured(VoiceSettings),
    Stopped,
    Released,
}

/// Keeps every call in memory. Useful for tests and for UIs that replay
/// the cue history of a rest.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<SinkRecord>>,
    fail_deliveries: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every call but reports initialization, each cue and each
    /// message as failed.
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_deliveries: true,
        }
    }

    pub fn records(&self) -> Vec<SinkRecord> {
        self.lock().clone()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.lock()
            .iter()
            .filter_map(|r| match r {
                SinkRecord::Cue(cue) => Some(*cue),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|r| match r {
                SinkRecord::Message(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn is_released(&self) -> bool {
        self.lock().contains(&SinkRecord::Released)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SinkRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, record: SinkRecord) -> Result<(), SinkError> {
        self.lock().push(record);
        if self.fail_deliveries {
            Err(SinkError::Playback("recording sink set to fail".into()))
        } else {
            Ok(())
        }
    }
}

impl CoachingSink for RecordingSink {
    fn initialize(&self) -> Result<(), SinkError> {
        self.record(SinkRecord::Initialized)
    }

    fn emit_cue(&self, cue: Cue) -> Result<(), SinkError> {
        self.record(SinkRecord::Cue(cue))
    }

    fn emit_message(&self, text: &str) -> Result<(), SinkError> {
        self.record(SinkRecord::Message(text.to_string()))
    }

    fn configure(&self, settings: &VoiceSettings) {
        self.lock().push(SinkRecord::Configured(*settings));
    }

    fn stop(&self) {
        self.lock().push(SinkRecord::Stopped);
    }

    fn release(&self) {
        self.lock().push(SinkRecord::Released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_settings_are_clamped() {
        let s = VoiceSettings::new(3.0, 0.1);
        assert_eq!(s.speech_rate, 2.0);
        assert_eq!(s.pitch, 0.5);
        assert_eq!(VoiceSettings::new(f32::NAN, 1.2).speech_rate, 1.0);
    }

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.emit_cue(Cue::RestStarted).unwrap();
        sink.emit_message("breathe").unwrap();
        sink.emit_cue(Cue::RestComplete).unwrap();
        sink.release();
        assert_eq!(sink.cues(), vec![Cue::RestStarted, Cue::RestComplete]);
        assert_eq!(sink.messages(), vec!["breathe".to_string()]);
        assert!(sink.is_released());
    }

    #[test]
    fn failing_sink_still_records() {
        let sink = RecordingSink::failing();
        assert!(sink.initialize().is_err());
        assert!(sink.emit_cue(Cue::TenSecondsLeft).is_err());
        assert_eq!(sink.cues(), vec![Cue::TenSecondsLeft]);
    }

    #[test]
    fn default_lifecycle_is_ready_and_silent() {
        assert!(NullSink.initialize().is_ok());
        assert!(!TracingSink.is_speaking());
    }

    #[test]
    fn language_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&VoiceLanguage::De).unwrap(), "\"de\"");
    }
}
