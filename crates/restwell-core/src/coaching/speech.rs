//! Spoken coaching: cue tokens resolved to phrases and handed to a
//! text-to-speech [`Speaker`].

use std::sync::atomic::{AtomicBool, Ordering};

use super::cue::Cue;
use super::sink::{CoachingSink, VoiceLanguage, VoiceSettings};
use crate::error::SinkError;

/// Phrase table for one language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhraseBook {
    language: VoiceLanguage,
}

impl PhraseBook {
    pub fn new(language: VoiceLanguage) -> Self {
        Self { language }
    }

    pub fn language(&self) -> VoiceLanguage {
        self.language
    }

    pub fn phrase(&self, cue: Cue) -> &'static str {
        match self.language {
            VoiceLanguage::En => match cue {
                Cue::RestStarted => "Rest started. Recover well!",
                Cue::ThirtySecondsLeft => "Thirty seconds of rest left",
                Cue::TenSecondsLeft => "Ten seconds left",
                Cue::Countdown3 => "3",
                Cue::Countdown2 => "2",
                Cue::Countdown1 => "1",
                Cue::RestComplete => "Rest complete! Ready for the next set?",
                Cue::RestExtended => "Rest extended",
                Cue::RestSkipped => "Rest skipped",
            },
            VoiceLanguage::De => match cue {
                Cue::RestStarted => "Pause gestartet. Erhol dich gut!",
                Cue::ThirtySecondsLeft => "Noch 30 Sekunden Pause",
                Cue::TenSecondsLeft => "Noch 10 Sekunden",
                Cue::Countdown3 => "3",
                Cue::Countdown2 => "2",
                Cue::Countdown1 => "1",
                Cue::RestComplete => "Pause beendet! Bereit für den nächsten Satz?",
                Cue::RestExtended => "Pause verlängert",
                Cue::RestSkipped => "Pause übersprungen",
            },
        }
    }
}

/// Text-to-speech output device.
pub trait Speaker: Send + Sync {
    fn initialize(&self) -> Result<(), SinkError> {
        Ok(())
    }

    fn speak(&self, text: &str) -> Result<(), SinkError>;

    fn apply_voice(&self, _settings: &VoiceSettings) {}

    fn stop(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }

    fn shutdown(&self) {}
}

/// [`CoachingSink`] that speaks every cue and message.
///
/// Output is refused with [`SinkError::Unavailable`] until
/// [`CoachingSink::initialize`] succeeds, and again after
/// [`CoachingSink::release`].
pub struct SpeechSink<S> {
    speaker: S,
    phrases: PhraseBook,
    ready: AtomicBool,
    released: AtomicBool,
}

impl<S: Speaker> SpeechSink<S> {
    pub fn new(speaker: S, language: VoiceLanguage) -> Self {
        Self {
            speaker,
            phrases: PhraseBook::new(language),
            ready: AtomicBool::new(false),
            released: AtomicBool::new(false),
        }
    }

    pub fn speaker(&self) -> &S {
        &self.speaker
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire) && !self.is_released()
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    fn ensure_ready(&self) -> Result<(), SinkError> {
        if self.is_released() {
            Err(SinkError::Unavailable("speech output released".into()))
        } else if !self.ready.load(Ordering::Acquire) {
            Err(SinkError::Unavailable("speech output not initialized".into()))
        } else {
            Ok(())
        }
    }
}

impl<S: Speaker> CoachingSink for SpeechSink<S> {
    fn initialize(&self) -> Result<(), SinkError> {
        if self.is_released() {
            return Err(SinkError::Unavailable("speech output released".into()));
        }
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }
        self.speaker.initialize()?;
        self.ready.store(true, Ordering::Release);
        tracing::info!(language = ?self.phrases.language(), "speech output initialized");
        Ok(())
    }

    fn emit_cue(&self, cue: Cue) -> Result<(), SinkError> {
        self.ensure_ready()?;
        let phrase = self.phrases.phrase(cue);
        tracing::debug!(cue = cue.token(), phrase, "speaking cue");
        self.speaker.speak(phrase)
    }

    fn emit_message(&self, text: &str) -> Result<(), SinkError> {
        self.ensure_ready()?;
        self.speaker.speak(text)
    }

    fn configure(&self, settings: &VoiceSettings) {
        if !self.is_released() {
            self.speaker.apply_voice(settings);
        }
    }

    fn stop(&self) {
        if self.is_ready() {
            self.speaker.stop();
        }
    }

    fn is_speaking(&self) -> bool {
        self.is_ready() && self.speaker.is_speaking()
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.speaker.shutdown();
            tracing::info!("speech output released");
        }
    }
}
