//! Coaching output: cue tokens, the sink seam, and spoken phrases.

mod cue;
mod dispatch;
mod sink;
mod speech;

pub use cue::Cue;
pub use dispatch::CueDispatcher;
pub use sink::{
    CoachingSink, NullSink, RecordingSink, SinkRecord, TracingSink, VoiceLanguage, VoiceSettings,
    MAX_VOICE_FACTOR, MIN_VOICE_FACTOR,
};
pub use speech::{PhraseBook, Speaker, SpeechSink};
