//! # Restwell Core Library
//!
//! Adaptive rest between sets of a workout: how long to rest, a live
//! countdown that can be paused, resumed, extended or skipped, coaching
//! cues at fixed milestones, and a recommendation for the next set.
//! The `restwell` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Rest model**: pure functions computing the rest duration and the
//!   suggestion bundle shown while resting
//! - **Timer Engine**: a tokio-driven state machine with one countdown task
//!   at a time, publishing snapshots through watch channels
//! - **Coaching**: a sink trait for audio/voice output, fed fire-and-forget
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`RestTimerEngine`]: Countdown state machine
//! - [`AdaptiveRestCalculator`]: Rest duration model
//! - [`RestSuggestionGenerator`]: Next-set recommendation and form tips
//! - [`CoachingSink`]: Trait for cue and message output
//! - [`Config`]: Application configuration management

pub mod coaching;
pub mod error;
pub mod events;
pub mod rest;
pub mod storage;
pub mod timer;

pub use coaching::{CoachingSink, Cue, RecordingSink, SpeechSink, TracingSink, VoiceSettings};
pub use error::{ConfigError, CoreError, SinkError, ValidationError};
pub use events::Event;
pub use rest::{
    AdaptiveRestCalculator, NextSetRecommendation, RestRequest, RestSuggestion,
    RestSuggestionGenerator, SetData,
};
pub use storage::{Config, RestConfig};
pub use timer::{RestTimerEngine, RestTimerState};
