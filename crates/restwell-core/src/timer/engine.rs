//! Rest timer engine.
//!
//! Owns at most one countdown task at a time and publishes every state
//! change through watch channels, so new observers always see the latest
//! snapshot.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running | Paused -> Completed   (countdown reaches 0, or skip)
//! any -> Idle                      (stop)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let engine = RestTimerEngine::new(Arc::new(TracingSink))?;
//! let mut states = engine.subscribe_state();
//! engine.start_adaptive_rest(RestRequest::new("squat", 0.85).heart_rate(150))?;
//! while states.changed().await.is_ok() {
//!     println!("{:?}", *states.borrow());
//! }
//! ```
//!
//! All commands lock one mutex for their whole transition. Each run carries
//! a generation number; a cancelling command bumps it and aborts the task,
//! and a tick only publishes while holding the lock with a current
//! generation. Once a command returns, the cancelled run can publish nothing.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::countdown::Countdown;
use super::state::RestTimerState;
use crate::coaching::{CoachingSink, Cue, CueDispatcher, VoiceSettings};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::rest::{
    AdaptiveRestCalculator, NextSetRecommendation, RestRequest, RestSuggestion,
    RestSuggestionGenerator,
};
use crate::storage::RestConfig;

const EVENT_CAPACITY: usize = 256;

/// Adaptive rest timer. Cheap to clone; clones drive the same timer.
#[derive(Clone)]
pub struct RestTimerEngine {
    shared: Arc<Shared>,
}

struct Shared {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<RestTimerState>,
    suggestion_tx: watch::Sender<Option<RestSuggestion>>,
    events_tx: broadcast::Sender<Event>,
    sink: Arc<dyn CoachingSink>,
    dispatcher: CueDispatcher,
    calculator: AdaptiveRestCalculator,
    generator: RestSuggestionGenerator,
    tick: Duration,
    runtime: Handle,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    task: Option<JoinHandle<()>>,
    released: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tick {
    Continue,
    Finished,
}

impl RestTimerEngine {
    /// Engine with default rest bounds and a one-second tick, running on
    /// the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoRuntime`] when called outside a runtime.
    pub fn new(sink: Arc<dyn CoachingSink>) -> Result<Self> {
        Self::with_config(sink, &RestConfig::default())
    }

    /// # Errors
    ///
    /// Returns [`CoreError::NoRuntime`] when called outside a runtime.
    pub fn with_config(sink: Arc<dyn CoachingSink>, config: &RestConfig) -> Result<Self> {
        let runtime = Handle::try_current()?;
        Ok(Self::with_runtime(sink, config, runtime))
    }

    /// Engine whose countdown and sink delivery run on `runtime`.
    pub fn with_runtime(sink: Arc<dyn CoachingSink>, config: &RestConfig, runtime: Handle) -> Self {
        let (state_tx, _) = watch::channel(RestTimerState::Idle);
        let (suggestion_tx, _) = watch::channel(None);
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let dispatcher = CueDispatcher::spawn(Arc::clone(&sink), &runtime);
        let tick = if config.tick_millis == 0 {
            Duration::from_secs(1)
        } else {
            config.tick()
        };

        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                state_tx,
                suggestion_tx,
                events_tx,
                sink,
                dispatcher,
                calculator: AdaptiveRestCalculator::from_config(config),
                generator: RestSuggestionGenerator::new(),
                tick,
                runtime,
            }),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> RestTimerState {
        self.shared.state()
    }

    pub fn suggestion(&self) -> Option<RestSuggestion> {
        self.shared.suggestion_tx.borrow().clone()
    }

    pub fn tick_duration(&self) -> Duration {
        self.shared.tick
    }

    pub fn is_released(&self) -> bool {
        self.shared.lock().released
    }

    /// State snapshots; the receiver starts with the latest one.
    pub fn subscribe_state(&self) -> watch::Receiver<RestTimerState> {
        self.shared.state_tx.subscribe()
    }

    /// Current suggestion (or none); the receiver starts with the latest one.
    pub fn subscribe_suggestion(&self) -> watch::Receiver<Option<RestSuggestion>> {
        self.shared.suggestion_tx.subscribe()
    }

    /// Lifecycle and cue events from now on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.shared.events_tx.subscribe()
    }

    /// Whether the coaching sink is playing something right now.
    pub fn is_speaking(&self) -> bool {
        !self.is_released() && self.shared.sink.is_speaking()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Compute a rest for the finished set and start counting down.
    ///
    /// Any countdown in flight is cancelled first. When this returns the
    /// state is already `Running { total, total }` and `rest_started` has
    /// been queued.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EngineReleased`] after [`RestTimerEngine::release`].
    pub fn start_adaptive_rest(&self, request: RestRequest) -> Result<RestSuggestion> {
        let shared = &self.shared;
        let rest_seconds = shared.calculator.compute_for(&request);
        let suggestion =
            shared
                .generator
                .generate(&request.exercise_id, rest_seconds, request.intensity);

        let mut inner = shared.lock();
        if inner.released {
            return Err(CoreError::EngineReleased);
        }
        shared.cancel(&mut inner);
        shared.suggestion_tx.send_replace(Some(suggestion.clone()));
        shared.emit(Event::RestStarted {
            exercise_id: request.exercise_id.clone(),
            duration_secs: rest_seconds,
            at: Utc::now(),
        });
        shared.begin(&mut inner, Countdown::fresh(rest_seconds));

        tracing::info!(
            exercise_id = %request.exercise_id,
            rest_seconds,
            "started adaptive rest"
        );
        Ok(suggestion)
    }

    /// Suspend a running countdown, keeping its remaining time.
    pub fn pause_timer(&self) -> Option<Event> {
        let shared = &self.shared;
        let mut inner = shared.lock();
        if inner.released {
            return None;
        }
        let RestTimerState::Running { remaining, total } = shared.state() else {
            return None;
        };

        shared.cancel(&mut inner);
        shared
            .state_tx
            .send_replace(RestTimerState::Paused { remaining, total });
        tracing::info!(remaining, total, "rest paused");
        Some(shared.emit(Event::TimerPaused {
            remaining_secs: remaining,
            total_secs: total,
            at: Utc::now(),
        }))
    }

    /// Continue a paused countdown from where it stopped.
    pub fn resume_timer(&self) -> Option<Event> {
        let shared = &self.shared;
        let mut inner = shared.lock();
        if inner.released {
            return None;
        }
        let RestTimerState::Paused { remaining, total } = shared.state() else {
            return None;
        };

        shared.cancel(&mut inner);
        let event = shared.emit(Event::TimerResumed {
            remaining_secs: remaining,
            total_secs: total,
            at: Utc::now(),
        });
        shared.begin(&mut inner, Countdown::resumed(remaining, total));
        tracing::info!(remaining, total, "rest resumed");
        Some(event)
    }

    /// Add time to a running countdown.
    ///
    /// Restarts the countdown at `remaining + additional_seconds`, which also
    /// becomes the new total. The new run replays its cue schedule from the
    /// start, so `rest_started` follows `rest_extended`.
    pub fn extend_rest(&self, additional_seconds: u32) -> Option<Event> {
        let shared = &self.shared;
        let mut inner = shared.lock();
        if inner.released {
            return None;
        }
        let RestTimerState::Running { remaining, .. } = shared.state() else {
            return None;
        };

        let extended = remaining.saturating_add(additional_seconds);
        shared.cancel(&mut inner);
        shared.cue(Cue::RestExtended, remaining);
        let event = shared.emit(Event::RestExtended {
            added_secs: additional_seconds,
            remaining_secs: extended,
            at: Utc::now(),
        });
        shared.begin(&mut inner, Countdown::fresh(extended));
        tracing::info!(additional_seconds, extended, "rest extended");
        Some(event)
    }

    /// End the rest now and hand out the next-set recommendation.
    pub fn skip_rest(&self) -> Option<Event> {
        let shared = &self.shared;
        let mut inner = shared.lock();
        if inner.released {
            return None;
        }
        let remaining = shared.state().remaining()?;

        shared.cancel(&mut inner);
        shared.cue(Cue::RestSkipped, remaining);
        let next_set_recommendation = shared.recommendation();
        shared.state_tx.send_replace(RestTimerState::Completed {
            next_set_recommendation,
        });
        tracing::info!(remaining, "rest skipped");
        Some(shared.emit(Event::RestSkipped {
            remaining_secs: remaining,
            at: Utc::now(),
        }))
    }

    /// Cancel everything and go back to `Idle`, forgetting the suggestion.
    ///
    /// Returns `None` when already idle with nothing to clear.
    pub fn stop_timer(&self) -> Option<Event> {
        let shared = &self.shared;
        let mut inner = shared.lock();
        if inner.released {
            return None;
        }
        let idle = shared.state() == RestTimerState::Idle;
        if idle && inner.task.is_none() && shared.suggestion_tx.borrow().is_none() {
            return None;
        }

        shared.cancel(&mut inner);
        shared.state_tx.send_if_modified(|state| {
            let changed = *state != RestTimerState::Idle;
            *state = RestTimerState::Idle;
            changed
        });
        shared.suggestion_tx.send_if_modified(|suggestion| suggestion.take().is_some());
        tracing::info!("rest stopped");
        Some(shared.emit(Event::TimerStopped { at: Utc::now() }))
    }

    /// Forward a free-text coaching message to the sink.
    pub fn play_coaching_message(&self, text: impl Into<String>) {
        let shared = &self.shared;
        let inner = shared.lock();
        if inner.released {
            return;
        }
        let text = text.into();
        shared.dispatcher.message(text.clone());
        shared.emit(Event::CoachingMessage {
            text,
            at: Utc::now(),
        });
    }

    /// Bring up the coaching sink's audio backend and report whether it is
    /// ready. Queued behind any output already sent to the sink.
    pub async fn initialize_audio(&self) -> bool {
        let reply = {
            let inner = self.shared.lock();
            if inner.released {
                return false;
            }
            self.shared.dispatcher.initialize()
        };
        let ready = reply.await.unwrap_or(false);
        if ready {
            tracing::info!("coaching audio ready");
        } else {
            tracing::warn!("coaching audio unavailable");
        }
        ready
    }

    /// Cut off the cue or message currently playing. Queued output is not
    /// affected and the countdown keeps running.
    pub fn stop_audio(&self) {
        let inner = self.shared.lock();
        if !inner.released {
            self.shared.sink.stop();
        }
    }

    /// Forward voice settings to the sink.
    pub fn configure_voice(&self, settings: VoiceSettings) {
        let inner = self.shared.lock();
        if !inner.released {
            self.shared.dispatcher.configure(settings);
        }
    }

    /// Terminal: cancel any countdown, return to `Idle` and release the
    /// sink. Every later command is ignored.
    pub fn release(&self) {
        let shared = &self.shared;
        let mut inner = shared.lock();
        if inner.released {
            return;
        }
        shared.cancel(&mut inner);
        inner.released = true;
        shared.state_tx.send_if_modified(|state| {
            let changed = *state != RestTimerState::Idle;
            *state = RestTimerState::Idle;
            changed
        });
        shared.suggestion_tx.send_if_modified(|suggestion| suggestion.take().is_some());
        shared.dispatcher.release();
        shared.emit(Event::EngineReleased { at: Utc::now() });
        tracing::info!("rest timer released");
    }
}

impl std::fmt::Debug for RestTimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTimerEngine")
            .field("state", &self.state())
            .field("tick", &self.shared.tick)
            .finish()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn state(&self) -> RestTimerState {
        self.state_tx.borrow().clone()
    }

    fn recommendation(&self) -> Option<NextSetRecommendation> {
        self.suggestion_tx
            .borrow()
            .as_ref()
            .map(|s| s.next_set_recommendation.clone())
    }

    fn emit(&self, event: Event) -> Event {
        // No subscribers is fine.
        let _ = self.events_tx.send(event.clone());
        event
    }

    fn cue(&self, cue: Cue, remaining: u32) {
        tracing::debug!(cue = cue.token(), remaining, "cue");
        self.dispatcher.cue(cue);
        self.emit(Event::CueEmitted {
            cue,
            remaining_secs: remaining,
            at: Utc::now(),
        });
    }

    /// Invalidate the current run. Caller holds the lock.
    fn cancel(&self, inner: &mut Inner) {
        inner.generation = inner.generation.wrapping_add(1);
        if let Some(task) = inner.task.take() {
            task.abort();
        }
    }

    /// Publish the first tick of `run` and spawn the rest. Caller holds the
    /// lock and has cancelled the previous run.
    fn begin(self: &Arc<Self>, inner: &mut Inner, run: Countdown) {
        let started = Instant::now();
        let generation = inner.generation;
        if self.tick(run.start, run) == Tick::Finished {
            return;
        }
        let weak = Arc::downgrade(self);
        inner.task = Some(
            self.runtime
                .spawn(run_countdown(weak, generation, run, started, self.tick)),
        );
    }

    /// Cue then publish for one remaining value. Caller holds the lock.
    fn tick(&self, remaining: u32, run: Countdown) -> Tick {
        if let Some(cue) = run.cue_at(remaining) {
            self.cue(cue, remaining);
        }

        if remaining == 0 {
            let next_set_recommendation = self.recommendation();
            self.state_tx.send_replace(RestTimerState::Completed {
                next_set_recommendation: next_set_recommendation.clone(),
            });
            self.emit(Event::RestCompleted {
                next_set_recommendation,
                at: Utc::now(),
            });
            tracing::info!(total = run.total, "rest complete");
            return Tick::Finished;
        }

        self.state_tx.send_replace(RestTimerState::Running {
            remaining,
            total: run.total,
        });
        tracing::trace!(remaining, total = run.total, "tick");
        Tick::Continue
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = inner.task.take() {
            task.abort();
        }
        if !inner.released {
            self.dispatcher.release();
        }
    }
}

/// Ticks are scheduled from `started`, the instant the first tick was
/// published, not from when this task is first polled.
async fn run_countdown(
    shared: Weak<Shared>,
    generation: u64,
    run: Countdown,
    started: Instant,
    tick: Duration,
) {
    let mut ticker = tokio::time::interval_at(started + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    let mut remaining = run.start;
    while remaining > 0 {
        ticker.tick().await;
        remaining -= 1;
        if !step(&shared, generation, remaining, run) {
            return;
        }
    }
}

/// Runs one tick under the lock. Returns false once the run is over or has
/// been superseded.
fn step(shared: &Weak<Shared>, generation: u64, remaining: u32, run: Countdown) -> bool {
    let Some(shared) = shared.upgrade() else {
        return false;
    };
    let mut inner = shared.lock();
    if inner.generation != generation || inner.released {
        return false;
    }
    match shared.tick(remaining, run) {
        Tick::Continue => true,
        Tick::Finished => {
            inner.task = None;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coaching::RecordingSink;

    fn engine() -> (RestTimerEngine, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let engine = RestTimerEngine::new(sink.clone()).unwrap();
        (engine, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn start_publishes_first_tick_synchronously() {
        let (engine, _sink) = engine();
        assert_eq!(engine.state(), RestTimerState::Idle);

        let suggestion = engine
            .start_adaptive_rest(RestRequest::new("squat", 0.5))
            .unwrap();
        assert_eq!(suggestion.rest_time, 90);
        assert_eq!(
            engine.state(),
            RestTimerState::Running {
                remaining: 90,
                total: 90
            }
        );
        assert_eq!(engine.suggestion(), Some(suggestion));
    }

    #[tokio::test(start_paused = true)]
    async fn start_pause_resume() {
        let (engine, _sink) = engine();
        engine
            .start_adaptive_rest(RestRequest::new("bench", 0.5))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50_500)).await;
        assert_eq!(engine.state().remaining(), Some(40));

        assert!(engine.pause_timer().is_some());
        assert_eq!(
            engine.state(),
            RestTimerState::Paused {
                remaining: 40,
                total: 90
            }
        );
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(engine.state().remaining(), Some(40));

        assert!(engine.resume_timer().is_some());
        assert_eq!(
            engine.state(),
            RestTimerState::Running {
                remaining: 40,
                total: 90
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_transitions_are_ignored() {
        let (engine, _sink) = engine();
        assert!(engine.pause_timer().is_none());
        assert!(engine.resume_timer().is_none());
        assert!(engine.extend_rest(30).is_none());
        assert!(engine.skip_rest().is_none());
        assert!(engine.stop_timer().is_none());
        assert_eq!(engine.state(), RestTimerState::Idle);

        engine
            .start_adaptive_rest(RestRequest::new("row", 0.5))
            .unwrap();
        assert!(engine.resume_timer().is_none());
        engine.pause_timer();
        assert!(engine.pause_timer().is_none());
        assert!(engine.extend_rest(10).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn skip_completes_with_recommendation() {
        let (engine, _sink) = engine();
        engine
            .start_adaptive_rest(RestRequest::new("deadlift", 0.9))
            .unwrap();
        assert!(engine.skip_rest().is_some());
        match engine.state() {
            RestTimerState::Completed {
                next_set_recommendation: Some(rec),
            } => assert_eq!(rec.suggestion, "Maintain current weight, focus on form"),
            other => panic!("expected Completed, got {other:?}"),
        }
        assert!(engine.skip_rest().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_clears_suggestion_and_is_idempotent() {
        let (engine, _sink) = engine();
        engine
            .start_adaptive_rest(RestRequest::new("squat", 0.7))
            .unwrap();
        assert!(engine.stop_timer().is_some());
        assert_eq!(engine.state(), RestTimerState::Idle);
        assert_eq!(engine.suggestion(), None);
        assert!(engine.stop_timer().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn release_makes_engine_inert() {
        let (engine, sink) = engine();
        engine
            .start_adaptive_rest(RestRequest::new("squat", 0.7))
            .unwrap();
        engine.release();
        assert!(engine.is_released());
        assert_eq!(engine.state(), RestTimerState::Idle);
        assert!(matches!(
            engine.start_adaptive_rest(RestRequest::new("squat", 0.7)),
            Err(CoreError::EngineReleased)
        ));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(engine.state(), RestTimerState::Idle);
        assert!(sink.is_released());
    }

    #[tokio::test(start_paused = true)]
    async fn audio_lifecycle_reaches_the_sink() {
        use crate::coaching::SinkRecord;

        let (engine, sink) = engine();
        assert!(engine.initialize_audio().await);
        assert!(!engine.is_speaking());
        engine.stop_audio();
        assert_eq!(sink.records(), vec![SinkRecord::Initialized, SinkRecord::Stopped]);

        engine.release();
        assert!(!engine.initialize_audio().await);
        engine.stop_audio();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(
            sink.records(),
            vec![
                SinkRecord::Initialized,
                SinkRecord::Stopped,
                SinkRecord::Released
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_audio_initialization_is_reported() {
        let engine = RestTimerEngine::new(Arc::new(RecordingSink::failing())).unwrap();
        assert!(!engine.initialize_audio().await);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_last_handle_releases_the_sink() {
        let (engine, sink) = engine();
        let other = engine.clone();
        engine
            .start_adaptive_rest(RestRequest::new("squat", 0.5))
            .unwrap();
        drop(engine);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!sink.is_released());

        drop(other);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(sink.is_released());
        assert_eq!(sink.cues(), vec![Cue::RestStarted]);
    }

    #[test]
    fn new_outside_runtime_fails() {
        let result = RestTimerEngine::new(Arc::new(RecordingSink::new()));
        assert!(matches!(result, Err(CoreError::NoRuntime(_))));
    }
}
