//! Fire-and-forget delivery to a [`CoachingSink`].
//!
//! Sends never block and never fail from the caller's point of view. A
//! background task drains the queue in order and runs each sink call on the
//! blocking pool, so a sink that speaks synchronously never holds up the
//! executor driving the countdown. Sink errors and panics are logged and
//! dropped.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

use super::cue::Cue;
use super::sink::{CoachingSink, VoiceSettings};
use crate::error::SinkError;

#[derive(Debug)]
enum Dispatch {
    Initialize(oneshot::Sender<bool>),
    Cue(Cue),
    Message(String),
    Configure(VoiceSettings),
    Release,
}

impl Dispatch {
    fn label(&self) -> &'static str {
        match self {
            Dispatch::Initialize(_) => "initialize",
            Dispatch::Cue(cue) => cue.token(),
            Dispatch::Message(_) => "message",
            Dispatch::Configure(_) => "configure",
            Dispatch::Release => "release",
        }
    }

    /// Runs on a blocking thread.
    fn apply(self, sink: &dyn CoachingSink) -> Result<(), SinkError> {
        match self {
            Dispatch::Initialize(reply) => {
                let result = sink.initialize();
                // The caller may have stopped waiting.
                let _ = reply.send(result.is_ok());
                result
            }
            Dispatch::Cue(cue) => sink.emit_cue(cue),
            Dispatch::Message(text) => sink.emit_message(&text),
            Dispatch::Configure(settings) => {
                sink.configure(&settings);
                Ok(())
            }
            Dispatch::Release => {
                sink.release();
                Ok(())
            }
        }
    }
}

/// Handle for queueing coaching output. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CueDispatcher {
    tx: mpsc::UnboundedSender<Dispatch>,
}

impl CueDispatcher {
    /// Start the delivery task for `sink` on `handle`.
    pub fn spawn(sink: Arc<dyn CoachingSink>, handle: &Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(deliver(sink, rx));
        Self { tx }
    }

    /// Queue sink initialization. The receiver resolves to whether the sink
    /// reported itself ready, or to an error if the queue is already closed.
    pub fn initialize(&self) -> oneshot::Receiver<bool> {
        let (reply, ready) = oneshot::channel();
        self.send(Dispatch::Initialize(reply));
        ready
    }

    pub fn cue(&self, cue: Cue) {
        self.send(Dispatch::Cue(cue));
    }

    pub fn message(&self, text: impl Into<String>) {
        self.send(Dispatch::Message(text.into()));
    }

    pub fn configure(&self, settings: VoiceSettings) {
        self.send(Dispatch::Configure(settings));
    }

    /// Queue the sink release. Everything queued before it is still
    /// delivered; everything after it is dropped.
    pub fn release(&self) {
        self.send(Dispatch::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, dispatch: Dispatch) {
        if let Err(err) = self.tx.send(dispatch) {
            tracing::debug!(dropped = err.0.label(), "coaching sink already released");
        }
    }
}

async fn deliver(sink: Arc<dyn CoachingSink>, mut rx: mpsc::UnboundedReceiver<Dispatch>) {
    while let Some(dispatch) = rx.recv().await {
        let what = dispatch.label();
        let last = matches!(dispatch, Dispatch::Release);
        let sink = Arc::clone(&sink);

        let outcome = tokio::task::spawn_blocking(move || dispatch.apply(sink.as_ref()))
            .await
            .unwrap_or_else(|err| {
                if err.is_panic() {
                    Err(SinkError::Playback("coaching sink panicked".into()))
                } else {
                    Err(SinkError::Unavailable("delivery cancelled".into()))
                }
            });
        report(what, outcome);

        if last {
            break;
        }
    }
    rx.close();
}

fn report(what: &str, result: Result<(), SinkError>) {
    match result {
        Ok(()) => {}
        Err(err @ SinkError::Unavailable(_)) => {
            tracing::debug!(what, error = %err, "coaching sink not ready");
        }
        Err(err) => {
            tracing::warn!(what, error = %err, "coaching sink delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coaching::RecordingSink;
    use crate::coaching::SinkRecord;
    use std::time::Duration;

    struct PanickingSink;

    impl CoachingSink for PanickingSink {
        fn initialize(&self) -> Result<(), SinkError> {
            panic!("no audio device");
        }

        fn emit_cue(&self, _cue: Cue) -> Result<(), SinkError> {
            panic!("audio engine exploded");
        }

        fn emit_message(&self, _text: &str) -> Result<(), SinkError> {
            Ok(())
        }
    }

    /// Poll until `done` holds; deliveries run on blocking threads.
    async fn wait_until(done: impl Fn() -> bool) {
        for _ in 0..500 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn delivers_in_order() {
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = CueDispatcher::spawn(sink.clone(), &Handle::current());
        dispatcher.cue(Cue::RestStarted);
        dispatcher.message("deep breaths");
        dispatcher.configure(VoiceSettings::new(1.2, 1.0));
        dispatcher.cue(Cue::RestComplete);
        wait_until(|| sink.records().len() == 4).await;
        assert_eq!(
            sink.records(),
            vec![
                SinkRecord::Cue(Cue::RestStarted),
                SinkRecord::Message("deep breaths".into()),
                SinkRecord::Configured(VoiceSettings::new(1.2, 1.0)),
                SinkRecord::Cue(Cue::RestComplete),
            ]
        );
    }

    #[tokio::test]
    async fn failures_do_not_stop_delivery() {
        let sink = Arc::new(RecordingSink::failing());
        let dispatcher = CueDispatcher::spawn(sink.clone(), &Handle::current());
        dispatcher.cue(Cue::Countdown2);
        dispatcher.cue(Cue::Countdown1);
        wait_until(|| sink.cues().len() == 2).await;
        assert_eq!(sink.cues(), vec![Cue::Countdown2, Cue::Countdown1]);
    }

    #[tokio::test]
    async fn panics_are_contained() {
        let dispatcher = CueDispatcher::spawn(Arc::new(PanickingSink), &Handle::current());
        dispatcher.cue(Cue::RestStarted);
        dispatcher.cue(Cue::RestComplete);
        assert!(!dispatcher.initialize().await.unwrap_or(false));
        assert!(!dispatcher.is_closed());
    }

    #[tokio::test]
    async fn initialize_reports_readiness_in_queue_order() {
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = CueDispatcher::spawn(sink.clone(), &Handle::current());
        dispatcher.cue(Cue::RestStarted);
        assert!(dispatcher.initialize().await.unwrap());
        assert_eq!(
            sink.records(),
            vec![SinkRecord::Cue(Cue::RestStarted), SinkRecord::Initialized]
        );

        let failing = Arc::new(RecordingSink::failing());
        let dispatcher = CueDispatcher::spawn(failing, &Handle::current());
        assert!(!dispatcher.initialize().await.unwrap());
    }

    #[tokio::test]
    async fn release_closes_the_queue() {
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = CueDispatcher::spawn(sink.clone(), &Handle::current());
        dispatcher.cue(Cue::RestSkipped);
        dispatcher.release();
        wait_until(|| dispatcher.is_closed()).await;
        dispatcher.cue(Cue::RestStarted);
        assert!(dispatcher.initialize().await.is_err());
        assert!(sink.is_released());
        assert_eq!(sink.cues(), vec![Cue::RestSkipped]);
    }
}
