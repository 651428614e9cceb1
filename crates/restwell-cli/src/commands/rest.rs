use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use restwell_core::coaching::{CoachingSink, NullSink, SpeechSink};
use restwell_core::{
    AdaptiveRestCalculator, Config, RestRequest, RestSuggestionGenerator, RestTimerEngine,
    RestTimerState, SetData,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::speaker::ConsoleSpeaker;

/// Signals from the set that just finished.
#[derive(Args, Debug, Clone)]
pub struct SetArgs {
    /// Intensity of the finished set, 0.0 to 1.0
    #[arg(long)]
    intensity: f64,
    /// Heart rate in bpm
    #[arg(long)]
    heart_rate: Option<u32>,
    /// Rate of perceived exertion, 1 to 10
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
    rpe: Option<u8>,
    /// Form quality of the finished set, 0.0 to 1.0
    #[arg(long)]
    form_quality: Option<f64>,
    /// Weight lifted in kg
    #[arg(long)]
    weight: Option<f64>,
    /// Reps completed
    #[arg(long)]
    reps: Option<u32>,
}

impl SetArgs {
    fn request(&self, exercise_id: &str) -> RestRequest {
        let mut request = RestRequest::new(exercise_id, self.intensity);
        request.heart_rate = self.heart_rate;
        request.perceived_exertion = self.rpe;
        request.previous_set = self.form_quality.map(|form_quality| SetData {
            weight: self.weight.unwrap_or(0.0),
            reps: self.reps.unwrap_or(0),
            form_quality,
            rpe: self.rpe,
            heart_rate: self.heart_rate,
        });
        request
    }
}

#[derive(Subcommand)]
pub enum RestAction {
    /// Print the adaptive rest duration as JSON
    Compute {
        #[command(flatten)]
        set: SetArgs,
    },
    /// Print the full rest suggestion as JSON
    Suggest {
        /// Exercise identifier (e.g. "squat", "bench_press")
        #[arg(long)]
        exercise: String,
        #[command(flatten)]
        set: SetArgs,
    },
    /// Run a live countdown, streaming state snapshots as JSON lines.
    ///
    /// Reads commands from stdin: pause, resume, extend <secs>, skip, stop,
    /// say <text>, hush.
    Run {
        #[arg(long)]
        exercise: String,
        #[command(flatten)]
        set: SetArgs,
        /// Override the tick length in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,
        /// Do not speak cues
        #[arg(long)]
        silent: bool,
    },
}

pub fn run(action: RestAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    config.validate()?;

    match action {
        RestAction::Compute { set } => {
            let calculator = AdaptiveRestCalculator::from_config(&config.rest);
            let seconds = calculator.compute_for(&set.request(""));
            println!("{}", serde_json::json!({ "rest_seconds": seconds }));
        }
        RestAction::Suggest { exercise, set } => {
            let request = set.request(&exercise);
            let seconds = AdaptiveRestCalculator::from_config(&config.rest).compute_for(&request);
            let suggestion =
                RestSuggestionGenerator::new().generate(&exercise, seconds, request.intensity);
            println!("{}", serde_json::to_string_pretty(&suggestion)?);
        }
        RestAction::Run {
            exercise,
            set,
            tick_ms,
            silent,
        } => {
            let mut config = config;
            if let Some(ms) = tick_ms {
                config.rest.tick_millis = ms.max(1);
            }
            if silent {
                config.coaching.enabled = false;
            }

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let result = runtime.block_on(live(config, set.request(&exercise)));
            // Stdin reads park a blocking thread; don't wait on it.
            runtime.shutdown_timeout(Duration::from_millis(100));
            result?;
        }
    }
    Ok(())
}

async fn live(config: Config, request: RestRequest) -> Result<(), Box<dyn std::error::Error>> {
    let sink: Arc<dyn CoachingSink> = if config.coaching.enabled {
        Arc::new(SpeechSink::new(ConsoleSpeaker, config.coaching.language))
    } else {
        Arc::new(NullSink)
    };
    let engine = RestTimerEngine::with_config(sink, &config.rest)?;
    if !engine.initialize_audio().await {
        eprintln!("voice coaching unavailable, continuing silently");
    }
    engine.configure_voice(config.coaching.voice());

    let mut states = engine.subscribe_state();
    let suggestion = engine.start_adaptive_rest(request)?;
    println!("{}", serde_json::to_string(&suggestion)?);
    engine.play_coaching_message(suggestion.motivational_message.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                println!("{}", serde_json::to_string(&state)?);
                if matches!(state, RestTimerState::Completed { .. } | RestTimerState::Idle) {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => handle_command(&engine, line.trim()),
                    None => stdin_open = false,
                }
            }
        }
    }

    engine.release();
    // Give the sink a moment to deliver the final cue.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}

fn handle_command(engine: &RestTimerEngine, line: &str) {
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    let applied = match command {
        "" => return,
        "pause" | "p" => engine.pause_timer().is_some(),
        "resume" | "r" => engine.resume_timer().is_some(),
        "skip" | "s" => engine.skip_rest().is_some(),
        "stop" | "q" => engine.stop_timer().is_some(),
        "extend" | "e" => match arg.parse::<u32>() {
            Ok(seconds) => engine.extend_rest(seconds).is_some(),
            Err(_) => {
                eprintln!("usage: extend <seconds>");
                return;
            }
        },
        "say" => {
            engine.play_coaching_message(arg);
            true
        }
        "hush" | "h" => {
            engine.stop_audio();
            true
        }
        other => {
            eprintln!("unknown command: {other}");
            return;
        }
    };

    if !applied {
        eprintln!("'{command}' ignored in state {:?}", engine.state());
    }
}
