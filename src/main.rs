use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use voice_router::clock::{Clock, SystemClock};
use voice_router::providers::{FallbackRateProvider, WeatherApiClient};
use voice_router::router::normalize;
use voice_router::voice::speaker_from_config;
use voice_router::{
    Config, DomainHandler, FxQueryHandler, IntentClassifier, Recognizer, Router,
    WeatherQueryHandler,
};

/// Voice Router - conversational command router for speech transcripts
#[derive(Parser)]
#[command(name = "voice-router", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/voice-router/config.toml)
    #[arg(short, long, env = "VOICE_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Read finalized transcripts from stdin, one per line (`text[\tconfidence]`)
    Listen,
    /// Route one utterance through a fresh router
    Route {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Classify an utterance and print its slots, without network access
    Parse {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Answer an exchange-rate query directly
    Fx {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Answer a weather query directly
    Weather {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
}

/// Stands in for the live recognizer when transcripts come from stdin
struct LineRecognizer;

impl Recognizer for LineRecognizer {
    fn reset(&self) -> voice_router::Result<()> {
        tracing::debug!("recognizer reset");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voice_router=info",
        1 => "info,voice_router=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Listen) {
        Command::Listen => listen(&config).await,
        Command::Route { text } => {
            let router = build_router(&config)?;
            let outcome = router.on_transcript_final(&text.join(" "), None).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Command::Parse { text } => {
            let classifier = IntentClassifier::default();
            let text = normalize(&text.join(" "));
            let query = classifier.slice_from_keyword(&text);
            let intent = classifier.parse(query, SystemClock.today());
            println!("{}", serde_json::to_string_pretty(&intent)?);
            Ok(())
        }
        Command::Fx { text } => {
            let handler = fx_handler(&config)?;
            handler.handle(&normalize(&text.join(" "))).await?;
            Ok(())
        }
        Command::Weather { text } => {
            let handler = weather_handler(&config, Arc::new(SystemClock))?;
            handler.handle(&normalize(&text.join(" "))).await?;
            Ok(())
        }
    }
}

fn fx_handler(config: &Config) -> anyhow::Result<FxQueryHandler> {
    let rates = FallbackRateProvider::from_config(&config.fx)?;
    Ok(FxQueryHandler::new(
        Arc::new(rates),
        speaker_from_config(&config.speech),
    ))
}

fn weather_handler(config: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<WeatherQueryHandler> {
    if config.weather.api_key.is_none() {
        tracing::warn!("WEATHERAPI_KEY is not set, weather queries will fail");
    }

    let provider = WeatherApiClient::from_config(&config.weather)?;
    Ok(WeatherQueryHandler::new(
        Arc::new(provider),
        speaker_from_config(&config.speech),
        clock,
        &config.weather,
    ))
}

fn build_router(config: &Config) -> anyhow::Result<Router> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    Ok(Router::builder(
        Arc::new(weather_handler(config, clock.clone())?),
        Arc::new(fx_handler(config)?),
    )
    .config(config.router.clone())
    .clock(clock)
    .recognizer(Arc::new(LineRecognizer))
    .build())
}

#[allow(clippy::future_not_send)]
async fn listen(config: &Config) -> anyhow::Result<()> {
    let router = build_router(config)?;

    tracing::info!(
        wake_phrases = ?config.router.wake_phrases,
        sleep_phrases = ?config.router.sleep_phrases,
        "listening for transcripts on stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("input closed");
                    break;
                };

                let (text, confidence) = split_confidence(&line);
                if text.trim().is_empty() {
                    continue;
                }

                let outcome = router.on_transcript_final(text, confidence).await;
                tracing::debug!(?outcome, "routed");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// `text\tconfidence`, confidence optional
fn split_confidence(line: &str) -> (&str, Option<f32>) {
    line.rsplit_once('\t')
        .and_then(|(text, conf)| conf.trim().parse().ok().map(|c| (text, Some(c))))
        .unwrap_or((line, None))
}
