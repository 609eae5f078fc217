mod config;
mod input;

use config::SpeakerConfig;
use herald_audio::component::EVENT_START;
use herald_audio::TtsComponent;
use herald_core::telemetry::init_tracing;
use herald_core::{Event, Herald};
use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging / tracing
    init_tracing("info,herald_core=info,herald_audio=info,speaker=info")?;

    info!(target = "speaker", "Starting speaker demo: stdin → bus → TTS");

    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = SpeakerConfig::load();

    let herald = Arc::new(Herald::new());
    let tts = Arc::new(TtsComponent::from_config(&cfg.tts)?);
    herald.register(Arc::clone(&tts))?;
    info!(
        target = "speaker",
        engine = tts.worker().synthesizer_name(),
        "Speech component registered"
    );

    let bus = Arc::clone(&herald.event_bus);
    if cfg.autostart {
        bus.publish(Event::new(EVENT_START, cfg.source.clone()))?;
    }

    // Blocking stdin reader on its own thread; the bus dispatches synchronously
    // so control events (including Stop's join) run there too.
    let (eof_tx, eof_rx) = oneshot::channel::<()>();
    let source = cfg.source.clone();
    thread::Builder::new()
        .name("speaker-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(target = "speaker", error = %e, "Failed to read stdin");
                        break;
                    }
                };
                let Some(event) = input::parse_line(&line, &source) else {
                    continue;
                };
                if let Err(e) = bus.publish(event) {
                    error!(target = "speaker", error = %e, "Publish failed");
                }
            }
            let _ = eof_tx.send(());
        })?;

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!(target = "speaker", "Shutting down...");
        }
        _ = eof_rx => {
            info!(target = "speaker", "Input closed; letting pending speech finish");
            let deadline = tokio::time::Instant::now() + Duration::from_millis(cfg.linger_ms);
            while tts.worker().is_running()
                && tts.worker().has_pending()
                && tokio::time::Instant::now() < deadline
            {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        }
    }

    // Joins the speech thread after any utterance in flight
    tokio::task::spawn_blocking(move || herald.shutdown()).await??;
    Ok(())
}
