//! Blocking text-to-speech backends.
//!
//! A [`Synthesizer`] renders one utterance and returns once playback has
//! finished or failed. Backends are interchangeable and chosen from
//! [`TtsConfig`]:
//! - espeak-ng / espeak, spd-say, macOS `say`: one child process per utterance
//! - Piper: synthesize to a temp WAV, then play it with aplay/paplay/ffplay
//! - log: no engine available, the text is only logged

mod command;
mod piper;

pub use command::{CommandSynthesizer, LogSynthesizer};
pub use piper::PiperSynthesizer;

use crate::config::{SynthesisBackend, TtsConfig};
use herald_core::{HeraldError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// One blocking text-to-speech call.
pub trait Synthesizer: Send + Sync {
    fn name(&self) -> &str;

    /// Speak `text`, returning when playback completes or fails.
    fn synthesize(&self, text: &str) -> Result<()>;
}

/// Build the synthesizer selected by `cfg`.
///
/// `Auto` never fails; it degrades to logging. An explicitly requested
/// backend whose binary is missing is an error.
pub fn build_synthesizer(cfg: &TtsConfig) -> Result<Arc<dyn Synthesizer>> {
    let backend = cfg.resolve_backend();
    let synth: Arc<dyn Synthesizer> = match backend {
        SynthesisBackend::Espeak => {
            let bin = require(&cfg.espeak_bin, backend)?;
            Arc::new(CommandSynthesizer::espeak(bin, cfg))
        }
        SynthesisBackend::SpdSay => {
            let bin = require(&cfg.spd_say_bin, backend)?;
            Arc::new(CommandSynthesizer::spd_say(bin, cfg))
        }
        SynthesisBackend::Say => {
            let bin = require(&cfg.say_bin, backend)?;
            Arc::new(CommandSynthesizer::say(bin, cfg))
        }
        SynthesisBackend::Piper => Arc::new(PiperSynthesizer::from_config(cfg)?),
        SynthesisBackend::Log | SynthesisBackend::Auto => Arc::new(LogSynthesizer),
    };
    info!(target = "tts", engine = synth.name(), "Selected speech engine");
    Ok(synth)
}

fn require(bin: &Option<PathBuf>, backend: SynthesisBackend) -> Result<PathBuf> {
    bin.clone()
        .ok_or_else(|| HeraldError::EngineNotFound(format!("{} binary not found", backend)))
}
