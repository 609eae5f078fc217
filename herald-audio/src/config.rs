//! Speech component configuration.
//!
//! Env overrides:
//! - TTS_BACKEND (auto|espeak|spd-say|say|piper|log)
//! - TTS_VOICE, TTS_RATE, TTS_VOLUME, TTS_PLAYER
//! - TTS_TEMP_DIR, TTS_EMERGENCY_PHRASE
//! - ESPEAK_BIN, SPD_SAY_BIN, SAY_BIN, PIPER_BIN, PIPER_VOICE

use crate::utils::{get_from_env_or_path, get_from_path};
use herald_core::{HeraldError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Announcement spoken on `EmergencyStop`.
pub const EMERGENCY_PHRASE: &str = "Oh no, emergency stop detected";

/// Which synthesis engine backs the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SynthesisBackend {
    /// First engine found on this machine, else `Log`.
    #[default]
    Auto,
    Espeak,
    SpdSay,
    Say,
    Piper,
    /// No engine: log the text.
    Log,
}

impl SynthesisBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Espeak => "espeak",
            Self::SpdSay => "spd-say",
            Self::Say => "say",
            Self::Piper => "piper",
            Self::Log => "log",
        }
    }
}

impl fmt::Display for SynthesisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SynthesisBackend {
    type Err = HeraldError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "espeak" | "espeak-ng" => Ok(Self::Espeak),
            "spd-say" | "spd_say" | "speech-dispatcher" => Ok(Self::SpdSay),
            "say" => Ok(Self::Say),
            "piper" => Ok(Self::Piper),
            "log" | "none" => Ok(Self::Log),
            other => Err(HeraldError::ConfigError(format!(
                "unknown TTS backend: {}",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TtsConfig {
    pub backend: SynthesisBackend,
    /// espeak/spd-say/say voice name; a model path for Piper
    pub voice: Option<String>,
    /// 0.5–2.0
    pub rate: f32,
    /// 0.5–2.0
    pub volume: f32,
    /// Preferred WAV player for Piper (aplay|paplay|ffplay)
    pub player: Option<String>,
    pub temp_dir: PathBuf,
    pub emergency_phrase: String,
    pub espeak_bin: Option<PathBuf>,
    pub spd_say_bin: Option<PathBuf>,
    pub say_bin: Option<PathBuf>,
    pub piper_bin: Option<PathBuf>,
    pub piper_voice: Option<PathBuf>,
}

impl Default for TtsConfig {
    fn default() -> Self {
        let backend = match std::env::var("TTS_BACKEND") {
            Ok(s) => s.parse().unwrap_or_else(|e| {
                tracing::warn!(target = "tts", error = %e, "Ignoring TTS_BACKEND");
                SynthesisBackend::Auto
            }),
            Err(_) => SynthesisBackend::Auto,
        };
        let parse_factor = |key: &str| {
            std::env::var(key)
                .ok()
                .and_then(|s| s.parse::<f32>().ok())
                .unwrap_or(1.0)
                .clamp(0.5, 2.0)
        };

        Self {
            backend,
            voice: std::env::var("TTS_VOICE").ok().filter(|s| !s.is_empty()),
            rate: parse_factor("TTS_RATE"),
            volume: parse_factor("TTS_VOLUME"),
            player: std::env::var("TTS_PLAYER").ok().filter(|s| !s.is_empty()),
            temp_dir: std::env::var("TTS_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            emergency_phrase: std::env::var("TTS_EMERGENCY_PHRASE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| EMERGENCY_PHRASE.to_string()),
            espeak_bin: get_from_env_or_path("ESPEAK_BIN", "espeak-ng")
                .or_else(|| get_from_path("espeak")),
            spd_say_bin: get_from_env_or_path("SPD_SAY_BIN", "spd-say"),
            say_bin: get_from_env_or_path("SAY_BIN", "say"),
            piper_bin: get_from_env_or_path("PIPER_BIN", "piper"),
            piper_voice: std::env::var("PIPER_VOICE").ok().map(PathBuf::from),
        }
    }
}

impl TtsConfig {
    /// A config with no engines detected, for hosts without audio.
    pub fn log_only() -> Self {
        Self {
            backend: SynthesisBackend::Log,
            voice: None,
            rate: 1.0,
            volume: 1.0,
            player: None,
            temp_dir: std::env::temp_dir(),
            emergency_phrase: EMERGENCY_PHRASE.to_string(),
            espeak_bin: None,
            spd_say_bin: None,
            say_bin: None,
            piper_bin: None,
            piper_voice: None,
        }
    }

    /// Map `Auto` onto a concrete backend using the detected binaries.
    pub fn resolve_backend(&self) -> SynthesisBackend {
        if self.backend != SynthesisBackend::Auto {
            return self.backend;
        }
        if self.piper_bin.is_some() && self.piper_voice_path().is_some() {
            return SynthesisBackend::Piper;
        }
        // The native engine comes first on macOS
        #[cfg(target_os = "macos")]
        {
            if self.say_bin.is_some() {
                return SynthesisBackend::Say;
            }
        }
        if self.espeak_bin.is_some() {
            return SynthesisBackend::Espeak;
        }
        if self.spd_say_bin.is_some() {
            return SynthesisBackend::SpdSay;
        }
        if self.say_bin.is_some() {
            return SynthesisBackend::Say;
        }
        SynthesisBackend::Log
    }

    /// Piper model: `piper_voice`, else `voice` when it names a file.
    pub fn piper_voice_path(&self) -> Option<PathBuf> {
        if let Some(v) = &self.piper_voice {
            return Some(v.clone());
        }
        self.voice
            .as_ref()
            .map(PathBuf::from)
            .filter(|p| p.exists())
    }
}
