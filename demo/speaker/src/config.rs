use std::fs;
use std::path::{Path, PathBuf};

use herald_audio::{SynthesisBackend, TtsConfig};

/// Configuration for the speaker demo
#[derive(Clone, Debug)]
pub struct SpeakerConfig {
    pub tts: TtsConfig,
    /// Event `source` stamped on events read from stdin
    pub source: String,
    /// Publish `Start` before reading input
    pub autostart: bool,
    /// How long to wait for a pending utterance on EOF before shutting down
    pub linger_ms: u64,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            tts: TtsConfig::default(),
            source: std::env::var("SPEAKER_SOURCE").unwrap_or_else(|_| "speaker.stdin".to_string()),
            autostart: std::env::var("SPEAKER_AUTOSTART")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            linger_ms: std::env::var("SPEAKER_LINGER_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5_000),
        }
    }
}

impl SpeakerConfig {
    /// Load configuration from a TOML file (path via SPEAKER_CONFIG or ./speaker.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let path = std::env::var("SPEAKER_CONFIG").unwrap_or_else(|_| "speaker.toml".into());
        Self::load_from(Path::new(&path), Self::default())
    }

    pub fn load_from(p: &Path, default: Self) -> Self {
        if !p.exists() {
            tracing::info!(target = "speaker", path = %p.display(), "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match toml::from_str::<SpeakerToml>(&s) {
                Ok(t) => t.overlay(default),
                Err(e) => {
                    tracing::warn!(target = "speaker", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target = "speaker", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct SpeakerToml {
    pub source: Option<String>,
    pub autostart: Option<bool>,
    pub linger_ms: Option<u64>,
    pub tts: Option<TtsToml>,
}

impl SpeakerToml {
    fn overlay(self, mut base: SpeakerConfig) -> SpeakerConfig {
        if let Some(v) = self.source {
            base.source = v;
        }
        if let Some(v) = self.autostart {
            base.autostart = v;
        }
        if let Some(v) = self.linger_ms {
            base.linger_ms = v;
        }
        if let Some(t) = self.tts {
            t.apply(&mut base.tts);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct TtsToml {
    pub backend: Option<SynthesisBackend>,
    pub voice: Option<String>,
    pub rate: Option<f32>,
    pub volume: Option<f32>,
    pub player: Option<String>,
    pub temp_dir: Option<PathBuf>,
    pub emergency_phrase: Option<String>,
    pub espeak_bin: Option<PathBuf>,
    pub spd_say_bin: Option<PathBuf>,
    pub say_bin: Option<PathBuf>,
    pub piper_bin: Option<PathBuf>,
    pub piper_voice: Option<PathBuf>,
}

impl TtsToml {
    fn apply(self, t: &mut TtsConfig) {
        if let Some(v) = self.backend {
            t.backend = v;
        }
        if let Some(v) = self.voice {
            t.voice = Some(v);
        }
        if let Some(v) = self.rate {
            t.rate = v.clamp(0.5, 2.0);
        }
        if let Some(v) = self.volume {
            t.volume = v.clamp(0.5, 2.0);
        }
        if let Some(v) = self.player {
            t.player = Some(v);
        }
        if let Some(v) = self.temp_dir {
            t.temp_dir = v;
        }
        if let Some(v) = self.emergency_phrase {
            t.emergency_phrase = v;
        }
        if let Some(v) = self.espeak_bin {
            t.espeak_bin = Some(v);
        }
        if let Some(v) = self.spd_say_bin {
            t.spd_say_bin = Some(v);
        }
        if let Some(v) = self.say_bin {
            t.say_bin = Some(v);
        }
        if let Some(v) = self.piper_bin {
            t.piper_bin = Some(v);
        }
        if let Some(v) = self.piper_voice {
            t.piper_voice = Some(v);
        }
    }
}
