use super::Synthesizer;
use crate::config::TtsConfig;
use crate::utils::get_from_path;
use herald_core::{HeraldError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

const PLAYERS: [&str; 3] = ["aplay", "paplay", "ffplay"];

/// Piper renders to a WAV file which is then played with the first
/// available player.
#[derive(Debug, Clone)]
pub struct PiperSynthesizer {
    piper_bin: PathBuf,
    voice_model: PathBuf,
    length_scale: f32,
    volume: f32,
    player: Option<PathBuf>,
    temp_dir: PathBuf,
}

impl PiperSynthesizer {
    pub fn from_config(cfg: &TtsConfig) -> Result<Self> {
        let piper_bin = cfg
            .piper_bin
            .clone()
            .ok_or_else(|| HeraldError::EngineNotFound("Piper binary not found".into()))?;
        let voice_model = cfg.piper_voice_path().ok_or_else(|| {
            HeraldError::ConfigError("Piper voice not found; set PIPER_VOICE or voice".into())
        })?;
        let player = select_player(cfg.player.as_deref());
        if player.is_none() {
            warn!(target = "tts", "No audio player found; Piper output will not be audible");
        }

        Ok(Self {
            piper_bin,
            voice_model,
            length_scale: (1.0f32 / cfg.rate).clamp(0.5, 2.0),
            volume: cfg.volume,
            player,
            temp_dir: cfg.temp_dir.clone(),
        })
    }

    fn render(&self, text: &str, out_wav: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.piper_bin);
        cmd.arg("-m").arg(&self.voice_model);
        cmd.arg("-f").arg(out_wav);
        cmd.arg("--length_scale")
            .arg(format!("{:.2}", self.length_scale));
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());

        debug!(target = "tts", command = ?cmd, "Running piper");
        let mut child = cmd.spawn()?;
        // Piper may exit before reading its input; reap it before reporting
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(text.as_bytes()),
            None => Ok(()),
        };
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(HeraldError::SynthesisError(format!(
                "Piper failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        written?;
        Ok(())
    }
}

impl Synthesizer for PiperSynthesizer {
    fn name(&self) -> &str {
        "piper"
    }

    fn synthesize(&self, text: &str) -> Result<()> {
        // Removed when dropped
        let wav = tempfile::Builder::new()
            .prefix("tts_")
            .suffix(".wav")
            .tempfile_in(&self.temp_dir)?;

        self.render(text, wav.path())?;

        if (self.volume - 1.0).abs() > f32::EPSILON {
            if let Err(e) = scale_wav_pcm16_inplace(wav.path(), self.volume) {
                warn!(target = "tts", error = %e, "Failed to scale volume for WAV");
            }
        }

        match &self.player {
            Some(bin) => play_wav_with(bin, wav.path()),
            None => {
                info!(target = "tts", "No audio player found; dropping rendered WAV");
                Ok(())
            }
        }
    }
}

fn select_player(pref: Option<&str>) -> Option<PathBuf> {
    pref.and_then(get_from_path)
        .or_else(|| PLAYERS.iter().find_map(|p| get_from_path(p)))
}

fn play_wav_with(player_bin: &Path, wav_path: &Path) -> Result<()> {
    let name = player_bin
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let mut cmd = Command::new(player_bin);
    if name == "ffplay" {
        cmd.arg("-autoexit").arg("-nodisp").arg("-loglevel").arg("quiet");
    }
    let status = cmd.arg(wav_path).stdin(Stdio::null()).status()?;
    if !status.success() {
        return Err(HeraldError::SynthesisError(format!(
            "{} exited with {}",
            name, status
        )));
    }
    Ok(())
}

/// Multiply the PCM16 samples of a RIFF/WAVE file by `gain`.
/// Files that are not RIFF/WAVE are left untouched.
fn scale_wav_pcm16_inplace(path: &Path, gain: f32) -> std::io::Result<()> {
    let mut buf = fs::read(path)?;

    if buf.len() < 12 || &buf[0..4] != b"RIFF" || &buf[8..12] != b"WAVE" {
        return Ok(());
    }
    let mut idx = 12;
    while idx + 8 <= buf.len() {
        let chunk_id = &buf[idx..idx + 4];
        let sz =
            u32::from_le_bytes([buf[idx + 4], buf[idx + 5], buf[idx + 6], buf[idx + 7]]) as usize;
        if chunk_id == b"data" {
            let start = idx + 8;
            let end = (start + sz).min(buf.len());
            for chunk in buf[start..end].chunks_exact_mut(2) {
                let s = i16::from_le_bytes([chunk[0], chunk[1]]);
                let scaled = (s as f32 * gain).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                chunk.copy_from_slice(&scaled.to_le_bytes());
            }
            return fs::write(path, &buf);
        }
        idx += 8 + sz;
    }
    Ok(())
}
