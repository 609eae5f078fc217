use super::Synthesizer;
use crate::config::TtsConfig;
use herald_core::{HeraldError, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Speaks by running a CLI engine that blocks until playback ends.
///
/// The utterance is the last argument, after a `--` so text starting with
/// a dash is never parsed as an option.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    engine: String,
    program: PathBuf,
    args: Vec<OsString>,
}

impl CommandSynthesizer {
    pub fn new(engine: impl Into<String>, program: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            engine: engine.into(),
            program: program.into(),
            args,
        }
    }

    /// `espeak-ng -v <voice> -s <wpm> -a <amplitude> -- <text>`
    pub fn espeak(bin: PathBuf, cfg: &TtsConfig) -> Self {
        let wpm = (160.0 * cfg.rate).round().clamp(80.0, 450.0) as i32;
        let amp = (100.0 * cfg.volume).round().clamp(50.0, 200.0) as i32;
        let mut args: Vec<OsString> = Vec::new();
        if let Some(voice) = &cfg.voice {
            args.push("-v".into());
            args.push(voice.into());
        }
        args.push("-s".into());
        args.push(wpm.to_string().into());
        args.push("-a".into());
        args.push(amp.to_string().into());
        Self::new("espeak-ng", bin, args)
    }

    /// `spd-say --wait -r <rate> -i <volume> [-y <voice>] -- <text>`
    pub fn spd_say(bin: PathBuf, cfg: &TtsConfig) -> Self {
        let rate = ((cfg.rate - 1.0) * 100.0).round().clamp(-100.0, 100.0) as i32;
        let volume = ((cfg.volume - 1.0) * 100.0).round().clamp(-100.0, 100.0) as i32;
        let mut args: Vec<OsString> = vec![
            "--wait".into(),
            "-r".into(),
            rate.to_string().into(),
            "-i".into(),
            volume.to_string().into(),
        ];
        if let Some(voice) = &cfg.voice {
            args.push("-y".into());
            args.push(voice.into());
        }
        Self::new("spd-say", bin, args)
    }

    /// macOS `say [-v <voice>] -r <wpm> -- <text>`
    pub fn say(bin: PathBuf, cfg: &TtsConfig) -> Self {
        let wpm = (175.0 * cfg.rate).round().clamp(90.0, 360.0) as i32;
        let mut args: Vec<OsString> = Vec::new();
        if let Some(voice) = &cfg.voice {
            args.push("-v".into());
            args.push(voice.into());
        }
        args.push("-r".into());
        args.push(wpm.to_string().into());
        Self::new("say", bin, args)
    }

    pub fn command_for(&self, text: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg("--").arg(text);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());
        cmd
    }
}

impl Synthesizer for CommandSynthesizer {
    fn name(&self) -> &str {
        &self.engine
    }

    fn synthesize(&self, text: &str) -> Result<()> {
        let mut cmd = self.command_for(text);
        debug!(target = "tts", command = ?cmd, "Running {}", self.engine);
        let output = cmd.output()?;
        if !output.status.success() {
            return Err(HeraldError::SynthesisError(format!(
                "{} failed ({}): {}",
                self.engine,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Fallback when no engine is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSynthesizer;

impl Synthesizer for LogSynthesizer {
    fn name(&self) -> &str {
        "log"
    }

    fn synthesize(&self, text: &str) -> Result<()> {
        info!(target = "tts", text = %text, "No TTS engine detected. Printing only.");
        Ok(())
    }
}
