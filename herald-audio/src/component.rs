//! Bus-facing speech component.
//!
//! Maps the `Start`, `Stop`, `Speak` and `EmergencyStop` events onto the
//! speech worker. `EmergencyStop` only announces the emergency; the worker
//! keeps running.

use crate::config::TtsConfig;
use crate::speech::{SpeechWorker, WorkerState};
use crate::synth::{build_synthesizer, Synthesizer};
use herald_core::{Component, Event, EventHandler, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const EVENT_START: &str = "Start";
pub const EVENT_STOP: &str = "Stop";
pub const EVENT_SPEAK: &str = "Speak";
pub const EVENT_EMERGENCY_STOP: &str = "EmergencyStop";

const TOPICS: [&str; 4] = [EVENT_START, EVENT_STOP, EVENT_SPEAK, EVENT_EMERGENCY_STOP];

/// One method per inbound event.
pub trait SpeechEvents {
    fn on_start(&self);
    fn on_stop(&self);
    fn on_speak(&self, text: String);
    fn on_emergency_stop(&self);
}

pub struct TtsComponent {
    name: String,
    worker: SpeechWorker,
    emergency_phrase: String,
}

impl TtsComponent {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, emergency_phrase: impl Into<String>) -> Self {
        Self {
            name: "tts".to_string(),
            worker: SpeechWorker::new(synthesizer),
            emergency_phrase: emergency_phrase.into(),
        }
    }

    /// Build the component with the engine selected by `cfg`.
    pub fn from_config(cfg: &TtsConfig) -> Result<Self> {
        let synthesizer = build_synthesizer(cfg)?;
        Ok(Self::new(synthesizer, cfg.emergency_phrase.clone()))
    }

    /// Register under a name other than `tts`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn worker(&self) -> &SpeechWorker {
        &self.worker
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    pub fn emergency_phrase(&self) -> &str {
        &self.emergency_phrase
    }
}

impl SpeechEvents for TtsComponent {
    fn on_start(&self) {
        self.worker.start();
    }

    fn on_stop(&self) {
        self.worker.stop();
    }

    fn on_speak(&self, text: String) {
        info!(target = "tts", text = %text, "Saying");
        self.worker.enqueue(text);
    }

    fn on_emergency_stop(&self) {
        info!(target = "tts", "EmergencyStop");
        self.on_speak(self.emergency_phrase.clone());
    }
}

impl EventHandler for TtsComponent {
    fn handle(&self, event: &Event) -> Result<()> {
        match event.name.as_str() {
            EVENT_START => self.on_start(),
            EVENT_STOP => self.on_stop(),
            EVENT_SPEAK => match &event.payload {
                Some(text) => self.on_speak(text.clone()),
                None => warn!(target = "tts", id = %event.id, "Speak event without text; ignored"),
            },
            EVENT_EMERGENCY_STOP => self.on_emergency_stop(),
            other => debug!(target = "tts", event = other, "Ignoring unrelated event"),
        }
        Ok(())
    }
}

impl Component for TtsComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn topics(&self) -> &[&'static str] {
        &TOPICS
    }

    fn shutdown(&self) -> Result<()> {
        self.worker.stop();
        Ok(())
    }
}
