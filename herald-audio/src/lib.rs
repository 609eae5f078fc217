// Herald speech output component

// Shared utilities
pub(crate) mod utils;

pub mod component;
pub mod config;
pub mod speech;
pub mod synth;

pub use component::{SpeechEvents, TtsComponent};
pub use config::{SynthesisBackend, TtsConfig, EMERGENCY_PHRASE};
pub use speech::{SpeechSlot, SpeechWorker, WorkerState};
pub use synth::{build_synthesizer, CommandSynthesizer, LogSynthesizer, PiperSynthesizer, Synthesizer};
