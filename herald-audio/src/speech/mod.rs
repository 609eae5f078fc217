// Speech request path: coalescing slot + background worker

pub mod slot;
pub mod worker;

pub use slot::SpeechSlot;
pub use worker::{SpeechWorker, WorkerState};
