//! Background speech worker.
//!
//! Owns the lifecycle flag and the drain thread. `start`/`stop` are
//! idempotent and may be called from any number of dispatch threads;
//! `enqueue` is valid in either state and never blocks on synthesis.
//! Each run gets its own stop flag, so a thread ended from inside its own
//! synthesizer exits even if `start` is called again before it returns.

use super::slot::SpeechSlot;
use crate::synth::Synthesizer;
use serde::Serialize;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

const THREAD_NAME: &str = "herald-speech";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Running,
}

/// One spawned drain thread and the flag that ends it.
struct Run {
    handle: JoinHandle<()>,
    live: Arc<AtomicBool>,
}

#[derive(Default)]
struct Lifecycle {
    current: Option<Run>,
    // Runs stopped from their own thread, joined by the next outside stop.
    detached: Vec<JoinHandle<()>>,
}

pub struct SpeechWorker {
    slot: Arc<SpeechSlot>,
    running: AtomicBool,
    // Lifecycle lock: serializes start/stop. Never held while joining.
    lifecycle: Mutex<Lifecycle>,
    // Held by a drain thread for its whole run, so a restarted thread waits
    // for the previous one to exit before it takes from the slot.
    consumer: Arc<Mutex<()>>,
    synthesizer: Arc<dyn Synthesizer>,
    spoken: Arc<AtomicU64>,
}

impl SpeechWorker {
    pub fn new(synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            slot: Arc::new(SpeechSlot::new()),
            running: AtomicBool::new(false),
            lifecycle: Mutex::new(Lifecycle::default()),
            consumer: Arc::new(Mutex::new(())),
            synthesizer,
            spoken: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spawn the drain thread. No-op when already running.
    pub fn start(&self) {
        let mut lifecycle = self.lock_lifecycle();
        if lifecycle.current.is_some() {
            debug!(target = "tts", "Speech worker already running - doing nothing");
            return;
        }

        let live = Arc::new(AtomicBool::new(true));
        self.running.store(true, Ordering::Release);

        let slot = Arc::clone(&self.slot);
        let thread_live = Arc::clone(&live);
        let consumer = Arc::clone(&self.consumer);
        let synthesizer = Arc::clone(&self.synthesizer);
        let spoken = Arc::clone(&self.spoken);
        let spawned = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                let _consumer = consumer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                drain_loop(&slot, &thread_live, synthesizer.as_ref(), &spoken);
            });

        match spawned {
            Ok(handle) => lifecycle.current = Some(Run { handle, live }),
            Err(e) => {
                self.running.store(false, Ordering::Release);
                error!(target = "tts", error = %e, "Failed to spawn speech worker thread");
            }
        }
    }

    /// Signal the drain thread to exit and join it. No-op when idle.
    ///
    /// Blocks for at most the utterance currently being synthesized. Called
    /// from the speech thread itself, the run is ended but not joined.
    pub fn stop(&self) {
        let me = thread::current().id();
        let mut joinable = Vec::new();
        {
            let mut lifecycle = self.lock_lifecycle();
            let (own, stale): (Vec<_>, Vec<_>) = mem::take(&mut lifecycle.detached)
                .into_iter()
                .partition(|h| h.thread().id() == me);
            lifecycle.detached = own;
            joinable.extend(stale);

            match lifecycle.current.take() {
                None => debug!(target = "tts", "Speech worker not running - doing nothing"),
                Some(run) => {
                    run.live.store(false, Ordering::Release);
                    self.running.store(false, Ordering::Release);
                    self.slot.wake();

                    if run.handle.thread().id() == me {
                        // Joining our own thread would deadlock
                        warn!(target = "tts", "stop() called from the speech thread; detaching");
                        lifecycle.detached.push(run.handle);
                    } else {
                        joinable.push(run.handle);
                    }
                }
            }
        }

        if joinable.is_empty() {
            return;
        }
        for handle in joinable {
            if handle.join().is_err() {
                error!(target = "tts", "Speech worker thread panicked");
            }
        }
        info!(target = "tts", "Speech worker stopped");
    }

    /// Buffer `text` as the next utterance, replacing any pending one.
    pub fn enqueue(&self, text: impl Into<String>) {
        self.slot.write(text);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn state(&self) -> WorkerState {
        if self.is_running() {
            WorkerState::Running
        } else {
            WorkerState::Idle
        }
    }

    /// Number of utterances the synthesizer completed successfully.
    pub fn utterances_spoken(&self) -> u64 {
        self.spoken.load(Ordering::Relaxed)
    }

    pub fn has_pending(&self) -> bool {
        !self.slot.is_empty()
    }

    pub fn synthesizer_name(&self) -> &str {
        self.synthesizer.name()
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SpeechWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn drain_loop(
    slot: &SpeechSlot,
    running: &AtomicBool,
    synthesizer: &dyn Synthesizer,
    spoken: &AtomicU64,
) {
    let engine = synthesizer.name();
    info!(target = "tts", engine, "Speech worker started");

    while let Some(text) = slot.wait_take(running) {
        if text.is_empty() {
            continue;
        }

        debug!(target = "tts", engine, text = %text, "Synthesizing");
        match panic::catch_unwind(AssertUnwindSafe(|| synthesizer.synthesize(&text))) {
            Ok(Ok(())) => {
                spoken.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                warn!(target = "tts", engine, error = %e, text = %text, "Synthesis failed");
            }
            Err(_) => {
                error!(target = "tts", engine, text = %text, "Synthesizer panicked");
            }
        }
    }

    debug!(target = "tts", engine, "Speech worker drain loop exited");
}
