// Shared test doubles for the speech worker
#![allow(dead_code)]

use herald_audio::{SpeechWorker, Synthesizer};
use herald_core::{HeraldError, Result};
use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread::{self, ThreadId};
use std::time::Duration;

pub const WAIT: Duration = Duration::from_secs(2);
pub const QUIET: Duration = Duration::from_millis(150);

pub fn init_logging() {
    let _ = herald_core::telemetry::init_tracing("warn");
}

/// Records every utterance and the thread that spoke it.
///
/// Fails on `"fail"` and panics on `"panic"`.
pub struct Recorder {
    tx: Mutex<Sender<String>>,
    threads: Mutex<HashSet<ThreadId>>,
}

impl Recorder {
    pub fn new() -> (Arc<Self>, Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        let rec = Arc::new(Self {
            tx: Mutex::new(tx),
            threads: Mutex::new(HashSet::new()),
        });
        (rec, rx)
    }

    pub fn thread_count(&self) -> usize {
        self.threads.lock().unwrap().len()
    }
}

impl Synthesizer for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn synthesize(&self, text: &str) -> Result<()> {
        self.threads.lock().unwrap().insert(thread::current().id());
        match text {
            "fail" => Err(HeraldError::SynthesisError("engine unavailable".into())),
            "panic" => panic!("engine crashed"),
            _ => {
                let _ = self.tx.lock().unwrap().send(text.to_string());
                Ok(())
            }
        }
    }
}

/// Blocks inside `synthesize` until released, announcing each start.
pub struct Gate {
    started: Mutex<Sender<String>>,
    release: Mutex<Receiver<()>>,
    log: Arc<Mutex<Vec<String>>>,
}

pub struct GateHandle {
    pub started: Receiver<String>,
    pub release: Sender<()>,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl Gate {
    pub fn new() -> (Arc<Self>, GateHandle) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let log = Arc::new(Mutex::new(Vec::new()));
        let gate = Arc::new(Self {
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
            log: Arc::clone(&log),
        });
        (
            gate,
            GateHandle {
                started: started_rx,
                release: release_tx,
                log,
            },
        )
    }
}

impl Synthesizer for Gate {
    fn name(&self) -> &str {
        "gate"
    }

    fn synthesize(&self, text: &str) -> Result<()> {
        let _ = self.started.lock().unwrap().send(text.to_string());
        let _ = self.release.lock().unwrap().recv_timeout(Duration::from_secs(5));
        self.log.lock().unwrap().push(format!("spoke:{}", text));
        Ok(())
    }
}

/// Drives its own worker from inside `synthesize`.
///
/// `"halt"` stops the worker, `"restart"` stops then starts it. Every
/// utterance is reported with the thread that spoke it.
pub struct SelfControl {
    worker: OnceLock<Weak<SpeechWorker>>,
    tx: Mutex<Sender<(String, ThreadId)>>,
}

impl SelfControl {
    pub fn new() -> (Arc<Self>, Receiver<(String, ThreadId)>) {
        let (tx, rx) = mpsc::channel();
        let synth = Arc::new(Self {
            worker: OnceLock::new(),
            tx: Mutex::new(tx),
        });
        (synth, rx)
    }

    pub fn attach(&self, worker: &Arc<SpeechWorker>) {
        let _ = self.worker.set(Arc::downgrade(worker));
    }
}

impl Synthesizer for SelfControl {
    fn name(&self) -> &str {
        "self-control"
    }

    fn synthesize(&self, text: &str) -> Result<()> {
        let _ = self
            .tx
            .lock()
            .unwrap()
            .send((text.to_string(), thread::current().id()));
        let Some(worker) = self.worker.get().and_then(Weak::upgrade) else {
            return Ok(());
        };
        match text {
            "halt" => worker.stop(),
            "restart" => {
                worker.stop();
                worker.start();
            }
            _ => {}
        }
        Ok(())
    }
}
