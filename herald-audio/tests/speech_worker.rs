//! Lifecycle and concurrency tests for the speech worker.

mod common;

use common::{init_logging, Gate, Recorder, SelfControl, QUIET, WAIT};
use herald_audio::{SpeechWorker, WorkerState};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn start_twice_spawns_one_thread() {
    init_logging();
    let (rec, rx) = Recorder::new();
    let worker = SpeechWorker::new(rec.clone());

    worker.start();
    worker.start();
    assert_eq!(worker.state(), WorkerState::Running);

    for text in ["one", "two", "three"] {
        worker.enqueue(text);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), text);
    }
    assert_eq!(rec.thread_count(), 1);

    worker.stop();
}

#[test]
fn concurrent_starts_spawn_one_thread() {
    let (rec, rx) = Recorder::new();
    let worker = Arc::new(SpeechWorker::new(rec.clone()));
    let barrier = Arc::new(Barrier::new(8));

    let starters: Vec<_> = (0..8)
        .map(|_| {
            let worker = Arc::clone(&worker);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                worker.start();
            })
        })
        .collect();
    for s in starters {
        s.join().unwrap();
    }

    for text in ["a", "b", "c"] {
        worker.enqueue(text);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), text);
    }
    assert_eq!(rec.thread_count(), 1);
    worker.stop();
}

#[test]
fn stop_twice_is_a_noop() {
    let (rec, _rx) = Recorder::new();
    let worker = SpeechWorker::new(rec);

    // Idle: nothing to join
    worker.stop();
    assert_eq!(worker.state(), WorkerState::Idle);

    worker.start();
    worker.stop();
    worker.stop();
    assert_eq!(worker.state(), WorkerState::Idle);
}

#[test]
fn start_stop_cycles_do_not_leak_threads() {
    let (rec, rx) = Recorder::new();
    let worker = SpeechWorker::new(rec.clone());

    for i in 0..50 {
        worker.start();
        assert!(worker.is_running());
        worker.stop();
        assert!(!worker.is_running());
        if i % 10 == 0 {
            worker.start();
            worker.enqueue(format!("cycle {}", i));
            assert_eq!(rx.recv_timeout(WAIT).unwrap(), format!("cycle {}", i));
            worker.stop();
        }
    }

    // Every thread was joined, so only our handle remains
    assert_eq!(Arc::strong_count(&rec), 2);
}

#[test]
fn rapid_writes_coalesce_to_the_last() {
    let (rec, rx) = Recorder::new();
    let worker = SpeechWorker::new(rec);

    worker.enqueue("a");
    worker.enqueue("b");
    worker.enqueue("c");
    worker.start();

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "c");
    assert!(rx.recv_timeout(QUIET).is_err(), "a and b must never be spoken");
    worker.stop();
}

#[test]
fn writes_during_an_utterance_coalesce() {
    let (gate, handle) = Gate::new();
    let worker = SpeechWorker::new(gate);
    worker.start();

    worker.enqueue("first");
    assert_eq!(handle.started.recv_timeout(WAIT).unwrap(), "first");

    worker.enqueue("a");
    worker.enqueue("b");
    worker.enqueue("c");
    handle.release.send(()).unwrap();

    assert_eq!(handle.started.recv_timeout(WAIT).unwrap(), "c");
    handle.release.send(()).unwrap();
    assert!(handle.started.recv_timeout(QUIET).is_err());

    worker.stop();
    assert_eq!(
        *handle.log.lock().unwrap(),
        vec!["spoke:first".to_string(), "spoke:c".to_string()]
    );
}

#[test]
fn enqueue_while_idle_is_spoken_after_start() {
    let (rec, rx) = Recorder::new();
    let worker = SpeechWorker::new(rec);

    worker.enqueue("x");
    assert!(rx.recv_timeout(QUIET).is_err(), "nothing speaks while idle");
    assert!(worker.has_pending());

    worker.start();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "x");
    worker.stop();
}

#[test]
fn enqueue_after_stop_is_buffered() {
    let (rec, rx) = Recorder::new();
    let worker = SpeechWorker::new(rec);

    worker.start();
    worker.stop();
    worker.enqueue("later");
    assert!(rx.recv_timeout(QUIET).is_err());
    assert!(worker.has_pending());

    worker.start();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "later");
    worker.stop();
}

#[test]
fn stop_waits_for_the_utterance_in_flight() {
    let (gate, handle) = Gate::new();
    let worker = Arc::new(SpeechWorker::new(gate));
    worker.start();

    worker.enqueue("long sentence");
    assert_eq!(handle.started.recv_timeout(WAIT).unwrap(), "long sentence");

    let log = Arc::clone(&handle.log);
    let stopper = {
        let worker = Arc::clone(&worker);
        let log = Arc::clone(&log);
        thread::spawn(move || {
            worker.stop();
            log.lock().unwrap().push("stop-returned".to_string());
        })
    };

    thread::sleep(Duration::from_millis(100));
    assert!(
        log.lock().unwrap().is_empty(),
        "stop must not return mid-utterance"
    );

    handle.release.send(()).unwrap();
    stopper.join().unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "spoke:long sentence".to_string(),
            "stop-returned".to_string()
        ]
    );
    assert_eq!(worker.state(), WorkerState::Idle);
}

#[test]
fn failed_synthesis_does_not_kill_the_worker() {
    init_logging();
    let (rec, rx) = Recorder::new();
    let worker = SpeechWorker::new(rec);
    worker.start();

    worker.enqueue("fail");
    thread::sleep(Duration::from_millis(50));
    worker.enqueue("next");
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "next");
    assert!(worker.is_running());

    worker.enqueue("panic");
    thread::sleep(Duration::from_millis(50));
    worker.enqueue("still alive");
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "still alive");

    worker.stop();
}

#[test]
fn empty_text_is_not_synthesized() {
    let (rec, rx) = Recorder::new();
    let worker = SpeechWorker::new(rec);
    worker.start();

    worker.enqueue("");
    assert!(rx.recv_timeout(QUIET).is_err());
    assert!(!worker.has_pending(), "empty text is consumed");

    worker.enqueue("after");
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "after");
    worker.stop();
}

#[test]
fn drop_stops_and_joins_the_worker() {
    let (rec, rx) = Recorder::new();
    {
        let worker = SpeechWorker::new(rec.clone());
        worker.start();
        worker.enqueue("bye");
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "bye");
    }
    assert_eq!(Arc::strong_count(&rec), 1);
}

#[test]
fn spoken_counter_tracks_successes() {
    let (rec, rx) = Recorder::new();
    let worker = SpeechWorker::new(rec);
    worker.start();

    for text in ["one", "fail", "two"] {
        worker.enqueue(text);
        if text != "fail" {
            rx.recv_timeout(WAIT).unwrap();
        } else {
            thread::sleep(Duration::from_millis(50));
        }
    }
    // The counter is bumped after synthesize returns; joining settles it.
    worker.stop();
    assert_eq!(worker.utterances_spoken(), 2);
}

#[test]
fn many_producers_one_consumer() {
    let (rec, rx) = Recorder::new();
    let worker = Arc::new(SpeechWorker::new(rec));
    worker.start();

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let worker = Arc::clone(&worker);
            thread::spawn(move || {
                for i in 0..100 {
                    worker.enqueue(format!("p{}-{}", p, i));
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }
    worker.enqueue("final");

    // Everything before "final" may be coalesced away; "final" must arrive.
    let mut seen = Vec::new();
    loop {
        let text = rx.recv_timeout(WAIT).unwrap();
        let done = text == "final";
        seen.push(text);
        if done {
            break;
        }
    }
    assert!(seen.len() <= 401);
    worker.stop();
}

fn wait_for_state(worker: &SpeechWorker, state: WorkerState) {
    let deadline = Instant::now() + WAIT;
    while worker.state() != state {
        assert!(Instant::now() < deadline, "worker never reached {:?}", state);
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn stop_from_inside_synthesis_ends_the_run() {
    init_logging();
    let (synth, rx) = SelfControl::new();
    let worker = Arc::new(SpeechWorker::new(synth.clone()));
    synth.attach(&worker);

    worker.start();
    worker.enqueue("halt");
    assert_eq!(rx.recv_timeout(WAIT).unwrap().0, "halt");
    wait_for_state(&worker, WorkerState::Idle);

    worker.enqueue("buffered");
    assert!(rx.recv_timeout(QUIET).is_err());

    worker.start();
    assert_eq!(rx.recv_timeout(WAIT).unwrap().0, "buffered");
    worker.stop();

    // Both runs are joined; only the test and the worker hold the synthesizer
    assert_eq!(Arc::strong_count(&synth), 2);
}

#[test]
fn restart_from_inside_synthesis_keeps_one_consumer() {
    init_logging();
    let (synth, rx) = SelfControl::new();
    let worker = Arc::new(SpeechWorker::new(synth.clone()));
    synth.attach(&worker);

    worker.start();
    worker.enqueue("restart");
    let (_, first_run) = rx.recv_timeout(WAIT).unwrap();
    wait_for_state(&worker, WorkerState::Running);

    let mut speakers = HashSet::new();
    for i in 0..100 {
        let text = format!("after {}", i);
        worker.enqueue(text.clone());
        let (spoken, thread) = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(spoken, text);
        speakers.insert(thread);
    }
    assert_eq!(speakers.len(), 1, "exactly one thread drains after a restart");
    assert!(!speakers.contains(&first_run));

    worker.stop();
    assert_eq!(worker.state(), WorkerState::Idle);
    assert_eq!(Arc::strong_count(&synth), 2);
}
