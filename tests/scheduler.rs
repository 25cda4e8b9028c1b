//! Program hand-over: tempo-synced promotion, failed compiles and the
//! shared engine under concurrent control.

use std::thread;

use glitch::{Engine, ErrorKind, SharedEngine};

fn take(engine: &mut Engine, n: usize) -> Vec<f32> {
    (0..n).map(|_| engine.next_sample()).collect()
}

#[test]
fn new_program_waits_for_the_next_beat() {
    let mut engine = Engine::new(8);
    engine.set("bpm", 60.0);
    engine.compile("1").unwrap();
    assert_eq!(take(&mut engine, 3), vec![1.0; 3]);

    engine.compile("2").unwrap();
    // One beat is eight samples; the switch lands on frame 8.
    assert_eq!(take(&mut engine, 5), vec![1.0; 5]);
    assert!(engine.has_pending());
    assert_eq!(engine.next_sample(), 2.0);
    assert!(!engine.has_pending());
}

#[test]
fn without_tempo_programs_switch_immediately() {
    let mut engine = Engine::new(8);
    engine.compile("1").unwrap();
    engine.next_sample();
    engine.compile("2").unwrap();
    assert_eq!(engine.next_sample(), 2.0);
}

#[test]
fn recompiling_the_same_text_is_idempotent() {
    let source = "sin(220) * 0.5 + r() * 0.1";
    let mut once = Engine::with_seed(8000, 42);
    once.compile(source).unwrap();
    let mut twice = Engine::with_seed(8000, 42);
    twice.compile(source).unwrap();
    twice.compile(source).unwrap();
    assert_eq!(take(&mut once, 256), take(&mut twice, 256));
}

#[test]
fn failed_compile_keeps_playing() {
    let mut engine = Engine::new(8000);
    engine.compile("0.25").unwrap();
    engine.next_sample();
    let err = engine.compile("sin(").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ParseError);
    assert!(!engine.has_pending());
    assert_eq!(take(&mut engine, 4), vec![0.25; 4]);
}

#[test]
fn nan_output_holds_the_previous_sample() {
    let mut engine = Engine::new(8000);
    engine.compile("x").unwrap();
    engine.set("x", 0.5);
    assert_eq!(engine.next_sample(), 0.5);
    engine.set("x", f32::NAN);
    assert_eq!(take(&mut engine, 3), vec![0.5; 3]);
}

#[test]
fn control_thread_compiles_while_audio_fills() {
    let shared = SharedEngine::new(Engine::new(8000));
    shared.compile("0").unwrap();

    let control = {
        let shared = shared.clone();
        thread::spawn(move || {
            for i in 1..=20 {
                shared.compile(&format!("{i}")).unwrap();
                thread::yield_now();
            }
        })
    };
    let audio = {
        let shared = shared.clone();
        thread::spawn(move || {
            let mut buffer = [0.0f32; 64];
            for _ in 0..200 {
                shared.fill(&mut buffer, 2);
                assert!(buffer.iter().all(|v| (0.0..=20.0).contains(v)));
            }
        })
    };
    control.join().unwrap();
    audio.join().unwrap();

    let mut buffer = [0.0f32; 4];
    shared.fill(&mut buffer, 1);
    assert_eq!(buffer, [20.0; 4]);
}

#[test]
fn runaway_nesting_is_a_compile_error() {
    let mut engine = Engine::new(8000);
    engine.compile("0.5").unwrap();
    let deep = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
    assert_eq!(engine.compile(&deep).unwrap_err().kind, ErrorKind::ParseError);
    assert_eq!(engine.next_sample(), 0.5);
}
