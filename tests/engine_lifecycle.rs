use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use typist::model::EventKind;
use typist::scheduler::{Clock, ManualClock};
use typist::{ConfigUpdate, SimulationConfig, SimulationState, TypingEngine};

const LIMIT_MS: u64 = 10 * 60 * 1000;

fn engine(text: &str, cfg: SimulationConfig) -> TypingEngine<ManualClock> {
    TypingEngine::with_clock(text, cfg, ManualClock::new(), StdRng::seed_from_u64(7))
}

fn long_text() -> String {
    "a".repeat(200)
}

#[test]
fn empty_text_completes_on_start() {
    let mut e = engine("", SimulationConfig::default());
    let completions = Rc::new(Cell::new(0));
    {
        let completions = completions.clone();
        e.on_complete(move |_| completions.set(completions.get() + 1));
    }

    assert_eq!(e.progress(), 100.0);
    e.start();

    assert!(e.is_completed());
    assert_eq!(e.progress(), 100.0);
    assert_eq!(e.display_text(), "");
    assert_eq!(completions.get(), 1);
    assert!(e.events().iter().all(|ev| !matches!(
        ev.kind,
        EventKind::Character { .. } | EventKind::Mistake { .. }
    )));
}

#[test]
fn single_character_completes() {
    let mut e = engine("A", SimulationConfig::default());
    e.start();
    assert!(e.run_until_complete(LIMIT_MS), "run should finish");

    assert_eq!(e.display_text(), "A");
    assert_eq!(e.progress(), 100.0);
    assert_eq!(e.state(), SimulationState::Completed);
    assert!(e.stats().end_time_ms.is_some());
}

#[test]
fn start_is_ignored_unless_idle() {
    let mut e = engine("hello", SimulationConfig::steady(50.0));
    e.start();
    e.advance_by(120);
    let typed = e.current_index();
    e.start();
    assert_eq!(e.current_index(), typed);
    assert!(e.is_typing());
}

#[test]
fn pause_and_resume_exclude_paused_time() {
    let mut e = engine(&long_text(), SimulationConfig::steady(100.0));
    e.start();
    e.advance_by(1000);

    e.pause();
    assert!(e.is_paused());
    let typed = e.display_text();
    let cursor = e.current_index();

    e.advance_by(3000);
    assert_eq!(e.display_text(), typed);
    assert_eq!(e.current_index(), cursor);
    assert_eq!(e.next_deadline(), None);

    e.resume();
    e.advance_by(500);

    assert_eq!(e.total_duration(), 1500);
    assert_eq!(e.stats().paused_ms, 3000);
    assert!(e.current_index() > cursor);
}

#[test]
fn duration_excludes_an_ongoing_pause() {
    let mut e = engine(&long_text(), SimulationConfig::steady(100.0));
    e.start();
    e.advance_by(800);
    e.pause();
    e.advance_by(5000);
    assert_eq!(e.total_duration(), 800);
}

#[test]
fn pause_and_resume_are_ignored_in_the_wrong_state() {
    let mut e = engine("abc", SimulationConfig::steady(50.0));
    e.resume();
    e.pause();
    assert_eq!(e.state(), SimulationState::Idle);

    e.start();
    e.resume();
    assert!(e.is_typing());
}

#[test]
fn skip_completes_once() {
    let text = "The quick brown fox jumps over the lazy dog.";
    let mut e = engine(text, SimulationConfig::default());
    let completions = Rc::new(Cell::new(0));
    {
        let completions = completions.clone();
        e.on_complete(move |_| completions.set(completions.get() + 1));
    }

    e.start();
    e.advance_by(700);
    e.skip();
    e.skip();
    e.advance_by(10_000);

    assert!(e.is_completed());
    assert_eq!(e.display_text(), text);
    assert_eq!(e.progress(), 100.0);
    assert!(e.uncorrected_mistakes().is_empty());
    assert_eq!(completions.get(), 1);
    assert_eq!(
        e.events()
            .iter()
            .filter(|ev| ev.kind == EventKind::Completed)
            .count(),
        1
    );
}

#[test]
fn skip_from_pause_completes() {
    let mut e = engine(&long_text(), SimulationConfig::steady(100.0));
    e.start();
    e.advance_by(400);
    e.pause();
    e.skip();

    assert!(e.is_completed());
    assert_eq!(e.display_text(), long_text());
}

#[test]
fn reset_clears_the_run() {
    let cfg = SimulationConfig {
        mistake_frequency: 0.5,
        ..Default::default()
    };
    let mut e = engine("Some text with plenty of room for mistakes", cfg);
    e.start();
    e.advance_by(3000);
    assert!(!e.display_text().is_empty());

    e.reset();

    assert_eq!(e.current_index(), 0);
    assert_eq!(e.display_text(), "");
    assert_eq!(e.progress(), 0.0);
    assert_eq!(e.state(), SimulationState::Idle);
    assert!(e.mistakes().is_empty());
    assert!(e.events().is_empty());
    assert_eq!(e.next_deadline(), None);
    assert_eq!(e.stats().chars_typed, 0);
}

#[test]
fn run_after_reset_starts_over() {
    let mut e = engine("again", SimulationConfig::steady(40.0));
    e.start();
    assert!(e.run_until_complete(LIMIT_MS));
    e.reset();
    e.start();
    assert!(e.run_until_complete(LIMIT_MS));
    assert_eq!(e.display_text(), "again");
}

#[test]
fn update_text_resets_without_restarting() {
    let mut e = engine("first text", SimulationConfig::steady(50.0));
    e.start();
    e.advance_by(200);

    e.update_text("second");
    assert_eq!(e.text(), "second");
    assert_eq!(e.state(), SimulationState::Idle);
    assert_eq!(e.display_text(), "");

    e.advance_by(5000);
    assert_eq!(e.display_text(), "");
    assert_eq!(e.stats().total_chars, 6);

    e.start();
    assert!(e.run_until_complete(LIMIT_MS));
    assert_eq!(e.display_text(), "second");
}

#[test]
fn stop_halts_and_start_continues() {
    let text = "stop and go";
    let mut e = engine(text, SimulationConfig::steady(60.0));
    e.start();
    e.advance_by(250);
    e.stop();

    assert_eq!(e.state(), SimulationState::Idle);
    let typed = e.display_text();
    e.advance_by(2000);
    assert_eq!(e.display_text(), typed);

    e.start();
    assert!(e.run_until_complete(LIMIT_MS));
    assert_eq!(e.display_text(), text);
}

#[test]
fn stop_after_completion_is_ignored() {
    let mut e = engine("ok", SimulationConfig::steady(10.0));
    e.start();
    assert!(e.run_until_complete(LIMIT_MS));
    e.stop();
    assert!(e.is_completed());
}

#[test]
fn state_listener_sees_every_transition() {
    let mut e = engine("hi", SimulationConfig::steady(30.0));
    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let seen = seen.clone();
        e.on_state_change(move |s| seen.borrow_mut().push(s));
    }

    e.start();
    e.advance_by(10);
    e.pause();
    e.resume();
    assert!(e.run_until_complete(LIMIT_MS));

    assert_eq!(
        *seen.borrow(),
        vec![
            SimulationState::Typing,
            SimulationState::Paused,
            SimulationState::Typing,
            SimulationState::Completed,
        ]
    );
}

#[test]
fn update_config_applies_partial_changes() {
    let mut e = engine("abc", SimulationConfig::default());
    e.update_config(&ConfigUpdate {
        base_speed_ms: Some(-20.0),
        mistake_frequency: Some(f64::NAN),
        ..Default::default()
    });

    assert_eq!(e.config().base_speed_ms, 0.0);
    assert_eq!(
        e.config().mistake_frequency,
        SimulationConfig::default().mistake_frequency
    );
}

#[test]
fn wpm_counts_five_chars_per_word() {
    let mut e = engine("abcdefghij", SimulationConfig::steady(100.0));
    e.start();
    assert!(e.run_until_complete(LIMIT_MS));

    let stats = e.stats();
    assert_eq!(stats.chars_typed, 10);
    let minutes = stats.total_duration_ms as f64 / 60_000.0;
    assert!((stats.wpm - 2.0 / minutes).abs() < 1e-6);
}

#[test]
fn concentration_lapse_thinks_without_moving_the_cursor() {
    let cfg = SimulationConfig {
        concentration_lapses: true,
        thinking_pause_ms: 300.0,
        ..SimulationConfig::steady(20.0)
    };
    let text = "a".repeat(2000);
    let mut e = engine(&text, cfg);
    let states = Rc::new(RefCell::new(Vec::new()));
    {
        let states = states.clone();
        e.on_state_change(move |s| states.borrow_mut().push(s));
    }

    e.start();
    let mut lapses = 0;
    let mut thinking_since: Option<(usize, u64)> = None;
    while !e.is_completed() {
        match (e.state(), thinking_since) {
            (SimulationState::Thinking, None) => {
                thinking_since = Some((e.current_index(), e.clock().now_ms()));
            }
            (SimulationState::Thinking, Some(_)) => {}
            (state, Some((index, since))) => {
                assert_eq!(state, SimulationState::Typing);
                assert_eq!(e.current_index(), index);
                assert_eq!(e.clock().now_ms() - since, 900);
                lapses += 1;
                thinking_since = None;
            }
            _ => {}
        }
        let due = e.next_deadline().expect("engine should be scheduled");
        let now = e.clock().now_ms();
        e.advance_by(due.saturating_sub(now));
    }

    assert!(lapses > 0, "a 2000 character run should lapse at least once");
    let states = states.borrow();
    let thinking: Vec<usize> = states
        .iter()
        .enumerate()
        .filter(|(_, s)| **s == SimulationState::Thinking)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(thinking.len(), lapses);
    for i in thinking {
        assert_eq!(states[i - 1], SimulationState::Typing);
        assert_eq!(states[i + 1], SimulationState::Typing);
    }
    assert_eq!(e.display_text(), text);
    assert_eq!(e.stats().chars_typed, 2000);
}
