use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use typist::model::{EventKind, MistakeKind, SimulationState, TypingEvent};
use typist::scheduler::ManualClock;
use typist::trace::{console_trace, plan_console_trace};
use typist::{SimulationConfig, TypingEngine};

fn at(at_ms: u64, kind: EventKind) -> TypingEvent {
    TypingEvent { at_ms, kind }
}

fn typed(text: &str, start: usize) -> Vec<TypingEvent> {
    text.chars()
        .enumerate()
        .map(|(i, ch)| {
            at(
                0,
                EventKind::Character {
                    ch,
                    position: start + i,
                },
            )
        })
        .collect()
}

fn state(state: SimulationState) -> TypingEvent {
    at(0, EventKind::StateChanged { state })
}

fn backspaces(removed: &str) -> Vec<TypingEvent> {
    removed
        .chars()
        .rev()
        .map(|removed| at(0, EventKind::Backspace { removed }))
        .collect()
}

#[test]
fn logs_typing_run_with_escapes() {
    let mut events = vec![state(SimulationState::Typing)];
    events.extend(typed("a\n\"b\"", 0));
    events.push(at(0, EventKind::Completed));

    assert_eq!(
        console_trace(&events),
        vec!["Typing \"a\\n\\\"b\\\"\"...".to_string()]
    );
}

#[test]
fn logs_replace_at_the_start_of_the_correction() {
    let mut events = vec![state(SimulationState::Typing)];
    events.extend(typed("hello wurld", 0));
    events.push(at(
        0,
        EventKind::Mistake {
            kind: MistakeKind::AdjacentKey,
            position: 7,
            original: 'o',
            substituted: 'u',
        },
    ));
    events.push(state(SimulationState::Correcting));
    let correction_start = events.len();
    events.extend(backspaces("urld"));
    events.extend(typed("o", 7));
    events.push(state(SimulationState::Typing));
    events.extend(typed("rld.", 8));
    events.push(at(0, EventKind::Completed));

    let trace: Vec<(usize, String)> = plan_console_trace(&events)
        .into_iter()
        .map(|e| (e.event_index, e.line))
        .collect();

    assert_eq!(
        trace,
        vec![
            (1, "Typing \"hello wurld\"...".to_string()),
            (correction_start, "Replace \"urld\" with \"o\"...".to_string()),
            (
                correction_start + 6,
                "Typing \"rld.\"...".to_string()
            ),
        ]
    );
}

#[test]
fn back_to_back_corrections_are_logged_separately() {
    let mut events = vec![state(SimulationState::Typing)];
    events.extend(typed("abxy", 0));
    events.push(state(SimulationState::Correcting));
    events.extend(backspaces("y"));
    events.extend(typed("d", 3));
    events.extend(backspaces("xd"));
    events.extend(typed("c", 2));
    events.push(state(SimulationState::Typing));
    events.push(at(0, EventKind::Completed));

    assert_eq!(
        console_trace(&events),
        vec![
            "Typing \"abxy\"...".to_string(),
            "Replace \"y\" with \"d\"...".to_string(),
            "Replace \"xd\" with \"c\"...".to_string(),
        ]
    );
}

#[test]
fn skip_is_logged() {
    let mut events = vec![state(SimulationState::Typing)];
    events.extend(typed("ab", 0));
    events.push(at(
        0,
        EventKind::Skipped {
            text: "abc".to_string(),
        },
    ));
    events.push(at(0, EventKind::Completed));

    assert_eq!(
        console_trace(&events),
        vec!["Typing \"ab\"...".to_string(), "Skip to the end...".to_string()]
    );
}

#[test]
fn traces_a_real_correction() {
    let cfg = SimulationConfig {
        mistake_frequency: 1.0,
        ..Default::default()
    };
    let mut engine =
        TypingEngine::with_clock("Hi", cfg, ManualClock::new(), StdRng::seed_from_u64(3));
    engine.start();
    assert!(engine.run_until_complete(60_000));

    let lines = console_trace(engine.events());
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert!(lines[0].starts_with("Typing \"H"));
    assert!(lines[1].starts_with("Replace \""));
    assert!(lines[1].ends_with("with \"i\"..."));
}
