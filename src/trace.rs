use crate::model::{EventKind, SimulationState, TypingEvent};
use crate::word_nav::is_word_char;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// Index of the event that starts the traced run.
    pub event_index: usize,
    pub line: String,
}

/// Condense an event log into console lines, keyed by the event that begins each run
/// so a real-time driver can print a line before the characters it describes.
pub fn plan_console_trace(events: &[TypingEvent]) -> Vec<TraceEvent> {
    let mut planner = TracePlanner::default();
    for (event_index, event) in events.iter().enumerate() {
        planner.observe(event_index, &event.kind);
    }
    planner.finish();

    planner.out.sort_by_key(|event| event.event_index);
    planner.out
}

/// [`plan_console_trace`] without the indices.
pub fn console_trace(events: &[TypingEvent]) -> Vec<String> {
    plan_console_trace(events)
        .into_iter()
        .map(|event| event.line)
        .collect()
}

#[derive(Debug, Default, Clone)]
struct Correction {
    start: usize,
    deleted: Vec<char>,
    inserted: String,
}

impl Correction {
    fn deleted_string(&self) -> String {
        self.deleted.iter().rev().collect()
    }

    fn has_replace(&self) -> bool {
        !self.deleted.is_empty() && !self.inserted.is_empty()
    }
}

#[derive(Debug, Default, Clone)]
struct TracePlanner {
    typing_run_start: Option<usize>,
    typing_run: String,
    correction: Option<Correction>,
    out: Vec<TraceEvent>,
}

impl TracePlanner {
    fn observe(&mut self, event_index: usize, kind: &EventKind) {
        match kind {
            EventKind::Character { ch, .. } => self.typed(event_index, *ch),
            EventKind::Backspace { removed } => {
                self.flush_typing_run();
                if self.correction.as_ref().is_some_and(|c| c.has_replace()) {
                    self.finish_correction();
                }
                self.correction
                    .get_or_insert_with(|| Correction {
                        start: event_index,
                        ..Default::default()
                    })
                    .deleted
                    .push(*removed);
            }
            EventKind::StateChanged { state } => {
                if *state != SimulationState::Correcting {
                    self.finish_correction();
                }
            }
            EventKind::Mistake { .. } => {}
            EventKind::Skipped { .. } => {
                self.finish_correction();
                self.flush_typing_run();
                self.out.push(TraceEvent {
                    event_index,
                    line: "Skip to the end...".to_string(),
                });
            }
            EventKind::Completed => self.finish(),
        }
    }

    fn typed(&mut self, event_index: usize, c: char) {
        if let Some(correction) = &mut self.correction {
            if !correction.has_replace() || is_word_char(c) {
                correction.inserted.push(c);
                return;
            }
            self.finish_correction();
        }

        if self.typing_run.is_empty() {
            self.typing_run_start = Some(event_index);
        }
        self.typing_run.push(c);
    }

    fn finish(&mut self) {
        self.finish_correction();
        self.flush_typing_run();
    }

    fn finish_correction(&mut self) {
        let Some(correction) = self.correction.take() else {
            return;
        };
        if !correction.has_replace() {
            return;
        }

        self.out.push(TraceEvent {
            event_index: correction.start,
            line: format!(
                "Replace \"{}\" with \"{}\"...",
                escape_for_log(&correction.deleted_string()),
                escape_for_log(&correction.inserted)
            ),
        });
    }

    fn flush_typing_run(&mut self) {
        let start = self.typing_run_start.take();
        if self.typing_run.is_empty() {
            return;
        }
        if let Some(event_index) = start {
            self.out.push(TraceEvent {
                event_index,
                line: format!("Typing \"{}\"...", escape_for_log(&self.typing_run)),
            });
        }
        self.typing_run.clear();
    }
}

pub fn escape_for_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}
