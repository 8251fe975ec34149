use crate::model::{EventKind, SimulationState, TypingEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventSummary {
    pub events: usize,
    pub characters: usize,
    pub mistakes: usize,
    pub backspaces: usize,
    pub state_changes: usize,
    pub skipped: bool,
    pub completed: bool,
    /// Clock time from the first to the last event, pauses excluded.
    pub active_ms: u64,
}

/// Tally an event log.
pub fn summarize(events: &[TypingEvent]) -> EventSummary {
    let mut out = EventSummary {
        events: events.len(),
        ..Default::default()
    };

    let mut paused_since: Option<u64> = None;
    let mut paused_ms = 0u64;

    for event in events {
        match &event.kind {
            EventKind::Character { .. } => out.characters += 1,
            EventKind::Mistake { .. } => out.mistakes += 1,
            EventKind::Backspace { .. } => out.backspaces += 1,
            EventKind::Skipped { .. } => out.skipped = true,
            EventKind::Completed => out.completed = true,
            EventKind::StateChanged { state } => {
                out.state_changes += 1;
                let halted = matches!(state, SimulationState::Paused | SimulationState::Idle);
                match (halted, paused_since) {
                    (true, None) => paused_since = Some(event.at_ms),
                    (false, Some(since)) => {
                        paused_ms += event.at_ms.saturating_sub(since);
                        paused_since = None;
                    }
                    _ => {}
                }
            }
        }
    }

    if let (Some(first), Some(last)) = (events.first(), events.last()) {
        if let Some(since) = paused_since {
            paused_ms += last.at_ms.saturating_sub(since);
        }
        out.active_ms = last
            .at_ms
            .saturating_sub(first.at_ms)
            .saturating_sub(paused_ms);
    }

    out
}

/// Rebuild the display text by applying the log's characters and backspaces in order.
pub fn replay_display_text(events: &[TypingEvent]) -> String {
    let mut buf: Vec<char> = Vec::new();

    for event in events {
        match &event.kind {
            EventKind::Character { ch, position } => {
                buf.truncate(*position);
                buf.push(*ch);
            }
            EventKind::Backspace { .. } => {
                buf.pop();
            }
            EventKind::Skipped { text } => buf = text.chars().collect(),
            _ => {}
        }
    }

    buf.into_iter().collect()
}
