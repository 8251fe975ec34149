use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationState {
    #[default]
    Idle,
    Typing,
    /// Pre-character pause; nothing is being typed.
    Thinking,
    Correcting,
    Paused,
    Completed,
}

impl SimulationState {
    /// Typing, thinking and correcting all count as an active run.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SimulationState::Typing | SimulationState::Thinking | SimulationState::Correcting
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MistakeKind {
    AdjacentKey,
    DoubleChar,
    RandomChar,
    CommonTypo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MistakeRecord {
    pub kind: MistakeKind,
    pub original: char,
    pub substituted: char,
    /// Character index into the target text.
    pub position: usize,
    pub corrected: bool,
    pub realization_delay_ms: u64,
    /// Set once the record has been queued for correction (or abandoned by `stop`).
    #[serde(skip)]
    pub(crate) realized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    StateChanged {
        state: SimulationState,
    },
    Character {
        ch: char,
        position: usize,
    },
    Mistake {
        kind: MistakeKind,
        position: usize,
        original: char,
        substituted: char,
    },
    Backspace {
        removed: char,
    },
    /// The run jumped straight to the finished text.
    Skipped {
        text: String,
    },
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypingStats {
    pub total_chars: usize,
    /// Every committed character, mistaken and retyped ones included.
    pub chars_typed: usize,
    pub mistakes_made: usize,
    pub mistakes_corrected: usize,
    pub backspaces: usize,
    pub start_time_ms: Option<u64>,
    pub end_time_ms: Option<u64>,
    pub paused_ms: u64,
    pub wpm: f64,
    pub total_duration_ms: u64,
}
