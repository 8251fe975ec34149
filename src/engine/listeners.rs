use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::model::{MistakeRecord, SimulationState, TypingStats};

pub(crate) type StateListener = Box<dyn FnMut(SimulationState)>;
pub(crate) type CharacterListener = Box<dyn FnMut(char, usize)>;
pub(crate) type MistakeListener = Box<dyn FnMut(&MistakeRecord)>;
pub(crate) type BackspaceListener = Box<dyn FnMut(char)>;
pub(crate) type ProgressListener = Box<dyn FnMut(f64)>;
pub(crate) type CompleteListener = Box<dyn FnMut(&TypingStats)>;

/// One optional subscriber per event. Registering again replaces the previous one.
#[derive(Default)]
pub(crate) struct Listeners {
    pub(crate) state: Option<StateListener>,
    pub(crate) character: Option<CharacterListener>,
    pub(crate) mistake: Option<MistakeListener>,
    pub(crate) backspace: Option<BackspaceListener>,
    pub(crate) progress: Option<ProgressListener>,
    pub(crate) complete: Option<CompleteListener>,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("state", &self.state.is_some())
            .field("character", &self.character.is_some())
            .field("mistake", &self.mistake.is_some())
            .field("backspace", &self.backspace.is_some())
            .field("progress", &self.progress.is_some())
            .field("complete", &self.complete.is_some())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Run a subscriber, swallowing any panic so the simulation keeps going.
fn guarded(debug: bool, event: &str, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        if debug {
            log::warn!(
                "{event} listener panicked: {}",
                panic_message(payload.as_ref())
            );
        }
    }
}

impl Listeners {
    pub(crate) fn state(&mut self, debug: bool, state: SimulationState) {
        if let Some(cb) = self.state.as_mut() {
            guarded(debug, "state", || cb(state));
        }
    }

    pub(crate) fn character(&mut self, debug: bool, c: char, position: usize) {
        if let Some(cb) = self.character.as_mut() {
            guarded(debug, "character", || cb(c, position));
        }
    }

    pub(crate) fn mistake(&mut self, debug: bool, record: &MistakeRecord) {
        if let Some(cb) = self.mistake.as_mut() {
            guarded(debug, "mistake", || cb(record));
        }
    }

    pub(crate) fn backspace(&mut self, debug: bool, removed: char) {
        if let Some(cb) = self.backspace.as_mut() {
            guarded(debug, "backspace", || cb(removed));
        }
    }

    pub(crate) fn progress(&mut self, debug: bool, progress: f64) {
        if let Some(cb) = self.progress.as_mut() {
            guarded(debug, "progress", || cb(progress));
        }
    }

    pub(crate) fn complete(&mut self, debug: bool, stats: &TypingStats) {
        if let Some(cb) = self.complete.as_mut() {
            guarded(debug, "complete", || cb(stats));
        }
    }
}
