use rand::Rng;

use super::{ActiveCorrection, Step, TypingEngine};
use crate::model::{EventKind, SimulationState};
use crate::scheduler::Clock;

/// Chance that a correction backspaces one correct character too many.
const OVER_CORRECTION_PROBABILITY: f64 = 0.3;

fn ms(value: f64) -> u64 {
    value.round() as u64
}

impl<C: Clock> TypingEngine<C> {
    /// The typist noticed mistake `idx`.
    pub(super) fn realize(&mut self, idx: usize) {
        let Some(record) = self.mistakes.get_mut(idx) else {
            return;
        };
        if record.corrected || record.realized {
            return;
        }
        record.realized = true;

        log::debug!("noticed mistake at {}", record.position);
        self.queue.push(idx);
        self.process_queue();
    }

    /// Start correcting the newest queued mistake, if nothing else is being
    /// corrected. Returns whether a correction is now underway.
    pub(super) fn process_queue(&mut self) -> bool {
        if self.active.is_some() {
            return true;
        }
        if !self.state.is_active() {
            return false;
        }

        while let Some(idx) = self.queue.pop() {
            if self.mistakes[idx].corrected {
                continue;
            }
            self.begin_correction(idx);
            return true;
        }
        false
    }

    pub(super) fn begin_correction(&mut self, idx: usize) {
        self.cancel_step();
        self.lapse_taken = false;

        let position = self.mistakes[idx].position;
        let over_correct = self.config.over_correction
            && position > 0
            && self.produced.len() > position
            && self.rng.gen_bool(OVER_CORRECTION_PROBABILITY);
        let stop_at = if over_correct { position - 1 } else { position };

        self.active = Some(ActiveCorrection {
            mistake: idx,
            stop_at,
        });
        self.set_state(SimulationState::Correcting);

        if self.produced.len() <= stop_at {
            self.schedule_step(Step::FinishCorrection, 0);
        } else {
            log::debug!(
                "correcting mistake at {position}: {} backspaces",
                self.produced.len() - stop_at
            );
            self.schedule_step(Step::Backspace, ms(self.config.backspace_interval_ms));
        }
    }

    pub(super) fn backspace_step(&mut self) {
        let Some(active) = self.active else {
            return;
        };

        if self.produced.len() > active.stop_at {
            self.remove_last(Some(active.mistake));
        }

        if self.produced.len() > active.stop_at {
            self.schedule_step(Step::Backspace, ms(self.config.backspace_interval_ms));
        } else {
            self.schedule_step(Step::FinishCorrection, 0);
        }
    }

    /// Resync the produced text to the mistake position and mark it corrected.
    pub(super) fn finish_correction(&mut self) {
        let Some(active) = self.active else {
            return;
        };
        let position = self.mistakes[active.mistake].position.min(self.target.len());

        while self.produced.len() > position {
            self.remove_last(Some(active.mistake));
        }
        // Over-correction removed good characters before the mistake; put them back.
        while self.produced.len() < position {
            let c = self.target[self.produced.len()];
            self.commit_char(c);
        }
        self.cursor = position;

        let record = &mut self.mistakes[active.mistake];
        if !record.corrected {
            record.corrected = true;
            record.realized = true;
            self.stats.mistakes_corrected += 1;
        }
        self.disarm_realization(active.mistake);

        self.schedule_step(Step::Retype, ms(self.config.correction_pause_ms));
    }

    pub(super) fn retype(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        let position = self.mistakes[active.mistake].position;

        if self.produced.len() == position {
            if let Some(&c) = self.target.get(position) {
                self.commit_char(c);
            }
        }

        if self.process_queue() {
            return;
        }
        self.set_state(SimulationState::Typing);
        if self.cursor >= self.target.len() {
            self.try_complete();
        } else {
            self.type_next();
        }
    }

    /// Pop the last produced character. Any other uncorrected mistake sitting at
    /// that position is gone with it and counts as corrected.
    fn remove_last(&mut self, keep: Option<usize>) {
        let Some(removed) = self.produced.pop() else {
            return;
        };
        let position = self.produced.len();
        self.cursor = position;
        self.stats.backspaces += 1;

        let superseded: Vec<usize> = self
            .mistakes
            .iter()
            .enumerate()
            .filter(|(idx, m)| Some(*idx) != keep && !m.corrected && m.position == position)
            .map(|(idx, _)| idx)
            .collect();
        for idx in superseded {
            self.mistakes[idx].corrected = true;
            self.mistakes[idx].realized = true;
            self.stats.mistakes_corrected += 1;
            self.disarm_realization(idx);
        }

        self.record(EventKind::Backspace { removed });
        self.listeners.backspace(self.config.debug, removed);
        self.notify_progress();
    }
}
