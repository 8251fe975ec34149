mod correction;
mod listeners;

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ConfigUpdate, SimulationConfig};
use crate::keyboard::{hand_for_char, Hand};
use crate::mistakes::{
    generate_mistake_char, look_ahead_fires, realization_delay_ms, select_mistake_type,
    should_make_mistake,
};
use crate::model::{
    EventKind, MistakeKind, MistakeRecord, SimulationState, TypingEvent, TypingStats,
};
use crate::scheduler::{Clock, ManualClock, SystemClock, TimerId, TimerQueue};
use crate::timing::{character_delay_ms, DelayContext, FATIGUE_STEP_MS};

use listeners::Listeners;

const LAPSE_PROBABILITY: f64 = 0.01;
const LAPSE_PAUSE_FACTOR: f64 = 3.0;
const COMPLETION_RECHECK_MS: u64 = 100;
/// Progress shown while the run has not completed yet.
const PROGRESS_CEILING: f64 = 99.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    TypeNext,
    Commit,
    ResumeAfterLapse,
    Backspace,
    FinishCorrection,
    Retype,
    CompletionCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Step(Step),
    Realize(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveCorrection {
    mistake: usize,
    /// Backspace until the produced text is this long.
    stop_at: usize,
}

/// Simulates a person typing `text`, one scheduled step at a time.
///
/// The engine never blocks or spawns. Callers drive it by calling [`poll`] whenever
/// [`next_deadline`] has passed on the engine's clock.
///
/// [`poll`]: TypingEngine::poll
/// [`next_deadline`]: TypingEngine::next_deadline
#[derive(Debug)]
pub struct TypingEngine<C: Clock = SystemClock> {
    config: SimulationConfig,
    text: String,
    target: Vec<char>,
    produced: Vec<char>,
    cursor: usize,
    state: SimulationState,

    mistakes: Vec<MistakeRecord>,
    queue: Vec<usize>,
    active: Option<ActiveCorrection>,

    stats: TypingStats,
    events: Vec<TypingEvent>,

    timers: TimerQueue<Timer>,
    step: Option<TimerId>,
    realizations: HashMap<usize, TimerId>,
    frozen_realizations: Vec<(usize, u64)>,
    paused_at: Option<u64>,

    prev_hand: Option<Hand>,
    fatigue_ms: f64,
    lapse_taken: bool,

    clock: C,
    rng: StdRng,
    listeners: Listeners,
}

impl TypingEngine<SystemClock> {
    pub fn new(text: impl Into<String>, config: SimulationConfig) -> Self {
        Self::with_clock(text, config, SystemClock::new(), StdRng::from_entropy())
    }
}

impl<C: Clock> TypingEngine<C> {
    pub fn with_clock(
        text: impl Into<String>,
        config: SimulationConfig,
        clock: C,
        rng: StdRng,
    ) -> Self {
        let text = text.into();
        let target: Vec<char> = text.chars().collect();
        let stats = TypingStats {
            total_chars: target.len(),
            ..Default::default()
        };

        Self {
            config: config.sanitized(),
            text,
            target,
            produced: Vec::new(),
            cursor: 0,
            state: SimulationState::Idle,
            mistakes: Vec::new(),
            queue: Vec::new(),
            active: None,
            stats,
            events: Vec::new(),
            timers: TimerQueue::new(),
            step: None,
            realizations: HashMap::new(),
            frozen_realizations: Vec::new(),
            paused_at: None,
            prev_hand: None,
            fatigue_ms: 0.0,
            lapse_taken: false,
            clock,
            rng,
            listeners: Listeners::default(),
        }
    }

    // ---- listeners ----

    pub fn on_state_change(&mut self, f: impl FnMut(SimulationState) + 'static) {
        self.listeners.state = Some(Box::new(f));
    }

    pub fn on_character(&mut self, f: impl FnMut(char, usize) + 'static) {
        self.listeners.character = Some(Box::new(f));
    }

    pub fn on_mistake(&mut self, f: impl FnMut(&MistakeRecord) + 'static) {
        self.listeners.mistake = Some(Box::new(f));
    }

    pub fn on_backspace(&mut self, f: impl FnMut(char) + 'static) {
        self.listeners.backspace = Some(Box::new(f));
    }

    pub fn on_progress(&mut self, f: impl FnMut(f64) + 'static) {
        self.listeners.progress = Some(Box::new(f));
    }

    pub fn on_complete(&mut self, f: impl FnMut(&TypingStats) + 'static) {
        self.listeners.complete = Some(Box::new(f));
    }

    // ---- lifecycle ----

    pub fn start(&mut self) {
        if self.state != SimulationState::Idle {
            return;
        }

        let now = self.now();
        self.stats.start_time_ms.get_or_insert(now);
        if let Some(stopped_at) = self.paused_at.take() {
            self.stats.paused_ms += now.saturating_sub(stopped_at);
        }
        self.stats.total_chars = self.target.len();
        log::debug!("starting run over {} chars", self.target.len());

        if self.target.is_empty() {
            self.complete();
            return;
        }

        self.set_state(SimulationState::Typing);
        if self.cursor >= self.target.len() {
            self.try_complete();
        } else {
            self.schedule_step(Step::TypeNext, 0);
        }
    }

    /// Halt the run and return to idle. Outstanding mistakes are abandoned, not
    /// retried; they are queued again only if the run is restarted and reaches
    /// the end of the text.
    pub fn stop(&mut self) {
        if self.state == SimulationState::Completed {
            return;
        }
        self.halt();
        // Time spent stopped does not count towards the run's duration.
        if self.stats.start_time_ms.is_some() {
            self.paused_at = Some(self.now());
        }
        self.set_state(SimulationState::Idle);
    }

    pub fn pause(&mut self) {
        if !self.state.is_active() {
            return;
        }

        let now = self.now();
        self.cancel_step();

        let mut frozen: Vec<(usize, u64)> = self
            .realizations
            .drain()
            .filter_map(|(idx, id)| {
                self.timers
                    .cancel(id)
                    .map(|(due, _)| (idx, due.saturating_sub(now)))
            })
            .collect();
        frozen.sort_unstable();
        self.frozen_realizations = frozen;

        self.paused_at = Some(now);
        self.set_state(SimulationState::Paused);
    }

    pub fn resume(&mut self) {
        if self.state != SimulationState::Paused {
            return;
        }

        let now = self.now();
        if let Some(paused_at) = self.paused_at.take() {
            self.stats.paused_ms += now.saturating_sub(paused_at);
        }
        self.set_state(SimulationState::Typing);

        for (idx, remaining) in std::mem::take(&mut self.frozen_realizations) {
            self.arm_realization(idx, remaining);
        }

        if let Some(active) = self.active {
            self.begin_correction(active.mistake);
            return;
        }
        if self.process_queue() {
            return;
        }
        if self.cursor >= self.target.len() {
            self.try_complete();
        } else {
            self.schedule_step(Step::TypeNext, 0);
        }
    }

    /// Jump straight to the finished text. Completion fires once.
    pub fn skip(&mut self) {
        if self.state == SimulationState::Completed {
            return;
        }

        self.cancel_all_timers();
        let now = self.now();
        self.stats.start_time_ms.get_or_insert(now);

        for record in &mut self.mistakes {
            if !record.corrected {
                record.corrected = true;
                record.realized = true;
                self.stats.mistakes_corrected += 1;
            }
        }
        self.queue.clear();
        self.active = None;

        self.produced = self.target.clone();
        self.cursor = self.target.len();
        self.record(EventKind::Skipped {
            text: self.text.clone(),
        });

        self.complete();
    }

    /// Stop and clear every piece of per-run state.
    pub fn reset(&mut self) {
        self.halt();
        self.set_state(SimulationState::Idle);

        self.produced.clear();
        self.cursor = 0;
        self.mistakes.clear();
        self.events.clear();
        self.stats = TypingStats {
            total_chars: self.target.len(),
            ..Default::default()
        };
        self.paused_at = None;
        self.prev_hand = None;
        self.fatigue_ms = 0.0;

        self.notify_progress();
    }

    pub fn update_config(&mut self, update: &ConfigUpdate) {
        self.config.merge(update);
    }

    /// Replace the target text. Always leaves the engine idle; it never restarts.
    pub fn update_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.target = self.text.chars().collect();
        self.reset();
    }

    // ---- driving ----

    /// Run every timer that is due on the engine's clock.
    pub fn poll(&mut self) {
        loop {
            let now = self.now();
            let Some((id, timer)) = self.timers.pop_due(now) else {
                break;
            };

            match timer {
                Timer::Step(step) => {
                    if self.step == Some(id) {
                        self.step = None;
                    }
                    self.run_step(step);
                }
                Timer::Realize(idx) => {
                    self.realizations.remove(&idx);
                    self.realize(idx);
                }
            }
        }
    }

    /// When the next timer is due, in clock milliseconds.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_due_ms()
    }

    // ---- getters ----

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn display_text(&self) -> String {
        self.produced.iter().collect()
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Percent of the text typed. Only reaches 100 once the run has completed.
    pub fn progress(&self) -> f64 {
        if self.target.is_empty() || self.state == SimulationState::Completed {
            return 100.0;
        }
        let raw = self.cursor as f64 / self.target.len() as f64 * 100.0;
        raw.min(PROGRESS_CEILING)
    }

    pub fn stats(&self) -> TypingStats {
        let mut stats = self.stats.clone();
        stats.total_duration_ms = self.total_duration();
        stats.wpm = words_per_minute(stats.chars_typed, stats.total_duration_ms);
        stats
    }

    pub fn mistakes(&self) -> &[MistakeRecord] {
        &self.mistakes
    }

    pub fn uncorrected_mistakes(&self) -> Vec<&MistakeRecord> {
        self.mistakes.iter().filter(|m| !m.corrected).collect()
    }

    pub fn events(&self) -> &[TypingEvent] {
        &self.events
    }

    pub fn current_index(&self) -> usize {
        self.cursor
    }

    pub fn is_completed(&self) -> bool {
        self.state == SimulationState::Completed
    }

    pub fn is_typing(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_paused(&self) -> bool {
        self.state == SimulationState::Paused
    }

    /// Active milliseconds since `start()`, excluding every paused interval.
    pub fn total_duration(&self) -> u64 {
        let Some(start) = self.stats.start_time_ms else {
            return 0;
        };
        let end = self.stats.end_time_ms.unwrap_or_else(|| self.now());

        let mut paused = self.stats.paused_ms;
        if let Some(paused_at) = self.paused_at {
            paused += end.saturating_sub(paused_at);
        }

        end.saturating_sub(start).saturating_sub(paused)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ---- scheduling internals ----

    fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    fn schedule_step(&mut self, step: Step, delay_ms: u64) {
        self.cancel_step();
        let now = self.now();
        self.step = Some(self.timers.schedule(now, delay_ms, Timer::Step(step)));
    }

    fn cancel_step(&mut self) {
        if let Some(id) = self.step.take() {
            self.timers.cancel(id);
        }
    }

    fn arm_realization(&mut self, idx: usize, delay_ms: u64) {
        let now = self.now();
        let id = self.timers.schedule(now, delay_ms, Timer::Realize(idx));
        if let Some(old) = self.realizations.insert(idx, id) {
            self.timers.cancel(old);
        }
    }

    fn disarm_realization(&mut self, idx: usize) {
        if let Some(id) = self.realizations.remove(&idx) {
            self.timers.cancel(id);
        }
    }

    fn cancel_all_timers(&mut self) {
        self.timers.clear();
        self.step = None;
        self.realizations.clear();
        self.frozen_realizations.clear();
    }

    /// Shared by `stop` and `reset`: cancel everything and abandon outstanding work.
    fn halt(&mut self) {
        self.cancel_all_timers();

        if let Some(paused_at) = self.paused_at.take() {
            let now = self.now();
            self.stats.paused_ms += now.saturating_sub(paused_at);
        }

        // A correction cut short may already have erased its mistake.
        let produced = self.produced.len();
        for record in &mut self.mistakes {
            if record.corrected {
                continue;
            }
            record.realized = true;
            if record.position >= produced {
                record.corrected = true;
                self.stats.mistakes_corrected += 1;
            }
        }
        self.queue.clear();
        self.active = None;
        self.lapse_taken = false;
    }

    fn run_step(&mut self, step: Step) {
        match step {
            Step::TypeNext => self.type_next(),
            Step::Commit => self.commit(),
            Step::ResumeAfterLapse => {
                self.set_state(SimulationState::Typing);
                self.type_next();
            }
            Step::Backspace => self.backspace_step(),
            Step::FinishCorrection => self.finish_correction(),
            Step::Retype => self.retype(),
            Step::CompletionCheck => self.try_complete(),
        }
    }

    fn type_next(&mut self) {
        if !matches!(
            self.state,
            SimulationState::Typing | SimulationState::Thinking
        ) {
            return;
        }
        if self.cursor >= self.target.len() {
            self.try_complete();
            return;
        }

        if self.config.concentration_lapses
            && !self.lapse_taken
            && self.rng.gen_bool(LAPSE_PROBABILITY)
        {
            self.lapse_taken = true;
            self.set_state(SimulationState::Thinking);
            let pause = (self.config.thinking_pause_ms * LAPSE_PAUSE_FACTOR).round() as u64;
            log::debug!("concentration lapse at {} for {pause}ms", self.cursor);
            self.schedule_step(Step::ResumeAfterLapse, pause);
            return;
        }

        let ctx = DelayContext {
            chars: &self.target,
            index: self.cursor,
            prev_hand: self.prev_hand,
            fatigue_ms: self.fatigue_ms,
        };
        let delay = character_delay_ms(&ctx, &self.config, &mut self.rng);
        self.schedule_step(Step::Commit, delay);
    }

    fn commit(&mut self) {
        let index = self.cursor;
        let Some(&expected) = self.target.get(index) else {
            self.try_complete();
            return;
        };
        self.lapse_taken = false;

        let look_ahead = look_ahead_fires(&self.target, index, &mut self.rng);
        let wrong = if should_make_mistake(
            &self.target,
            index,
            &self.config,
            look_ahead,
            &mut self.rng,
        ) {
            let kind = select_mistake_type(&self.config, look_ahead, &mut self.rng);
            generate_mistake_char(kind, &self.target, index, &mut self.rng).map(|c| (kind, c))
        } else {
            None
        };

        match wrong {
            Some((kind, c)) => self.commit_mistake(kind, expected, c),
            None => self.commit_char(expected),
        }

        if self.config.fatigue {
            self.fatigue_ms += FATIGUE_STEP_MS;
        }

        self.type_next();
    }

    /// Append `c` to the produced text and advance the cursor past it.
    fn commit_char(&mut self, c: char) {
        let position = self.produced.len();
        self.produced.push(c);
        self.cursor = self.produced.len();
        self.prev_hand = hand_for_char(c);
        self.stats.chars_typed += 1;

        log::trace!("commit {c:?} at {position}");
        self.record(EventKind::Character { ch: c, position });
        self.listeners.character(self.config.debug, c, position);
        self.notify_progress();
    }

    fn commit_mistake(&mut self, kind: MistakeKind, original: char, substituted: char) {
        let position = self.produced.len();
        let delay = realization_delay_ms(&self.config, &mut self.rng);

        self.commit_char(substituted);

        self.mistakes.push(MistakeRecord {
            kind,
            original,
            substituted,
            position,
            corrected: false,
            realization_delay_ms: delay,
            realized: false,
        });
        let idx = self.mistakes.len() - 1;
        self.stats.mistakes_made += 1;

        log::debug!("{kind:?} mistake at {position}: {original:?} -> {substituted:?}");
        self.record(EventKind::Mistake {
            kind,
            position,
            original,
            substituted,
        });
        self.listeners.mistake(self.config.debug, &self.mistakes[idx]);

        self.arm_realization(idx, delay);
    }

    /// Finish the run if the text is fully typed and every mistake is fixed.
    fn try_complete(&mut self) {
        if self.state == SimulationState::Completed
            || self.cursor < self.target.len()
            || self.active.is_some()
        {
            return;
        }
        if self.process_queue() {
            return;
        }

        // Mistakes abandoned by `stop` have no timer left to surface them.
        let stranded: Vec<usize> = self
            .mistakes
            .iter()
            .enumerate()
            .filter(|(idx, m)| !m.corrected && !self.realizations.contains_key(idx))
            .map(|(idx, _)| idx)
            .collect();
        if !stranded.is_empty() {
            for idx in stranded {
                self.mistakes[idx].realized = true;
                self.queue.push(idx);
            }
            if self.process_queue() {
                return;
            }
        }

        if self.mistakes.iter().any(|m| !m.corrected) {
            self.schedule_step(Step::CompletionCheck, COMPLETION_RECHECK_MS);
            return;
        }

        self.complete();
    }

    fn complete(&mut self) {
        if self.state == SimulationState::Completed {
            return;
        }

        self.cancel_all_timers();
        self.queue.clear();
        self.active = None;

        let now = self.now();
        if let Some(paused_at) = self.paused_at.take() {
            self.stats.paused_ms += now.saturating_sub(paused_at);
        }
        self.stats.end_time_ms = Some(now);
        self.stats.total_duration_ms = self.total_duration();
        self.stats.wpm = words_per_minute(self.stats.chars_typed, self.stats.total_duration_ms);

        self.set_state(SimulationState::Completed);
        log::debug!(
            "completed: {} chars, {} mistakes, {:.1} wpm",
            self.stats.chars_typed,
            self.stats.mistakes_made,
            self.stats.wpm
        );
        self.record(EventKind::Completed);
        self.notify_progress();
        self.listeners.complete(self.config.debug, &self.stats);
    }

    fn set_state(&mut self, state: SimulationState) {
        if self.state == state {
            return;
        }
        log::debug!("state {:?} -> {state:?}", self.state);
        self.state = state;
        self.record(EventKind::StateChanged { state });
        self.listeners.state(self.config.debug, state);
    }

    fn record(&mut self, kind: EventKind) {
        let at_ms = self.now();
        self.events.push(TypingEvent { at_ms, kind });
    }

    fn notify_progress(&mut self) {
        let progress = self.progress();
        if self.state.is_active() || self.state == SimulationState::Completed {
            self.stats.total_duration_ms = self.total_duration();
            self.stats.wpm =
                words_per_minute(self.stats.chars_typed, self.stats.total_duration_ms);
        }
        self.listeners.progress(self.config.debug, progress);
    }
}

impl TypingEngine<ManualClock> {
    /// Move the manual clock forward by `ms`, firing every timer on the way.
    pub fn advance_by(&mut self, ms: u64) {
        let target = self.clock.now_ms().saturating_add(ms);
        while let Some(due) = self.next_deadline() {
            if due > target {
                break;
            }
            if due > self.clock.now_ms() {
                self.clock.set(due);
            }
            self.poll();
        }
        self.clock.set(target);
        self.poll();
    }

    /// Jump from deadline to deadline until the run completes or `limit_ms` of
    /// clock time has passed. Returns whether the run completed.
    pub fn run_until_complete(&mut self, limit_ms: u64) -> bool {
        let deadline = self.clock.now_ms().saturating_add(limit_ms);
        loop {
            self.poll();
            if self.is_completed() {
                return true;
            }
            match self.next_deadline() {
                Some(due) if due <= deadline => {
                    if due > self.clock.now_ms() {
                        self.clock.set(due);
                    }
                }
                _ => return false,
            }
        }
    }
}

fn words_per_minute(chars: usize, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 0.0;
    }
    let minutes = duration_ms as f64 / 60_000.0;
    (chars as f64 / 5.0) / minutes
}
