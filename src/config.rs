use serde::{Deserialize, Serialize};

use crate::model::MistakeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MistakeKinds {
    pub adjacent_key: bool,
    pub double_char: bool,
    pub random_char: bool,
    pub common_typo: bool,
}

impl Default for MistakeKinds {
    fn default() -> Self {
        Self {
            adjacent_key: true,
            double_char: true,
            random_char: false,
            common_typo: true,
        }
    }
}

impl MistakeKinds {
    pub fn is_enabled(&self, kind: MistakeKind) -> bool {
        match kind {
            MistakeKind::AdjacentKey => self.adjacent_key,
            MistakeKind::DoubleChar => self.double_char,
            MistakeKind::RandomChar => self.random_char,
            MistakeKind::CommonTypo => self.common_typo,
        }
    }
}

/// Tuning knobs for a single simulation run. All durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Mean delay per character.
    pub base_speed_ms: f64,
    /// Uniform spread around `base_speed_ms`, as a fraction of it (0.3 = ±30%).
    pub speed_variance: f64,
    /// Probability of a mistake on an eligible character (0.0-1.0).
    pub mistake_frequency: f64,
    pub mistake_kinds: MistakeKinds,
    pub fatigue: bool,
    pub concentration_lapses: bool,
    pub over_correction: bool,
    pub sentence_pause_ms: f64,
    pub word_pause_ms: f64,
    pub thinking_pause_ms: f64,
    pub correction_pause_ms: f64,
    pub min_char_delay_ms: f64,
    pub backspace_interval_ms: f64,
    pub realization_delay_ms: f64,
    /// Log listener panics instead of swallowing them silently.
    pub debug: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            base_speed_ms: 90.0,
            speed_variance: 0.35,
            mistake_frequency: 0.03,
            mistake_kinds: MistakeKinds::default(),
            fatigue: true,
            concentration_lapses: true,
            over_correction: false,
            sentence_pause_ms: 450.0,
            word_pause_ms: 60.0,
            thinking_pause_ms: 320.0,
            correction_pause_ms: 180.0,
            min_char_delay_ms: 25.0,
            backspace_interval_ms: 70.0,
            realization_delay_ms: 450.0,
            debug: false,
        }
    }
}

/// Partial update merged into an existing config by [`SimulationConfig::merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub base_speed_ms: Option<f64>,
    pub speed_variance: Option<f64>,
    pub mistake_frequency: Option<f64>,
    pub mistake_kinds: Option<MistakeKinds>,
    pub fatigue: Option<bool>,
    pub concentration_lapses: Option<bool>,
    pub over_correction: Option<bool>,
    pub sentence_pause_ms: Option<f64>,
    pub word_pause_ms: Option<f64>,
    pub thinking_pause_ms: Option<f64>,
    pub correction_pause_ms: Option<f64>,
    pub min_char_delay_ms: Option<f64>,
    pub backspace_interval_ms: Option<f64>,
    pub realization_delay_ms: Option<f64>,
    pub debug: Option<bool>,
}

fn non_negative(value: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        fallback
    } else {
        value.max(0.0)
    }
}

impl SimulationConfig {
    /// Return a copy with every numeric field forced into a usable range.
    ///
    /// NaN and infinities fall back to the default value; negatives clamp to zero;
    /// probabilities clamp to `0.0..=1.0`.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        let variance = non_negative(self.speed_variance, d.speed_variance).min(1.0);
        let frequency = non_negative(self.mistake_frequency, d.mistake_frequency).min(1.0);

        Self {
            base_speed_ms: non_negative(self.base_speed_ms, d.base_speed_ms),
            speed_variance: variance,
            mistake_frequency: frequency,
            mistake_kinds: self.mistake_kinds,
            fatigue: self.fatigue,
            concentration_lapses: self.concentration_lapses,
            over_correction: self.over_correction,
            sentence_pause_ms: non_negative(self.sentence_pause_ms, d.sentence_pause_ms),
            word_pause_ms: non_negative(self.word_pause_ms, d.word_pause_ms),
            thinking_pause_ms: non_negative(self.thinking_pause_ms, d.thinking_pause_ms),
            correction_pause_ms: non_negative(self.correction_pause_ms, d.correction_pause_ms),
            min_char_delay_ms: non_negative(self.min_char_delay_ms, d.min_char_delay_ms),
            backspace_interval_ms: non_negative(
                self.backspace_interval_ms,
                d.backspace_interval_ms,
            ),
            realization_delay_ms: non_negative(self.realization_delay_ms, d.realization_delay_ms),
            debug: self.debug,
        }
    }

    /// Apply the `Some` fields of `update`, then sanitize.
    pub fn merge(&mut self, update: &ConfigUpdate) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = update.$field {
                    self.$field = v;
                })*
            };
        }

        take!(
            base_speed_ms,
            speed_variance,
            mistake_frequency,
            mistake_kinds,
            fatigue,
            concentration_lapses,
            over_correction,
            sentence_pause_ms,
            word_pause_ms,
            thinking_pause_ms,
            correction_pause_ms,
            min_char_delay_ms,
            backspace_interval_ms,
            realization_delay_ms,
            debug,
        );

        *self = self.sanitized();
    }

    /// A config that types every character at exactly `ms` with no randomness-driven
    /// pauses, lapses, fatigue or mistakes. Handy for deterministic runs.
    pub fn steady(ms: f64) -> Self {
        Self {
            base_speed_ms: ms,
            speed_variance: 0.0,
            mistake_frequency: 0.0,
            fatigue: false,
            concentration_lapses: false,
            over_correction: false,
            sentence_pause_ms: 0.0,
            word_pause_ms: 0.0,
            thinking_pause_ms: 0.0,
            min_char_delay_ms: 0.0,
            ..Default::default()
        }
    }
}
