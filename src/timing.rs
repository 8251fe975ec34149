use rand::Rng;

use crate::config::SimulationConfig;
use crate::keyboard::{hand_for_char, is_line_break, needs_shift, Hand};
use crate::lexicon::{is_complex_word, is_vowel, letter_frequency, symbol_tier, SymbolTier};
use crate::word_nav::{collect, word_after};

pub const SHIFT_COST_MS: f64 = 45.0;
pub const CAPS_ENGAGE_COST_MS: f64 = 110.0;
pub const CAPS_DISENGAGE_COST_MS: f64 = 70.0;
pub const DIGIT_COST_MS: f64 = 35.0;

const SPECIAL_CHAR_FACTOR: f64 = 1.1;
const VOWEL_FACTOR: f64 = 0.92;
const FREQUENCY_SCALE: f64 = 2.0;
const FREQUENCY_FLOOR: f64 = 0.78;
const HAND_ALTERNATION_FACTOR: f64 = 0.88;
const BURST_PROBABILITY: f64 = 0.06;
const BURST_FACTOR: f64 = 0.6;

/// Fatigue added per committed character when fatigue is enabled.
pub const FATIGUE_STEP_MS: f64 = 0.04;

/// Read-only view of what the delay model needs from the engine.
#[derive(Debug, Clone, Copy)]
pub struct DelayContext<'a> {
    pub chars: &'a [char],
    pub index: usize,
    pub prev_hand: Option<Hand>,
    pub fatigue_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapsRole {
    None,
    Engage,
    Hold,
    Release,
}

fn is_upper_letter(c: char) -> bool {
    c.is_alphabetic() && c.is_uppercase()
}

/// Where `chars[index]` sits within a caps-lock run.
///
/// A run is three or more uppercase letters; single spaces between uppercase
/// letters do not break it ("NEW YORK" is one run).
pub fn caps_role(chars: &[char], index: usize) -> CapsRole {
    if index >= chars.len() || !is_upper_letter(chars[index]) {
        return CapsRole::None;
    }

    let mut start = index;
    loop {
        if start >= 1 && is_upper_letter(chars[start - 1]) {
            start -= 1;
        } else if start >= 2 && chars[start - 1] == ' ' && is_upper_letter(chars[start - 2]) {
            start -= 2;
        } else {
            break;
        }
    }

    let mut end = index;
    loop {
        if end + 1 < chars.len() && is_upper_letter(chars[end + 1]) {
            end += 1;
        } else if end + 2 < chars.len() && chars[end + 1] == ' ' && is_upper_letter(chars[end + 2])
        {
            end += 2;
        } else {
            break;
        }
    }

    let letters = chars[start..=end]
        .iter()
        .filter(|c| is_upper_letter(**c))
        .count();
    if letters < 3 {
        return CapsRole::None;
    }

    if index == start {
        CapsRole::Engage
    } else if index == end {
        CapsRole::Release
    } else {
        CapsRole::Hold
    }
}

fn shift_cost_ms(chars: &[char], index: usize) -> f64 {
    match caps_role(chars, index) {
        CapsRole::Engage => CAPS_ENGAGE_COST_MS,
        CapsRole::Release => CAPS_DISENGAGE_COST_MS,
        CapsRole::Hold => 0.0,
        CapsRole::None if needs_shift(chars[index]) => SHIFT_COST_MS,
        CapsRole::None => 0.0,
    }
}

fn symbol_cost_ms(c: char) -> f64 {
    if c.is_ascii_digit() {
        return DIGIT_COST_MS;
    }
    match symbol_tier(c) {
        Some(SymbolTier::Low) => 12.0,
        Some(SymbolTier::Medium) => 30.0,
        Some(SymbolTier::High) => 55.0,
        None => 0.0,
    }
}

/// Pause appended after the keystroke itself: sentence, clause, paragraph, word.
pub fn boundary_pause_ms(chars: &[char], index: usize, cfg: &SimulationConfig) -> f64 {
    let c = chars[index];
    match c {
        '.' | '!' | '?' => cfg.sentence_pause_ms,
        ',' | ';' | ':' => cfg.sentence_pause_ms * 0.35,
        c if is_line_break(c) => cfg.sentence_pause_ms * 2.0,
        ' ' => {
            let upcoming = word_after(chars, index + 1).map(|range| collect(chars, range));
            match upcoming {
                Some(word) if is_complex_word(&word) => cfg.word_pause_ms + cfg.thinking_pause_ms,
                _ => cfg.word_pause_ms,
            }
        }
        _ => 0.0,
    }
}

/// Delay in milliseconds before `ctx.chars[ctx.index]` is committed.
///
/// Reads `ctx` only; fatigue and hand history are advanced by the caller.
pub fn character_delay_ms(ctx: &DelayContext<'_>, cfg: &SimulationConfig, rng: &mut impl Rng) -> u64 {
    let Some(&c) = ctx.chars.get(ctx.index) else {
        return cfg.min_char_delay_ms.round() as u64;
    };

    let spread = cfg.base_speed_ms * cfg.speed_variance;
    let mut delay = if spread > 0.0 {
        cfg.base_speed_ms + rng.gen_range(-spread..=spread)
    } else {
        cfg.base_speed_ms
    };

    delay += shift_cost_ms(ctx.chars, ctx.index);
    delay += symbol_cost_ms(c);

    if !c.is_alphanumeric() && !c.is_whitespace() {
        delay *= SPECIAL_CHAR_FACTOR;
    }
    if is_vowel(c) {
        delay *= VOWEL_FACTOR;
    }
    if let Some(pct) = letter_frequency(c) {
        delay *= (1.0 - pct / 100.0 * FREQUENCY_SCALE).max(FREQUENCY_FLOOR);
    }

    if let (Some(prev), Some(cur)) = (ctx.prev_hand, hand_for_char(c)) {
        if prev != cur {
            delay *= HAND_ALTERNATION_FACTOR;
        }
    }

    if cfg.fatigue {
        delay += ctx.fatigue_ms;
    }

    if rng.gen_bool(BURST_PROBABILITY) {
        delay *= BURST_FACTOR;
    }

    delay += boundary_pause_ms(ctx.chars, ctx.index, cfg);

    delay.max(cfg.min_char_delay_ms).max(0.0).round() as u64
}
