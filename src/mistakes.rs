use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::SimulationConfig;
use crate::keyboard::{is_line_break, is_shifted_symbol, match_case, qwerty_adjacent_char};
use crate::lexicon::{common_typo, symbol_tier, SymbolTier, WORD_ENDING_FRAGMENTS};
use crate::model::MistakeKind;
use crate::word_nav::{collect, word_at};

const LOOK_AHEAD_PROBABILITY: f64 = 0.12;
pub const MIN_REALIZATION_DELAY_MS: u64 = 200;

const ALL_KINDS: [MistakeKind; 4] = [
    MistakeKind::AdjacentKey,
    MistakeKind::DoubleChar,
    MistakeKind::RandomChar,
    MistakeKind::CommonTypo,
];

/// True when `index` falls inside one of the common word-ending fragments.
pub fn near_word_ending(chars: &[char], index: usize) -> bool {
    WORD_ENDING_FRAGMENTS.iter().any(|fragment| {
        let frag: Vec<char> = fragment.chars().collect();
        let first = index.saturating_sub(frag.len() - 1);
        (first..=index).any(|start| {
            start + frag.len() <= chars.len()
                && chars[start..start + frag.len()]
                    .iter()
                    .zip(&frag)
                    .all(|(a, b)| a.to_ascii_lowercase() == *b)
        })
    })
}

/// Roll the look-ahead heuristic for `chars[index]`.
pub fn look_ahead_fires(chars: &[char], index: usize, rng: &mut impl Rng) -> bool {
    near_word_ending(chars, index) && rng.gen_bool(LOOK_AHEAD_PROBABILITY)
}

pub fn mistake_probability(c: char, cfg: &SimulationConfig, look_ahead: bool) -> f64 {
    let mut p = cfg.mistake_frequency;
    if c.is_ascii_digit() {
        p *= 1.5;
    }

    let tier = symbol_tier(c);
    if is_shifted_symbol(c) || tier.is_some() {
        p *= 1.2;
    }
    match tier {
        Some(SymbolTier::High) => p *= 1.3,
        Some(SymbolTier::Low) => p *= 0.5,
        _ => {}
    }

    if look_ahead {
        p *= 2.0;
    }

    p.clamp(0.0, 1.0)
}

pub fn should_make_mistake(
    chars: &[char],
    index: usize,
    cfg: &SimulationConfig,
    look_ahead: bool,
    rng: &mut impl Rng,
) -> bool {
    if index == 0 || cfg.mistake_frequency <= 0.0 {
        return false;
    }
    let Some(&c) = chars.get(index) else {
        return false;
    };
    if c == ' ' || is_line_break(c) {
        return false;
    }

    rng.gen_bool(mistake_probability(c, cfg, look_ahead))
}

fn kind_weight(kind: MistakeKind, look_ahead: bool) -> f64 {
    match (kind, look_ahead) {
        (MistakeKind::AdjacentKey, false) => 4.0,
        (MistakeKind::AdjacentKey, true) => 6.0,
        (MistakeKind::CommonTypo, false) => 2.0,
        (MistakeKind::CommonTypo, true) => 5.0,
        (MistakeKind::DoubleChar, _) => 1.5,
        (MistakeKind::RandomChar, _) => 1.0,
    }
}

pub fn select_mistake_type(
    cfg: &SimulationConfig,
    look_ahead: bool,
    rng: &mut impl Rng,
) -> MistakeKind {
    let enabled: Vec<MistakeKind> = ALL_KINDS
        .into_iter()
        .filter(|kind| cfg.mistake_kinds.is_enabled(*kind))
        .collect();

    let weights = enabled.iter().map(|kind| kind_weight(*kind, look_ahead));
    match WeightedIndex::new(weights) {
        Ok(dist) => enabled[dist.sample(rng)],
        Err(_) => MistakeKind::AdjacentKey,
    }
}

fn typo_char(chars: &[char], index: usize) -> Option<char> {
    let range = word_at(chars, index)?;
    let offset = index - range.start;
    let word = collect(chars, range).to_lowercase();
    let typo = common_typo(&word)?;
    typo.chars().nth(offset)
}

/// The wrong character to type in place of `chars[index]`, if one exists.
///
/// The result never equals the original and always shares its case.
/// `DoubleChar` strikes the previous key again in place of `chars[index]`, so
/// "the" becomes "thh"; there is no substitute when that key is the same letter.
pub fn generate_mistake_char(
    kind: MistakeKind,
    chars: &[char],
    index: usize,
    rng: &mut impl Rng,
) -> Option<char> {
    let original = *chars.get(index)?;

    let candidate = match kind {
        MistakeKind::AdjacentKey => qwerty_adjacent_char(original, rng),
        MistakeKind::DoubleChar => index
            .checked_sub(1)
            .and_then(|prev| chars.get(prev))
            .filter(|prev| prev.is_alphanumeric())
            .copied(),
        MistakeKind::RandomChar => Some(char::from(rng.gen_range(b'a'..=b'z'))),
        MistakeKind::CommonTypo => {
            typo_char(chars, index).or_else(|| qwerty_adjacent_char(original, rng))
        }
    };

    let produced = match_case(candidate?, original);
    (produced != original).then_some(produced)
}

/// Time until the typist notices a mistake.
pub fn realization_delay_ms(cfg: &SimulationConfig, rng: &mut impl Rng) -> u64 {
    let mean = cfg.realization_delay_ms;
    let jittered = match Normal::new(mean, (mean * 0.3).max(1.0)) {
        Ok(dist) => dist.sample(rng),
        Err(_) => mean,
    };
    (jittered.round().max(0.0) as u64).max(MIN_REALIZATION_DELAY_MS)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::config::MistakeKinds;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn never_on_first_char_space_or_newline() {
        let cfg = SimulationConfig {
            mistake_frequency: 1.0,
            ..Default::default()
        };
        let buf = chars("ab c\nd");
        let mut rng = StdRng::seed_from_u64(0);
        assert!(!should_make_mistake(&buf, 0, &cfg, false, &mut rng));
        assert!(should_make_mistake(&buf, 1, &cfg, false, &mut rng));
        assert!(!should_make_mistake(&buf, 2, &cfg, false, &mut rng));
        assert!(!should_make_mistake(&buf, 4, &cfg, false, &mut rng));
    }

    #[test]
    fn probability_scales_by_character_class() {
        let cfg = SimulationConfig {
            mistake_frequency: 0.1,
            ..Default::default()
        };
        let p = |c, look| mistake_probability(c, &cfg, look);
        assert!((p('a', false) - 0.1).abs() < 1e-9);
        assert!((p('7', false) - 0.15).abs() < 1e-9);
        assert!((p('.', false) - 0.06).abs() < 1e-9);
        assert!((p('#', false) - 0.1 * 1.2 * 1.3).abs() < 1e-9);
        assert!((p('a', true) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn fragments_are_detected_around_the_index() {
        let buf = chars("running fast");
        assert!(near_word_ending(&buf, 4));
        assert!(near_word_ending(&buf, 6));
        assert!(!near_word_ending(&buf, 9));
    }

    #[test]
    fn falls_back_to_adjacent_when_nothing_enabled() {
        let cfg = SimulationConfig {
            mistake_kinds: MistakeKinds {
                adjacent_key: false,
                double_char: false,
                random_char: false,
                common_typo: false,
            },
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(select_mistake_type(&cfg, true, &mut rng), MistakeKind::AdjacentKey);
    }

    #[test]
    fn only_enabled_kinds_are_selected() {
        let cfg = SimulationConfig {
            mistake_kinds: MistakeKinds {
                adjacent_key: false,
                double_char: false,
                random_char: true,
                common_typo: false,
            },
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            assert_eq!(select_mistake_type(&cfg, false, &mut rng), MistakeKind::RandomChar);
        }
    }

    #[test]
    fn common_typo_uses_dictionary_offset() {
        let buf = chars("see The cat");
        let mut rng = StdRng::seed_from_u64(2);
        // "the" -> "teh": offset 1 becomes 'e', offset 2 becomes 'h'.
        assert_eq!(
            generate_mistake_char(MistakeKind::CommonTypo, &buf, 5, &mut rng),
            Some('e')
        );
        assert_eq!(
            generate_mistake_char(MistakeKind::CommonTypo, &buf, 6, &mut rng),
            Some('h')
        );
    }

    #[test]
    fn substitutes_match_case_and_differ() {
        let buf = chars("xQ");
        let mut rng = StdRng::seed_from_u64(8);
        for kind in ALL_KINDS {
            for _ in 0..30 {
                if let Some(c) = generate_mistake_char(kind, &buf, 1, &mut rng) {
                    assert_ne!(c, 'Q');
                    assert!(c.is_uppercase() || !c.is_alphabetic(), "{kind:?} -> {c}");
                }
            }
        }
    }

    #[test]
    fn double_char_repeats_previous_key() {
        let buf = chars("ab");
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            generate_mistake_char(MistakeKind::DoubleChar, &buf, 1, &mut rng),
            Some('a')
        );
        let the = chars("the");
        assert_eq!(
            generate_mistake_char(MistakeKind::DoubleChar, &the, 2, &mut rng),
            Some('h')
        );
        assert_eq!(
            generate_mistake_char(MistakeKind::DoubleChar, &the, 0, &mut rng),
            None
        );
        let same = chars("aa");
        assert_eq!(
            generate_mistake_char(MistakeKind::DoubleChar, &same, 1, &mut rng),
            None
        );
    }

    #[test]
    fn realization_delay_has_a_floor() {
        let cfg = SimulationConfig {
            realization_delay_ms: 0.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            assert!(realization_delay_ms(&cfg, &mut rng) >= MIN_REALIZATION_DELAY_MS);
        }
    }
}
