use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

// Touch-typing assignment on US-QWERTY.
const LEFT_HAND_KEYS: &str = "`12345qwertasdfgzxcvb~!@#$%";
const RIGHT_HAND_KEYS: &str = "67890-=yuiop[]\\hjkl;'nm,./^&*()_+{}|:\"<>?";

pub fn hand_for_char(c: char) -> Option<Hand> {
    let base = c.to_ascii_lowercase();
    if LEFT_HAND_KEYS.contains(base) {
        Some(Hand::Left)
    } else if RIGHT_HAND_KEYS.contains(base) {
        Some(Hand::Right)
    } else {
        None
    }
}

/// Punctuation that needs Shift on a US-QWERTY layout.
pub fn is_shifted_symbol(c: char) -> bool {
    matches!(
        c,
        '~' | '!'
            | '@'
            | '#'
            | '$'
            | '%'
            | '^'
            | '&'
            | '*'
            | '('
            | ')'
            | '_'
            | '+'
            | '{'
            | '}'
            | '|'
            | ':'
            | '"'
            | '<'
            | '>'
            | '?'
    )
}

pub fn needs_shift(c: char) -> bool {
    c.is_ascii_uppercase() || is_shifted_symbol(c)
}

pub fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r')
}

/// Force `c` into the case of `template`. Non-letters pass through.
pub fn match_case(c: char, template: char) -> char {
    if template.is_uppercase() {
        c.to_ascii_uppercase()
    } else if template.is_lowercase() {
        c.to_ascii_lowercase()
    } else {
        c
    }
}

fn adjacent_keys(base: char) -> &'static [char] {
    match base {
        'a' => &['q', 'w', 's', 'z'],
        'b' => &['v', 'g', 'h', 'n'],
        'c' => &['x', 'd', 'f', 'v'],
        'd' => &['s', 'e', 'r', 'f', 'c', 'x'],
        'e' => &['w', 's', 'd', 'r'],
        'f' => &['d', 'r', 't', 'g', 'v', 'c'],
        'g' => &['f', 't', 'y', 'h', 'b', 'v'],
        'h' => &['g', 'y', 'u', 'j', 'n', 'b'],
        'i' => &['u', 'j', 'k', 'o'],
        'j' => &['h', 'u', 'i', 'k', 'm', 'n'],
        'k' => &['j', 'i', 'o', 'l', 'm'],
        'l' => &['k', 'o', 'p'],
        'm' => &['n', 'j', 'k'],
        'n' => &['b', 'h', 'j', 'm'],
        'o' => &['i', 'k', 'l', 'p'],
        'p' => &['o', 'l'],
        'q' => &['w', 'a'],
        'r' => &['e', 'd', 'f', 't'],
        's' => &['a', 'w', 'e', 'd', 'x', 'z'],
        't' => &['r', 'f', 'g', 'y'],
        'u' => &['y', 'h', 'j', 'i'],
        'v' => &['c', 'f', 'g', 'b'],
        'w' => &['q', 'a', 's', 'e'],
        'x' => &['z', 's', 'd', 'c'],
        'y' => &['t', 'g', 'h', 'u'],
        'z' => &['a', 's', 'x'],
        '1' => &['2', 'q'],
        '2' => &['1', '3', 'q', 'w'],
        '3' => &['2', '4', 'w', 'e'],
        '4' => &['3', '5', 'e', 'r'],
        '5' => &['4', '6', 'r', 't'],
        '6' => &['5', '7', 't', 'y'],
        '7' => &['6', '8', 'y', 'u'],
        '8' => &['7', '9', 'u', 'i'],
        '9' => &['8', '0', 'i', 'o'],
        '0' => &['9', '-', 'o', 'p'],
        ',' => &['m', '.'],
        '.' => &[',', '/'],
        ';' => &['l', '\''],
        '\'' => &[';'],
        '-' => &['0', '='],
        _ => &[],
    }
}

/// Pick a random physical neighbor of `c`, in the same case as `c`.
pub fn qwerty_adjacent_char(c: char, rng: &mut impl Rng) -> Option<char> {
    let neighbors = adjacent_keys(c.to_ascii_lowercase());
    if neighbors.is_empty() {
        return None;
    }

    let chosen = neighbors[rng.gen_range(0..neighbors.len())];
    Some(match_case(chosen, c))
}
