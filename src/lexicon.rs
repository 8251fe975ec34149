//! Static lookup tables consulted by the delay and mistake models.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SymbolTier {
    Low,
    Medium,
    High,
}

pub fn symbol_tier(c: char) -> Option<SymbolTier> {
    let tier = match c {
        '.' | ',' | '\'' | '-' => SymbolTier::Low,
        ';' | ':' | '"' | '!' | '?' | '(' | ')' | '/' => SymbolTier::Medium,
        '@' | '#' | '$' | '%' | '^' | '&' | '*' | '_' | '+' | '=' | '[' | ']' | '{' | '}'
        | '|' | '\\' | '<' | '>' | '~' | '`' => SymbolTier::High,
        _ => return None,
    };
    Some(tier)
}

/// Relative frequency of a letter in English text, in percent.
pub fn letter_frequency(c: char) -> Option<f64> {
    let pct = match c.to_ascii_lowercase() {
        'e' => 12.7,
        't' => 9.1,
        'a' => 8.2,
        'o' => 7.5,
        'i' => 7.0,
        'n' => 6.7,
        's' => 6.3,
        'h' => 6.1,
        'r' => 6.0,
        'd' => 4.3,
        'l' => 4.0,
        'c' => 2.8,
        'u' => 2.8,
        'm' => 2.4,
        'w' => 2.4,
        'f' => 2.2,
        'g' => 2.0,
        'y' => 2.0,
        'p' => 1.9,
        'b' => 1.5,
        'v' => 0.98,
        'k' => 0.77,
        'j' => 0.15,
        'x' => 0.15,
        'q' => 0.095,
        'z' => 0.074,
        _ => return None,
    };
    Some(pct)
}

pub fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

const COMMON_WORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "also", "an", "and", "any", "are", "as", "at", "back",
    "be", "because", "been", "before", "but", "by", "can", "come", "could", "day", "did", "do",
    "down", "even", "first", "for", "from", "get", "give", "go", "good", "had", "has", "have",
    "he", "her", "here", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just",
    "know", "like", "little", "look", "make", "many", "me", "more", "most", "my", "new", "no",
    "not", "now", "of", "on", "one", "only", "or", "other", "our", "out", "over", "people",
    "said", "say", "see", "she", "so", "some", "take", "than", "that", "the", "their", "them",
    "then", "there", "these", "they", "thing", "think", "this", "time", "to", "two", "up", "us",
    "use", "very", "was", "way", "we", "well", "were", "what", "when", "which", "who", "will",
    "with", "work", "would", "year", "you", "your",
];

pub fn is_common_word(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    COMMON_WORDS.contains(&lower.as_str())
}

/// A word that takes a beat of thought before typing it.
pub fn is_complex_word(word: &str) -> bool {
    word.chars().count() > 7 || !is_common_word(word)
}

/// Known misspelling for a lowercase word, aligned character-for-character
/// where possible.
pub fn common_typo(word_lower: &str) -> Option<&'static str> {
    let typo = match word_lower {
        "the" => "teh",
        "and" => "adn",
        "that" => "taht",
        "with" => "wiht",
        "have" => "ahve",
        "from" => "form",
        "their" => "thier",
        "which" => "whcih",
        "would" => "woudl",
        "about" => "abotu",
        "there" => "tehre",
        "what" => "waht",
        "because" => "becuase",
        "receive" => "recieve",
        "believe" => "beleive",
        "friend" => "freind",
        "just" => "jsut",
        "know" => "konw",
        "people" => "poeple",
        "really" => "realyl",
        "when" => "wehn",
        "your" => "yoru",
        "should" => "shoudl",
        "could" => "cuold",
        "thing" => "thign",
        "think" => "thnik",
        "going" => "giong",
        "typing" => "tpying",
        "world" => "wrold",
        "other" => "otehr",
        _ => return None,
    };
    Some(typo)
}

pub const WORD_ENDING_FRAGMENTS: &[&str] = &["ing", "tion", "ly", "ment", "ness", "ed", "able"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typo_table_keeps_word_length() {
        for word in ["the", "because", "receive", "people", "typing"] {
            let typo = common_typo(word).expect("word is in the table");
            assert_eq!(typo.len(), word.len(), "{word} -> {typo}");
        }
    }

    #[test]
    fn complexity_checks() {
        assert!(!is_complex_word("The"));
        assert!(is_complex_word("xylophone"));
        assert!(is_complex_word("zebra"));
    }

    #[test]
    fn symbol_tiers_are_ordered() {
        assert_eq!(symbol_tier(','), Some(SymbolTier::Low));
        assert_eq!(symbol_tier('?'), Some(SymbolTier::Medium));
        assert_eq!(symbol_tier('{'), Some(SymbolTier::High));
        assert_eq!(symbol_tier('a'), None);
        assert!(SymbolTier::High > SymbolTier::Low);
    }
}
