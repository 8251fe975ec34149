use std::ops::Range;

pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '’'
}

/// Range of the word containing `index`, or `None` when `index` is not on a word
/// character.
///
/// Word characters are letters, digits and apostrophes, so "don't" is one word.
pub fn word_at(buf: &[char], index: usize) -> Option<Range<usize>> {
    if index >= buf.len() || !is_word_char(buf[index]) {
        return None;
    }

    let mut start = index;
    while start > 0 && is_word_char(buf[start - 1]) {
        start -= 1;
    }

    let mut end = index + 1;
    while end < buf.len() && is_word_char(buf[end]) {
        end += 1;
    }

    Some(start..end)
}

/// The next word that starts at or after `from`, skipping whitespace and
/// punctuation in between.
pub fn word_after(buf: &[char], from: usize) -> Option<Range<usize>> {
    let mut idx = from;
    while idx < buf.len() && !is_word_char(buf[idx]) {
        if buf[idx] == '\n' {
            return None;
        }
        idx += 1;
    }
    word_at(buf, idx)
}

pub fn collect(buf: &[char], range: Range<usize>) -> String {
    buf[range].iter().collect()
}
