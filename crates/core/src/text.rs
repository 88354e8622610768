//! Rules for building taglines word by word.

/// Characters that attach to the previous word without a space.
const LEADING_PUNCTUATION: [char; 4] = ['.', ',', '!', '?'];

/// Number of whitespace-separated words in `text`.
///
/// The empty string has zero words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// True if `word` begins with punctuation that attaches to the previous word.
pub fn is_leading_punctuation(word: &str) -> bool {
    word.trim_start()
        .chars()
        .next()
        .is_some_and(|c| LEADING_PUNCTUATION.contains(&c))
}

/// Append one word to a partial tagline.
///
/// Words are joined by a single space, except punctuation which attaches
/// directly (`"Build" + "."` is `"Build."`).
pub fn append_word(text: &str, word: &str) -> String {
    let word = word.trim();
    let text = text.trim_end();
    if text.is_empty() {
        return word.to_string();
    }
    if is_leading_punctuation(word) {
        format!("{text}{word}")
    } else {
        format!("{text} {word}")
    }
}

/// True if `word` is a single non-blank token.
pub fn is_single_word(word: &str) -> bool {
    let word = word.trim();
    !word.is_empty() && !word.contains(char::is_whitespace)
}
