//! Lexical analysis: splitting command text into whitespace-delimited words.
//!
//! There is no quoting or escaping, so a word is simply a maximal run of
//! non-whitespace characters.

/// Characters that separate words.
///
/// This is wider than [`char::is_ascii_whitespace`], which does not treat the
/// vertical tab (`\x0B`) as whitespace.
pub const WHITESPACE: [char; 6] = [' ', '\t', '\n', '\x0B', '\x0C', '\r'];

/// Returns `true` if `c` belongs to the word separator class.
pub fn is_whitespace(c: char) -> bool {
    WHITESPACE.contains(&c)
}

/// Returns `true` if `text` holds nothing but separators (or nothing at all).
pub fn is_blank(text: &str) -> bool {
    text.chars().all(is_whitespace)
}

/// Lazy iterator over the words of a string.
///
/// Created by [`tokens`]. Yields borrowed slices of the input in order and
/// never yields an empty word.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let start = self.rest.find(|c: char| !is_whitespace(c))?;
        let word = &self.rest[start..];
        let end = word.find(is_whitespace).unwrap_or(word.len());
        self.rest = &word[end..];
        Some(&word[..end])
    }
}

/// Iterate over the words of `text`.
pub fn tokens(text: &str) -> Tokens<'_> {
    Tokens { rest: text }
}

/// The main entry point to perform lexical analysis.
///
/// # Returns
/// The ordered words of `line`. A line made only of separators yields an
/// empty vector.
pub fn split_into_tokens(line: &str) -> Vec<&str> {
    tokens(line).collect()
}

/// First word of `text`, if any.
pub fn first_token(text: &str) -> Option<&str> {
    tokens(text).next()
}
