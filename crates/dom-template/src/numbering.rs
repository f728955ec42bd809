/*
 * numbering.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Numbering formatters and the numbering index stack.
//!
//! A numbering pattern is free text with placeholder tokens:
//!
//! | token | output for 1, 2, 3, 27 |
//! |-------|------------------------|
//! | `%n`  | 1, 2, 3, 27            |
//! | `%i`  | i, ii, iii, xxvii      |
//! | `%I`  | I, II, III, XXVII      |
//! | `%s`  | a, b, c, aa            |
//! | `%S`  | A, B, C, AA            |
//!
//! `%%` is a literal percent sign and a trailing `%` is kept verbatim. When a
//! pattern has several tokens, the rightmost one reads the innermost ordered
//! container counter, the one before it the enclosing counter, and so on.

use thiserror::Error;

/// Errors raised while composing a numbering string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberingError {
    #[error("Invalid numbering format code `%{0}`.")]
    InvalidFormatCode(char),

    #[error("Numbering requires an active ordered list or ordered map.")]
    NoActiveCounter,

    #[error("Numbering is not allowed inside an unordered list or map.")]
    UnorderedContainer,

    #[error("Numbering pattern needs {needed} counters but only {available} are active.")]
    NotEnoughCounters { needed: usize, available: usize },
}

/// Textual representation of a 1-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberingFormat {
    Arabic,
    LowerRoman,
    UpperRoman,
    LowerAlpha,
    UpperAlpha,
}

const ROMAN_NUMERALS: [(usize, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

impl NumberingFormat {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'n' => Some(NumberingFormat::Arabic),
            'i' => Some(NumberingFormat::LowerRoman),
            'I' => Some(NumberingFormat::UpperRoman),
            's' => Some(NumberingFormat::LowerAlpha),
            'S' => Some(NumberingFormat::UpperAlpha),
            _ => None,
        }
    }

    pub fn format(self, index: usize) -> String {
        match self {
            NumberingFormat::Arabic => index.to_string(),
            NumberingFormat::UpperRoman => roman(index),
            NumberingFormat::LowerRoman => roman(index).to_lowercase(),
            NumberingFormat::UpperAlpha => alpha(index),
            NumberingFormat::LowerAlpha => alpha(index).to_lowercase(),
        }
    }
}

fn roman(mut index: usize) -> String {
    let mut s = String::new();
    for (value, numeral) in ROMAN_NUMERALS {
        while index >= value {
            s.push_str(numeral);
            index -= value;
        }
    }
    s
}

/// Letters repeat past `Z`: 26 is `Z`, 27 is `AA`, 53 is `AAA`.
fn alpha(index: usize) -> String {
    if index == 0 {
        return String::new();
    }
    let index = index - 1;
    let letter = char::from(ALPHABET[index % ALPHABET.len()]);
    std::iter::repeat_n(letter, index / ALPHABET.len() + 1).collect()
}

enum Segment<'p> {
    Text(&'p str),
    Percent,
    Token(NumberingFormat),
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment<'_>>, NumberingError> {
    let mut segments = Vec::new();
    let mut rest = pattern;
    while let Some(pos) = rest.find('%') {
        if pos > 0 {
            segments.push(Segment::Text(&rest[..pos]));
        }
        let after = &rest[pos + 1..];
        match after.chars().next() {
            None => {
                segments.push(Segment::Text("%"));
                rest = after;
            }
            Some('%') => {
                segments.push(Segment::Percent);
                rest = &after[1..];
            }
            Some(code) => {
                let format = NumberingFormat::from_code(code)
                    .ok_or(NumberingError::InvalidFormatCode(code))?;
                segments.push(Segment::Token(format));
                rest = &after[code.len_utf8()..];
            }
        }
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    Ok(segments)
}

/// Compose a numbering string.
///
/// `counters` lists the active ordered counters, outermost first; the last
/// counter feeds the rightmost token.
pub fn format_numbering(pattern: &str, counters: &[usize]) -> Result<String, NumberingError> {
    let segments = parse_pattern(pattern)?;
    let needed = segments
        .iter()
        .filter(|s| matches!(s, Segment::Token(_)))
        .count();
    if needed > counters.len() {
        return Err(NumberingError::NotEnoughCounters {
            needed,
            available: counters.len(),
        });
    }

    let mut counters = counters[counters.len() - needed..].iter();
    let mut out = String::with_capacity(pattern.len() + needed * 2);
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Percent => out.push('%'),
            Segment::Token(format) => {
                if let Some(&index) = counters.next() {
                    out.push_str(&format.format(index));
                }
            }
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Ordered(usize),
    Unordered,
}

/// One level per active list or map nesting.
///
/// Ordered containers push a counter that is incremented per item; unordered
/// ones push a marker so numbering inside them can be rejected.
#[derive(Debug, Default, Clone)]
pub struct IndexStack {
    levels: Vec<Level>,
}

impl IndexStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ordered(&mut self) {
        self.levels.push(Level::Ordered(0));
    }

    pub fn push_unordered(&mut self) {
        self.levels.push(Level::Unordered);
    }

    pub fn pop(&mut self) {
        self.levels.pop();
    }

    /// Advance the innermost counter. No-op on an unordered level.
    pub fn increment(&mut self) {
        if let Some(Level::Ordered(count)) = self.levels.last_mut() {
            *count += 1;
        }
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Active ordered counters, outermost first.
    ///
    /// The innermost level must be ordered; unordered levels further out
    /// are skipped.
    pub fn counters(&self) -> Result<Vec<usize>, NumberingError> {
        match self.levels.last() {
            None => Err(NumberingError::NoActiveCounter),
            Some(Level::Unordered) => Err(NumberingError::UnorderedContainer),
            Some(Level::Ordered(_)) => Ok(self
                .levels
                .iter()
                .filter_map(|level| match level {
                    Level::Ordered(count) => Some(*count),
                    Level::Unordered => None,
                })
                .collect()),
        }
    }

    pub fn format(&self, pattern: &str) -> Result<String, NumberingError> {
        format_numbering(pattern, &self.counters()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roman() {
        let upper: Vec<String> = (1..=5).map(|i| NumberingFormat::UpperRoman.format(i)).collect();
        assert_eq!(upper, vec!["I", "II", "III", "IV", "V"]);
        assert_eq!(NumberingFormat::UpperRoman.format(1994), "MCMXCIV");
        assert_eq!(NumberingFormat::LowerRoman.format(49), "xlix");
    }

    #[test]
    fn test_alpha_repeats_letters() {
        assert_eq!(NumberingFormat::LowerAlpha.format(1), "a");
        assert_eq!(NumberingFormat::LowerAlpha.format(26), "z");
        assert_eq!(NumberingFormat::LowerAlpha.format(27), "aa");
        assert_eq!(NumberingFormat::LowerAlpha.format(28), "bb");
        assert_eq!(NumberingFormat::UpperAlpha.format(53), "AAA");
    }

    #[test]
    fn test_pattern_composition() {
        assert_eq!(format_numbering("%I.%S", &[2, 1]).unwrap(), "II.A");
        assert_eq!(format_numbering("%n)", &[7]).unwrap(), "7)");
        assert_eq!(format_numbering("Chapter %n", &[1, 3]).unwrap(), "Chapter 3");
    }

    #[test]
    fn test_literal_percent() {
        assert_eq!(format_numbering("%n%%", &[40]).unwrap(), "40%");
        assert_eq!(format_numbering("%n %", &[4]).unwrap(), "4 %");
        assert_eq!(format_numbering("no tokens", &[]).unwrap(), "no tokens");
    }

    #[test]
    fn test_pattern_errors() {
        assert_eq!(
            format_numbering("%x", &[1]),
            Err(NumberingError::InvalidFormatCode('x'))
        );
        assert_eq!(
            format_numbering("%n.%n", &[1]),
            Err(NumberingError::NotEnoughCounters {
                needed: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_stack_levels() {
        let mut stack = IndexStack::new();
        assert_eq!(stack.counters(), Err(NumberingError::NoActiveCounter));

        stack.push_ordered();
        stack.increment();
        stack.increment();
        stack.push_unordered();
        assert_eq!(stack.counters(), Err(NumberingError::UnorderedContainer));

        stack.push_ordered();
        stack.increment();
        assert_eq!(stack.counters().unwrap(), vec![2, 1]);
        assert_eq!(stack.format("%n.%n").unwrap(), "2.1");

        stack.pop();
        stack.pop();
        stack.pop();
        assert_eq!(stack.depth(), 0);
    }
}
