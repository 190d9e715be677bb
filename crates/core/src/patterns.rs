use crate::error::SearchError;
use crate::segmenter::normalize_whitespace;
use regex::{Regex, RegexBuilder};
use tracing::debug;

const SINGLE_QUOTES: &str = "['\u{2018}\u{2019}\u{201B}]";
const DOUBLE_QUOTES: &str = "[\"\u{201C}\u{201D}\u{201E}]";
const FLEXIBLE_GAP: &str = r"\p{P}*\s+\p{P}*";

pub fn normalize_query(query: &str) -> String {
    normalize_whitespace(query)
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201B}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' => '"',
            other => other,
        })
        .collect()
}

pub fn strip_punctuation(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    normalize_whitespace(&kept)
}

fn quote_tolerant_literal(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match c {
            '\'' => pattern.push_str(SINGLE_QUOTES),
            '"' => pattern.push_str(DOUBLE_QUOTES),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern
}

pub(crate) fn compile(pattern: &str) -> Result<Regex, SearchError> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

/// Ordered fallback matchers tried when a plain substring search misses.
#[derive(Debug, Clone)]
pub struct FallbackPatterns {
    patterns: Vec<Regex>,
}

impl FallbackPatterns {
    pub fn build(query: &str) -> Self {
        let normalized = normalize_query(query);
        let stripped = strip_punctuation(&normalized);

        let flexible = stripped
            .split(' ')
            .filter(|word| !word.is_empty())
            .map(|word| regex::escape(word))
            .collect::<Vec<_>>()
            .join(FLEXIBLE_GAP);

        let candidates = [
            quote_tolerant_literal(&normalized),
            quote_tolerant_literal(&stripped),
            flexible,
        ];

        let mut sources: Vec<String> = Vec::new();
        let mut patterns = Vec::new();
        for candidate in candidates {
            if candidate.is_empty() || sources.contains(&candidate) {
                continue;
            }
            match compile(&candidate) {
                Ok(regex) => {
                    sources.push(candidate);
                    patterns.push(regex);
                }
                Err(error) => debug!(pattern = %candidate, %error, "skipping fallback pattern"),
            }
        }

        if patterns.is_empty() && !query.trim().is_empty() {
            match compile(&regex::escape(query.trim())) {
                Ok(regex) => patterns.push(regex),
                Err(error) => debug!(%error, "literal fallback pattern failed"),
            }
        }

        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// First pattern, in order, that matches wins.
    pub fn find<'h>(&self, haystack: &'h str) -> Option<regex::Match<'h>> {
        self.patterns
            .iter()
            .find_map(|pattern| pattern.find(haystack))
    }
}
