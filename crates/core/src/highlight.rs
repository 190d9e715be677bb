use crate::models::Paragraph;
use crate::patterns::compile;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::ops::Range;
use tracing::debug;

fn term_regex(term: &str) -> Option<Regex> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    match compile(&regex::escape(term)) {
        Ok(regex) => Some(regex),
        Err(error) => {
            debug!(%error, "highlight term did not compile");
            None
        }
    }
}

pub fn highlight_spans(text: &str, term: &str) -> Vec<Range<usize>> {
    term_regex(term)
        .map(|regex| regex.find_iter(text).map(|found| found.range()).collect())
        .unwrap_or_default()
}

pub fn count_occurrences(text: &str, term: &str) -> usize {
    term_regex(term).map_or(0, |regex| regex.find_iter(text).count())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighter {
    pub open: String,
    pub close: String,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new("<mark>", "</mark>")
    }
}

impl Highlighter {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Wraps all occurrences, not only the first. Text without an occurrence
    /// comes back borrowed and unchanged.
    pub fn apply<'t>(&self, text: &'t str, term: &str) -> Cow<'t, str> {
        match term_regex(term) {
            Some(regex) => regex.replace_all(text, |captures: &Captures| {
                format!("{}{}{}", self.open, &captures[0], self.close)
            }),
            None => Cow::Borrowed(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub paragraph_id: u32,
    pub range: Range<usize>,
}

pub fn find_in_document<'a, I>(paragraphs: I, query: &str) -> Vec<Occurrence>
where
    I: IntoIterator<Item = &'a Paragraph>,
{
    let Some(regex) = term_regex(query) else {
        return Vec::new();
    };

    paragraphs
        .into_iter()
        .flat_map(|paragraph| {
            regex
                .find_iter(&paragraph.content)
                .map(|found| Occurrence {
                    paragraph_id: paragraph.id,
                    range: found.range(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindCursor {
    occurrences: Vec<Occurrence>,
    current: usize,
}

impl FindCursor {
    pub fn new(occurrences: Vec<Occurrence>) -> Self {
        Self {
            occurrences,
            current: 0,
        }
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    pub fn total(&self) -> usize {
        self.occurrences.len()
    }

    /// 1-based; 0 when there is nothing to navigate.
    pub fn position(&self) -> usize {
        if self.occurrences.is_empty() {
            0
        } else {
            self.current + 1
        }
    }

    pub fn current(&self) -> Option<&Occurrence> {
        self.occurrences.get(self.current)
    }

    pub fn next(&mut self) -> Option<&Occurrence> {
        if self.occurrences.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.occurrences.len();
        self.current()
    }

    pub fn previous(&mut self) -> Option<&Occurrence> {
        if self.occurrences.is_empty() {
            return None;
        }
        self.current = self
            .current
            .checked_sub(1)
            .unwrap_or(self.occurrences.len() - 1);
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::number_paragraphs;

    #[test]
    fn every_occurrence_is_wrapped() {
        let highlighter = Highlighter::default();
        let out = highlighter.apply("Grace upon grace, GRACE!", "grace");
        assert_eq!(
            out,
            "<mark>Grace</mark> upon <mark>grace</mark>, <mark>GRACE</mark>!"
        );
    }

    #[test]
    fn text_without_the_term_is_unchanged() {
        let highlighter = Highlighter::new("[", "]");
        let text = "nothing to see here";
        let out = highlighter.apply(text, "mercy");
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, text);
        assert_eq!(highlighter.apply(text, "   "), text);
    }

    #[test]
    fn metacharacters_highlight_literally() {
        let highlighter = Highlighter::new("[", "]");
        assert_eq!(highlighter.apply("see (1 John 5:7)", "(1 john"), "see [(1 John] 5:7)");
    }

    #[test]
    fn spans_and_counts_agree() {
        let spans = highlight_spans("Amen, amen, AMEN", "amen");
        assert_eq!(spans, vec![0..4, 6..10, 12..16]);
        assert_eq!(count_occurrences("Amen, amen, AMEN", "amen"), 3);
        assert_eq!(count_occurrences("Amen", ""), 0);
    }

    #[test]
    fn find_reports_paragraph_and_range() {
        let paragraphs = number_paragraphs(vec![
            "the seven seals".to_string(),
            "nothing".to_string(),
            "Seven thunders and seven vials".to_string(),
        ]);
        let found = find_in_document(&paragraphs, "seven");
        let located = found
            .iter()
            .map(|o| (o.paragraph_id, o.range.clone()))
            .collect::<Vec<_>>();
        assert_eq!(located, vec![(1, 4..9), (3, 0..5), (3, 19..24)]);
    }

    #[test]
    fn cursor_wraps_both_ways() {
        let paragraphs = number_paragraphs(vec!["a b a b a".to_string()]);
        let mut cursor = FindCursor::new(find_in_document(&paragraphs, "a"));
        assert_eq!(cursor.total(), 3);
        assert_eq!(cursor.position(), 1);
        cursor.next();
        cursor.next();
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.next().map(|o| o.range.start), Some(0));
        assert_eq!(cursor.previous().map(|o| o.range.start), Some(8));
    }

    #[test]
    fn empty_cursor_has_no_position() {
        let mut cursor = FindCursor::new(Vec::new());
        assert_eq!(cursor.position(), 0);
        assert!(cursor.next().is_none());
        assert!(cursor.previous().is_none());
    }
}
