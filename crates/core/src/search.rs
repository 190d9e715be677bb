use crate::config::{SearchOptions, SegmentationConfig};
use crate::models::{Document, DocumentMatches, MatchKind, Paragraph, SearchMatch, SearchOutcome};
use crate::patterns::FallbackPatterns;
use crate::segmenter::segment_transcript_with;
use std::collections::HashMap;
use std::ops::Range;

// Per character, so a final sigma lowers the same in queries and content.
pub(crate) fn lowercase_chars(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Lowercased copy of a string that remembers, for every lowered byte, the
/// original character it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LoweredText {
    lowered: String,
    origins: Vec<Range<usize>>,
}

impl LoweredText {
    fn new(original: &str) -> Self {
        let mut lowered = String::with_capacity(original.len());
        let mut origins = Vec::with_capacity(original.len());

        for (offset, c) in original.char_indices() {
            let source = offset..offset + c.len_utf8();
            for lower in c.to_lowercase() {
                lowered.push(lower);
                origins.resize(lowered.len(), source.clone());
            }
        }

        Self { lowered, origins }
    }

    // A hit ending inside a multi-char expansion covers the whole character.
    fn find(&self, lowered_needle: &str) -> Option<Range<usize>> {
        if lowered_needle.is_empty() {
            return None;
        }
        let start = self.lowered.find(lowered_needle)?;
        let end = start + lowered_needle.len();
        Some(self.origins[start].start..self.origins[end - 1].end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedParagraph {
    paragraph: Paragraph,
    lowered: LoweredText,
}

impl IndexedParagraph {
    pub fn new(paragraph: Paragraph) -> Self {
        let lowered = LoweredText::new(&paragraph.content);
        Self { paragraph, lowered }
    }

    pub fn paragraph(&self) -> &Paragraph {
        &self.paragraph
    }

    /// Byte range of the first case-insensitive occurrence in the content.
    pub fn find_substring(&self, lowered_query: &str) -> Option<Range<usize>> {
        self.lowered.find(lowered_query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDocument {
    pub document_id: String,
    pub title: String,
    paragraphs: Vec<IndexedParagraph>,
}

impl IndexedDocument {
    pub fn new(
        document_id: impl Into<String>,
        title: impl Into<String>,
        paragraphs: Vec<Paragraph>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            title: title.into(),
            paragraphs: paragraphs.into_iter().map(IndexedParagraph::new).collect(),
        }
    }

    pub fn segment(document: &Document, config: &SegmentationConfig) -> Self {
        Self::new(
            document.id.clone(),
            document.title.clone(),
            segment_transcript_with(&document.transcript, config),
        )
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.paragraphs.iter().map(IndexedParagraph::paragraph)
    }

    pub fn indexed_paragraphs(&self) -> &[IndexedParagraph] {
        &self.paragraphs
    }

    pub fn paragraph(&self, id: u32) -> Option<&Paragraph> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.paragraphs.get(index).map(IndexedParagraph::paragraph)
    }
}

enum QueryKind {
    /// `None` when the digits do not fit a paragraph id.
    ParagraphNumber(Option<u32>),
    Text,
}

fn classify(trimmed: &str) -> QueryKind {
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return QueryKind::Text;
    }
    QueryKind::ParagraphNumber(digits.parse().ok())
}

struct Limits {
    per_document: Option<usize>,
    total: Option<usize>,
}

impl Limits {
    fn document_full(&self, produced: usize) -> bool {
        self.per_document.is_some_and(|limit| produced >= limit)
    }

    fn total_full(&self, produced: usize) -> bool {
        self.total.is_some_and(|limit| produced >= limit)
    }
}

pub fn search_corpus<'a, I>(documents: I, query: &str, options: &SearchOptions) -> SearchOutcome
where
    I: IntoIterator<Item = &'a IndexedDocument>,
{
    let trimmed = query.trim();
    if trimmed.chars().count() < options.min_query_chars {
        return SearchOutcome::TooShort;
    }

    let limits = Limits {
        per_document: options.per_document_limit,
        total: options.total_limit,
    };

    let matches = match classify(trimmed) {
        QueryKind::ParagraphNumber(number) => {
            paragraph_number_matches(documents, number, options, &limits)
        }
        QueryKind::Text => text_matches(documents, trimmed, options, &limits),
    };

    SearchOutcome::Matches(matches)
}

fn paragraph_number_matches<'a, I>(
    documents: I,
    number: Option<u32>,
    options: &SearchOptions,
    limits: &Limits,
) -> Vec<SearchMatch>
where
    I: IntoIterator<Item = &'a IndexedDocument>,
{
    let Some(number) = number else {
        return Vec::new();
    };

    let mut matches = Vec::new();
    for document in documents {
        if limits.total_full(matches.len()) {
            break;
        }
        if let Some(paragraph) = document.paragraph(number) {
            matches.push(SearchMatch {
                document_id: document.document_id.clone(),
                document_title: document.title.clone(),
                paragraph_id: paragraph.id,
                kind: MatchKind::ParagraphNumber,
                matched_text: String::new(),
                context_before: String::new(),
                context_after: head_chars(&paragraph.content, options.context_chars).to_string(),
                preview_window: head_chars(&paragraph.content, options.preview_chars * 2)
                    .to_string(),
                match_start: 0,
                match_end: 0,
            });
        }
    }
    matches
}

fn text_matches<'a, I>(
    documents: I,
    trimmed: &str,
    options: &SearchOptions,
    limits: &Limits,
) -> Vec<SearchMatch>
where
    I: IntoIterator<Item = &'a IndexedDocument>,
{
    let lowered_query = lowercase_chars(trimmed);
    let fallback = FallbackPatterns::build(trimmed);
    let mut matches = Vec::new();

    'documents: for document in documents {
        let mut produced = 0;
        for indexed in &document.paragraphs {
            let content = &indexed.paragraph.content;
            let found = indexed
                .find_substring(&lowered_query)
                .map(|range| (range, MatchKind::Substring))
                .or_else(|| {
                    fallback
                        .find(content)
                        .map(|found| (found.range(), MatchKind::Fuzzy))
                });

            let Some((range, kind)) = found else {
                continue;
            };

            matches.push(build_match(document, &indexed.paragraph, range, kind, options));
            produced += 1;

            if limits.total_full(matches.len()) {
                break 'documents;
            }
            if limits.document_full(produced) {
                break;
            }
        }
    }

    matches
}

fn build_match(
    document: &IndexedDocument,
    paragraph: &Paragraph,
    range: Range<usize>,
    kind: MatchKind,
    options: &SearchOptions,
) -> SearchMatch {
    let content = paragraph.content.as_str();
    let before = &content[..range.start];
    let matched = &content[range.clone()];
    let after = &content[range.end..];

    let preview_window = format!(
        "{}{}{}",
        tail_chars(before, options.preview_chars),
        matched,
        head_chars(after, options.preview_chars)
    );

    SearchMatch {
        document_id: document.document_id.clone(),
        document_title: document.title.clone(),
        paragraph_id: paragraph.id,
        kind,
        matched_text: matched.to_string(),
        context_before: tail_chars(before, options.context_chars).to_string(),
        context_after: head_chars(after, options.context_chars).to_string(),
        preview_window,
        match_start: range.start,
        match_end: range.end,
    }
}

fn head_chars(text: &str, count: usize) -> &str {
    match text.char_indices().nth(count) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn tail_chars(text: &str, count: usize) -> &str {
    if count == 0 {
        return "";
    }
    match text.char_indices().rev().nth(count - 1) {
        Some((index, _)) => &text[index..],
        None => text,
    }
}

pub fn group_by_document(matches: Vec<SearchMatch>) -> Vec<DocumentMatches> {
    let mut positions = HashMap::<String, usize>::new();
    let mut groups: Vec<DocumentMatches> = Vec::new();

    for item in matches {
        match positions.get(&item.document_id) {
            Some(&position) => {
                let group = &mut groups[position];
                group.matches.push(item);
                group.total_matches += 1;
            }
            None => {
                positions.insert(item.document_id.clone(), groups.len());
                groups.push(DocumentMatches {
                    document_id: item.document_id.clone(),
                    document_title: item.document_title.clone(),
                    matches: vec![item],
                    total_matches: 1,
                });
            }
        }
    }

    groups
}
