use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    Text,
    Audio,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: DocumentKind,
    #[serde(default, alias = "sermon")]
    pub transcript: String,
}

impl Document {
    pub fn text(id: impl Into<String>, title: impl Into<String>, transcript: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year: None,
            location: None,
            kind: DocumentKind::Text,
            transcript: transcript.into(),
        }
    }

    pub fn is_searchable(&self) -> bool {
        self.kind == DocumentKind::Text && !self.transcript.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Paragraph {
    /// 1-based, contiguous. Persisted in bookmarks and deep links.
    pub id: u32,
    pub content: String,
    pub original_index: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    ParagraphNumber,
    Substring,
    Fuzzy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchMatch {
    pub document_id: String,
    pub document_title: String,
    pub paragraph_id: u32,
    pub kind: MatchKind,
    pub matched_text: String,
    pub context_before: String,
    pub context_after: String,
    pub preview_window: String,
    /// Byte offsets of `matched_text` inside the paragraph content.
    pub match_start: usize,
    pub match_end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMatches {
    pub document_id: String,
    pub document_title: String,
    pub matches: Vec<SearchMatch>,
    pub total_matches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    TooShort,
    Matches(Vec<SearchMatch>),
}

impl SearchOutcome {
    pub fn matches(&self) -> &[SearchMatch] {
        match self {
            SearchOutcome::TooShort => &[],
            SearchOutcome::Matches(matches) => matches,
        }
    }

    pub fn into_matches(self) -> Vec<SearchMatch> {
        match self {
            SearchOutcome::TooShort => Vec::new(),
            SearchOutcome::Matches(matches) => matches,
        }
    }

    pub fn is_too_short(&self) -> bool {
        matches!(self, SearchOutcome::TooShort)
    }
}
