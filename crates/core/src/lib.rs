pub mod config;
pub mod corpus;
pub mod error;
pub mod highlight;
pub mod models;
pub mod patterns;
pub mod pipeline;
pub mod search;
pub mod segmenter;
pub mod session;
pub mod traits;

pub use config::{DebounceConfig, SearchOptions, SegmentationConfig};
pub use corpus::Corpus;
pub use error::{CorpusError, SearchError};
pub use highlight::{
    count_occurrences, find_in_document, highlight_spans, FindCursor, Highlighter, Occurrence,
};
pub use models::{
    Document, DocumentKind, DocumentMatches, MatchKind, Paragraph, SearchMatch, SearchOutcome,
};
pub use patterns::FallbackPatterns;
pub use pipeline::segment_transcript_async;
pub use search::{group_by_document, search_corpus, IndexedDocument, IndexedParagraph};
pub use segmenter::{
    normalize_whitespace, segment, segment_transcript, segment_transcript_with, segment_with,
    split_blocks, split_sentences,
};
pub use session::{SearchSession, SearchState, SharedResults};
pub use traits::{CorpusSource, StaticSource};
