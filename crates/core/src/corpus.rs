use crate::config::{SearchOptions, SegmentationConfig};
use crate::error::CorpusError;
use crate::models::{Document, SearchOutcome};
use crate::pipeline::segment_transcript_async;
use crate::search::{search_corpus, IndexedDocument};
use crate::traits::CorpusSource;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, info};

#[derive(Debug)]
struct CorpusEntry {
    document: Document,
    index: OnceLock<IndexedDocument>,
}

#[derive(Debug)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
    segmentation: SegmentationConfig,
}

impl Corpus {
    pub fn new(documents: Vec<Document>, segmentation: SegmentationConfig) -> Result<Self, CorpusError> {
        segmentation.validate()?;

        let mut seen = HashSet::new();
        for document in &documents {
            if !seen.insert(document.id.as_str()) {
                return Err(CorpusError::DuplicateDocument(document.id.clone()));
            }
        }

        let entries = documents
            .into_iter()
            .map(|document| CorpusEntry {
                document,
                index: OnceLock::new(),
            })
            .collect();

        Ok(Self {
            entries,
            segmentation,
        })
    }

    pub async fn load<S>(source: &S, segmentation: SegmentationConfig) -> Result<Self, CorpusError>
    where
        S: CorpusSource + Sync + ?Sized,
    {
        let documents = source.load_documents().await?;
        info!(documents = documents.len(), "corpus loaded");
        Self::new(documents, segmentation)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().map(|entry| &entry.document)
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.entry(id).map(|entry| &entry.document)
    }

    fn entry(&self, id: &str) -> Option<&CorpusEntry> {
        self.entries.iter().find(|entry| entry.document.id == id)
    }

    fn indexed_entry<'a>(&'a self, entry: &'a CorpusEntry) -> &'a IndexedDocument {
        entry.index.get_or_init(|| {
            debug!(document_id = %entry.document.id, "segmenting document");
            IndexedDocument::segment(&entry.document, &self.segmentation)
        })
    }

    pub fn indexed(&self, id: &str) -> Option<&IndexedDocument> {
        self.entry(id).map(|entry| self.indexed_entry(entry))
    }

    pub fn is_indexed(&self, id: &str) -> bool {
        self.entry(id).is_some_and(|entry| entry.index.get().is_some())
    }

    pub async fn warm(&self) {
        for entry in self.entries.iter().filter(|entry| entry.document.is_searchable()) {
            if entry.index.get().is_some() {
                continue;
            }
            let paragraphs =
                segment_transcript_async(&entry.document.transcript, &self.segmentation).await;
            // A concurrent reader may have filled it first; the result is identical.
            let _ = entry.index.set(IndexedDocument::new(
                entry.document.id.clone(),
                entry.document.title.clone(),
                paragraphs,
            ));
        }
    }

    pub fn searchable(&self) -> impl Iterator<Item = &IndexedDocument> {
        self.entries
            .iter()
            .filter(|entry| entry.document.is_searchable())
            .map(|entry| self.indexed_entry(entry))
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> SearchOutcome {
        search_corpus(self.searchable(), query, options)
    }
}
