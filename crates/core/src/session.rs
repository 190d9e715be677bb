use crate::config::{DebounceConfig, SearchOptions};
use crate::corpus::Corpus;
use crate::error::CorpusError;
use crate::models::DocumentMatches;
use crate::search::{group_by_document, lowercase_chars};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::debug;

pub type SharedResults = Arc<Vec<DocumentMatches>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    TooShort {
        generation: u64,
    },
    Pending {
        generation: u64,
        query: String,
    },
    Searching {
        generation: u64,
        query: String,
    },
    Ready {
        generation: u64,
        query: String,
        results: SharedResults,
    },
}

#[derive(Debug)]
struct QueryCache {
    capacity: usize,
    entries: VecDeque<(String, SharedResults)>,
}

impl QueryCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    fn get(&self, key: &str) -> Option<SharedResults> {
        self.entries
            .iter()
            .find(|(cached, _)| cached == key)
            .map(|(_, results)| Arc::clone(results))
    }

    fn insert(&mut self, key: String, results: SharedResults) {
        if self.capacity == 0 {
            return;
        }
        if let Some(slot) = self.entries.iter_mut().find(|(cached, _)| *cached == key) {
            slot.1 = results;
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, results));
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

pub struct SearchSession {
    corpus: Arc<Corpus>,
    options: SearchOptions,
    timing: DebounceConfig,
    generation: AtomicU64,
    state: watch::Sender<SearchState>,
    cache: Mutex<QueryCache>,
}

impl SearchSession {
    pub fn new(
        corpus: Arc<Corpus>,
        options: SearchOptions,
        timing: DebounceConfig,
    ) -> Result<Self, CorpusError> {
        options
            .validate()
            .map_err(|error| CorpusError::InvalidConfig(error.to_string()))?;
        timing.validate()?;

        let (state, _) = watch::channel(SearchState::Idle);
        Ok(Self {
            corpus,
            options,
            timing,
            generation: AtomicU64::new(0),
            state,
            cache: Mutex::new(QueryCache::new(timing.cache_capacity)),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.latest_generation() == generation
    }

    fn publish(&self, generation: u64, next: SearchState) -> bool {
        self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            *state = next;
            true
        })
    }

    fn cached(&self, key: &str) -> Option<SharedResults> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
    }

    fn remember(&self, key: String, results: SharedResults) {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, results);
    }

    pub fn cached_queries(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    // Only the newest generation may publish or commit.
    pub async fn submit(&self, query: &str) -> Option<SharedResults> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let trimmed = query.trim();

        if trimmed.is_empty() {
            self.publish(generation, SearchState::Idle);
            return None;
        }
        if trimmed.chars().count() < self.options.min_query_chars {
            self.publish(generation, SearchState::TooShort { generation });
            return None;
        }

        let key = lowercase_chars(trimmed);
        if let Some(results) = self.cached(&key) {
            debug!(generation, query = %trimmed, "search cache hit");
            let committed = self.publish(
                generation,
                SearchState::Ready {
                    generation,
                    query: trimmed.to_string(),
                    results: Arc::clone(&results),
                },
            );
            return committed.then_some(results);
        }

        self.publish(
            generation,
            SearchState::Pending {
                generation,
                query: trimmed.to_string(),
            },
        );
        // Documents not yet indexed go through the guarded async pipeline
        // instead of being segmented inline by the search.
        self.corpus.warm().await;

        tokio::time::sleep(self.timing.spinner_delay).await;
        if !self.is_current(generation) {
            return None;
        }
        self.publish(
            generation,
            SearchState::Searching {
                generation,
                query: trimmed.to_string(),
            },
        );

        tokio::time::sleep(self.timing.debounce.saturating_sub(self.timing.spinner_delay)).await;
        if !self.is_current(generation) {
            return None;
        }

        let matches = self.corpus.search(trimmed, &self.options).into_matches();
        let results: SharedResults = Arc::new(group_by_document(matches));

        let committed = self.publish(
            generation,
            SearchState::Ready {
                generation,
                query: trimmed.to_string(),
                results: Arc::clone(&results),
            },
        );
        if !committed {
            debug!(generation, query = %trimmed, "discarding stale search results");
            return None;
        }

        self.remember(key, Arc::clone(&results));
        Some(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SegmentationConfig;
    use crate::models::Document;
    use std::time::Duration;
    use tokio::time::Instant;

    fn session() -> Arc<SearchSession> {
        let documents = vec![
            Document::text("a", "Grace", "Amazing grace, how sweet the sound."),
            Document::text("b", "Faith", "Faith cometh by hearing, and hearing by the Word."),
        ];
        let corpus = Corpus::new(documents, SegmentationConfig::default()).expect("valid corpus");
        Arc::new(
            SearchSession::new(Arc::new(corpus), SearchOptions::default(), DebounceConfig::default())
                .expect("valid session"),
        )
    }

    fn ready_query(state: &SearchState) -> Option<&str> {
        match state {
            SearchState::Ready { query, .. } => Some(query),
            _ => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_latest_query_commits() {
        let session = session();

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("grace").await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("faith").await }
        });

        assert!(first.await.expect("task").is_none());
        let results = second.await.expect("task").expect("latest query commits");
        assert_eq!(results[0].document_id, "b");
        assert_eq!(ready_query(&session.state()), Some("faith"));
    }

    #[tokio::test(start_paused = true)]
    async fn spinner_shows_before_results() {
        let session = session();
        let receiver = session.subscribe();

        let handle = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("amazing").await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(*receiver.borrow(), SearchState::Pending { .. }));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(matches!(*receiver.borrow(), SearchState::Searching { .. }));

        let results = handle.await.expect("task").expect("results");
        assert_eq!(results.len(), 1);
        assert_eq!(ready_query(&receiver.borrow()), Some("amazing"));
    }

    #[tokio::test(start_paused = true)]
    async fn short_and_empty_queries_do_not_search() {
        let session = session();
        assert!(session.submit("g").await.is_none());
        assert!(matches!(session.state(), SearchState::TooShort { generation: 1 }));

        assert!(session.submit("   ").await.is_none());
        assert_eq!(session.state(), SearchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_the_query_cancels_a_pending_search() {
        let session = session();
        let pending = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("grace").await }
        });
        tokio::time::sleep(Duration::from_millis(300)).await;
        session.submit("").await;

        assert!(pending.await.expect("task").is_none());
        assert_eq!(session.state(), SearchState::Idle);
        assert_eq!(session.cached_queries(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_queries_come_from_the_cache() {
        let session = session();
        let first = session.submit("Grace").await.expect("results");

        let started = Instant::now();
        let second = session.submit("  grace ").await.expect("cached results");
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(start_paused = true)]
    async fn documents_are_indexed_during_the_debounce() -> Result<(), CorpusError> {
        let documents = vec![
            Document::text("a", "Grace", "Amazing grace, how sweet the sound."),
            Document::text("b", "Faith", "Faith cometh by hearing, and hearing by the Word."),
        ];
        let corpus = Arc::new(Corpus::new(documents, SegmentationConfig::default())?);
        let session = Arc::new(SearchSession::new(
            Arc::clone(&corpus),
            SearchOptions::default(),
            DebounceConfig::default(),
        )?);
        assert!(!corpus.is_indexed("a"));

        let handle = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("grace").await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(matches!(session.state(), SearchState::Pending { .. }));
        assert!(corpus.is_indexed("a"));
        assert!(corpus.is_indexed("b"));

        assert!(handle.await.expect("task").is_some());
        Ok(())
    }

    #[test]
    fn cache_evicts_oldest_entry() {
        let mut cache = QueryCache::new(2);
        cache.insert("one".to_string(), Arc::new(Vec::new()));
        cache.insert("two".to_string(), Arc::new(Vec::new()));
        cache.insert("three".to_string(), Arc::new(Vec::new()));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("one").is_none());
        assert!(cache.get("three").is_some());
    }
}
