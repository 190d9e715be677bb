use crate::error::{CorpusError, SearchError};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationConfig {
    /// Inputs with fewer characters than this are returned whole.
    pub short_text_chars: usize,
    /// Blocks shorter than this are folded into a neighbour.
    pub min_block_chars: usize,
    pub target_words: usize,
    pub min_words: usize,
    pub max_words: usize,
    /// Above this size the async pipeline yields between block batches.
    pub large_text_chars: usize,
    pub batch_blocks: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            short_text_chars: 100,
            min_block_chars: 5,
            target_words: 375,
            min_words: 300,
            max_words: 450,
            large_text_chars: 30_000,
            batch_blocks: 3,
        }
    }
}

impl SegmentationConfig {
    pub fn validate(&self) -> Result<(), CorpusError> {
        if self.min_words == 0 {
            return Err(CorpusError::InvalidConfig(
                "min_words must be greater than zero".to_string(),
            ));
        }
        if !(self.min_words <= self.target_words && self.target_words <= self.max_words) {
            return Err(CorpusError::InvalidConfig(format!(
                "expected min_words <= target_words <= max_words, got {} / {} / {}",
                self.min_words, self.target_words, self.max_words
            )));
        }
        if self.batch_blocks == 0 {
            return Err(CorpusError::InvalidConfig(
                "batch_blocks must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub context_chars: usize,
    pub preview_chars: usize,
    pub min_query_chars: usize,
    pub per_document_limit: Option<usize>,
    pub total_limit: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            context_chars: 150,
            preview_chars: 40,
            min_query_chars: 2,
            per_document_limit: None,
            total_limit: None,
        }
    }
}

impl SearchOptions {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.min_query_chars == 0 {
            return Err(SearchError::InvalidOptions(
                "min_query_chars must be at least 1".to_string(),
            ));
        }
        if self.per_document_limit == Some(0) || self.total_limit == Some(0) {
            return Err(SearchError::InvalidOptions(
                "result limits must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    pub debounce: Duration,
    pub spinner_delay: Duration,
    pub cache_capacity: usize,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            spinner_delay: Duration::from_millis(200),
            cache_capacity: 50,
        }
    }
}

impl DebounceConfig {
    pub fn validate(&self) -> Result<(), CorpusError> {
        if self.spinner_delay > self.debounce {
            return Err(CorpusError::InvalidConfig(format!(
                "spinner_delay ({:?}) must not exceed debounce ({:?})",
                self.spinner_delay, self.debounce
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SegmentationConfig::default().validate().is_ok());
        assert!(SearchOptions::default().validate().is_ok());
        assert!(DebounceConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_word_bounds_are_rejected() {
        let config = SegmentationConfig {
            min_words: 500,
            ..SegmentationConfig::default()
        };
        assert!(matches!(config.validate(), Err(CorpusError::InvalidConfig(_))));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let options = SearchOptions {
            total_limit: Some(0),
            ..SearchOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn spinner_after_debounce_is_rejected() {
        let config = DebounceConfig {
            debounce: Duration::from_millis(100),
            spinner_delay: Duration::from_millis(200),
            cache_capacity: 10,
        };
        assert!(config.validate().is_err());
    }
}
