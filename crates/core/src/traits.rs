use crate::error::CorpusError;
use crate::models::Document;
use async_trait::async_trait;
use serde::Deserialize;

#[async_trait]
pub trait CorpusSource {
    async fn load_documents(&self) -> Result<Vec<Document>, CorpusError>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    documents: Vec<Document>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Document>),
    One(Document),
}

impl StaticSource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Accepts either a single document object or an array of them.
    pub fn from_json(raw: &str) -> Result<Self, CorpusError> {
        let documents = match serde_json::from_str::<OneOrMany>(raw)? {
            OneOrMany::Many(documents) => documents,
            OneOrMany::One(document) => vec![document],
        };
        Ok(Self::new(documents))
    }
}

#[async_trait]
impl CorpusSource for StaticSource {
    async fn load_documents(&self) -> Result<Vec<Document>, CorpusError> {
        Ok(self.documents.clone())
    }
}
