use async_trait::async_trait;
use sermon_search_core::{CorpusError, CorpusSource, Document, StaticSource};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

const SERMON_EXTENSIONS: [&str; 2] = ["json", "txt"];

pub fn discover_sermon_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_sermon = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SERMON_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });

        if is_sermon {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Reads one `.json` (object or array) or plain-text transcript file.
pub async fn load_file_documents(path: &Path) -> Result<Vec<Document>, CorpusError> {
    let raw = tokio::fs::read_to_string(path).await?;

    if is_json(path) {
        return StaticSource::from_json(&raw)?.load_documents().await;
    }

    let title = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| CorpusError::Source(format!("path has no file name: {}", path.display())))?;

    Ok(vec![Document::text(generate_document_id(path), title, raw)])
}

pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

pub struct LoadReport {
    pub documents: Vec<Document>,
    pub skipped_files: Vec<SkippedFile>,
}

pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn load_best_effort(&self) -> Result<LoadReport, CorpusError> {
        let files = discover_sermon_files(&self.root);

        if files.is_empty() {
            return Err(CorpusError::Source(format!(
                "no sermon files found in {}",
                self.root.display()
            )));
        }

        let mut documents = Vec::new();
        let mut skipped_files = Vec::new();

        for path in files {
            match load_file_documents(&path).await {
                Ok(loaded) => documents.extend(loaded),
                Err(error) => skipped_files.push(SkippedFile {
                    path,
                    reason: error.to_string(),
                }),
            }
        }

        Ok(LoadReport {
            documents,
            skipped_files,
        })
    }
}

#[async_trait]
impl CorpusSource for DirectorySource {
    async fn load_documents(&self) -> Result<Vec<Document>, CorpusError> {
        let report = self.load_best_effort().await?;
        for skipped in &report.skipped_files {
            warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped sermon file");
        }
        Ok(report.documents)
    }
}
