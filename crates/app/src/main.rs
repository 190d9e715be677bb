mod loader;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use loader::{load_file_documents, DirectorySource};
use sermon_search_core::{
    find_in_document, group_by_document, segment_transcript_async, Corpus, DebounceConfig,
    DocumentMatches, FindCursor, Highlighter, MatchKind, SearchOptions, SearchOutcome,
    SearchSession, SearchState, SegmentationConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sermon-search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Folder holding sermon .json and .txt files
    #[arg(long, env = "SERMON_CORPUS", default_value = "sermons", global = true)]
    corpus: PathBuf,

    /// Characters of context kept on each side of a match
    #[arg(long, env = "SERMON_CONTEXT_CHARS", default_value = "150", global = true)]
    context_chars: usize,

    /// Characters of preview kept on each side of a match
    #[arg(long, env = "SERMON_PREVIEW_CHARS", default_value = "40", global = true)]
    preview_chars: usize,

    /// Preferred words per paragraph
    #[arg(long, env = "SERMON_TARGET_WORDS", default_value = "375", global = true)]
    target_words: usize,

    #[arg(long, env = "SERMON_MIN_WORDS", default_value = "300", global = true)]
    min_words: usize,

    #[arg(long, env = "SERMON_MAX_WORDS", default_value = "450", global = true)]
    max_words: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Split a transcript file into numbered paragraphs.
    Segment {
        #[arg(long)]
        file: PathBuf,
        /// Emit paragraphs as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Search the corpus for a phrase or a paragraph number (`#12`).
    Search {
        #[arg(long)]
        query: String,
        /// Matches kept per sermon.
        #[arg(long, default_value = "5")]
        per_document_limit: usize,
        /// Matches kept overall.
        #[arg(long, default_value = "100")]
        limit: usize,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Find every occurrence of a phrase inside one transcript file.
    Find {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        query: String,
    },
    /// Read queries from stdin as they are typed and show the latest results.
    Watch {
        #[arg(long, env = "SERMON_DEBOUNCE_MS", default_value = "500")]
        debounce_ms: u64,
        #[arg(long, env = "SERMON_SPINNER_MS", default_value = "200")]
        spinner_ms: u64,
        #[arg(long, default_value = "5")]
        per_document_limit: usize,
        #[arg(long, default_value = "100")]
        limit: usize,
    },
}

impl Cli {
    fn segmentation(&self) -> SegmentationConfig {
        SegmentationConfig {
            target_words: self.target_words,
            min_words: self.min_words,
            max_words: self.max_words,
            ..SegmentationConfig::default()
        }
    }

    fn search_options(&self, per_document_limit: usize, limit: usize) -> SearchOptions {
        SearchOptions {
            context_chars: self.context_chars,
            preview_chars: self.preview_chars,
            per_document_limit: Some(per_document_limit),
            total_limit: Some(limit),
            ..SearchOptions::default()
        }
    }

    async fn load_corpus(&self) -> anyhow::Result<Corpus> {
        let source = DirectorySource::new(&self.corpus);
        let corpus = Corpus::load(&source, self.segmentation())
            .await
            .with_context(|| format!("loading corpus from {}", self.corpus.display()))?;
        Ok(corpus)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "sermon-search boot"
    );

    match &cli.command {
        Command::Segment { file, json } => segment_file(&cli, file, *json).await?,
        Command::Search {
            query,
            per_document_limit,
            limit,
            json,
        } => {
            let corpus = cli.load_corpus().await?;
            let options = cli.search_options(*per_document_limit, *limit);
            options.validate()?;

            match corpus.search(query, &options) {
                SearchOutcome::TooShort => {
                    println!("query too short: type at least {} characters", options.min_query_chars);
                }
                SearchOutcome::Matches(matches) => {
                    let groups = group_by_document(matches);
                    if *json {
                        println!("{}", serde_json::to_string_pretty(&groups)?);
                    } else {
                        print_groups(query, &groups);
                    }
                }
            }
        }
        Command::Find { file, query } => find_in_file(&cli, file, query).await?,
        Command::Watch {
            debounce_ms,
            spinner_ms,
            per_document_limit,
            limit,
        } => {
            let timing = DebounceConfig {
                debounce: Duration::from_millis(*debounce_ms),
                spinner_delay: Duration::from_millis(*spinner_ms),
                ..DebounceConfig::default()
            };
            let corpus = cli.load_corpus().await?;
            corpus.warm().await;
            watch_stdin(corpus, cli.search_options(*per_document_limit, *limit), timing).await?;
        }
    }

    Ok(())
}

async fn segment_file(cli: &Cli, file: &Path, json: bool) -> anyhow::Result<()> {
    let config = cli.segmentation();
    config.validate()?;

    for document in load_file_documents(file).await? {
        let paragraphs = segment_transcript_async(&document.transcript, &config).await;
        info!(document_id = %document.id, paragraphs = paragraphs.len(), "segmented");

        if json {
            println!("{}", serde_json::to_string_pretty(&paragraphs)?);
            continue;
        }

        println!("# {}", document.title);
        for paragraph in paragraphs {
            let words = paragraph.content.split_whitespace().count();
            println!("[{}] ({} words)\n{}\n", paragraph.id, words, paragraph.content);
        }
    }

    Ok(())
}

async fn find_in_file(cli: &Cli, file: &Path, query: &str) -> anyhow::Result<()> {
    let config = cli.segmentation();
    config.validate()?;
    let highlighter = Highlighter::new("[", "]");

    for document in load_file_documents(file).await? {
        let paragraphs = segment_transcript_async(&document.transcript, &config).await;
        let cursor = FindCursor::new(find_in_document(&paragraphs, query));

        println!("# {}: {} occurrence(s)", document.title, cursor.total());

        let mut last_paragraph = None;
        for occurrence in cursor.occurrences() {
            if last_paragraph == Some(occurrence.paragraph_id) {
                continue;
            }
            last_paragraph = Some(occurrence.paragraph_id);
            if let Some(paragraph) = paragraphs.iter().find(|p| p.id == occurrence.paragraph_id) {
                println!("[{}] {}", paragraph.id, highlighter.apply(&paragraph.content, query));
            }
        }
    }

    Ok(())
}

fn print_groups(query: &str, groups: &[DocumentMatches]) {
    let highlighter = Highlighter::new("[", "]");
    let total: usize = groups.iter().map(|group| group.total_matches).sum();
    println!("query: {query} ({total} match(es) in {} sermon(s))", groups.len());

    for group in groups {
        println!("{} ({})", group.document_title, group.total_matches);
        for found in &group.matches {
            let preview = match found.kind {
                MatchKind::ParagraphNumber => found.preview_window.clone(),
                MatchKind::Substring | MatchKind::Fuzzy => highlighter
                    .apply(&found.preview_window, &found.matched_text)
                    .into_owned(),
            };
            println!("  [{}] ...{}...", found.paragraph_id, preview);
        }
    }
}

async fn watch_stdin(
    corpus: Corpus,
    options: SearchOptions,
    timing: DebounceConfig,
) -> anyhow::Result<()> {
    let session = Arc::new(SearchSession::new(Arc::new(corpus), options, timing)?);
    let mut receiver = session.subscribe();

    let printer = tokio::spawn(async move {
        while receiver.changed().await.is_ok() {
            let state = receiver.borrow_and_update().clone();
            match state {
                SearchState::Ready { query, results, .. } => print_groups(&query, &results),
                SearchState::TooShort { .. } => println!("(keep typing)"),
                SearchState::Searching { query, generation } => {
                    debug!(%query, generation, "searching");
                }
                SearchState::Idle | SearchState::Pending { .. } => {}
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = None;
    while let Some(line) = lines.next_line().await? {
        let session = Arc::clone(&session);
        last = Some(tokio::spawn(async move { session.submit(&line).await }));
    }

    if let Some(handle) = last {
        handle.await?;
    }
    // The printer stops once every submission has released the session.
    drop(session);
    printer.await?;

    Ok(())
}
