use crate::config::SegmentationConfig;
use crate::models::Paragraph;
use crate::segmenter::{number_paragraphs, segment_blocks, segment_with, split_blocks};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

pub async fn segment_transcript_async(text: &str, config: &SegmentationConfig) -> Vec<Paragraph> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    tokio::task::yield_now().await;

    let chars = text.chars().count();
    let result = if chars > config.large_text_chars && chars >= config.short_text_chars {
        segment_in_batches(text, config).await
    } else {
        catch_unwind(AssertUnwindSafe(|| segment_with(text, config)))
    };

    match result {
        Ok(contents) => number_paragraphs(contents),
        Err(_) => {
            warn!(chars, "segmentation panicked, using block fallback");
            fallback_paragraphs(text, config)
        }
    }
}

async fn segment_in_batches(
    text: &str,
    config: &SegmentationConfig,
) -> std::thread::Result<Vec<String>> {
    let blocks = catch_unwind(AssertUnwindSafe(|| split_blocks(text, config)))?;
    debug!(
        blocks = blocks.len(),
        batch_blocks = config.batch_blocks,
        "segmenting large transcript in batches"
    );

    let mut contents = Vec::new();
    let batches = catch_unwind(AssertUnwindSafe(|| {
        blocks.chunks(config.batch_blocks).collect::<Vec<_>>()
    }))?;
    for batch in batches {
        tokio::task::yield_now().await;
        contents.extend(catch_unwind(AssertUnwindSafe(|| {
            segment_blocks(batch, config)
        }))?);
    }

    Ok(contents)
}

fn fallback_paragraphs(text: &str, config: &SegmentationConfig) -> Vec<Paragraph> {
    number_paragraphs(split_blocks(text, config))
}
