use crate::config::SegmentationConfig;
use crate::models::Paragraph;

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits on blank lines of the original text, then collapses whitespace
/// inside each block. Blocks shorter than `min_block_chars` are folded into
/// the preceding block (or the following one when nothing precedes them) so
/// no word is lost.
pub fn split_blocks(text: &str, config: &SegmentationConfig) -> Vec<String> {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut raw_blocks = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    for line in unified.split('\n') {
        if line.trim().is_empty() {
            if !lines.is_empty() {
                raw_blocks.push(normalize_whitespace(&lines.join(" ")));
                lines.clear();
            }
        } else {
            lines.push(line);
        }
    }
    if !lines.is_empty() {
        raw_blocks.push(normalize_whitespace(&lines.join(" ")));
    }

    fold_short_blocks(raw_blocks, config.min_block_chars)
}

fn fold_short_blocks(raw_blocks: Vec<String>, min_block_chars: usize) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut leading: Option<String> = None;

    for block in raw_blocks {
        if block.chars().count() < min_block_chars {
            match blocks.last_mut() {
                Some(previous) => {
                    previous.push(' ');
                    previous.push_str(&block);
                }
                None => leading = Some(join_optional(leading.take(), block)),
            }
            continue;
        }
        blocks.push(join_optional(leading.take(), block));
    }

    if let Some(rest) = leading {
        blocks.push(rest);
    }

    blocks
}

fn join_optional(head: Option<String>, tail: String) -> String {
    match head {
        Some(head) => format!("{head} {tail}"),
        None => tail,
    }
}

// Abbreviations end sentences too.
pub fn split_sentences(block: &str) -> Vec<String> {
    sentence_tokens(block)
        .into_iter()
        .map(|tokens| tokens.join(" "))
        .collect()
}

fn sentence_tokens(block: &str) -> Vec<Vec<&str>> {
    let mut sentences = Vec::new();
    let mut current = Vec::new();

    for token in block.split_whitespace() {
        current.push(token);
        if token.ends_with(['.', '!', '?']) {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }

    sentences
}

fn bounded_sentences<'a>(block: &'a str, config: &SegmentationConfig) -> Vec<Vec<&'a str>> {
    let target = config.target_words.max(1);
    let mut bounded = Vec::new();

    for sentence in sentence_tokens(block) {
        if sentence.len() <= config.max_words {
            bounded.push(sentence);
            continue;
        }
        let pieces = sentence.len().div_ceil(target);
        let piece_len = sentence.len().div_ceil(pieces);
        bounded.extend(sentence.chunks(piece_len).map(|piece| piece.to_vec()));
    }

    bounded
}

fn pack_block(block: &str, config: &SegmentationConfig) -> Vec<String> {
    let sentences = bounded_sentences(block, config);
    let total_words: usize = sentences.iter().map(Vec::len).sum();
    if total_words == 0 {
        return Vec::new();
    }

    // Spread the words evenly over the number of paragraphs the block needs.
    let estimated = total_words.div_ceil(config.target_words.max(1));
    let target = (total_words / estimated).max(1);
    let last = sentences.len() - 1;

    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for (index, sentence) in sentences.into_iter().enumerate() {
        let combined = current.len() + sentence.len();
        let reached_target =
            combined > target && current.len() >= config.min_words && index != last;
        // The ceiling wins over the minimum: a short run followed by a long
        // sentence is emitted on its own rather than overflowing.
        let over_ceiling = combined > config.max_words;

        if !current.is_empty() && (reached_target || over_ceiling) {
            paragraphs.push(std::mem::take(&mut current));
        }
        current.extend(sentence);
    }

    if !current.is_empty() {
        let orphan = current.len() < config.min_words / 2;
        match paragraphs.last_mut() {
            Some(previous) if orphan => previous.extend(current),
            _ => paragraphs.push(current),
        }
    }

    paragraphs
        .into_iter()
        .map(|tokens| tokens.join(" "))
        .collect()
}

/// Splits one block at a time so batched callers get identical output.
pub fn segment_blocks(blocks: &[String], config: &SegmentationConfig) -> Vec<String> {
    blocks
        .iter()
        .flat_map(|block| pack_block(block, config))
        .collect()
}

pub fn segment_with(text: &str, config: &SegmentationConfig) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if text.chars().count() < config.short_text_chars {
        return vec![trimmed.to_string()];
    }

    segment_blocks(&split_blocks(text, config), config)
}

pub fn segment(text: &str) -> Vec<String> {
    segment_with(text, &SegmentationConfig::default())
}

pub fn number_paragraphs(contents: Vec<String>) -> Vec<Paragraph> {
    contents
        .into_iter()
        .enumerate()
        .map(|(position, content)| Paragraph {
            id: u32::try_from(position + 1).unwrap_or(u32::MAX),
            content,
            original_index: position,
        })
        .collect()
}

pub fn segment_transcript_with(text: &str, config: &SegmentationConfig) -> Vec<Paragraph> {
    number_paragraphs(segment_with(text, config))
}

pub fn segment_transcript(text: &str) -> Vec<Paragraph> {
    segment_transcript_with(text, &SegmentationConfig::default())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sentence_run(sentences: usize, words_per_sentence: usize) -> String {
        (0..sentences)
            .map(|sentence| {
                let words = (0..words_per_sentence)
                    .map(|word| format!("w{sentence}x{word}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("{words}.")
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn tokens(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    fn word_count(text: &str) -> usize {
        text.split_whitespace().count()
    }

    #[test]
    fn whitespace_is_normalized() {
        let input = "A  \t  lot\nof   spacing";
        assert_eq!(normalize_whitespace(input), "A lot of spacing");
    }

    #[test]
    fn empty_input_has_no_paragraphs() {
        assert!(segment("").is_empty());
        assert!(segment("   \n\t ").is_empty());
    }

    #[test]
    fn short_text_is_returned_trimmed() {
        let input = "  And the Lord said,\n let there be light.  ";
        assert_eq!(segment(input), vec![input.trim().to_string()]);
    }

    #[test]
    fn sentences_split_on_terminal_punctuation() {
        let sentences = split_sentences("He came. Did you see Him? Amen! And then");
        assert_eq!(
            sentences,
            vec!["He came.", "Did you see Him?", "Amen!", "And then"]
        );
    }

    #[test]
    fn blank_lines_start_new_blocks() {
        let text = "The first block talks about the morning service and the prayer line.\r\n\r\nThe second block is about the evening message and the baptism.";
        let paragraphs = segment(text);
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].starts_with("The first block"));
        assert!(paragraphs[1].starts_with("The second block"));
    }

    #[test]
    fn tiny_blocks_are_folded_not_dropped() {
        let text = "The brother led the congregation in a long prayer for the sick.\n\nAmen\n\nThen the service continued with another song from the hymnal.";
        let paragraphs = segment(text);
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].ends_with("sick. Amen"));
    }

    #[test]
    fn twelve_hundred_words_pack_into_balanced_paragraphs() {
        let text = sentence_run(100, 12);
        let paragraphs = segment(&text);
        assert!((3..=4).contains(&paragraphs.len()), "got {}", paragraphs.len());
        for paragraph in &paragraphs[..paragraphs.len() - 1] {
            let words = word_count(paragraph);
            assert!((300..=450).contains(&words), "paragraph had {words} words");
        }
    }

    #[test]
    fn unpunctuated_text_is_cut_at_word_boundaries() {
        let text = (0..1000).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let paragraphs = segment(&text);
        assert_eq!(paragraphs.len(), 3);
        for paragraph in &paragraphs {
            assert!(word_count(paragraph) <= 450);
        }
        let rejoined = paragraphs.join(" ");
        assert_eq!(tokens(&rejoined), tokens(&text));
    }

    #[test]
    fn small_trailing_paragraph_merges_backward() {
        let text = format!("{} A short closing remark.", sentence_run(4, 100));
        let paragraphs = segment(&text);
        assert_eq!(paragraphs.len(), 1);
        assert!(paragraphs[0].ends_with("closing remark."));
    }

    #[test]
    fn ceiling_cut_can_leave_a_short_leading_paragraph() {
        let text = format!("{} {}", sentence_run(1, 20), sentence_run(1, 440));
        let counts = segment(&text)
            .iter()
            .map(|paragraph| word_count(paragraph))
            .collect::<Vec<_>>();
        assert_eq!(counts, vec![20, 440]);
    }

    #[test]
    fn segmentation_preserves_every_token_in_order() {
        let text = format!(
            "{}\n\n\n{}\n  \n{}",
            sentence_run(40, 11),
            "Ok.",
            sentence_run(55, 9)
        );
        let paragraphs = segment(&text);
        let rejoined = paragraphs.join(" ");
        assert_eq!(tokens(&rejoined), tokens(&text));
        assert!(paragraphs.iter().all(|paragraph| !paragraph.trim().is_empty()));
    }

    #[test]
    fn segmentation_is_deterministic() {
        let text = sentence_run(80, 14);
        assert_eq!(segment_transcript(&text), segment_transcript(&text));
    }

    #[test]
    fn paragraph_ids_are_contiguous_and_one_based() {
        let paragraphs = segment_transcript(&sentence_run(120, 10));
        for (position, paragraph) in paragraphs.iter().enumerate() {
            assert_eq!(paragraph.id as usize, position + 1);
            assert_eq!(paragraph.original_index, position);
        }
    }

    #[test]
    fn multibyte_text_is_not_split_inside_characters() {
        let text = "Ésaïe a dit « Voici, la vierge deviendra enceinte » et l’Éternel l’a accompli. ".repeat(40);
        let paragraphs = segment(&text);
        let rejoined = paragraphs.join(" ");
        assert_eq!(tokens(&rejoined), tokens(&text));
    }
}
