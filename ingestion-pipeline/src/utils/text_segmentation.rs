use common::{
    error::AppError,
    storage::types::passage::Passage,
    utils::config::{default_chunk_overlap, default_chunk_size, SegmentationMode},
};

use super::file_text_extraction::ExtractedDocument;

/// Window size and overlap, both in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmenterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl SegmenterConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, AppError> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunk_size == 0 {
            return Err(AppError::Validation("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

pub fn segment_document(
    document: &ExtractedDocument,
    mode: SegmentationMode,
    config: &SegmenterConfig,
) -> Result<Vec<Passage>, AppError> {
    match mode {
        SegmentationMode::Window => segment_text(&document.source, &document.text, config),
        SegmentationMode::Structural => {
            segment_elements(&document.source, document.elements().iter().map(String::as_str))
        }
    }
}

/// Splits `text` into overlapping windows of at most `chunk_size` characters.
///
/// Consecutive passages share exactly `chunk_overlap` characters. A window that does not reach
/// the end of the text is pulled back to the last whitespace in its second half when one exists.
pub fn segment_text(
    source: &str,
    text: &str,
    config: &SegmenterConfig,
) -> Result<Vec<Passage>, AppError> {
    config.validate()?;
    if text.trim().is_empty() {
        return Err(AppError::Extraction(format!(
            "{source} has no text to segment"
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut passages: Vec<Passage> = Vec::new();
    let mut start = 0;
    let mut previous_end: usize = 0;

    loop {
        let hard_end = (start + config.chunk_size).min(total);
        let end = if hard_end == total {
            total
        } else {
            soft_boundary(&chars, start, hard_end, config)
        };

        passages.push(Passage {
            source: source.to_string(),
            index: passages.len(),
            text: chars[start..end].iter().collect(),
            char_start: start,
            char_end: end,
            overlap_chars: if passages.is_empty() {
                0
            } else {
                previous_end.saturating_sub(start)
            },
        });

        if end >= total {
            break;
        }
        previous_end = end;
        start = end - config.chunk_overlap;
    }

    Ok(passages)
}

// `floor > start + chunk_overlap` keeps every step moving forward.
fn soft_boundary(chars: &[char], start: usize, hard_end: usize, config: &SegmenterConfig) -> usize {
    let floor = (start + config.chunk_overlap + 1).max(start + config.chunk_size / 2);
    (floor..=hard_end)
        .rev()
        .find(|&end| chars[end - 1].is_whitespace())
        .unwrap_or(hard_end)
}

/// One passage per non-blank element, verbatim.
pub fn segment_elements<'a>(
    source: &str,
    elements: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<Passage>, AppError> {
    let mut passages = Vec::new();
    let mut offset = 0;

    for element in elements {
        let len = element.chars().count();
        if !element.trim().is_empty() {
            passages.push(Passage {
                source: source.to_string(),
                index: passages.len(),
                text: element.to_string(),
                char_start: offset,
                char_end: offset + len,
                overlap_chars: 0,
            });
        }
        offset += len;
    }

    if passages.is_empty() {
        return Err(AppError::Extraction(format!(
            "{source} has no non-blank elements"
        )));
    }

    Ok(passages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, overlap: usize) -> SegmenterConfig {
        SegmenterConfig::new(size, overlap).expect("valid segmenter config")
    }

    fn shared_chars(a: &Passage, b: &Passage) -> usize {
        a.char_end.saturating_sub(b.char_start)
    }

    #[test]
    fn unbroken_text_yields_fixed_windows() {
        let text = "a".repeat(5_000);
        let passages = segment_text("doc.txt", &text, &config(2_000, 500)).expect("passages");

        let spans: Vec<(usize, usize)> = passages.iter().map(|p| (p.char_start, p.char_end)).collect();
        assert_eq!(spans, vec![(0, 2_000), (1_500, 3_500), (3_000, 5_000)]);
        assert!(passages.windows(2).all(|w| shared_chars(&w[0], &w[1]) == 500));
        assert_eq!(passages[0].overlap_chars, 0);
        assert_eq!(passages[2].overlap_chars, 500);
    }

    #[test]
    fn last_window_holds_the_remainder() {
        let text = "b".repeat(4_500);
        let lens: Vec<usize> = segment_text("doc.txt", &text, &config(2_000, 500))
            .expect("passages")
            .iter()
            .map(Passage::char_len)
            .collect();
        assert_eq!(lens, vec![2_000, 2_000, 1_500]);
    }

    #[test]
    fn short_text_is_a_single_passage() {
        let passages =
            segment_text("doc.txt", "Just one sentence.", &config(2_000, 500)).expect("passages");
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].text, "Just one sentence.");
    }

    #[test]
    fn windows_snap_to_whitespace() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let passages = segment_text("doc.txt", text, &config(20, 5)).expect("passages");

        for passage in &passages[..passages.len() - 1] {
            assert!(passage.text.ends_with(' '), "cut mid-word: {:?}", passage.text);
        }
        assert!(text.ends_with(&passages[passages.len() - 1].text));
    }

    #[test]
    fn sizes_and_overlaps_hold_for_mixed_text() {
        let text = "Rust 所有权 borrow checker. ".repeat(300);
        for (size, overlap) in [(100, 20), (257, 0), (64, 63), (2_000, 500)] {
            let cfg = config(size, overlap);
            let passages = segment_text("doc.txt", &text, &cfg).expect("passages");

            assert!(passages.iter().all(|p| p.text.chars().count() <= size));
            assert!(passages.iter().all(|p| p.text.chars().count() == p.char_len()));
            for pair in passages.windows(2) {
                assert!(shared_chars(&pair[0], &pair[1]) >= overlap);
                assert!(pair[1].char_start > pair[0].char_start);
            }
            assert_eq!(passages[0].char_start, 0);
            assert_eq!(
                passages.last().expect("last passage").char_end,
                text.chars().count()
            );
        }
    }

    #[test]
    fn blank_text_is_an_extraction_error() {
        assert!(matches!(
            segment_text("empty.txt", " \n\t ", &SegmenterConfig::default()),
            Err(AppError::Extraction(_))
        ));
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(matches!(
            SegmenterConfig::new(500, 500),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            SegmenterConfig::new(0, 0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn structural_mode_keeps_elements_verbatim() {
        let doc = ExtractedDocument {
            source: "notes.md".into(),
            text: "# Title\n\n- item one\n- item two\n\nClosing words.".into(),
        };
        let passages = segment_document(
            &doc,
            SegmentationMode::Structural,
            &SegmenterConfig::default(),
        )
        .expect("passages");

        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["# Title", "- item one\n- item two", "Closing words."]);
        assert_eq!(passages[2].index, 2);
    }

    #[test]
    fn structural_mode_drops_blank_elements() {
        let passages = segment_elements("x", ["  ", "kept", ""]).expect("passages");
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].index, 0);

        assert!(matches!(
            segment_elements("x", [" ", "\n"]),
            Err(AppError::Extraction(_))
        ));
    }
}
