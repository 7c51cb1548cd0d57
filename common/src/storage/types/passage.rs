use serde::{Deserialize, Serialize};

/// A bounded span of source text. Offsets are in characters, not bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Passage {
    pub source: String,
    pub index: usize,
    pub text: String,
    pub char_start: usize,
    pub char_end: usize,
    /// Characters shared with the previous passage of the same source.
    pub overlap_chars: usize,
}

impl Passage {
    pub fn char_len(&self) -> usize {
        self.char_end.saturating_sub(self.char_start)
    }
}
