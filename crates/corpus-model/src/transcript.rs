use serde::{Deserialize, Serialize};

/// A talk transcript as served by the transcript API.
///
/// Only the fields below survive decoding; anything else in the response
/// is dropped, so serializing a `Transcript` writes the validated shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub cues: Vec<Cue>,
}

/// A timed text fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Kept as the exact JSON number so `0` is written back as `0`, not `0.0`.
    pub time: serde_json::Number,
    pub text: String,
}

impl Transcript {
    pub fn cue_count(&self) -> usize {
        self.paragraphs.iter().map(|p| p.cues.len()).sum()
    }
}
