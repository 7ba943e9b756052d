use std::fmt;

/// Confidence assumed when the backend reports none.
pub const DEFAULT_CONFIDENCE: f32 = 0.9;

/// Stable segment identifier, unique within one collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(String);

impl SegmentId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SegmentId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Informational metadata attached to a segment. Never validated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentMetadata {
    pub page: Option<u32>,
    pub section: Option<String>,
    pub confidence: Option<f32>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: SegmentId,
    pub file_id: Option<String>,
    pub content: String,
    /// Position among siblings when the segment was created. Not renumbered.
    pub chunk_index: usize,
    pub metadata: SegmentMetadata,
}

impl Segment {
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// A backend segment after boundary normalization (`text`/`content` and the
/// two confidence locations already resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingSegment {
    pub id: Option<SegmentId>,
    pub content: String,
    pub metadata: SegmentMetadata,
}

impl IncomingSegment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
            metadata: SegmentMetadata {
                confidence: Some(DEFAULT_CONFIDENCE),
                ..SegmentMetadata::default()
            },
        }
    }
}

/// Tuning knobs forwarded to the segmentation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationOptions {
    pub chunk_size: u32,
    pub overlap: u32,
    pub llm_backend: String,
    pub llm_model: String,
    pub llm_timeout_secs: u32,
}

impl Default for SegmentationOptions {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
            llm_backend: "deepseek".to_string(),
            llm_model: "qwen2.5:7b".to_string(),
            llm_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationRequest {
    pub content: String,
    pub options: SegmentationOptions,
}

/// Payload for persisting the reviewed segments on the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmRequest {
    pub file_id: Option<String>,
    pub source_text: String,
    pub segments: Vec<Segment>,
}

/// Illustrative feedback while a segmentation call is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationPhase {
    Preparing,
    Sending,
    Processing,
}

impl SegmentationPhase {
    pub fn label(self) -> &'static str {
        match self {
            SegmentationPhase::Preparing => "preparing",
            SegmentationPhase::Sending => "sending",
            SegmentationPhase::Processing => "processing",
        }
    }
}
