//! JSON payloads exchanged with the processing backend.
//!
//! Backend payloads are loose: segment text may arrive as `content` or `text`,
//! confidence may sit at the top level or inside `metadata`, and ids may be
//! numbers or strings. Everything is normalized here so the core only ever
//! sees [`JobStatus`] and [`IncomingSegment`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pipeline_core::{
    ConfirmRequest, IncomingSegment, JobStatus, Segment, SegmentId, SegmentMetadata,
    SegmentationRequest, TaskStatus, DEFAULT_CONFIDENCE,
};

#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusPayload {
    #[serde(default)]
    pub task_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl From<JobStatusPayload> for JobStatus {
    fn from(payload: JobStatusPayload) -> Self {
        JobStatus {
            task_id: payload.task_id.unwrap_or_default(),
            status: TaskStatus::parse(&payload.status),
            progress: payload.progress,
            message: payload.message,
            error: payload.error,
            start_time: payload.start_time,
            end_time: payload.end_time,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SegmentPayload {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub confidence: Option<Value>,
}

/// Maps one backend segment onto the canonical shape.
pub fn normalize_segment(payload: SegmentPayload) -> IncomingSegment {
    let id = match payload.id {
        Some(Value::Number(number)) => Some(SegmentId::new(number.to_string())),
        Some(Value::String(raw)) if !raw.trim().is_empty() => Some(SegmentId::new(raw)),
        _ => None,
    };

    let content = payload
        .content
        .filter(|content| !content.is_empty())
        .or(payload.text)
        .unwrap_or_default();

    let metadata = payload.metadata.as_ref().and_then(Value::as_object);
    let field = |name: &str| metadata.and_then(|map| map.get(name));

    let confidence = field("confidence")
        .and_then(Value::as_f64)
        .or_else(|| payload.confidence.as_ref().and_then(Value::as_f64))
        .map(|value| value as f32)
        .unwrap_or(DEFAULT_CONFIDENCE);

    IncomingSegment {
        id,
        content,
        metadata: SegmentMetadata {
            page: field("page")
                .and_then(Value::as_u64)
                .and_then(|page| u32::try_from(page).ok()),
            section: field("section").and_then(|section| match section {
                Value::String(raw) => Some(raw.clone()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            }),
            confidence: Some(confidence),
            keywords: field("keywords")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentationBody {
    pub content: String,
    pub chunk_size: u32,
    pub overlap: u32,
    pub llm_backend: String,
    pub llm_model: String,
    pub llm_timeout: u32,
}

impl From<&SegmentationRequest> for SegmentationBody {
    fn from(request: &SegmentationRequest) -> Self {
        Self {
            content: request.content.clone(),
            chunk_size: request.options.chunk_size,
            overlap: request.options.overlap,
            llm_backend: request.options.llm_backend.clone(),
            llm_model: request.options.llm_model.clone(),
            llm_timeout: request.options.llm_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmBody {
    pub ocr_result: OcrResultBody,
    pub rag_segments: Vec<SegmentBody>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OcrResultBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentBody {
    pub id: String,
    pub content: String,
    pub chunk_index: usize,
    pub metadata: MetadataBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl From<&Segment> for SegmentBody {
    fn from(segment: &Segment) -> Self {
        Self {
            id: segment.id.to_string(),
            content: segment.content.clone(),
            chunk_index: segment.chunk_index,
            metadata: MetadataBody {
                page: segment.metadata.page,
                section: segment.metadata.section.clone(),
                confidence: segment.metadata.confidence,
                keywords: segment.metadata.keywords.clone(),
            },
        }
    }
}

impl From<&ConfirmRequest> for ConfirmBody {
    fn from(request: &ConfirmRequest) -> Self {
        Self {
            ocr_result: OcrResultBody {
                file_id: request.file_id.clone(),
                content: request.source_text.clone(),
            },
            rag_segments: request.segments.iter().map(SegmentBody::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub result_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    detail: Value,
}

/// Pulls `detail` out of an error body; validation errors carry a list there.
pub fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        Value::String(text) if !text.is_empty() => Some(text),
        Value::Null | Value::String(_) => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(value: Value) -> IncomingSegment {
        normalize_segment(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn text_is_a_fallback_for_content() {
        assert_eq!(parse(json!({"text": "from text"})).content, "from text");
        assert_eq!(
            parse(json!({"content": "wins", "text": "loses"})).content,
            "wins"
        );
        assert_eq!(parse(json!({})).content, "");
    }

    #[test]
    fn confidence_prefers_metadata_then_top_level_then_default() {
        let nested = parse(json!({
            "content": "a",
            "confidence": 0.5,
            "metadata": {"confidence": 0.7}
        }));
        assert_eq!(nested.metadata.confidence, Some(0.7));

        let top = parse(json!({"content": "a", "confidence": 0.5}));
        assert_eq!(top.metadata.confidence, Some(0.5));

        let none = parse(json!({"content": "a"}));
        assert_eq!(none.metadata.confidence, Some(DEFAULT_CONFIDENCE));
    }

    #[test]
    fn error_detail_reads_string_and_structured_details() {
        assert_eq!(
            error_detail(r#"{"detail": "segmenter crashed"}"#).as_deref(),
            Some("segmenter crashed")
        );
        assert_eq!(
            error_detail(r#"{"detail": [{"loc": ["body"]}]}"#).as_deref(),
            Some(r#"[{"loc":["body"]}]"#)
        );
        assert_eq!(error_detail("task not found"), None);
        assert_eq!(error_detail(r#"{"error": "x"}"#), None);
    }

    #[test]
    fn non_numeric_confidence_falls_back_to_default() {
        let top = parse(json!({"content": "a", "confidence": "high"}));
        assert_eq!(top.metadata.confidence, Some(DEFAULT_CONFIDENCE));

        let nested = parse(json!({
            "content": "a",
            "confidence": "high",
            "metadata": {"confidence": 0.4}
        }));
        assert_eq!(nested.metadata.confidence, Some(0.4));

        let batch: Vec<SegmentPayload> = serde_json::from_value(json!([
            {"content": "a", "confidence": null},
            {"text": "b", "confidence": [1]}
        ]))
        .unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn numeric_and_string_ids_are_accepted() {
        assert_eq!(parse(json!({"id": 3, "content": "a"})).id, Some(SegmentId::from("3")));
        assert_eq!(
            parse(json!({"id": "seg-9", "content": "a"})).id,
            Some(SegmentId::from("seg-9"))
        );
        assert_eq!(parse(json!({"id": null, "content": "a"})).id, None);
        assert_eq!(parse(json!({"id": "", "content": "a"})).id, None);
    }

    #[test]
    fn metadata_is_read_leniently() {
        let segment = parse(json!({
            "content": "a",
            "metadata": {
                "page": 4,
                "section": 2,
                "keywords": ["ocr", 7, "rag"],
                "chunk_type": "paragraph"
            }
        }));
        assert_eq!(segment.metadata.page, Some(4));
        assert_eq!(segment.metadata.section.as_deref(), Some("2"));
        assert_eq!(segment.metadata.keywords, vec!["ocr", "rag"]);

        let odd = parse(json!({"content": "a", "metadata": "not an object"}));
        assert_eq!(odd.metadata.page, None);
    }

    #[test]
    fn status_payload_maps_unknown_status_and_missing_fields() {
        let payload: JobStatusPayload =
            serde_json::from_value(json!({"status": "processing", "progress": 35})).unwrap();
        let status = JobStatus::from(payload);
        assert_eq!(status.status, TaskStatus::Processing);
        assert_eq!(status.progress, Some(35.0));
        assert_eq!(status.task_id, "");
    }
}
