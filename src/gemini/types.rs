//! Wire types for the `generateContent` endpoint.
//!
//! Every nested field of the response is optional; extraction walks the
//! envelope with explicit presence checks.

use crate::image::DataUri;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// MIME type assumed when the model omits one on an inline image.
const FALLBACK_IMAGE_MIME: &str = "image/png";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub(crate) contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content {
    pub(crate) parts: Vec<RequestPart>,
}

/// A part in a request: text or an inline image.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum RequestPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    #[serde(default)]
    pub(crate) mime_type: String,
    #[serde(default)]
    pub(crate) data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub(crate) response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageConfig {
    pub(crate) aspect_ratio: String,
}

impl GenerateContentRequest {
    /// A plain text prompt for the text model.
    pub(crate) fn text(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![RequestPart::Text { text: prompt }],
            }],
            generation_config: None,
        }
    }

    /// A text prompt asking the image model for a picture.
    pub(crate) fn image(prompt: String, aspect_ratio: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![RequestPart::Text { text: prompt }],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: Some(ImageConfig {
                    aspect_ratio: aspect_ratio.to_string(),
                }),
            }),
        }
    }

    /// The source image first, then the instruction.
    pub(crate) fn edit(mime_type: &str, image_bytes: &[u8], instruction: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: base64::engine::general_purpose::STANDARD.encode(image_bytes),
                        },
                    },
                    RequestPart::Text { text: instruction },
                ],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: None,
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
    #[serde(default)]
    pub(crate) prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub(crate) content: Option<CandidateContent>,
    #[serde(default)]
    pub(crate) finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub(crate) parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponsePart {
    #[serde(default)]
    pub(crate) text: Option<String>,
    #[serde(default, alias = "inline_data")]
    pub(crate) inline_data: Option<InlineData>,
    /// Set on reasoning summaries, which are not part of the answer.
    #[serde(default)]
    pub(crate) thought: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    #[serde(default)]
    pub(crate) block_reason: Option<String>,
    #[serde(default)]
    pub(crate) block_reason_message: Option<String>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated answer text of the first candidate, `None` when empty.
    pub(crate) fn text(&self) -> Option<String> {
        let text: String = self
            .first_parts()
            .iter()
            .filter(|part| !part.thought)
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// The first inline image of the first candidate, as a data URI.
    pub(crate) fn first_inline_image(&self) -> Option<DataUri> {
        self.first_parts()
            .iter()
            .filter_map(|part| part.inline_data.as_ref())
            .find(|inline| !inline.data.is_empty())
            .map(|inline| {
                let mime = if inline.mime_type.is_empty() {
                    FALLBACK_IMAGE_MIME
                } else {
                    inline.mime_type.as_str()
                };
                DataUri::new(mime, inline.data.clone())
            })
    }

    /// Why the prompt was rejected, if it was.
    pub(crate) fn block_message(&self) -> Option<String> {
        let feedback = self.prompt_feedback.as_ref()?;
        let reason = feedback.block_reason.as_ref()?;
        Some(
            feedback
                .block_reason_message
                .clone()
                .unwrap_or_else(|| format!("Prompt blocked: {reason}")),
        )
    }

    /// Finish reason of the first candidate.
    pub(crate) fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }
}

/// Finish reasons meaning a safety filter stopped the output.
pub(crate) fn is_safety_finish_reason(reason: &str) -> bool {
    matches!(
        reason,
        "SAFETY"
            | "IMAGE_SAFETY"
            | "IMAGE_PROHIBITED_CONTENT"
            | "IMAGE_RECITATION"
            | "RECITATION"
            | "PROHIBITED_CONTENT"
            | "BLOCKLIST"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_request_shape() {
        let req = GenerateContentRequest::text("hello".into());
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_image_request_asks_for_square_image() {
        let req = GenerateContentRequest::image("a cake".into(), "1:1");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["generationConfig"]["responseModalities"][0], "IMAGE");
        assert_eq!(json["generationConfig"]["imageConfig"]["aspectRatio"], "1:1");
        assert!(json.get("generation_config").is_none());
    }

    #[test]
    fn test_edit_request_puts_image_before_instruction() {
        let req = GenerateContentRequest::edit("image/jpeg", b"hello", "add parsley".into());
        let json = serde_json::to_value(&req).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "aGVsbG8=");
        assert_eq!(parts[1]["text"], "add parsley");
        assert!(json["generationConfig"].get("imageConfig").is_none());
    }

    #[test]
    fn test_text_concatenates_parts_and_skips_thoughts() {
        let resp = parse(
            r##"{"candidates": [{"content": {"parts": [
                {"text": "thinking...", "thought": true},
                {"text": "# Bibimbap\n"},
                {"text": "1. Cook rice"}
            ]}}]}"##,
        );
        assert_eq!(resp.text().as_deref(), Some("# Bibimbap\n1. Cook rice"));
    }

    #[test]
    fn test_text_is_none_for_empty_shapes() {
        for json in [
            r#"{}"#,
            r#"{"candidates": []}"#,
            r#"{"candidates": [{"finishReason": "STOP"}]}"#,
            r#"{"candidates": [{"content": {}}]}"#,
            r#"{"candidates": [{"content": {"parts": [{"text": ""}]}}]}"#,
            r#"{"candidates": [{"content": {"parts": [{"text": "hmm", "thought": true}]}}]}"#,
        ] {
            assert!(parse(json).text().is_none(), "{json}");
        }
    }

    #[test]
    fn test_whitespace_text_is_returned_as_is() {
        let resp = parse(r#"{"candidates": [{"content": {"parts": [{"text": " \n "}]}}]}"#);
        assert_eq!(resp.text().as_deref(), Some(" \n "));
    }

    #[test]
    fn test_first_inline_image() {
        let resp = parse(
            r#"{"candidates": [{"content": {"parts": [
                {"text": "Here is your dish"},
                {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/AAAA"}},
                {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
            ]}, "finishReason": "STOP"}]}"#,
        );
        let image = resp.first_inline_image().unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.data(), "/9j/AAAA");
        assert_eq!(resp.finish_reason(), Some("STOP"));
    }

    #[test]
    fn test_inline_image_accepts_snake_case_and_missing_mime() {
        let resp = parse(
            r#"{"candidates": [{"content": {"parts": [{"inline_data": {"data": "AAAA"}}]}}]}"#,
        );
        let image = resp.first_inline_image().unwrap();
        assert_eq!(image.mime_type(), "image/png");
    }

    #[test]
    fn test_no_inline_image() {
        for json in [
            r#"{}"#,
            r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#,
            r#"{"candidates": [{"content": {"parts": [{"text": "I can't draw that"}]}}]}"#,
            r#"{"candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": ""}}]}}]}"#,
        ] {
            assert!(parse(json).first_inline_image().is_none(), "{json}");
        }
    }

    #[test]
    fn test_block_message() {
        let resp = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        assert_eq!(resp.block_message().as_deref(), Some("Prompt blocked: SAFETY"));

        let resp = parse(
            r#"{"promptFeedback": {"blockReason": "OTHER", "blockReasonMessage": "nope"}}"#,
        );
        assert_eq!(resp.block_message().as_deref(), Some("nope"));

        assert!(parse(r#"{"promptFeedback": {}}"#).block_message().is_none());
    }

    #[test]
    fn test_safety_finish_reasons() {
        assert!(is_safety_finish_reason("IMAGE_SAFETY"));
        assert!(is_safety_finish_reason("BLOCKLIST"));
        assert!(!is_safety_finish_reason("STOP"));
        assert!(!is_safety_finish_reason("MAX_TOKENS"));
    }
}
