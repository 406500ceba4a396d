//! image_gen.rs — Gemini image-generation client for the "draw me ..." path.

use serde_json::{json, Value};
use std::env;

use crate::conversation::Attachment;
use crate::llm::{resolve_api_key, truncate_body};
use crate::logging::{backend_error, backend_info};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

/// Shown when the image endpoint fails for any reason.
pub const ERR_IMAGE_BUSY: &str =
    "Şəkil servisi hazırda məşğuldur. Bir az sonra yenidən cəhd edin.";

pub fn image_model() -> String {
    env::var("GEMINI_IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string())
}

fn first_inline_image(data: &Value) -> Option<Attachment> {
    let parts = data["candidates"].get(0)?["content"]["parts"].as_array()?;
    parts.iter().find_map(|part| {
        let inline = part.get("inlineData")?;
        let payload = inline["data"].as_str()?;
        if payload.is_empty() {
            return None;
        }
        Some(Attachment {
            mime_type: inline["mimeType"].as_str().unwrap_or("image/png").to_string(),
            data_base64: payload.to_string(),
        })
    })
}

/// Generate one image from a free-text prompt. Single attempt; failure maps
/// to the fixed busy notice.
pub async fn generate_image(
    prompt: &str,
    api_key_override: Option<&str>,
) -> Result<Attachment, String> {
    let api_key = resolve_api_key(api_key_override).ok_or_else(|| {
        backend_error("GEMINI_API_KEY not set and no override provided");
        ERR_IMAGE_BUSY.to_string()
    })?;
    let model = image_model();

    let payload = json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }],
        }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"],
            "candidateCount": 1,
        },
    });

    backend_info(format!(
        "Image generation requested via {} (prompt_len={})",
        model,
        prompt.len()
    ));

    let url = format!("{GEMINI_BASE_URL}/{model}:generateContent?key={api_key}");
    let client = reqwest::Client::new();
    let resp = client.post(&url).json(&payload).send().await.map_err(|e| {
        backend_error(format!("Image HTTP request failed: {}", e));
        ERR_IMAGE_BUSY.to_string()
    })?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let truncated = truncate_body(&body, 300);
        backend_error(format!("Image HTTP error {}: {}", status, truncated));
        return Err(ERR_IMAGE_BUSY.to_string());
    }

    let data: Value = resp.json().await.map_err(|e| {
        backend_error(format!("Failed to parse image JSON response: {}", e));
        ERR_IMAGE_BUSY.to_string()
    })?;

    match first_inline_image(&data) {
        Some(image) => {
            backend_info(format!(
                "Image received ({}, base64_len={})",
                image.mime_type,
                image.data_base64.len()
            ));
            Ok(image)
        }
        None => {
            backend_error("Image response contained no inlineData part");
            Err(ERR_IMAGE_BUSY.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_inline_image() {
        let data = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "burada şəkliniz:" },
                    { "inlineData": { "mimeType": "image/png", "data": "QUJD" } }
                ] }
            }]
        });
        let image = first_inline_image(&data).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data_base64, "QUJD");
    }

    #[test]
    fn text_only_response_yields_none() {
        let data = json!({
            "candidates": [{ "content": { "parts": [{ "text": "yalnız mətn" }] } }]
        });
        assert!(first_inline_image(&data).is_none());
    }

    #[test]
    fn empty_inline_payload_is_rejected() {
        let data = json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "" } }] }
            }]
        });
        assert!(first_inline_image(&data).is_none());
    }
}
