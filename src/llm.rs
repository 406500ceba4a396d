//! llm.rs — Gemini generateContent client for the chat text path.
//! Runs server-side in the Tauri backend to keep the API key out of the webview.

use serde_json::{json, Value};
use std::env;

use crate::conversation::{Attachment, Message, Sender};
use crate::logging::{backend_error, backend_info};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";

const TEMPERATURE: f32 = 0.9;
const TOP_P: f32 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 4096;

/// User-facing transport failure notice. Raw reqwest errors never cross the
/// command boundary.
pub const ERR_CONNECTION: &str =
    "Bağlantı xətası baş verdi. İnternet bağlantınızı yoxlayıb yenidən cəhd edin.";
/// Shown when the model returns no usable candidate (empty or safety-blocked).
pub const ERR_BLOCKED: &str = "Cavab bloklandı və ya boş qayıtdı.";

/// Truncate an error body for logging without splitting a multi-byte UTF-8
/// character (Gemini error JSON can carry localized text).
pub(crate) fn truncate_body(body: &str, max: usize) -> &str {
    if body.len() <= max {
        return body;
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Resolve the API key: prefer explicit override, then env var.
pub fn resolve_api_key(override_key: Option<&str>) -> Option<String> {
    override_key
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| {
            let from_env = env::var("GEMINI_API_KEY").unwrap_or_default();
            let trimmed = from_env.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
}

pub fn text_model() -> String {
    env::var("GEMINI_TEXT_MODEL").unwrap_or_else(|_| DEFAULT_TEXT_MODEL.to_string())
}

fn role_for(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "user",
        Sender::Bot => "model",
    }
}

fn turn(role: &str, text: &str, attachment: Option<&Attachment>) -> Value {
    let mut parts = Vec::new();
    if let Some(image) = attachment {
        parts.push(json!({
            "inlineData": {
                "mimeType": image.mime_type,
                "data": image.data_base64,
            }
        }));
    }
    // A turn always carries at least one part; an image-only message still
    // gets its (possibly empty) text part.
    if attachment.is_none() || !text.is_empty() {
        parts.push(json!({ "text": text }));
    }
    json!({ "role": role, "parts": parts })
}

/// Replay the full history as role-tagged turns, in original order, followed
/// by the new user turn. There is no server-side session — this array is the
/// whole context window.
pub fn build_contents(history: &[Message], new_text: &str, new_image: Option<&Attachment>) -> Value {
    let mut contents: Vec<Value> = history
        .iter()
        .map(|message| turn(role_for(message.sender), &message.text, message.attachment.as_ref()))
        .collect();
    contents.push(turn("user", new_text, new_image));
    Value::Array(contents)
}

/// Persona / language / formatting policy sent as the system instruction.
pub fn build_system_instruction(language_tag: &str) -> String {
    format!(
        "Sən Söhbət adlı köməkçi çatbotsan. İstifadəçi ilə '{}' dilində danış. \
         Cavabları markdown formatında ver. Veb sayt istənəndə tam HTML sənədini \
         ```html çərçivəsində qaytar.",
        language_tag
    )
}

fn first_candidate_text(data: &Value) -> Option<String> {
    let parts = data["candidates"].get(0)?["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Send the conversation plus the new user message to the text model.
/// Single attempt — no retry, no backoff, no timeout.
pub async fn send_text(
    history: &[Message],
    new_text: &str,
    new_image: Option<&Attachment>,
    language_tag: &str,
    api_key_override: Option<&str>,
) -> Result<String, String> {
    let api_key = resolve_api_key(api_key_override).ok_or_else(|| {
        backend_error("GEMINI_API_KEY not set and no override provided");
        ERR_CONNECTION.to_string()
    })?;
    let model = text_model();

    let payload = json!({
        "contents": build_contents(history, new_text, new_image),
        "systemInstruction": {
            "parts": [{ "text": build_system_instruction(language_tag) }]
        },
        "generationConfig": {
            "temperature": TEMPERATURE,
            "topP": TOP_P,
            "maxOutputTokens": MAX_OUTPUT_TOKENS,
        },
    });

    backend_info(format!(
        "LLM payload prepared for {} (turns={}, has_image={})",
        model,
        history.len() + 1,
        new_image.is_some()
    ));

    let url = format!("{GEMINI_BASE_URL}/{model}:generateContent?key={api_key}");
    let client = reqwest::Client::new();
    let resp = client.post(&url).json(&payload).send().await.map_err(|e| {
        backend_error(format!("LLM HTTP request failed: {}", e));
        ERR_CONNECTION.to_string()
    })?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let truncated = truncate_body(&body, 300);
        backend_error(format!("LLM HTTP error {}: {}", status, truncated));
        return Err(ERR_CONNECTION.to_string());
    }

    let data: Value = resp.json().await.map_err(|e| {
        backend_error(format!("Failed to parse LLM JSON response: {}", e));
        ERR_CONNECTION.to_string()
    })?;

    match first_candidate_text(&data) {
        Some(text) => {
            backend_info(format!("LLM response extracted (text_len={})", text.len()));
            Ok(text)
        }
        None => {
            let finish_reason = data["candidates"][0]["finishReason"].as_str().unwrap_or("none");
            backend_error(format!(
                "LLM returned no usable candidate (finishReason={})",
                finish_reason
            ));
            Err(ERR_BLOCKED.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(sender: Sender, text: &str) -> Message {
        Message::new(sender, text.to_string(), None, false)
    }

    #[test]
    fn history_order_and_roles_preserved() {
        let history = vec![
            msg(Sender::User, "salam"),
            msg(Sender::Bot, "Salam! Necə kömək edə bilərəm?"),
            msg(Sender::User, "hava necədir"),
        ];
        let contents = build_contents(&history, "sağ ol", None);
        let turns = contents.as_array().unwrap();

        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0]["role"], "user");
        assert_eq!(turns[1]["role"], "model");
        assert_eq!(turns[2]["role"], "user");
        assert_eq!(turns[3]["role"], "user");
        assert_eq!(turns[0]["parts"][0]["text"], "salam");
        assert_eq!(turns[3]["parts"][0]["text"], "sağ ol");
    }

    #[test]
    fn attachment_becomes_inline_data_part() {
        let image = Attachment {
            mime_type: "image/png".to_string(),
            data_base64: "aGVsbG8=".to_string(),
        };
        let contents = build_contents(&[], "bu nədir?", Some(&image));
        let parts = contents[0]["parts"].as_array().unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "aGVsbG8=");
        assert_eq!(parts[1]["text"], "bu nədir?");
    }

    #[test]
    fn image_only_bot_message_serializes_without_empty_text() {
        let image = Attachment {
            mime_type: "image/png".to_string(),
            data_base64: "aaaa".to_string(),
        };
        let history = vec![Message::new(Sender::Bot, String::new(), Some(image), false)];
        let contents = build_contents(&history, "davam", None);
        let parts = contents[0]["parts"].as_array().unwrap();

        assert_eq!(parts.len(), 1);
        assert!(parts[0].get("inlineData").is_some());
    }

    #[test]
    fn system_instruction_names_the_language() {
        let instruction = build_system_instruction("az-AZ");
        assert!(instruction.contains("az-AZ"));
    }

    #[test]
    fn blocked_response_has_no_candidate_text() {
        let data = serde_json::json!({
            "candidates": [{ "finishReason": "SAFETY", "content": { "parts": [] } }]
        });
        assert!(first_candidate_text(&data).is_none());
    }

    #[test]
    fn body_truncation_respects_char_boundaries() {
        // Byte 300 falls inside the two-byte "ə".
        let body = format!("{}əəəə", "x".repeat(299));
        let truncated = truncate_body(&body, 300);
        assert_eq!(truncated, "x".repeat(299));
        assert!(truncated.len() <= 300);

        let short = "qısa mətn";
        assert_eq!(truncate_body(short, 300), short);

        let exact = "ə".repeat(150);
        assert_eq!(truncate_body(&exact, 300), exact);
    }

    #[test]
    fn multi_part_candidate_text_is_concatenated() {
        let data = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "birinci " }, { "text": "ikinci" }] }
            }]
        });
        assert_eq!(first_candidate_text(&data).unwrap(), "birinci ikinci");
    }
}
