//! stt.rs — single-shot speech-to-text via the multimodal endpoint.
//!
//! The webview records a clip, sends it here as base64, and appends the
//! transcript to whatever is already in the input field (space-separated).
//! Any failure leaves no persisted error state — the caller resets to idle.

use serde_json::{json, Value};
use std::env;

use crate::llm::{resolve_api_key, truncate_body};
use crate::logging::{backend_error, backend_info, backend_warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_STT_MODEL: &str = "gemini-2.0-flash";

pub fn stt_model() -> String {
    env::var("GEMINI_STT_MODEL").unwrap_or_else(|_| DEFAULT_STT_MODEL.to_string())
}

fn mime_for(format: &str) -> String {
    match format {
        "wav" => "audio/wav".to_string(),
        "mp3" => "audio/mpeg".to_string(),
        other => format!("audio/{other}"),
    }
}

/// Transcribe a recorded clip. No interim results, no continuous mode.
pub async fn transcribe_base64(
    audio_base64: &str,
    format: &str,
    lang: &str,
    api_key_override: Option<&str>,
) -> Result<String, String> {
    let api_key = resolve_api_key(api_key_override)
        .ok_or("GEMINI_API_KEY not set — STT requires the cloud endpoint")?;
    let model = stt_model();

    let audio_kb = audio_base64.len() / 1024;
    if audio_kb < 1 {
        return Err("STT: recording too short (<1KB) — probably silence".into());
    }
    if audio_kb > 10_000 {
        return Err("STT: recording too large (>10MB) — limit the clip length".into());
    }

    backend_info(format!(
        "STT sending {}KB audio to {} (format={}, lang={})",
        audio_kb, model, format, lang
    ));

    let body = json!({
        "contents": [{
            "role": "user",
            "parts": [
                {
                    "text": format!(
                        "Transcribe this audio exactly, in language '{}'. \
                         If the recording is empty, too quiet, or unintelligible, \
                         return an empty string.",
                        lang
                    )
                },
                {
                    "inlineData": {
                        "mimeType": mime_for(format),
                        "data": audio_base64,
                    }
                }
            ],
        }],
        "generationConfig": { "temperature": 0.0 },
    });

    let url = format!("{GEMINI_BASE_URL}/{model}:generateContent?key={api_key}");
    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("STT: HTTP request failed: {e}"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let preview = truncate_body(&text, 300);
        backend_error(format!("STT HTTP error {}: {}", status, preview));
        return Err(format!("STT: HTTP {status}"));
    }

    let data: Value = resp
        .json()
        .await
        .map_err(|e| format!("STT: JSON parse error: {e}"))?;

    let text = data["candidates"]
        .get(0)
        .and_then(|c| c["content"]["parts"][0]["text"].as_str())
        .unwrap_or("")
        .trim()
        .to_string();

    if text.is_empty() {
        return Err("STT: empty transcription result (too quiet or silence?)".into());
    }

    backend_info(format!(
        "STT result: \"{}\"",
        text.chars().take(120).collect::<String>()
    ));
    Ok(text)
}

// ── Tauri command ────────────────────────────────────

/// Invoked as `invoke("stt_transcribe", { audioBase64, format, language })`.
/// Errors are not surfaced to the user — the dictation button just resets.
#[tauri::command]
pub async fn stt_transcribe(
    audio_base64: String,
    format: String,
    language: Option<String>,
    api_key: Option<String>,
) -> Result<String, String> {
    let lang = language.as_deref().unwrap_or("az");

    if format != "wav" {
        backend_warn(format!("STT: format '{format}' passed through without conversion"));
    }

    transcribe_base64(&audio_base64, &format, lang, api_key.as_deref()).await
}
