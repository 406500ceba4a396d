//! tts.rs — native text-to-speech stand-in for the Web Speech API.
//!
//! One utterance at a time: starting a new one kills the in-flight child.

use serde::{Deserialize, Serialize};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, OnceLock};

use crate::logging::{backend_error, backend_info, backend_warn};
use crate::settings::load_settings;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TtsAvailability {
    pub supported: bool,
    pub backend: String,
    pub reason: Option<String>,
}

static ACTIVE_TTS_CHILD: OnceLock<Mutex<Option<Child>>> = OnceLock::new();

/// Regional UI languages without a synthesis voice fall back to a
/// linguistically related one.
const RELATED_LANGUAGES: &[(&str, &str)] = &[("az", "tr")];

fn active_tts_child() -> &'static Mutex<Option<Child>> {
    ACTIVE_TTS_CHILD.get_or_init(|| Mutex::new(None))
}

pub fn detect_backend() -> Option<&'static str> {
    let candidates = ["espeak-ng", "espeak"];

    for candidate in candidates {
        let status = Command::new(candidate)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        if let Ok(exit_status) = status {
            if exit_status.success() {
                return Some(candidate);
            }
        }
    }

    None
}

fn normalize_lang(lang: &str) -> String {
    let trimmed = lang.trim();
    if trimmed.is_empty() {
        return "az".to_string();
    }

    let normalized = trimmed.replace('_', "-").to_lowercase();
    normalized
        .split('-')
        .next()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "az".to_string())
}

/// Installed voice language codes, parsed from `espeak --voices`.
fn list_voices(backend: &str) -> Vec<String> {
    let output = match Command::new(backend).arg("--voices").output() {
        Ok(output) if output.status.success() => output,
        _ => return Vec::new(),
    };

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(1).map(str::to_string))
        .collect()
}

/// Voice selection priority: explicit user choice, then a voice matching the
/// UI language, then a related language's voice, then the backend default.
fn select_voice(explicit: &str, language_tag: &str, available: &[String]) -> String {
    let explicit = explicit.trim();
    if !explicit.is_empty() {
        return explicit.to_string();
    }

    let primary = normalize_lang(language_tag);
    if available.iter().any(|voice| *voice == primary) {
        return primary;
    }

    if let Some((_, related)) = RELATED_LANGUAGES.iter().find(|(from, _)| *from == primary) {
        if available.iter().any(|voice| voice == related) {
            backend_info(format!(
                "No '{}' synthesis voice installed, falling back to related '{}'",
                primary, related
            ));
            return related.to_string();
        }
    }

    "default".to_string()
}

fn map_rate(rate: f32) -> i32 {
    let bounded = rate.clamp(0.5, 2.0);
    (175.0 * bounded).round().clamp(80.0, 450.0) as i32
}

fn map_pitch(pitch: f32) -> i32 {
    let normalized = 50.0 + ((pitch.clamp(0.5, 2.0) - 1.0) * 25.0);
    normalized.round().clamp(0.0, 99.0) as i32
}

fn stop_active_tts_child() -> Result<(), String> {
    let mut guard = active_tts_child()
        .lock()
        .map_err(|_| "Failed to lock active TTS process state".to_string())?;

    if let Some(mut child) = guard.take() {
        let pid = child.id();
        match child.try_wait() {
            Ok(Some(status)) => {
                backend_info(format!(
                    "No active TTS process to stop (already exited: pid={}, status={})",
                    pid, status
                ));
            }
            Ok(None) => {
                backend_info(format!("Stopping active TTS process (pid={})", pid));
                if let Err(error) = child.kill() {
                    backend_warn(format!("Failed to kill TTS process {}: {}", pid, error));
                }
                if let Err(error) = child.wait() {
                    backend_warn(format!(
                        "Failed to wait for terminated TTS process {}: {}",
                        pid, error
                    ));
                }
            }
            Err(error) => {
                backend_warn(format!(
                    "Failed to inspect active TTS process {}: {}",
                    pid, error
                ));
            }
        }
    }

    Ok(())
}

/// Capability probe, run once at startup and on demand from the settings
/// overlay. Absence is a normal branch for callers, not an exception.
#[tauri::command]
pub fn tts_is_available() -> TtsAvailability {
    if let Some(backend) = detect_backend() {
        backend_info(format!("TTS backend available: {}", backend));
        return TtsAvailability {
            supported: true,
            backend: backend.to_string(),
            reason: None,
        };
    }

    backend_warn("No supported local TTS backend found (expected: espeak-ng or espeak)");

    TtsAvailability {
        supported: false,
        backend: "none".to_string(),
        reason: Some(
            "Lokal TTS backend tapılmadı. 'espeak-ng' və ya 'espeak' paketini quraşdırın."
                .to_string(),
        ),
    }
}

/// Speak a bot reply aloud. Rate, pitch, voice, and UI language come from the
/// persisted settings; `voice` overrides the stored choice for this call.
#[tauri::command]
pub fn tts_speak(text: String, voice: Option<String>) -> Result<(), String> {
    let prepared_text = text.trim().to_string();
    if prepared_text.is_empty() {
        return Err("Empty text payload for TTS".to_string());
    }

    let backend = detect_backend().ok_or_else(|| {
        "Lokal TTS backend tapılmadı. 'espeak-ng' və ya 'espeak' paketini quraşdırın.".to_string()
    })?;

    stop_active_tts_child()?;

    let settings = load_settings();
    let explicit = voice.unwrap_or_else(|| settings.voice_uri.clone());
    let available = list_voices(backend);
    let voice_name = select_voice(&explicit, &settings.language, &available);

    let speed = map_rate(settings.rate).to_string();
    let pitch_value = map_pitch(settings.pitch).to_string();

    backend_info(format!(
        "Starting TTS playback via {} (text_len={}, voice='{}', rate={}, pitch={})",
        backend,
        prepared_text.len(),
        voice_name,
        speed,
        pitch_value
    ));

    let child = Command::new(backend)
        .arg("-v")
        .arg(voice_name)
        .arg("-s")
        .arg(speed)
        .arg("-p")
        .arg(pitch_value)
        .arg(prepared_text)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|error| {
            backend_error(format!("Failed to spawn backend TTS process: {}", error));
            format!("Failed to spawn backend TTS process: {}", error)
        })?;

    let pid = child.id();

    let mut guard = active_tts_child()
        .lock()
        .map_err(|_| "Failed to lock active TTS process state".to_string())?;
    *guard = Some(child);

    backend_info(format!("TTS playback process started (pid={})", pid));

    Ok(())
}

#[tauri::command]
pub fn tts_stop() -> Result<(), String> {
    backend_info("Command tts_stop invoked");
    stop_active_tts_child()
}
