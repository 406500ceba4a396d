/// Settings management — load, save, and migrate voice/UI settings.

use crate::logging::{backend_error, backend_info, backend_warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Voice and UI preferences mutated only via the settings overlay.
/// `voice_uri` empty means "no explicit voice chosen" — the speech bridge
/// then falls back to language matching (see tts.rs).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VoiceSettings {
    #[serde(default = "default_pitch")]
    pub pitch: f32,
    #[serde(default = "default_rate")]
    pub rate: f32,
    #[serde(default)]
    pub voice_uri: String,
    #[serde(default = "default_auto_read")]
    pub auto_read: bool,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_pitch() -> f32 { 1.0 }
fn default_rate() -> f32 { 1.0 }
fn default_auto_read() -> bool { false }
fn default_language() -> String { "az-AZ".to_string() }

impl Default for VoiceSettings {
    fn default() -> Self {
        VoiceSettings {
            pitch: default_pitch(),
            rate: default_rate(),
            voice_uri: String::new(),
            auto_read: default_auto_read(),
            language: default_language(),
        }
    }
}

pub fn settings_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sohbet");
    if let Err(err) = fs::create_dir_all(&config_dir) {
        backend_warn(format!(
            "Failed to create config directory {}: {}",
            config_dir.display(),
            err
        ));
    }
    config_dir.join("settings.json")
}

fn load_from(path: &PathBuf) -> VoiceSettings {
    if !path.exists() {
        backend_warn(format!(
            "Settings file not found at {}. Using defaults.",
            path.display()
        ));
        return VoiceSettings::default();
    }

    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => {
            backend_error(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                err
            ));
            return VoiceSettings::default();
        }
    };

    match serde_json::from_str::<VoiceSettings>(&data) {
        Ok(settings) => settings,
        Err(err) => {
            backend_error(format!("Failed to parse settings: {}", err));
            VoiceSettings::default()
        }
    }
}

/// Load settings from disk (used by tts.rs and the chat_send system prompt).
pub fn load_settings() -> VoiceSettings {
    load_from(&settings_path())
}

#[tauri::command]
pub fn get_settings() -> VoiceSettings {
    backend_info("Command get_settings invoked");
    load_settings()
}

#[tauri::command]
pub fn save_settings(settings: VoiceSettings) -> Result<(), String> {
    backend_info("Command save_settings invoked");
    let path = settings_path();
    let json = serde_json::to_string_pretty(&settings).map_err(|e| {
        backend_error(format!("Failed to serialize settings: {}", e));
        e.to_string()
    })?;
    fs::write(&path, json).map_err(|e| {
        backend_error(format!(
            "Failed to write settings file {}: {}",
            path.display(),
            e
        ));
        e.to_string()
    })?;
    backend_info(format!("Settings saved to {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let parsed: VoiceSettings = serde_json::from_str(r#"{"pitch": 1.5}"#).unwrap();
        assert_eq!(parsed.pitch, 1.5);
        assert_eq!(parsed.rate, 1.0);
        assert!(parsed.voice_uri.is_empty());
        assert!(!parsed.auto_read);
        assert_eq!(parsed.language, "az-AZ");
    }

    #[test]
    fn auto_read_round_trips() {
        let mut settings = VoiceSettings::default();
        settings.auto_read = true;
        let json = serde_json::to_string(&settings).unwrap();
        let back: VoiceSettings = serde_json::from_str(&json).unwrap();
        assert!(back.auto_read);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let settings = load_from(&path);
        assert_eq!(settings.language, "az-AZ");
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        let settings = load_from(&path);
        assert_eq!(settings.rate, 1.0);
    }
}
