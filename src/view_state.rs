//! view_state.rs — primary screen tag, preview payload, and overlay flags.
//!
//! Transitions: LanguageSelect → Chat (one-time), Chat ⇄ Projects,
//! Chat/Projects → Preview → Chat. Overlays are orthogonal booleans on top
//! of the primary view.

use serde::Serialize;

use crate::logging::{backend_info, backend_warn};
use crate::{settings, SharedAppState};

pub const ERR_LANGUAGE_ALREADY_SET: &str = "Dil artıq seçilib.";
pub const ERR_LANGUAGE_NOT_SET: &str = "Əvvəlcə dil seçin.";
pub const ERR_EMPTY_PREVIEW: &str = "Önizləmə üçün HTML tapılmadı.";
pub const ERR_BAD_TRANSITION: &str = "Bu keçid mümkün deyil.";

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    LanguageSelect,
    Chat,
    Projects,
    Preview,
}

/// Overlay dialogs layered on top of the primary view, each independently
/// dismissible.
#[derive(Debug, Serialize, Clone, Copy, Default)]
pub struct Overlays {
    pub settings: bool,
    pub save_dialog: bool,
    pub debug_panel: bool,
}

#[derive(Debug)]
pub struct ViewState {
    view: View,
    language: Option<String>,
    preview_html: Option<String>,
    pub overlays: Overlays,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            view: View::LanguageSelect,
            language: None,
            preview_html: None,
            overlays: Overlays::default(),
        }
    }
}

/// Serializable snapshot handed to the webview.
#[derive(Debug, Serialize, Clone)]
pub struct ViewSnapshot {
    pub view: View,
    pub language: Option<String>,
    pub preview_html: Option<String>,
    pub overlays: Overlays,
}

impl ViewState {
    pub fn view(&self) -> View {
        self.view
    }

    /// Language for the system instruction: the tag chosen at startup,
    /// falling back to the persisted settings default before selection.
    pub fn active_language(&self) -> String {
        self.language
            .clone()
            .unwrap_or_else(|| settings::load_settings().language)
    }

    /// One-time, irreversible exit from the language screen.
    pub fn select_language(&mut self, tag: &str) -> Result<(), String> {
        if self.language.is_some() || self.view != View::LanguageSelect {
            return Err(ERR_LANGUAGE_ALREADY_SET.to_string());
        }
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(ERR_LANGUAGE_NOT_SET.to_string());
        }
        self.language = Some(tag.to_string());
        self.view = View::Chat;
        Ok(())
    }

    /// Return to chat. Leaving the preview discards its payload; history is
    /// untouched.
    pub fn show_chat(&mut self) -> Result<(), String> {
        match self.view {
            View::LanguageSelect => Err(ERR_LANGUAGE_NOT_SET.to_string()),
            View::Preview => {
                self.preview_html = None;
                self.view = View::Chat;
                Ok(())
            }
            View::Chat | View::Projects => {
                self.view = View::Chat;
                Ok(())
            }
        }
    }

    pub fn show_projects(&mut self) -> Result<(), String> {
        match self.view {
            View::Chat | View::Projects => {
                self.view = View::Projects;
                Ok(())
            }
            View::LanguageSelect => Err(ERR_LANGUAGE_NOT_SET.to_string()),
            View::Preview => Err(ERR_BAD_TRANSITION.to_string()),
        }
    }

    /// Enter the preview sandbox. Requires a non-empty HTML payload — the
    /// preview view never exists without one.
    pub fn enter_preview(&mut self, html: &str) -> Result<(), String> {
        if html.trim().is_empty() {
            return Err(ERR_EMPTY_PREVIEW.to_string());
        }
        match self.view {
            View::Chat | View::Projects => {
                self.preview_html = Some(html.to_string());
                self.view = View::Preview;
                Ok(())
            }
            View::LanguageSelect => Err(ERR_LANGUAGE_NOT_SET.to_string()),
            View::Preview => Err(ERR_BAD_TRANSITION.to_string()),
        }
    }

    /// Current preview payload, present exactly while in the preview view.
    pub fn preview_html(&self) -> Option<&str> {
        self.preview_html.as_deref()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            view: self.view,
            language: self.language.clone(),
            preview_html: self.preview_html.clone(),
            overlays: self.overlays,
        }
    }
}

// ── Tauri commands ───────────────────────────────────

#[tauri::command]
pub fn get_view(state: tauri::State<SharedAppState>) -> ViewSnapshot {
    state.lock().unwrap().view.snapshot()
}

#[tauri::command]
pub fn select_language(tag: String, state: tauri::State<SharedAppState>) -> Result<ViewSnapshot, String> {
    backend_info(format!("Command select_language invoked (tag='{}')", tag));
    let mut app = state.lock().map_err(|_| "Application state poisoned".to_string())?;
    app.view.select_language(&tag)?;
    Ok(app.view.snapshot())
}

#[tauri::command]
pub fn show_chat(state: tauri::State<SharedAppState>) -> Result<ViewSnapshot, String> {
    let mut app = state.lock().map_err(|_| "Application state poisoned".to_string())?;
    app.view.show_chat()?;
    Ok(app.view.snapshot())
}

#[tauri::command]
pub fn show_projects(state: tauri::State<SharedAppState>) -> Result<ViewSnapshot, String> {
    let mut app = state.lock().map_err(|_| "Application state poisoned".to_string())?;
    app.view.show_projects()?;
    Ok(app.view.snapshot())
}

/// HTML payload a given message can offer for preview, if any.
pub fn message_preview_html(messages: &[crate::conversation::Message], id: &str) -> Option<String> {
    messages
        .iter()
        .find(|message| message.id == id)
        .and_then(|message| crate::html_extract::extract_html(&message.text))
}

/// Enter the preview with the HTML extracted from a specific bot message.
/// Messages without an extractable document are rejected; together with
/// `open_project` this is the only command path into the preview, so the
/// payload invariant cannot be bypassed from the webview.
#[tauri::command]
pub fn preview_message(message_id: String, state: tauri::State<SharedAppState>) -> Result<ViewSnapshot, String> {
    let mut app = state.lock().map_err(|_| "Application state poisoned".to_string())?;
    let html = message_preview_html(&app.conversation.messages, &message_id).ok_or_else(|| {
        backend_warn(format!("preview_message rejected: no HTML in message {}", message_id));
        ERR_EMPTY_PREVIEW.to_string()
    })?;
    app.view.enter_preview(&html)?;
    backend_info(format!("Preview entered from message {}", message_id));
    Ok(app.view.snapshot())
}

#[tauri::command]
pub fn leave_preview(state: tauri::State<SharedAppState>) -> Result<ViewSnapshot, String> {
    let mut app = state.lock().map_err(|_| "Application state poisoned".to_string())?;
    app.view.show_chat()?;
    Ok(app.view.snapshot())
}

#[tauri::command]
pub fn set_settings_open(open: bool, state: tauri::State<SharedAppState>) -> ViewSnapshot {
    let mut app = state.lock().unwrap();
    app.view.overlays.settings = open;
    app.view.snapshot()
}

#[tauri::command]
pub fn set_save_dialog_open(open: bool, state: tauri::State<SharedAppState>) -> ViewSnapshot {
    let mut app = state.lock().unwrap();
    app.view.overlays.save_dialog = open;
    app.view.snapshot()
}

#[tauri::command]
pub fn set_debug_panel_open(open: bool, state: tauri::State<SharedAppState>) -> ViewSnapshot {
    let mut app = state.lock().unwrap();
    app.view.overlays.debug_panel = open;
    app.view.snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat_state() -> ViewState {
        let mut state = ViewState::default();
        state.select_language("az-AZ").unwrap();
        state
    }

    #[test]
    fn starts_on_language_select() {
        let state = ViewState::default();
        assert_eq!(state.view(), View::LanguageSelect);
    }

    #[test]
    fn language_selection_is_irreversible() {
        let mut state = ViewState::default();
        state.select_language("az-AZ").unwrap();
        assert_eq!(state.view(), View::Chat);
        assert!(state.select_language("en-US").is_err());
    }

    #[test]
    fn chat_and_projects_toggle_freely() {
        let mut state = chat_state();
        state.show_projects().unwrap();
        assert_eq!(state.view(), View::Projects);
        state.show_chat().unwrap();
        assert_eq!(state.view(), View::Chat);
    }

    #[test]
    fn preview_requires_nonempty_payload() {
        let mut state = chat_state();
        assert!(state.enter_preview("").is_err());
        assert!(state.enter_preview("   \n").is_err());
        assert_eq!(state.view(), View::Chat);

        state.enter_preview("<!DOCTYPE html><html></html>").unwrap();
        assert_eq!(state.view(), View::Preview);
        assert!(state.preview_html().is_some());
    }

    #[test]
    fn leaving_preview_discards_payload() {
        let mut state = chat_state();
        state.enter_preview("<html></html>").unwrap();
        state.show_chat().unwrap();
        assert_eq!(state.view(), View::Chat);
        assert!(state.preview_html().is_none());
    }

    #[test]
    fn preview_reachable_from_projects() {
        let mut state = chat_state();
        state.show_projects().unwrap();
        state.enter_preview("<html></html>").unwrap();
        assert_eq!(state.view(), View::Preview);
    }

    #[test]
    fn no_transition_from_language_select_except_selection() {
        let mut state = ViewState::default();
        assert!(state.show_chat().is_err());
        assert!(state.show_projects().is_err());
        assert!(state.enter_preview("<html></html>").is_err());
        assert_eq!(state.view(), View::LanguageSelect);
    }

    #[test]
    fn message_without_html_offers_no_preview() {
        use crate::conversation::{Message, Sender};

        let with_html = Message::new(
            Sender::Bot,
            "```html\n<html><body>salam</body></html>\n```".to_string(),
            None,
            false,
        );
        let plain = Message::new(Sender::Bot, "Bakı paytaxtdır.".to_string(), None, false);
        let messages = vec![with_html.clone(), plain.clone()];

        assert_eq!(
            message_preview_html(&messages, &with_html.id).unwrap(),
            "<html><body>salam</body></html>"
        );
        assert!(message_preview_html(&messages, &plain.id).is_none());
        assert!(message_preview_html(&messages, "yoxdur").is_none());
    }

    #[test]
    fn overlays_are_independent() {
        let mut state = chat_state();
        state.overlays.settings = true;
        state.overlays.debug_panel = true;
        state.overlays.settings = false;
        assert!(!state.overlays.settings);
        assert!(state.overlays.debug_panel);
        assert!(!state.overlays.save_dialog);
    }
}
