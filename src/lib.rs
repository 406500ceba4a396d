pub mod conversation;
pub mod html_extract;
pub mod image_gen;
pub mod intent;
pub mod llm;
pub mod logging;
pub mod projects;
pub mod settings;
pub mod stt;
pub mod tts;
pub mod view_state;

use std::sync::{Arc, Mutex};

use crate::logging::{backend_error, backend_info, backend_warn, init_logging};

/// All mutable UI state behind one controller: append-only conversation,
/// view-state machine, session-scoped project library. No ambient globals.
#[derive(Debug, Default)]
pub struct AppState {
    pub conversation: conversation::ConversationState,
    pub view: view_state::ViewState,
    pub projects: projects::ProjectLibrary,
}

pub type SharedAppState = Arc<Mutex<AppState>>;

#[tauri::command]
async fn get_app_version() -> Result<String, String> {
    backend_info("Command get_app_version invoked");
    Ok(env!("CARGO_PKG_VERSION").to_string())
}

pub fn run() {
    // Load environment variables from .env file (in project root)
    match dotenvy::dotenv() {
        Ok(path) => backend_info(format!("Loaded .env from: {:?}", path)),
        Err(e) => backend_warn(format!("Failed to load .env: {}", e)),
    }

    init_logging();
    backend_info("Booting Söhbət Tauri backend...");

    // Log API key status (without revealing the key)
    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.is_empty() => {
            backend_info(format!("GEMINI_API_KEY loaded (length: {})", key.len()))
        }
        Ok(_) => backend_warn("GEMINI_API_KEY is empty"),
        Err(_) => backend_warn("GEMINI_API_KEY not found"),
    }

    // One-time capability probe; absence of a TTS backend is a normal branch.
    let availability = tts::tts_is_available();
    backend_info(format!(
        "TTS capability probe: supported={}, backend={}",
        availability.supported, availability.backend
    ));

    let app_state: SharedAppState = Arc::new(Mutex::new(AppState::default()));

    if let Err(err) = tauri::Builder::default()
        .manage(app_state)
        .plugin(tauri_plugin_shell::init())
        .invoke_handler(tauri::generate_handler![
            get_app_version,
            settings::get_settings,
            settings::save_settings,
            conversation::chat_send,
            conversation::get_messages,
            conversation::is_busy,
            view_state::get_view,
            view_state::select_language,
            view_state::show_chat,
            view_state::show_projects,
            view_state::preview_message,
            view_state::leave_preview,
            view_state::set_settings_open,
            view_state::set_save_dialog_open,
            view_state::set_debug_panel_open,
            html_extract::extract_preview_html,
            projects::list_projects,
            projects::save_project,
            projects::delete_project,
            projects::open_project,
            tts::tts_is_available,
            tts::tts_speak,
            tts::tts_stop,
            stt::stt_transcribe,
            logging::get_backend_logs,
        ])
        .run(tauri::generate_context!())
    {
        backend_error(format!("Error while running Söhbət: {}", err));
        panic!("error while running Söhbət");
    }

    backend_info("Söhbət backend stopped gracefully");
}
