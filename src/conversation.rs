//! conversation.rs — append-only message history and the chat_send command.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logging::{backend_info, backend_warn};
use crate::{image_gen, intent, llm, SharedAppState};

/// Rejection for rapid double-submission while a request is in flight.
pub const ERR_BUSY: &str = "Cavab hazırlanır, zəhmət olmasa gözləyin.";
/// Rejection for a submission with neither text nor image.
pub const ERR_EMPTY: &str = "Boş mesaj göndərilə bilməz.";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Inline image carried by a message, base64-encoded for the webview.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Attachment {
    pub mime_type: String,
    pub data_base64: String,
}

/// One conversation entry. Immutable once appended; entries are never
/// individually deleted (there is no session reset).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub is_error: bool,
    pub attachment: Option<Attachment>,
}

impl Message {
    pub fn new(sender: Sender, text: String, attachment: Option<Attachment>, is_error: bool) -> Self {
        Message {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            text,
            timestamp: Utc::now(),
            is_error,
            attachment,
        }
    }
}

/// Append-only history plus the single-outstanding-request flag.
#[derive(Debug, Default)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub busy: bool,
}

impl ConversationState {
    pub fn push(&mut self, message: Message) -> Message {
        self.messages.push(message.clone());
        message
    }

    /// Claim the single outstanding request slot. Rejected while a request
    /// is already in flight.
    pub fn begin_request(&mut self) -> Result<(), String> {
        if self.busy {
            return Err(ERR_BUSY.to_string());
        }
        self.busy = true;
        Ok(())
    }

    /// Release the slot, on success and on error alike.
    pub fn finish_request(&mut self) {
        self.busy = false;
    }
}

#[tauri::command]
pub fn get_messages(state: tauri::State<SharedAppState>) -> Vec<Message> {
    state.lock().unwrap().conversation.messages.clone()
}

#[tauri::command]
pub fn is_busy(state: tauri::State<SharedAppState>) -> bool {
    state.lock().unwrap().conversation.busy
}

/// Send one user message: classify intent, call the image or text endpoint,
/// append the bot reply. Transport failures come back as a bot message
/// flagged `is_error` — the conversation continues.
///
/// Only one request may be outstanding; while busy, further sends are
/// rejected (the frontend also disables the input). There is no timeout on
/// the network call itself.
#[tauri::command]
pub async fn chat_send(
    text: String,
    image: Option<Attachment>,
    api_key: Option<String>,
    state: tauri::State<'_, SharedAppState>,
) -> Result<Message, String> {
    let trimmed = text.trim().to_string();
    if trimmed.is_empty() && image.is_none() {
        return Err(ERR_EMPTY.to_string());
    }

    // Snapshot history and flip the busy flag without holding the lock
    // across the network await.
    let (history, language) = {
        let mut app = state.lock().map_err(|_| "Application state poisoned".to_string())?;
        if let Err(err) = app.conversation.begin_request() {
            backend_warn("chat_send rejected: a request is already in flight");
            return Err(err);
        }
        let history = app.conversation.messages.clone();
        let language = app.view.active_language();
        app.conversation
            .push(Message::new(Sender::User, trimmed.clone(), image.clone(), false));
        (history, language)
    };

    let outcome = if image.is_none() && intent::is_image_request(&trimmed) {
        backend_info("chat_send classified as image request");
        image_gen::generate_image(&trimmed, api_key.as_deref())
            .await
            .map(|generated| (String::new(), Some(generated)))
    } else {
        backend_info(format!(
            "chat_send classified as text request (history_len={}, language={})",
            history.len(),
            language
        ));
        llm::send_text(&history, &trimmed, image.as_ref(), &language, api_key.as_deref())
            .await
            .map(|reply| (reply, None))
    };

    let mut app = state.lock().map_err(|_| "Application state poisoned".to_string())?;
    app.conversation.finish_request();

    let bot_message = match outcome {
        Ok((reply_text, reply_image)) => {
            Message::new(Sender::Bot, reply_text, reply_image, false)
        }
        Err(notice) => {
            backend_warn(format!("chat_send surfacing error to chat: {}", notice));
            Message::new(Sender::Bot, notice, None, true)
        }
    };

    Ok(app.conversation.push(bot_message))
}
