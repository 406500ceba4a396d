//! projects.rs — session-scoped library of saved generated websites.
//!
//! In-memory only: no persistence, no versioning, no deduplication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logging::{backend_info, backend_warn};
use crate::view_state::ViewSnapshot;
use crate::SharedAppState;

pub const ERR_PROJECT_NOT_FOUND: &str = "Layihə tapılmadı.";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub code: String,
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ProjectLibrary {
    projects: Vec<Project>,
}

impl ProjectLibrary {
    /// Save a preview as a project at the head of the list. An empty or
    /// whitespace-only name is silently rejected: the library is unchanged
    /// and the save dialog gives no feedback.
    pub fn save(&mut self, name: &str, code: &str, thumbnail: Option<String>) -> Option<Project> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let project = Project {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            code: code.to_string(),
            thumbnail,
            created_at: Utc::now(),
        };
        self.projects.insert(0, project.clone());
        Some(project)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.projects.len();
        self.projects.retain(|project| project.id != id);
        self.projects.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn list(&self) -> &[Project] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

// ── Tauri commands ───────────────────────────────────

#[tauri::command]
pub fn list_projects(state: tauri::State<SharedAppState>) -> Vec<Project> {
    state.lock().unwrap().projects.list().to_vec()
}

/// Save the current preview under a name. Blank names are a silent no-op —
/// `None` comes back and the library stays as it was.
#[tauri::command]
pub fn save_project(
    name: String,
    code: String,
    thumbnail: Option<String>,
    state: tauri::State<SharedAppState>,
) -> Result<Option<Project>, String> {
    let mut app = state.lock().map_err(|_| "Application state poisoned".to_string())?;
    match app.projects.save(&name, &code, thumbnail) {
        Some(project) => {
            backend_info(format!(
                "Project saved (id={}, name='{}', code_len={})",
                project.id,
                project.name,
                project.code.len()
            ));
            Ok(Some(project))
        }
        None => {
            backend_warn("save_project ignored: blank project name");
            Ok(None)
        }
    }
}

#[tauri::command]
pub fn delete_project(id: String, state: tauri::State<SharedAppState>) -> Result<(), String> {
    let mut app = state.lock().map_err(|_| "Application state poisoned".to_string())?;
    if app.projects.delete(&id) {
        backend_info(format!("Project deleted (id={})", id));
        Ok(())
    } else {
        Err(ERR_PROJECT_NOT_FOUND.to_string())
    }
}

/// Re-enter the preview with a stored project's code. Routes through the
/// view-state machine so the non-empty-payload invariant holds.
#[tauri::command]
pub fn open_project(id: String, state: tauri::State<SharedAppState>) -> Result<ViewSnapshot, String> {
    let mut app = state.lock().map_err(|_| "Application state poisoned".to_string())?;
    let code = app
        .projects
        .get(&id)
        .map(|project| project.code.clone())
        .ok_or_else(|| ERR_PROJECT_NOT_FOUND.to_string())?;
    app.view.enter_preview(&code)?;
    backend_info(format!("Project opened in preview (id={})", id));
    Ok(app.view.snapshot())
}
