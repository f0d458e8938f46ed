use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, Note};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

fn user_id_param(state: &AppState, params: &serde_json::Value) -> String {
    params
        .get("userId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| state.session.id.clone())
}

fn handle_notes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let notes = store::notes(conn, &user_id);
    ok(&req.id, json!({ "userId": user_id, "notes": notes }))
}

fn handle_notes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    // New notes start untitled and empty, newest first.
    let note = Note {
        id: Uuid::new_v4().to_string(),
        title: "Untitled".to_string(),
        content: String::new(),
        updated_at: Utc::now().to_rfc3339(),
    };
    let mut notes = store::notes(conn, &user_id);
    notes.insert(0, note.clone());
    if let Err(e) = store::save_notes(conn, &user_id, &notes) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "note": note }))
}

fn handle_notes_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let note_id = match req.params.get("id").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing id", None),
    };
    let patch = req.params.get("patch").cloned().unwrap_or(json!({}));

    let mut notes = store::notes(conn, &user_id);
    let Some(note) = notes.iter_mut().find(|n| n.id == note_id) else {
        return err(&req.id, "not_found", "no such note", None);
    };
    if let Some(title) = patch.get("title").and_then(|v| v.as_str()) {
        note.title = title.to_string();
    }
    if let Some(content) = patch.get("content").and_then(|v| v.as_str()) {
        note.content = content.to_string();
    }
    note.updated_at = Utc::now().to_rfc3339();
    let updated = note.clone();
    if let Err(e) = store::save_notes(conn, &user_id, &notes) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "note": updated }))
}

fn handle_notes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let note_id = match req.params.get("id").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing id", None),
    };

    let notes = store::notes(conn, &user_id);
    let before = notes.len();
    let notes: Vec<Note> = notes.into_iter().filter(|n| n.id != note_id).collect();
    let removed = notes.len() < before;
    if removed {
        if let Err(e) = store::save_notes(conn, &user_id, &notes) {
            return err(&req.id, "db_write_failed", e.to_string(), None);
        }
    }
    ok(&req.id, json!({ "removed": removed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "notes.list" => Some(handle_notes_list(state, req)),
        "notes.create" => Some(handle_notes_create(state, req)),
        "notes.update" => Some(handle_notes_update(state, req)),
        "notes.delete" => Some(handle_notes_delete(state, req)),
        _ => None,
    }
}
