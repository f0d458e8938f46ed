use crate::ics;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, EventItem};
use serde_json::json;
use std::path::PathBuf;
use uuid::Uuid;

fn user_id_param(state: &AppState, params: &serde_json::Value) -> String {
    params
        .get("userId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| state.session.id.clone())
}

fn handle_events_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let mut events = store::events(conn, &user_id);
    if let Some(date) = req.params.get("date").and_then(|v| v.as_str()) {
        events.retain(|e| e.start.get(..10) == Some(date));
    }
    ok(&req.id, json!({ "userId": user_id, "events": events }))
}

fn handle_events_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let title = match req.params.get("title").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing title", None),
    };
    let start = match req.params.get("start").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing start", None),
    };
    let opt = |key: &str| {
        req.params
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    };

    let event = EventItem {
        id: Uuid::new_v4().to_string(),
        title,
        start,
        end: opt("end"),
        location: opt("location"),
        description: opt("description"),
    };
    let mut events = store::events(conn, &user_id);
    events.insert(0, event.clone());
    if let Err(e) = store::save_events(conn, &user_id, &events) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "event": event }))
}

fn handle_events_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let event_id = match req.params.get("id").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing id", None),
    };

    let events = store::events(conn, &user_id);
    let before = events.len();
    let events: Vec<EventItem> = events.into_iter().filter(|e| e.id != event_id).collect();
    let removed = events.len() < before;
    if removed {
        if let Err(e) = store::save_events(conn, &user_id, &events) {
            return err(&req.id, "db_write_failed", e.to_string(), None);
        }
    }
    ok(&req.id, json!({ "removed": removed }))
}

fn handle_events_export_ics(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let events = store::events(conn, &user_id);
    let text = ics::to_ics(&events);

    if let Some(out) = req.params.get("outPath").and_then(|v| v.as_str()) {
        let out_path = PathBuf::from(out);
        if let Some(parent) = out_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&out_path, &text) {
            return err(
                &req.id,
                "io_failed",
                e.to_string(),
                Some(json!({ "path": out })),
            );
        }
        return ok(&req.id, json!({ "path": out, "events": events.len() }));
    }
    ok(&req.id, json!({ "ics": text, "events": events.len() }))
}

fn handle_events_import_ics(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let text = match req.params.get("ics").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing ics", None),
    };

    // Imported events get fresh ids and land ahead of existing ones. An
    // import that parses to nothing leaves the collection untouched.
    let parsed = ics::parse_ics(&text);
    if parsed.is_empty() {
        return ok(&req.id, json!({ "imported": 0 }));
    }
    let mut events = store::events(conn, &user_id);
    for (i, p) in parsed.iter().enumerate() {
        events.insert(
            i,
            EventItem {
                id: Uuid::new_v4().to_string(),
                title: p.title.clone(),
                start: p.start.clone(),
                end: p.end.clone(),
                location: p.location.clone(),
                description: p.description.clone(),
            },
        );
    }
    if let Err(e) = store::save_events(conn, &user_id, &events) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "imported": parsed.len() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "events.list" => Some(handle_events_list(state, req)),
        "events.create" => Some(handle_events_create(state, req)),
        "events.delete" => Some(handle_events_delete(state, req)),
        "events.exportIcs" => Some(handle_events_export_ics(state, req)),
        "events.importIcs" => Some(handle_events_import_ics(state, req)),
        _ => None,
    }
}
