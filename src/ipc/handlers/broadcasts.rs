use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, Broadcast, BroadcastFilter, Dept, Year};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use uuid::Uuid;

fn handle_broadcasts_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let broadcasts = store::broadcasts(conn);
    ok(&req.id, json!({ "broadcasts": broadcasts }))
}

fn handle_broadcasts_send(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let title = match req.params.get("title").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing title", None),
    };
    let body = match req.params.get("body").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing body", None),
    };
    let dept = req
        .params
        .get("dept")
        .and_then(|v| v.as_str())
        .and_then(Dept::parse);
    let year = req
        .params
        .get("year")
        .and_then(|v| v.as_str())
        .and_then(Year::parse);
    let filter = if dept.is_some() || year.is_some() {
        Some(BroadcastFilter { dept, year })
    } else {
        None
    };

    let broadcast = Broadcast {
        id: Uuid::new_v4().to_string(),
        title,
        body,
        date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        filter,
    };
    if let Err(e) = store::add_broadcast(conn, broadcast.clone()) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "broadcast": broadcast }))
}

fn handle_broadcasts_matching(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let dept = req
        .params
        .get("dept")
        .and_then(|v| v.as_str())
        .and_then(Dept::parse);
    let year = req
        .params
        .get("year")
        .and_then(|v| v.as_str())
        .and_then(Year::parse);

    // An untargeted broadcast reaches everyone.
    let matching: Vec<Broadcast> = store::broadcasts(conn)
        .into_iter()
        .filter(|b| match &b.filter {
            Some(f) => f.matches(dept, year),
            None => true,
        })
        .collect();
    ok(&req.id, json!({ "broadcasts": matching }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "broadcasts.list" => Some(handle_broadcasts_list(state, req)),
        "broadcasts.send" => Some(handle_broadcasts_send(state, req)),
        "broadcasts.matching" => Some(handle_broadcasts_matching(state, req)),
        _ => None,
    }
}
