use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, Role};
use serde_json::json;

fn session_json(state: &AppState) -> serde_json::Value {
    serde_json::to_value(&state.session).unwrap_or_else(|_| json!({}))
}

fn handle_session_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "user": session_json(state) }))
}

fn handle_session_set_role(state: &mut AppState, req: &Request) -> serde_json::Value {
    let role = match req
        .params
        .get("role")
        .and_then(|v| v.as_str())
        .and_then(Role::parse)
    {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing or unknown role", None),
    };

    state.session.role = role;
    if let Some(conn) = state.db.as_ref() {
        if let Err(e) = store::save_session(conn, &state.session) {
            return err(&req.id, "db_write_failed", e.to_string(), None);
        }
    }
    ok(&req.id, json!({ "user": session_json(state) }))
}

fn handle_session_select_user(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let user_id = match req.params.get("userId").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing userId", None),
    };

    let Some(user) = store::users(conn).into_iter().find(|u| u.id == user_id) else {
        return err(
            &req.id,
            "not_found",
            "no such user",
            Some(json!({ "userId": user_id })),
        );
    };

    if let Err(e) = store::save_session(conn, &user) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    state.session = user;
    ok(&req.id, json!({ "user": session_json(state) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.get" => Some(handle_session_get(state, req)),
        "session.setRole" => Some(handle_session_set_role(state, req)),
        "session.selectUser" => Some(handle_session_select_user(state, req)),
        _ => None,
    }
}
