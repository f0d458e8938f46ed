use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, Dept, Role, User, Year};
use serde_json::json;
use uuid::Uuid;

fn handle_users_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let users = store::users(conn);
    ok(&req.id, json!({ "users": users }))
}

fn handle_users_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let name = match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing name", None),
    };
    let role = req
        .params
        .get("role")
        .and_then(|v| v.as_str())
        .and_then(Role::parse)
        .unwrap_or(Role::Student);

    let user = User {
        id: Uuid::new_v4().to_string(),
        name,
        role,
        department: req
            .params
            .get("department")
            .and_then(|v| v.as_str())
            .and_then(Dept::parse),
        year: req
            .params
            .get("year")
            .and_then(|v| v.as_str())
            .and_then(Year::parse),
    };
    let mut users = store::users(conn);
    users.insert(0, user.clone());
    if let Err(e) = store::save_users(conn, &users) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "user": user }))
}

fn handle_users_update_role(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let user_id = match req.params.get("id").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing id", None),
    };
    let role = match req
        .params
        .get("role")
        .and_then(|v| v.as_str())
        .and_then(Role::parse)
    {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing or unknown role", None),
    };

    let mut users = store::users(conn);
    let Some(user) = users.iter_mut().find(|u| u.id == user_id) else {
        return err(&req.id, "not_found", "no such user", None);
    };
    user.role = role;
    let updated = user.clone();
    if let Err(e) = store::save_users(conn, &users) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "user": updated }))
}

fn handle_users_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let user_id = match req.params.get("id").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing id", None),
    };

    let users = store::users(conn);
    let before = users.len();
    let users: Vec<User> = users.into_iter().filter(|u| u.id != user_id).collect();
    let removed = users.len() < before;
    if removed {
        if let Err(e) = store::save_users(conn, &users) {
            return err(&req.id, "db_write_failed", e.to_string(), None);
        }
    }
    ok(&req.id, json!({ "removed": removed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "users.list" => Some(handle_users_list(state, req)),
        "users.create" => Some(handle_users_create(state, req)),
        "users.updateRole" => Some(handle_users_update_role(state, req)),
        "users.delete" => Some(handle_users_delete(state, req)),
        _ => None,
    }
}
