use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, Task, TaskStatus};
use serde_json::json;
use uuid::Uuid;

fn user_id_param(state: &AppState, params: &serde_json::Value) -> String {
    params
        .get("userId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| state.session.id.clone())
}

fn handle_tasks_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let items = store::tasks(conn, &user_id);
    ok(&req.id, json!({ "userId": user_id, "tasks": items }))
}

fn handle_tasks_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let title = match req.params.get("title").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing title", None),
    };
    let due_date = req
        .params
        .get("dueDate")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let description = req
        .params
        .get("description")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let tags: Option<Vec<String>> = req
        .params
        .get("tags")
        .and_then(|raw| serde_json::from_value(raw.clone()).ok())
        .filter(|t: &Vec<String>| !t.is_empty());

    let task = Task {
        id: Uuid::new_v4().to_string(),
        title,
        status: TaskStatus::Todo,
        due_date,
        description,
        tags,
    };
    let mut items = store::tasks(conn, &user_id);
    items.insert(0, task.clone());
    if let Err(e) = store::save_tasks(conn, &user_id, &items) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "task": task }))
}

fn handle_tasks_move(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let task_id = match req.params.get("id").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing id", None),
    };
    let dir = match req.params.get("dir").and_then(|v| v.as_i64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing dir", None),
    };

    let mut items = store::tasks(conn, &user_id);
    let Some(task) = items.iter_mut().find(|t| t.id == task_id) else {
        return err(&req.id, "not_found", "no such task", None);
    };
    task.status = task.status.shifted(dir);
    let moved = task.clone();
    if let Err(e) = store::save_tasks(conn, &user_id, &items) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "task": moved }))
}

fn handle_tasks_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let task_id = match req.params.get("id").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing id", None),
    };

    let items = store::tasks(conn, &user_id);
    let before = items.len();
    let items: Vec<Task> = items.into_iter().filter(|t| t.id != task_id).collect();
    let removed = items.len() < before;
    if removed {
        if let Err(e) = store::save_tasks(conn, &user_id, &items) {
            return err(&req.id, "db_write_failed", e.to_string(), None);
        }
    }
    ok(&req.id, json!({ "removed": removed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "tasks.list" => Some(handle_tasks_list(state, req)),
        "tasks.create" => Some(handle_tasks_create(state, req)),
        "tasks.move" => Some(handle_tasks_move(state, req)),
        "tasks.delete" => Some(handle_tasks_delete(state, req)),
        _ => None,
    }
}
