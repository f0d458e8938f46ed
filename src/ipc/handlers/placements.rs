use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, Application};
use serde_json::json;

fn user_id_param(state: &AppState, params: &serde_json::Value) -> String {
    params
        .get("userId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| state.session.id.clone())
}

fn handle_applications_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let apps = store::applications(conn, &user_id);
    ok(&req.id, json!({ "userId": user_id, "applications": apps }))
}

fn handle_applications_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let app: Application = match req.params.get("application") {
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(v) => v,
            Err(e) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("invalid application: {}", e),
                    None,
                )
            }
        },
        None => return err(&req.id, "bad_params", "missing application", None),
    };

    // Adding an application that already exists (same id) is a silent no-op.
    match store::add_application(conn, &user_id, app) {
        Ok(added) => ok(&req.id, json!({ "added": added })),
        Err(e) => err(&req.id, "db_write_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "applications.list" => Some(handle_applications_list(state, req)),
        "applications.add" => Some(handle_applications_add(state, req)),
        _ => None,
    }
}
