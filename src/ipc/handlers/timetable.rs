use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::schedule::{self, Prefs};
use crate::store::{self, TimetableBlock, Year};
use serde_json::json;

fn user_id_param(state: &AppState, params: &serde_json::Value) -> String {
    params
        .get("userId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| state.session.id.clone())
}

fn handle_timetable_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let blocks = store::timetable(conn, &user_id);
    ok(&req.id, json!({ "userId": user_id, "blocks": blocks }))
}

fn handle_timetable_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let blocks: Vec<TimetableBlock> = match req.params.get("blocks") {
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "bad_params", format!("invalid blocks: {}", e), None),
        },
        None => return err(&req.id, "bad_params", "missing blocks", None),
    };

    // The timetable is replaced wholesale on every save.
    if let Err(e) = store::save_timetable(conn, &user_id, &blocks) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "userId": user_id, "count": blocks.len() }))
}

fn handle_timetable_semesters(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let year = match req
        .params
        .get("year")
        .and_then(|v| v.as_str())
        .and_then(Year::parse)
    {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing or unknown year", None),
    };
    ok(&req.id, json!({ "semesters": year.semesters() }))
}

fn handle_timetable_generate(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let courses: Vec<String> = match req.params.get("courses") {
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(v) => v,
            Err(e) => {
                return err(&req.id, "bad_params", format!("invalid courses: {}", e), None)
            }
        },
        None => return err(&req.id, "bad_params", "missing courses", None),
    };
    if courses.is_empty() {
        return err(&req.id, "bad_params", "courses must not be empty", None);
    }
    let prefs: Prefs = req
        .params
        .get("prefs")
        .cloned()
        .and_then(|raw| serde_json::from_value(raw).ok())
        .unwrap_or_default();

    let options = schedule::generate_options(&courses, &prefs);
    ok(&req.id, json!({ "options": options }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetable.get" => Some(handle_timetable_get(state, req)),
        "timetable.set" => Some(handle_timetable_set(state, req)),
        "timetable.semesters" => Some(handle_timetable_semesters(state, req)),
        "timetable.generate" => Some(handle_timetable_generate(state, req)),
        _ => None,
    }
}
