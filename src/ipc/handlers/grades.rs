use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, GradeEntry};
use serde_json::json;

fn course_id_param(params: &serde_json::Value) -> Option<String> {
    params
        .get("courseId")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn handle_grades_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = course_id_param(&req.params) else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };
    let grades = store::grades(conn, &course_id);
    ok(&req.id, json!({ "courseId": course_id, "grades": grades }))
}

fn handle_grades_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = course_id_param(&req.params) else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };
    let rows: Vec<GradeEntry> = match req.params.get("rows") {
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "bad_params", format!("invalid rows: {}", e), None),
        },
        None => return err(&req.id, "bad_params", "missing rows", None),
    };

    // Grades for a course are replaced wholesale on every save.
    if let Err(e) = store::save_grades(conn, &course_id, &rows) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "courseId": course_id, "count": rows.len() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.list" => Some(handle_grades_list(state, req)),
        "grades.save" => Some(handle_grades_save(state, req)),
        _ => None,
    }
}
