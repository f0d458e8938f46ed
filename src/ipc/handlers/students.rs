use crate::export;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, Dept, Student, Year};
use serde_json::json;
use std::path::PathBuf;

/// (dept, year, semester, derived scope key) from the request params.
pub fn scope_from_params(
    params: &serde_json::Value,
) -> Result<(Dept, Year, String, String), &'static str> {
    let dept = params
        .get("dept")
        .and_then(|v| v.as_str())
        .and_then(Dept::parse)
        .ok_or("missing or unknown dept")?;
    let year = params
        .get("year")
        .and_then(|v| v.as_str())
        .and_then(Year::parse)
        .ok_or("missing or unknown year")?;
    let semester = params
        .get("semester")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or("missing semester")?;
    let scope = store::scope_key(dept, year, &semester);
    Ok((dept, year, semester, scope))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (_, _, _, scope) = match scope_from_params(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let students = store::students(conn, &scope);
    ok(
        &req.id,
        json!({ "scope": scope, "students": students }),
    )
}

fn handle_students_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (dept, year, semester, scope) = match scope_from_params(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let roll_no = match req.params.get("rollNo").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing rollNo", None),
    };
    let name = match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing name", None),
    };

    let mut list = store::students(conn, &scope);
    list.push(Student {
        roll_no,
        name,
        year,
        semester,
        department: dept,
        overall: Some(0),
    });
    if let Err(e) = store::save_students(conn, &scope, &list) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "scope": scope, "count": list.len() }))
}

fn handle_students_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (_, _, _, scope) = match scope_from_params(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let out_path = match req.params.get("outPath").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => return err(&req.id, "bad_params", "missing outPath", None),
    };

    let rows: Vec<_> = store::students(conn, &scope)
        .iter()
        .map(|s| {
            json!({
                "rollNo": s.roll_no,
                "name": s.name,
                "year": s.year,
                "semester": s.semester,
                "department": s.department,
            })
            .as_object()
            .cloned()
            .unwrap_or_default()
        })
        .collect();
    let count = rows.len();

    if let Err(e) = export::write_csv(&out_path, &rows) {
        return err(
            &req.id,
            "io_failed",
            e.to_string(),
            Some(json!({ "path": out_path.to_string_lossy() })),
        );
    }
    ok(
        &req.id,
        json!({ "path": out_path.to_string_lossy(), "rows": count }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.add" => Some(handle_students_add(state, req)),
        "students.exportCsv" => Some(handle_students_export_csv(state, req)),
        _ => None,
    }
}
