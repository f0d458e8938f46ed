use crate::export;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::students::scope_from_params;
use crate::ipc::types::{AppState, Request};
use crate::store::{self, AttendanceRecord, AttendanceRow};
use rusqlite::Connection;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;

struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl HandlerErr {
    fn bad(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad(format!("missing {}", key)))
}

fn parse_rows(params: &serde_json::Value) -> Result<Vec<AttendanceRow>, HandlerErr> {
    let raw = params
        .get("rows")
        .cloned()
        .ok_or_else(|| HandlerErr::bad("missing rows"))?;
    serde_json::from_value(raw).map_err(|e| HandlerErr::bad(format!("invalid rows: {}", e)))
}

fn save_record(
    conn: &Connection,
    scope: &str,
    date: String,
    subject: String,
    rows: Vec<AttendanceRow>,
) -> Result<usize, HandlerErr> {
    let present: Vec<String> = rows
        .iter()
        .filter(|r| r.present)
        .map(|r| r.roll_no.clone())
        .collect();
    let count = rows.len();

    store::append_attendance(
        conn,
        AttendanceRecord {
            scope: scope.to_string(),
            date,
            subject,
            rows,
        },
    )
    .map_err(|e| HandlerErr {
        code: "db_write_failed",
        message: e.to_string(),
        details: None,
    })?;

    // Each save bumps the running overall counter for everyone present.
    let mut roster = store::students(conn, scope);
    for s in roster.iter_mut() {
        if present.iter().any(|r| *r == s.roll_no) {
            s.overall = Some(s.overall.unwrap_or(0) + 1);
        }
    }
    store::save_students(conn, scope, &roster).map_err(|e| HandlerErr {
        code: "db_write_failed",
        message: e.to_string(),
        details: None,
    })?;

    Ok(count)
}

fn handle_attendance_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (_, _, _, scope) = match scope_from_params(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let parsed = get_required_str(&req.params, "date").and_then(|date| {
        let subject = get_required_str(&req.params, "subject")?;
        let rows = parse_rows(&req.params)?;
        Ok((date, subject, rows))
    });
    let (date, subject, rows) = match parsed {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    match save_record(conn, &scope, date, subject, rows) {
        Ok(saved) => ok(&req.id, json!({ "scope": scope, "saved": saved })),
        Err(e) => e.response(&req.id),
    }
}

fn handle_attendance_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (_, _, _, scope) = match scope_from_params(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let records = store::attendance(conn, &scope);
    ok(&req.id, json!({ "scope": scope, "records": records }))
}

fn handle_attendance_recent(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (_, _, _, scope) = match scope_from_params(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let limit = req
        .params
        .get("limit")
        .and_then(|v| v.as_u64())
        .unwrap_or(5) as usize;

    // Newest first, summarized per session.
    let records = store::attendance(conn, &scope);
    let sessions: Vec<_> = records
        .iter()
        .rev()
        .take(limit)
        .map(|r| {
            let present = r.rows.iter().filter(|x| x.present).count();
            json!({
                "date": r.date,
                "subject": r.subject,
                "present": present,
                "absent": r.rows.len() - present,
            })
        })
        .collect();
    ok(&req.id, json!({ "scope": scope, "sessions": sessions }))
}

fn handle_attendance_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (_, _, _, scope) = match scope_from_params(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let parsed = get_required_str(&req.params, "date").and_then(|date| {
        let subject = get_required_str(&req.params, "subject")?;
        let out_path = get_required_str(&req.params, "outPath")?;
        Ok((date, subject, PathBuf::from(out_path)))
    });
    let (date, subject, out_path) = match parsed {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let Some(record) = store::attendance(conn, &scope)
        .into_iter()
        .rev()
        .find(|r| r.date == date && r.subject == subject)
    else {
        return err(
            &req.id,
            "not_found",
            "no attendance record for that date and subject",
            Some(json!({ "scope": scope, "date": date, "subject": subject })),
        );
    };

    let overall: HashMap<String, i64> = store::students(conn, &scope)
        .into_iter()
        .map(|s| (s.roll_no, s.overall.unwrap_or(0)))
        .collect();

    let rows: Vec<_> = record
        .rows
        .iter()
        .map(|r| {
            json!({
                "date": record.date,
                "subject": record.subject,
                "rollNo": r.roll_no,
                "name": r.name,
                "present": r.present,
                "medicalLeave": r.medical_leave.unwrap_or(false),
                "urgency": r.urgency.clone().unwrap_or_default(),
                "remark": r.remark.clone().unwrap_or_default(),
                "overall": overall.get(&r.roll_no).copied().unwrap_or(0),
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
        "attendance.save" => Some(handle_attendance_save(state, req)),
        "attendance.list" => Some(handle_attendance_list(state, req)),
        "attendance.recent" => Some(handle_attendance_recent(state, req)),
        "attendance.exportCsv" => Some(handle_attendance_export_csv(state, req)),
        _ => None,
    }
}
