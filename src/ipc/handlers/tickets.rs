use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, Ticket, TicketStatus};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use uuid::Uuid;

fn handle_tickets_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let tickets = store::tickets(conn);
    ok(&req.id, json!({ "tickets": tickets }))
}

fn handle_tickets_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = req
        .params
        .get("userId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| state.session.id.clone());
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let subject = match req.params.get("subject").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing subject", None),
    };
    let body = match req.params.get("body").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing body", None),
    };
    let category = req
        .params
        .get("category")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("General")
        .to_string();

    let ticket = Ticket {
        id: Uuid::new_v4().to_string(),
        user_id,
        category,
        subject,
        body,
        status: TicketStatus::Open,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    let mut tickets = store::tickets(conn);
    tickets.insert(0, ticket.clone());
    if let Err(e) = store::save_tickets(conn, &tickets) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "ticket": ticket }))
}

fn handle_tickets_set_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let ticket_id = match req.params.get("id").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing id", None),
    };
    let status = match req
        .params
        .get("status")
        .and_then(|v| v.as_str())
        .and_then(TicketStatus::parse)
    {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing or unknown status", None),
    };

    let mut tickets = store::tickets(conn);
    let Some(ticket) = tickets.iter_mut().find(|t| t.id == ticket_id) else {
        return err(&req.id, "not_found", "no such ticket", None);
    };
    ticket.status = status;
    let updated = ticket.clone();
    if let Err(e) = store::save_tickets(conn, &tickets) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "ticket": updated }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "tickets.list" => Some(handle_tickets_list(state, req)),
        "tickets.submit" => Some(handle_tickets_submit(state, req)),
        "tickets.setStatus" => Some(handle_tickets_set_status(state, req)),
        _ => None,
    }
}
