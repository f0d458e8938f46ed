use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store;
use serde_json::json;
use std::collections::BTreeMap;

fn handle_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let scopes: Vec<String> = match req.params.get("scopes") {
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "bad_params", format!("invalid scopes: {}", e), None),
        },
        None => Vec::new(),
    };

    // Attendance presents/totals across the requested scopes, keyed by date.
    let mut by_date: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for scope in &scopes {
        for record in store::attendance(conn, scope) {
            let present = record.rows.iter().filter(|r| r.present).count();
            let entry = by_date.entry(record.date.clone()).or_insert((0, 0));
            entry.0 += present;
            entry.1 += record.rows.len();
        }
    }
    let attendance: Vec<_> = by_date
        .into_iter()
        .map(|(date, (present, total))| json!({ "date": date, "present": present, "total": total }))
        .collect();

    // Ticket counts per category, first-seen order.
    let mut categories: Vec<(String, usize)> = Vec::new();
    for t in store::tickets(conn) {
        match categories.iter_mut().find(|(c, _)| *c == t.category) {
            Some((_, n)) => *n += 1,
            None => categories.push((t.category, 1)),
        }
    }
    let tickets: Vec<_> = categories
        .into_iter()
        .map(|(category, count)| json!({ "category": category, "count": count }))
        .collect();

    let mut kinds: Vec<(store::MarketKind, usize)> = Vec::new();
    for item in store::market(conn) {
        match kinds.iter_mut().find(|(k, _)| *k == item.kind) {
            Some((_, n)) => *n += 1,
            None => kinds.push((item.kind, 1)),
        }
    }
    let market: Vec<_> = kinds
        .into_iter()
        .map(|(kind, count)| json!({ "type": kind, "count": count }))
        .collect();

    let broadcast_count = store::broadcasts(conn).len();

    ok(
        &req.id,
        json!({
            "attendance": attendance,
            "tickets": tickets,
            "market": market,
            "broadcasts": broadcast_count,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.overview" => Some(handle_overview(state, req)),
        _ => None,
    }
}
