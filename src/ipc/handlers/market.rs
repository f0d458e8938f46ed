use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, MarketItem, MarketKind};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use uuid::Uuid;

fn handle_market_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let mut items = store::market(conn);
    if let Some(kind_raw) = req.params.get("type").and_then(|v| v.as_str()) {
        let Some(kind) = MarketKind::parse(kind_raw) else {
            return err(&req.id, "bad_params", "unknown type", None);
        };
        items.retain(|i| i.kind == kind);
    }
    ok(&req.id, json!({ "items": items }))
}

fn handle_market_post(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = req
        .params
        .get("userId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| state.session.id.clone());
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let kind = match req
        .params
        .get("type")
        .and_then(|v| v.as_str())
        .and_then(MarketKind::parse)
    {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing or unknown type", None),
    };
    let title = match req.params.get("title").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing title", None),
    };

    let item = MarketItem {
        id: Uuid::new_v4().to_string(),
        kind,
        title,
        description: req
            .params
            .get("description")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string()),
        price: req.params.get("price").and_then(|v| v.as_f64()),
        image_url: req
            .params
            .get("imageUrl")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string()),
        user_id,
        date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    let mut items = store::market(conn);
    items.insert(0, item.clone());
    if let Err(e) = store::save_market(conn, &items) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "item": item }))
}

fn handle_market_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let item_id = match req.params.get("id").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing id", None),
    };

    let items = store::market(conn);
    let before = items.len();
    let items: Vec<MarketItem> = items.into_iter().filter(|i| i.id != item_id).collect();
    let removed = items.len() < before;
    if removed {
        if let Err(e) = store::save_market(conn, &items) {
            return err(&req.id, "db_write_failed", e.to_string(), None);
        }
    }
    ok(&req.id, json!({ "removed": removed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "market.list" => Some(handle_market_list(state, req)),
        "market.post" => Some(handle_market_post(state, req)),
        "market.delete" => Some(handle_market_delete(state, req)),
        _ => None,
    }
}
