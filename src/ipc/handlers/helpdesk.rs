use crate::helpbot;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, ChatMessage, ChatRole};
use serde_json::json;

fn user_id_param(state: &AppState, params: &serde_json::Value) -> String {
    params
        .get("userId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| state.session.id.clone())
}

fn seeded_history(conn: &rusqlite::Connection, user_id: &str) -> Vec<ChatMessage> {
    let history = store::helpdesk_history(conn, user_id);
    if history.is_empty() {
        vec![ChatMessage {
            role: ChatRole::Assistant,
            text: helpbot::GREETING.to_string(),
        }]
    } else {
        history
    }
}

fn handle_helpdesk_ask(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let question = match req.params.get("question").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing question", None),
    };

    let answer = helpbot::answer(&question);
    let mut history = seeded_history(conn, &user_id);
    history.push(ChatMessage {
        role: ChatRole::User,
        text: question,
    });
    history.push(ChatMessage {
        role: ChatRole::Assistant,
        text: answer.clone(),
    });
    if let Err(e) = store::save_helpdesk_history(conn, &user_id, &history) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "answer": answer }))
}

fn handle_helpdesk_history(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let messages = seeded_history(conn, &user_id);
    ok(&req.id, json!({ "userId": user_id, "messages": messages }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "helpdesk.ask" => Some(handle_helpdesk_ask(state, req)),
        "helpdesk.history" => Some(handle_helpdesk_history(state, req)),
        _ => None,
    }
}
