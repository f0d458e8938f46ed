use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, EventItem};
use chrono::{Duration, SecondsFormat, Timelike, Utc};
use serde_json::json;
use uuid::Uuid;

struct Peer {
    id: &'static str,
    name: &'static str,
    skills: &'static [&'static str],
    looking: &'static [&'static str],
}

// Fixed peer roster; a stand-in for real matchmaking.
const PEERS: &[Peer] = &[
    Peer {
        id: "p1",
        name: "Samiksha Patel",
        skills: &["DSA", "React"],
        looking: &["DBMS"],
    },
    Peer {
        id: "p2",
        name: "Michael Chen",
        skills: &["Calculus", "Physics"],
        looking: &["Algorithms"],
    },
    Peer {
        id: "p3",
        name: "Isha Rao",
        skills: &["DBMS", "Networks"],
        looking: &["OS"],
    },
];

fn user_id_param(state: &AppState, params: &serde_json::Value) -> String {
    params
        .get("userId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| state.session.id.clone())
}

fn interests_for(conn: &rusqlite::Connection, user_id: &str) -> Vec<String> {
    let mut interests = Vec::new();
    for block in store::timetable(conn, user_id) {
        if !interests.contains(&block.course) {
            interests.push(block.course);
        }
    }
    interests
}

fn peer_json(p: &Peer) -> serde_json::Value {
    json!({
        "id": p.id,
        "name": p.name,
        "skills": p.skills,
        "looking": p.looking,
    })
}

fn handle_suggest(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let topic = req
        .params
        .get("topic")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_lowercase();

    let interests = interests_for(conn, &user_id);
    let suggestions: Vec<_> = PEERS
        .iter()
        .filter(|p| {
            let wants_my_course = p.looking.iter().any(|l| interests.iter().any(|i| i == l));
            let topic_hit =
                !topic.is_empty() && p.looking.iter().any(|l| topic.contains(&l.to_lowercase()));
            wants_my_course || topic_hit
        })
        .map(peer_json)
        .collect();

    ok(
        &req.id,
        json!({ "interests": interests, "peers": suggestions }),
    )
}

fn handle_invite(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = user_id_param(state, &req.params);
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let peer_id = match req.params.get("peerId").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing peerId", None),
    };
    let Some(peer) = PEERS.iter().find(|p| p.id == peer_id) else {
        return err(&req.id, "not_found", "no such peer", None);
    };
    let topic = req
        .params
        .get("topic")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("General");

    // The session lands tomorrow at this hour, on the hour.
    let start = (Utc::now() + Duration::hours(24))
        .with_minute(0)
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or_else(Utc::now);

    let event = EventItem {
        id: Uuid::new_v4().to_string(),
        title: format!("Study Group: {} with {}", topic, peer.name),
        start: start.to_rfc3339_opts(SecondsFormat::Secs, true),
        end: None,
        location: Some("Library A-204".to_string()),
        description: None,
    };
    let mut events = store::events(conn, &user_id);
    events.insert(0, event.clone());
    if let Err(e) = store::save_events(conn, &user_id, &events) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "event": event, "peer": peer_json(peer) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "studygroups.suggest" => Some(handle_suggest(state, req)),
        "studygroups.invite" => Some(handle_invite(state, req)),
        _ => None,
    }
}
