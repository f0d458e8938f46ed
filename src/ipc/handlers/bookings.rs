use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, Booking};
use serde_json::json;
use uuid::Uuid;

struct Resource {
    id: &'static str,
    name: &'static str,
    kind: &'static str,
}

const RESOURCES: &[Resource] = &[
    Resource {
        id: "room-a1",
        name: "Study Room A1",
        kind: "Study Room",
    },
    Resource {
        id: "room-a2",
        name: "Study Room A2",
        kind: "Study Room",
    },
    Resource {
        id: "lab-c3",
        name: "Computer Lab C3",
        kind: "Lab",
    },
    Resource {
        id: "court-1",
        name: "Badminton Court 1",
        kind: "Sports",
    },
];

fn resource_exists(id: &str) -> bool {
    RESOURCES.iter().any(|r| r.id == id)
}

fn handle_resources(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let list: Vec<_> = RESOURCES
        .iter()
        .map(|r| json!({ "id": r.id, "name": r.name, "type": r.kind }))
        .collect();
    ok(&req.id, json!({ "resources": list }))
}

fn handle_bookings_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let resource_id = match req.params.get("resourceId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing resourceId", None),
    };
    let mut bookings = store::bookings(conn, &resource_id);
    if let Some(date) = req.params.get("date").and_then(|v| v.as_str()) {
        bookings.retain(|b| b.start.get(..10) == Some(date));
    }
    ok(
        &req.id,
        json!({ "resourceId": resource_id, "bookings": bookings }),
    )
}

fn handle_bookings_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = req
        .params
        .get("userId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| state.session.id.clone());
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let resource_id = match req.params.get("resourceId").and_then(|v| v.as_str()) {
        Some(v) if resource_exists(v) => v.to_string(),
        Some(v) => {
            return err(
                &req.id,
                "not_found",
                "no such resource",
                Some(json!({ "resourceId": v })),
            )
        }
        None => return err(&req.id, "bad_params", "missing resourceId", None),
    };
    let title = match req.params.get("title").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing title", None),
    };
    let start = match req.params.get("start").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing start", None),
    };
    let end = match req.params.get("end").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing end", None),
    };

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        resource_id: resource_id.clone(),
        title,
        start,
        end,
        user_id,
    };
    let mut bookings = store::bookings(conn, &resource_id);
    bookings.insert(0, booking.clone());
    if let Err(e) = store::save_bookings(conn, &resource_id, &bookings) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "booking": booking }))
}

fn handle_bookings_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let resource_id = match req.params.get("resourceId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing resourceId", None),
    };
    let booking_id = match req.params.get("id").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing id", None),
    };

    let bookings = store::bookings(conn, &resource_id);
    let before = bookings.len();
    let bookings: Vec<Booking> = bookings
        .into_iter()
        .filter(|b| b.id != booking_id)
        .collect();
    let removed = bookings.len() < before;
    if removed {
        if let Err(e) = store::save_bookings(conn, &resource_id, &bookings) {
            return err(&req.id, "db_write_failed", e.to_string(), None);
        }
    }
    ok(&req.id, json!({ "removed": removed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "bookings.resources" => Some(handle_resources(state, req)),
        "bookings.list" => Some(handle_bookings_list(state, req)),
        "bookings.create" => Some(handle_bookings_create(state, req)),
        "bookings.delete" => Some(handle_bookings_delete(state, req)),
        _ => None,
    }
}
