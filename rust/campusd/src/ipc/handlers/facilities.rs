use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{
    get_required_str, get_str_or_empty, require_admin, require_db, require_identity, FieldErrors,
};
use crate::ipc::types::{AppState, Request};
use crate::notify::Notifier;
use crate::roster::Role;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

const FACILITY_TYPES: [&str; 7] = [
    "classroom",
    "laboratory",
    "library",
    "gymnasium",
    "cafeteria",
    "office",
    "other",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Facility {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    location: String,
    capacity: i64,
    is_available: bool,
    description: String,
}

struct FacilityInput {
    name: String,
    kind: String,
    location: String,
    capacity: i64,
    is_available: bool,
    description: String,
}

fn parse_input(params: &serde_json::Value, notices: &mut Notifier) -> Result<FacilityInput, HandlerErr> {
    let kind = params
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or("classroom")
        .to_string();
    let input = FacilityInput {
        name: get_str_or_empty(params, "name").trim().to_string(),
        kind,
        location: get_str_or_empty(params, "location").trim().to_string(),
        capacity: params.get("capacity").and_then(|v| v.as_i64()).unwrap_or(0),
        is_available: params
            .get("isAvailable")
            .and_then(|v| v.as_bool())
            .unwrap_or(true),
        description: get_str_or_empty(params, "description").trim().to_string(),
    };

    let mut errors = FieldErrors::default();
    if input.name.chars().count() < 2 {
        errors.add("name", "Name must be at least 2 characters");
    }
    if !FACILITY_TYPES.contains(&input.kind.as_str()) {
        errors.add("type", "Please select a facility type");
    }
    if input.location.chars().count() < 3 {
        errors.add("location", "Location must be at least 3 characters");
    }
    if input.capacity <= 0 {
        errors.add("capacity", "Capacity must be a positive number");
    }
    if input.description.chars().count() < 5 {
        errors.add("description", "Description must be at least 5 characters");
    }

    if errors.is_empty() {
        Ok(input)
    } else {
        Err(errors.into_err(notices))
    }
}

fn row_to_facility(r: &rusqlite::Row<'_>) -> rusqlite::Result<Facility> {
    Ok(Facility {
        id: r.get(0)?,
        name: r.get(1)?,
        kind: r.get(2)?,
        location: r.get(3)?,
        capacity: r.get(4)?,
        is_available: r.get::<_, i64>(5)? != 0,
        description: r.get(6)?,
    })
}

fn load_facility(conn: &Connection, id: &str) -> Result<Option<Facility>, HandlerErr> {
    conn.query_row(
        "SELECT id, name, type, location, capacity, is_available, description
         FROM facilities WHERE id = ?",
        [id],
        row_to_facility,
    )
    .optional()
    .map_err(|e| HandlerErr::db("db_query_failed", e))
}

fn not_found(notices: &mut Notifier) -> HandlerErr {
    notices.destructive(
        "Facility not found",
        "The facility you're trying to edit doesn't exist",
    );
    HandlerErr::new("not_found", "facility not found")
}

fn facilities_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let identity = require_identity(&state.session)?;
    let conn = require_db(&state.db)?;
    let mut stmt = conn
        .prepare(
            "SELECT id, name, type, location, capacity, is_available, description
             FROM facilities
             ORDER BY rowid",
        )
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let facilities = stmt
        .query_map([], row_to_facility)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let available = facilities.iter().filter(|f| f.is_available).count();
    Ok(json!({
        "facilities": facilities,
        "availableCount": available,
        "canManage": identity.role == Role::Admin,
    }))
}

fn facilities_get(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_identity(&state.session)?;
    let conn = require_db(&state.db)?;
    let id = get_required_str(params, "facilityId")?;
    match load_facility(conn, &id)? {
        Some(f) => Ok(json!({ "facility": f })),
        None => Err(not_found(&mut state.notices)),
    }
}

fn facilities_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_admin(&state.session, &mut state.notices)?;
    let conn = require_db(&state.db)?;
    let input = parse_input(params, &mut state.notices)?;

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO facilities(id, name, type, location, capacity, is_available, description)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            &input.name,
            &input.kind,
            &input.location,
            input.capacity,
            input.is_available as i64,
            &input.description,
        ),
    )
    .map_err(|e| {
        HandlerErr::db("db_insert_failed", e).with_details(json!({ "table": "facilities" }))
    })?;

    state
        .notices
        .info("Facility created", "The facility has been successfully created");
    Ok(json!({ "facilityId": id }))
}

fn facilities_update(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_admin(&state.session, &mut state.notices)?;
    let conn = require_db(&state.db)?;
    let id = get_required_str(params, "facilityId")?;
    if load_facility(conn, &id)?.is_none() {
        return Err(not_found(&mut state.notices));
    }
    let input = parse_input(params, &mut state.notices)?;

    conn.execute(
        "UPDATE facilities
         SET name = ?, type = ?, location = ?, capacity = ?, is_available = ?, description = ?
         WHERE id = ?",
        (
            &input.name,
            &input.kind,
            &input.location,
            input.capacity,
            input.is_available as i64,
            &input.description,
            &id,
        ),
    )
    .map_err(|e| HandlerErr::db("db_update_failed", e))?;

    state
        .notices
        .info("Facility updated", "The facility has been successfully updated");
    Ok(json!({ "ok": true }))
}

fn facilities_delete(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_admin(&state.session, &mut state.notices)?;
    let conn = require_db(&state.db)?;
    let id = get_required_str(params, "facilityId")?;
    let removed = conn
        .execute("DELETE FROM facilities WHERE id = ?", [&id])
        .map_err(|e| HandlerErr::db("db_delete_failed", e))?;
    if removed == 0 {
        return Err(not_found(&mut state.notices));
    }

    state
        .notices
        .info("Facility deleted", "The facility has been successfully deleted.");
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "facilities.list" => facilities_list(state),
        "facilities.get" => facilities_get(state, &req.params),
        "facilities.create" => facilities_create(state, &req.params),
        "facilities.update" => facilities_update(state, &req.params),
        "facilities.delete" => facilities_delete(state, &req.params),
        _ => return None,
    };
    Some(reply(&req.id, res))
}
