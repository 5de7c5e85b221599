use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{get_required_str, is_iso_date, require_db, require_staff};
use crate::ipc::types::{AppState, Request};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

const DEFAULT_SUBJECT: &str = "Mathematics";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Present,
    Absent,
    Late,
}

impl Status {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            "late" => Some(Self::Late),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
        }
    }
}

fn get_date(params: &serde_json::Value) -> Result<String, HandlerErr> {
    let date = get_required_str(params, "date")?;
    let date = date.trim().to_string();
    if !is_iso_date(&date) {
        return Err(HandlerErr::new("bad_params", "date must be YYYY-MM-DD"));
    }
    Ok(date)
}

fn student_exists(conn: &Connection, student_id: &str) -> Result<bool, HandlerErr> {
    conn.query_row("SELECT 1 FROM students WHERE id = ?", [student_id], |r| {
        r.get::<_, i64>(0)
    })
    .optional()
    .map(|v| v.is_some())
    .map_err(|e| HandlerErr::db("db_query_failed", e))
}

fn attendance_day(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_staff(&state.session)?;
    let conn = require_db(&state.db)?;
    let date = get_date(params)?;

    let mut stmt = conn
        .prepare("SELECT student_id, status, subject FROM attendance WHERE date = ?")
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let marked: HashMap<String, (String, String)> = stmt
        .query_map([&date], |r| {
            Ok((
                r.get::<_, String>(0)?,
                (r.get::<_, String>(1)?, r.get::<_, String>(2)?),
            ))
        })
        .and_then(|it| it.collect::<Result<HashMap<_, _>, _>>())
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;

    let mut stmt = conn
        .prepare("SELECT id, first_name, last_name FROM students ORDER BY rowid")
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let students = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
            ))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let rows: Vec<serde_json::Value> = students
        .iter()
        .map(|(id, first, last)| {
            let (status, subject) = match marked.get(id) {
                Some((status, subject)) => (status.as_str(), Some(subject.as_str())),
                None => ("unmarked", None),
            };
            *counts.entry(status).or_insert(0) += 1;
            json!({
                "studentId": id,
                "displayName": format!("{} {}", first, last),
                "status": status,
                "subject": subject,
            })
        })
        .collect();

    let count = |k: &str| counts.get(k).copied().unwrap_or(0);
    Ok(json!({
        "date": date,
        "rows": rows,
        "stats": {
            "total": students.len(),
            "present": count("present"),
            "absent": count("absent"),
            "late": count("late"),
            "unmarked": count("unmarked"),
        }
    }))
}

/// Upsert keyed by (student, date): an existing record only has its status
/// replaced, otherwise a new record is inserted.
fn attendance_mark(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_staff(&state.session)?;
    let conn = require_db(&state.db)?;
    let student_id = get_required_str(params, "studentId")?;
    let date = get_date(params)?;
    let status_raw = get_required_str(params, "status")?;
    let status = Status::parse(status_raw.trim())
        .ok_or_else(|| HandlerErr::new("bad_params", "status must be present, absent or late"))?;
    let subject = params
        .get("subject")
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUBJECT)
        .to_string();

    if !student_exists(conn, &student_id)? {
        return Err(HandlerErr::new("not_found", "student not found"));
    }

    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM attendance WHERE student_id = ? AND date = ?",
            (&student_id, &date),
            |r| r.get(0),
        )
        .optional()
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;

    let (record_id, created) = match existing {
        Some(id) => {
            conn.execute(
                "UPDATE attendance SET status = ? WHERE id = ?",
                (status.as_str(), &id),
            )
            .map_err(|e| HandlerErr::db("db_update_failed", e))?;
            (id, false)
        }
        None => {
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO attendance(id, student_id, date, status, subject) VALUES(?, ?, ?, ?, ?)",
                (&id, &student_id, &date, status.as_str(), &subject),
            )
            .map_err(|e| {
                HandlerErr::db("db_insert_failed", e).with_details(json!({ "table": "attendance" }))
            })?;
            (id, true)
        }
    };

    debug!(
        target: "campusd::ipc",
        student = %student_id,
        date = %date,
        status = status.as_str(),
        created,
        "attendance marked"
    );
    Ok(json!({
        "recordId": record_id,
        "created": created,
        "status": status.as_str(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "attendance.day" => attendance_day(state, &req.params),
        "attendance.mark" => attendance_mark(state, &req.params),
        _ => return None,
    };
    Some(reply(&req.id, res))
}
