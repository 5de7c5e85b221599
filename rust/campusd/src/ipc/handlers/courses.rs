use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{
    get_str_or_empty, is_iso_date, require_db, require_identity, require_staff, FieldErrors,
};
use crate::ipc::types::{AppState, Request};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

const COURSE_STATUSES: [&str; 3] = ["active", "inactive", "completed"];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Course {
    id: String,
    name: String,
    code: String,
    instructor: String,
    students: i64,
    max_students: i64,
    schedule: String,
    duration: String,
    status: String,
    description: String,
    start_date: String,
    end_date: String,
}

fn courses_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_identity(&state.session)?;
    let conn = require_db(&state.db)?;

    let status = params.get("status").and_then(|v| v.as_str());
    if let Some(s) = status {
        if !COURSE_STATUSES.contains(&s) {
            return Err(HandlerErr::new(
                "bad_params",
                "status must be active, inactive or completed",
            ));
        }
    }

    let mut stmt = conn
        .prepare(
            "SELECT id, name, code, instructor, students, max_students, schedule,
                    duration, status, description, start_date, end_date
             FROM courses
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY rowid",
        )
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let courses = stmt
        .query_map([status], |r| {
            Ok(Course {
                id: r.get(0)?,
                name: r.get(1)?,
                code: r.get(2)?,
                instructor: r.get(3)?,
                students: r.get(4)?,
                max_students: r.get(5)?,
                schedule: r.get(6)?,
                duration: r.get(7)?,
                status: r.get(8)?,
                description: r.get(9)?,
                start_date: r.get(10)?,
                end_date: r.get(11)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;

    let enrolled: i64 = courses.iter().map(|c| c.students).sum();
    let active = courses.iter().filter(|c| c.status == "active").count();
    Ok(json!({
        "courses": courses,
        "activeCount": active,
        "enrolledCount": enrolled,
    }))
}

fn courses_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_staff(&state.session)?;
    let conn = require_db(&state.db)?;

    let name = get_str_or_empty(params, "name").trim().to_string();
    let code = get_str_or_empty(params, "code").trim().to_string();
    let instructor = get_str_or_empty(params, "instructor").trim().to_string();
    let students = params.get("students").and_then(|v| v.as_i64()).unwrap_or(0);
    let max_students = params.get("maxStudents").and_then(|v| v.as_i64()).unwrap_or(0);
    let schedule = get_str_or_empty(params, "schedule").trim().to_string();
    let duration = get_str_or_empty(params, "duration").trim().to_string();
    let status = params
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("active")
        .to_string();
    let description = get_str_or_empty(params, "description").trim().to_string();
    let start_date = get_str_or_empty(params, "startDate").trim().to_string();
    let end_date = get_str_or_empty(params, "endDate").trim().to_string();

    let mut errors = FieldErrors::default();
    if name.is_empty() {
        errors.add("name", "Name is required");
    }
    if code.is_empty() {
        errors.add("code", "Code is required");
    }
    if instructor.is_empty() {
        errors.add("instructor", "Instructor is required");
    }
    if max_students <= 0 {
        errors.add("maxStudents", "Maximum students must be a positive number");
    }
    if students < 0 || students > max_students.max(0) {
        errors.add("students", "Enrolled students must be between 0 and the maximum");
    }
    if !COURSE_STATUSES.contains(&status.as_str()) {
        errors.add("status", "Status must be active, inactive or completed");
    }
    let start_ok = is_iso_date(&start_date);
    let end_ok = is_iso_date(&end_date);
    if !start_ok {
        errors.add("startDate", "Start date must be YYYY-MM-DD");
    }
    if !end_ok {
        errors.add("endDate", "End date must be YYYY-MM-DD");
    }
    // ISO dates compare correctly as strings.
    if start_ok && end_ok && end_date < start_date {
        errors.add("endDate", "End date must not be before the start date");
    }
    if !errors.is_empty() {
        return Err(errors.into_err(&mut state.notices));
    }

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO courses(id, name, code, instructor, students, max_students, schedule,
                             duration, status, description, start_date, end_date)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            &name,
            &code,
            &instructor,
            students,
            max_students,
            &schedule,
            &duration,
            &status,
            &description,
            &start_date,
            &end_date,
        ),
    )
    .map_err(|e| {
        HandlerErr::db("db_insert_failed", e).with_details(json!({ "table": "courses" }))
    })?;

    state
        .notices
        .info("Course created", format!("{} ({}) has been added.", name, code));
    Ok(json!({ "courseId": id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "courses.list" => courses_list(state, &req.params),
        "courses.create" => courses_create(state, &req.params),
        _ => return None,
    };
    Some(reply(&req.id, res))
}
