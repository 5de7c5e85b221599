use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{
    get_required_str, get_str_or_empty, is_iso_date, require_db, require_staff, FieldErrors,
};
use crate::ipc::types::{AppState, Request};
use crate::notify::Notifier;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde_json::json;
use std::sync::OnceLock;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Student {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    grade: String,
    age: i64,
    enrollment_date: String,
}

struct StudentInput {
    first_name: String,
    last_name: String,
    email: String,
    grade: String,
    age: i64,
    enrollment_date: String,
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").expect("static email pattern"))
}

fn parse_input(params: &serde_json::Value, notices: &mut Notifier) -> Result<StudentInput, HandlerErr> {
    let input = StudentInput {
        first_name: get_str_or_empty(params, "firstName").trim().to_string(),
        last_name: get_str_or_empty(params, "lastName").trim().to_string(),
        email: get_str_or_empty(params, "email").trim().to_string(),
        grade: get_str_or_empty(params, "grade").trim().to_string(),
        age: params.get("age").and_then(|v| v.as_i64()).unwrap_or(0),
        enrollment_date: get_str_or_empty(params, "enrollmentDate").trim().to_string(),
    };

    let mut errors = FieldErrors::default();
    if input.first_name.is_empty() {
        errors.add("firstName", "First name is required");
    }
    if input.last_name.is_empty() {
        errors.add("lastName", "Last name is required");
    }
    if input.email.is_empty() {
        errors.add("email", "Email is required");
    } else if !email_re().is_match(&input.email) {
        errors.add("email", "Invalid email format");
    }
    if input.grade.is_empty() {
        errors.add("grade", "Grade is required");
    }
    if input.age <= 0 {
        errors.add("age", "Age must be a positive number");
    }
    if !is_iso_date(&input.enrollment_date) {
        errors.add("enrollmentDate", "Enrollment date must be YYYY-MM-DD");
    }

    if errors.is_empty() {
        Ok(input)
    } else {
        Err(errors.into_err(notices))
    }
}

fn row_to_student(r: &rusqlite::Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        first_name: r.get(1)?,
        last_name: r.get(2)?,
        email: r.get(3)?,
        grade: r.get(4)?,
        age: r.get(5)?,
        enrollment_date: r.get(6)?,
    })
}

fn load_student(conn: &Connection, id: &str) -> Result<Option<Student>, HandlerErr> {
    conn.query_row(
        "SELECT id, first_name, last_name, email, grade, age, enrollment_date
         FROM students WHERE id = ?",
        [id],
        row_to_student,
    )
    .optional()
    .map_err(|e| HandlerErr::db("db_query_failed", e))
}

fn not_found() -> HandlerErr {
    HandlerErr::new("not_found", "student not found")
}

fn students_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    require_staff(&state.session)?;
    let conn = require_db(&state.db)?;
    let mut stmt = conn
        .prepare(
            "SELECT id, first_name, last_name, email, grade, age, enrollment_date
             FROM students
             ORDER BY rowid",
        )
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let students = stmt
        .query_map([], row_to_student)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    Ok(json!({ "students": students }))
}

fn students_get(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_staff(&state.session)?;
    let conn = require_db(&state.db)?;
    let id = get_required_str(params, "studentId")?;
    let student = load_student(conn, &id)?.ok_or_else(not_found)?;
    Ok(json!({ "student": student }))
}

fn students_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_staff(&state.session)?;
    let conn = require_db(&state.db)?;
    let input = parse_input(params, &mut state.notices)?;

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO students(id, first_name, last_name, email, grade, age, enrollment_date)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            &input.first_name,
            &input.last_name,
            &input.email,
            &input.grade,
            input.age,
            &input.enrollment_date,
        ),
    )
    .map_err(|e| {
        HandlerErr::db("db_insert_failed", e).with_details(json!({ "table": "students" }))
    })?;

    state.notices.info(
        "Student added",
        format!("{} {} has been added.", input.first_name, input.last_name),
    );
    Ok(json!({ "studentId": id }))
}

fn students_update(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_staff(&state.session)?;
    let conn = require_db(&state.db)?;
    let id = get_required_str(params, "studentId")?;
    if load_student(conn, &id)?.is_none() {
        return Err(not_found());
    }
    let input = parse_input(params, &mut state.notices)?;

    conn.execute(
        "UPDATE students
         SET first_name = ?, last_name = ?, email = ?, grade = ?, age = ?, enrollment_date = ?
         WHERE id = ?",
        (
            &input.first_name,
            &input.last_name,
            &input.email,
            &input.grade,
            input.age,
            &input.enrollment_date,
            &id,
        ),
    )
    .map_err(|e| HandlerErr::db("db_update_failed", e))?;

    state.notices.info(
        "Student updated",
        format!("{} {} has been updated.", input.first_name, input.last_name),
    );
    Ok(json!({ "ok": true }))
}

fn students_delete(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_staff(&state.session)?;
    let conn = require_db(&state.db)?;
    let id = get_required_str(params, "studentId")?;
    let student = load_student(conn, &id)?.ok_or_else(not_found)?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::db("db_tx_failed", e))?;
    tx.execute("DELETE FROM attendance WHERE student_id = ?", [&id])
        .map_err(|e| {
            HandlerErr::db("db_delete_failed", e).with_details(json!({ "table": "attendance" }))
        })?;
    tx.execute("DELETE FROM students WHERE id = ?", [&id])
        .map_err(|e| {
            HandlerErr::db("db_delete_failed", e).with_details(json!({ "table": "students" }))
        })?;
    tx.commit().map_err(|e| HandlerErr::db("db_commit_failed", e))?;

    state.notices.info(
        "Student deleted",
        format!("{} {} has been removed.", student.first_name, student.last_name),
    );
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "students.list" => students_list(state),
        "students.get" => students_get(state, &req.params),
        "students.create" => students_create(state, &req.params),
        "students.update" => students_update(state, &req.params),
        "students.delete" => students_delete(state, &req.params),
        _ => return None,
    };
    Some(reply(&req.id, res))
}
