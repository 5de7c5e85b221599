use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{require_db, require_staff};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::collections::BTreeMap;

fn grade_points(grade: &str) -> f64 {
    match grade {
        "A+" => 4.3,
        "A" => 4.0,
        "A-" => 3.7,
        "B+" => 3.3,
        "B" => 3.0,
        "B-" => 2.7,
        "C+" => 2.3,
        "C" => 2.0,
        "C-" => 1.7,
        "D+" => 1.3,
        "D" => 1.0,
        "D-" => 0.7,
        _ => 0.0,
    }
}

fn summarize(grades: &[String]) -> serde_json::Value {
    let total = grades.len();
    let average = if total == 0 {
        0.0
    } else {
        grades.iter().map(|g| grade_points(g)).sum::<f64>() / total as f64
    };

    let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
    for g in grades {
        if let Some(letter) = g.chars().next() {
            *distribution.entry(letter.to_string()).or_insert(0) += 1;
        }
    }

    json!({
        "totalStudents": total,
        "averageGrade": format!("{:.2}", average),
        "gradeDistribution": distribution,
    })
}

fn dashboard_summary(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    require_staff(&state.session)?;
    let conn = require_db(&state.db)?;
    let mut stmt = conn
        .prepare("SELECT grade FROM students ORDER BY rowid")
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let grades = stmt
        .query_map([], |r| r.get::<_, String>(0))
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    Ok(summarize(&grades))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.summary" => Some(reply(&req.id, dashboard_summary(state))),
        _ => None,
    }
}
