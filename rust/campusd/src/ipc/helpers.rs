use crate::ipc::error::HandlerErr;
use crate::notify::Notifier;
use crate::roster::{Identity, Role};
use crate::session::SessionAuthenticator;
use rusqlite::Connection;
use tracing::info;

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn get_str_or_empty(params: &serde_json::Value, key: &str) -> String {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

pub fn require_db(db: &Option<Connection>) -> Result<&Connection, HandlerErr> {
    db.as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn require_identity(session: &SessionAuthenticator) -> Result<&Identity, HandlerErr> {
    session
        .current_identity()
        .ok_or_else(|| HandlerErr::new("not_authenticated", "log in first"))
}

pub fn require_staff(session: &SessionAuthenticator) -> Result<&Identity, HandlerErr> {
    let identity = require_identity(session)?;
    if !identity.role.is_staff() {
        return Err(HandlerErr::new(
            "forbidden",
            "only administrators and teachers can do this",
        ));
    }
    Ok(identity)
}

/// Admin gate for facility management; a denial is also surfaced to the user.
pub fn require_admin<'a>(
    session: &'a SessionAuthenticator,
    notices: &mut Notifier,
) -> Result<&'a Identity, HandlerErr> {
    let identity = require_identity(session)?;
    if identity.role != Role::Admin {
        info!(
            target: "campusd::ipc",
            user = %identity.username,
            "facility management denied"
        );
        notices.destructive("Access Denied", "Only administrators can manage facilities");
        return Err(HandlerErr::new(
            "forbidden",
            "only administrators can manage facilities",
        ));
    }
    Ok(identity)
}

/// Field-level validation failures, reported together.
#[derive(Default)]
pub struct FieldErrors {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: &str) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| serde_json::Value::String(message.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_err(self, notices: &mut Notifier) -> HandlerErr {
        notices.destructive("Validation Error", "Please check the form for errors");
        HandlerErr::new("validation_failed", "one or more fields are invalid")
            .with_details(serde_json::json!({ "fields": self.fields }))
    }
}

pub fn is_iso_date(s: &str) -> bool {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
