use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::routing::landing_path;
use crate::session::SessionView;
use serde_json::json;

fn session_json(view: SessionView<'_>) -> serde_json::Value {
    json!({
        "authenticated": view.is_authenticated(),
        "identity": view.identity(),
        "landing": view.role().map(landing_path),
    })
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    // Empty strings are legal credentials; they simply never match.
    let username = req.params.get("username").and_then(|v| v.as_str());
    let password = req.params.get("password").and_then(|v| v.as_str());
    let (Some(username), Some(password)) = (username, password) else {
        return err(
            &req.id,
            "bad_params",
            "missing params.username or params.password",
            None,
        );
    };

    if !state.config.login_delay.is_zero() {
        std::thread::sleep(state.config.login_delay);
    }

    let authenticated = state
        .session
        .authenticate(username, password, &mut state.notices);
    let mut result = session_json(state.session.view());
    // A failed attempt does not touch an existing session, but the caller
    // only learns whether this attempt matched.
    result["authenticated"] = json!(authenticated);
    ok(&req.id, result)
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session.end_session(&mut state.notices);
    ok(&req.id, session_json(state.session.view()))
}

fn handle_session(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, session_json(state.session.view()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.session" => Some(handle_session(state, req)),
        _ => None,
    }
}
