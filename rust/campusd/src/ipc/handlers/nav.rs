use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::routing::{self, Route, RouteDecision};
use serde_json::json;

fn handle_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(path) = req.params.get("path").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let route = Route::parse(path);
    let decision = routing::resolve(state.session.view(), &route, &mut state.notices);
    let redirect = match decision {
        RouteDecision::Redirect { to } => Some(to),
        RouteDecision::Allow => None,
    };
    ok(
        &req.id,
        json!({
            "path": path,
            "route": route.name(),
            "allowed": decision.is_allowed(),
            "redirect": redirect,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "nav.resolve" => Some(handle_resolve(state, req)),
        _ => None,
    }
}
