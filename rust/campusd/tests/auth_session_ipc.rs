use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_campusd");
    let mut child = Command::new(exe)
        .env("CAMPUSD_LOGIN_DELAY_MS", "0")
        .env_remove("CAMPUSD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn campusd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn notification_titles(value: &serde_json::Value) -> Vec<String> {
    value
        .get("notifications")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|n| n.get("title").and_then(|t| t.as_str()))
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn admin_login_lands_on_dashboard_and_logout_is_idempotent() {
    let workspace = temp_dir("campusd-auth-admin");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "username": "admin", "password": "password" }),
    );
    let result = &login["result"];
    assert_eq!(result["authenticated"], true);
    assert_eq!(result["identity"]["role"], "admin");
    assert_eq!(result["identity"]["fullName"], "Admin User");
    assert_eq!(result["landing"], "/dashboard");
    assert_eq!(notification_titles(&login), vec!["Login successful"]);
    assert_eq!(
        login["notifications"][0]["description"],
        "Welcome back, Admin User!"
    );

    let out = request_ok(&mut stdin, &mut reader, "3", "auth.logout", json!({}));
    assert_eq!(out["result"]["authenticated"], false);
    assert_eq!(notification_titles(&out), vec!["Logged out"]);

    let again = request_ok(&mut stdin, &mut reader, "4", "auth.logout", json!({}));
    assert_eq!(again["result"]["authenticated"], false);
    assert!(again["result"]["identity"].is_null());
    assert_eq!(notification_titles(&again), vec!["Logged out"]);

    let session = request_ok(&mut stdin, &mut reader, "5", "auth.session", json!({}));
    assert_eq!(session["result"]["authenticated"], false);
    assert!(session.get("notifications").is_none());
}

#[test]
fn student_login_lands_on_learner_view() {
    let workspace = temp_dir("campusd-auth-student");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let login = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "username": "student", "password": "student123" }),
    );
    assert_eq!(login["result"]["authenticated"], true);
    assert_eq!(login["result"]["identity"]["role"], "student");
    assert_eq!(login["result"]["landing"], "/student-dashboard");

    let nav = request_ok(&mut stdin, &mut reader, "3", "nav.resolve", json!({ "path": "/" }));
    assert_eq!(nav["result"]["allowed"], false);
    assert_eq!(nav["result"]["redirect"], "/student-dashboard");
}

#[test]
fn wrong_password_fails_without_creating_a_session() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "username": "admin", "password": "wrong" }),
    );
    assert_eq!(login["result"]["authenticated"], false);
    assert!(login["result"]["identity"].is_null());
    assert_eq!(notification_titles(&login), vec!["Login failed"]);
    assert_eq!(login["notifications"][0]["severity"], "destructive");
    assert_eq!(
        login["notifications"][0]["description"],
        "Invalid username or password"
    );

    let unknown = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "username": "nobody", "password": "password" }),
    );
    assert_eq!(unknown["notifications"], login["notifications"]);

    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "username": "", "password": "" }),
    );
    assert_eq!(empty["result"]["authenticated"], false);

    let health = request_ok(&mut stdin, &mut reader, "4", "health", json!({}));
    assert_eq!(health["result"]["authenticated"], false);

    let missing = request(&mut stdin, &mut reader, "5", "auth.login", json!({ "username": "admin" }));
    assert_eq!(error_code(&missing), "bad_params");
}

#[test]
fn failed_login_keeps_existing_session() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "username": "teacher", "password": "password" }),
    );
    let bad = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "username": "admin", "password": "nope" }),
    );
    assert_eq!(bad["result"]["authenticated"], false);
    assert_eq!(bad["result"]["identity"]["role"], "teacher");

    let session = request_ok(&mut stdin, &mut reader, "3", "auth.session", json!({}));
    assert_eq!(session["result"]["identity"]["username"], "teacher");
}

#[test]
fn session_survives_restart_until_logout_or_tab_close() {
    let workspace = temp_dir("campusd-auth-restore");

    let before = {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        let login = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "auth.login",
            json!({ "username": "teacher", "password": "password" }),
        );
        drop(stdin);
        let _ = child.wait();
        login["result"]["identity"].clone()
    };

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        let selected = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        assert_eq!(selected["result"]["authenticated"], true);
        assert!(selected.get("notifications").is_none());
        let session = request_ok(&mut stdin, &mut reader, "2", "auth.session", json!({}));
        assert_eq!(session["result"]["identity"], before);

        let closed = request_ok(&mut stdin, &mut reader, "3", "tab.close", json!({}));
        assert_eq!(closed["result"]["authenticated"], false);
        assert!(closed.get("notifications").is_none());
        drop(stdin);
        let _ = child.wait();
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected["result"]["authenticated"], false);
}

#[test]
fn login_before_workspace_select_keeps_the_session() {
    let workspace = temp_dir("campusd-auth-early-login");

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        let login = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "auth.login",
            json!({ "username": "admin", "password": "password" }),
        );
        assert_eq!(login["result"]["authenticated"], true);

        let selected = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        assert_eq!(selected["result"]["authenticated"], true);
        assert!(selected.get("notifications").is_none());

        let session = request_ok(&mut stdin, &mut reader, "3", "auth.session", json!({}));
        assert_eq!(session["result"]["authenticated"], true);
        assert_eq!(session["result"]["identity"]["role"], "admin");
        assert_eq!(session["result"]["landing"], "/dashboard");
        drop(stdin);
        let _ = child.wait();
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected["result"]["authenticated"], true);
    let session = request_ok(&mut stdin, &mut reader, "2", "auth.session", json!({}));
    assert_eq!(session["result"]["identity"]["username"], "admin");
}

#[test]
fn tampered_session_entry_is_not_restored() {
    let workspace = temp_dir("campusd-auth-tampered");
    {
        let conn = rusqlite::Connection::open(workspace.join("tab_storage.sqlite3")).expect("open");
        conn.execute(
            "CREATE TABLE IF NOT EXISTS tab_storage(key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .expect("create");
        let forged = json!({
            "id": "3",
            "username": "student",
            "password": "student123",
            "fullName": "Student User",
            "role": "admin"
        });
        conn.execute(
            "INSERT INTO tab_storage(key, value) VALUES('currentUser', ?)",
            [forged.to_string()],
        )
        .expect("insert");
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected["result"]["authenticated"], false);
}

#[test]
fn malformed_lines_and_unknown_methods_are_reported() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    writeln!(stdin, "not json").expect("write");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read");
    let v: serde_json::Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(error_code(&v), "bad_json");

    let unknown = request(&mut stdin, &mut reader, "1", "auth.explode", json!({}));
    assert_eq!(error_code(&unknown), "not_implemented");
}
