use std::path::Path;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use symfetch_http::mock::MockClient;
use symfetch_http::{HttpRequest, HttpResponse};
use symfetch_tasks::{trigger, TaskError, TriggerSettings};
use tempfile::TempDir;

fn write_templates(dir: &Path) {
    std::fs::write(
        dir.join("fetch-task.json"),
        json!({
            "taskGroupId": "{{ task_group_id }}",
            "created": "{{ task_created }}",
            "deadline": "{{ task_deadline }}",
            "payload": { "expires": "{{ artifacts_expires }}", "maxRunTime": 600 }
        })
        .to_string(),
    )
    .unwrap();
    std::fs::write(
        dir.join("upload-task.json"),
        json!({
            "taskGroupId": "{{ task_group_id }}",
            "payload": { "env": { "FETCH": "{{ fetch_task_id }}" } }
        })
        .to_string(),
    )
    .unwrap();
}

fn settings(dir: &TempDir) -> TriggerSettings {
    TriggerSettings {
        template_dir: dir.path().to_path_buf(),
        credentials_file: dir.path().join("missing").join("taskcluster-auth.json"),
        queue_base_url: "https://queue.test/v1/".into(),
        timeout: Duration::from_secs(5),
    }
}

fn body(req: &HttpRequest) -> Value {
    serde_json::from_slice(req.body.as_deref().unwrap()).unwrap()
}

fn task_id(req: &HttpRequest) -> String {
    req.url.rsplit('/').next().unwrap().to_string()
}

#[test]
fn decision_task_uses_proxy_and_chains_dependencies() {
    let dir = TempDir::new().unwrap();
    write_templates(dir.path());
    let http = MockClient::new(|_| Ok(HttpResponse::new(200, "{}")));
    let now = Utc.with_ymd_and_hms(2026, 10, 17, 6, 0, 0).unwrap();

    let report = trigger(&http, &settings(&dir), Some("DECISION"), now).unwrap();
    assert_eq!(report.task_group_id, "DECISION");
    assert_eq!(report.tasks.len(), 2);
    assert_eq!(report.tasks[0].template, "fetch-task");

    let requests = http.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests
        .iter()
        .all(|r| r.url.starts_with("http://taskcluster/queue/v1/task/")));
    assert!(requests.iter().all(|r| r.header_value("Authorization").is_none()));

    let fetch = body(&requests[0]);
    assert_eq!(fetch["taskGroupId"], "DECISION");
    assert_eq!(fetch["created"], "2026-10-17T06:00:00.000Z");
    assert_eq!(fetch["deadline"], "2026-10-17T14:00:00.000Z");
    assert_eq!(fetch["payload"]["expires"], "2026-10-18T06:00:00.000Z");
    assert_eq!(fetch["dependencies"], json!(["DECISION"]));

    let fetch_id = task_id(&requests[0]);
    assert_eq!(fetch_id, report.tasks[0].task_id);
    let upload = body(&requests[1]);
    assert_eq!(upload["payload"]["env"]["FETCH"], fetch_id.as_str());
    assert_eq!(upload["dependencies"], json!([fetch_id]));
}

#[test]
fn standalone_run_signs_with_credentials() {
    let dir = TempDir::new().unwrap();
    write_templates(dir.path());
    let creds_dir = TempDir::new().unwrap();
    let creds = creds_dir.path().join("taskcluster-auth.json");
    std::fs::write(&creds, r#"{"clientId": "me", "accessToken": "secret"}"#).unwrap();
    let settings = TriggerSettings {
        credentials_file: creds,
        ..settings(&dir)
    };
    let http = MockClient::new(|_| Ok(HttpResponse::new(200, "{}")));

    let report = trigger(&http, &settings, None, Utc::now()).unwrap();
    assert_eq!(report.task_group_id.len(), 22);
    assert!(report
        .inspector_url()
        .ends_with(&format!("#/{}", report.task_group_id)));

    let requests = http.requests();
    assert!(requests[0].url.starts_with("https://queue.test/v1/task/"));
    assert!(requests
        .iter()
        .all(|r| r.header_value("Authorization").is_some_and(|h| h.starts_with("Hawk id=\"me\""))));
    let fetch = body(&requests[0]);
    assert!(fetch.get("dependencies").is_none(), "first task has nothing to depend on");
}

#[test]
fn missing_credentials_fail_before_any_request() {
    let dir = TempDir::new().unwrap();
    write_templates(dir.path());
    let http = MockClient::new(|_| Ok(HttpResponse::new(200, "{}")));
    let err = trigger(&http, &settings(&dir), None, Utc::now()).unwrap_err();
    assert!(matches!(err, TaskError::Io { .. }), "got: {err}");
    assert_eq!(http.request_count(), 0);
}

#[test]
fn auth_failure_stops_submission() {
    let dir = TempDir::new().unwrap();
    write_templates(dir.path());
    let http = MockClient::new(|_| Ok(HttpResponse::new(401, "no scopes")));
    let err = trigger(&http, &settings(&dir), Some("DECISION"), Utc::now()).unwrap_err();
    assert!(matches!(err, TaskError::AuthFailure { .. }));
    assert_eq!(http.request_count(), 1);
}

#[test]
fn declared_dependencies_are_kept() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("only.json"),
        r#"{"dependencies": ["EXISTING"]}"#,
    )
    .unwrap();
    let http = MockClient::new(|_| Ok(HttpResponse::new(200, "{}")));
    trigger(&http, &settings(&dir), Some("DECISION"), Utc::now()).unwrap();
    assert_eq!(body(&http.requests()[0])["dependencies"], json!(["EXISTING"]));
}
