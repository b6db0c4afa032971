//! End-to-end roster and session scenarios against a mocked remote store.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use turnario_core::{
    AbsenceStatus, DoctorRoster, NoHolidays, Redraw, RosterError, Session,
};
use turnario_store::{BackupCache, RemoteStore, RetryPolicy, StoreError, VersionToken};

fn encoded(value: &serde_json::Value) -> String {
    STANDARD.encode(serde_json::to_string_pretty(value).unwrap())
}

fn store_for(server: &MockServer) -> Arc<RemoteStore> {
    Arc::new(RemoteStore::new(
        format!("{}/contents", server.uri()),
        "test-secret",
    ))
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(2, Duration::from_millis(1))
}

fn backup_in(dir: &tempfile::TempDir) -> BackupCache {
    BackupCache::new(dir.path())
}

async fn mount_roster(server: &MockServer, doc: &serde_json::Value, sha: &str) {
    Mock::given(method("GET"))
        .and(path("/contents/medici.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": encoded(doc),
            "sha": sha,
        })))
        .mount(server)
        .await;
}

async fn load_roster(server: &MockServer, dir: &tempfile::TempDir) -> DoctorRoster {
    DoctorRoster::load(store_for(server), fast_retry(), backup_in(dir), "medici.json")
        .await
        .unwrap()
}

fn displays(roster: &DoctorRoster) -> Vec<&str> {
    roster.names().iter().map(|n| n.as_str()).collect()
}

// Missing document means empty roster with no token; the first add issues
// a create (no version token in the request) and adopts the returned one.
#[tokio::test]
async fn missing_document_then_first_add_creates_it() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/contents/medici.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/contents/medici.json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": {"sha": "created1"},
        })))
        .mount(&server)
        .await;

    let mut roster = load_roster(&server, &dir).await;
    assert!(roster.names().is_empty());
    assert_eq!(roster.version(), None);

    roster.add("Verdi Anna").await.unwrap();
    assert_eq!(displays(&roster), vec!["Verdi Anna"]);
    assert_eq!(roster.version(), Some(&VersionToken::from("created1")));

    // The create request must not carry a version token.
    let put = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method.as_str() == "PUT")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&put.body).unwrap();
    assert!(body.get("sha").is_none());
}

// "bianchi luca " is normalized, the candidate roster is sorted, and
// exactly one write is issued carrying the loaded version token.
#[tokio::test]
async fn add_normalizes_sorts_and_writes_once() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_roster(&server, &json!(["Rossi Mario"]), "r1").await;
    Mock::given(method("PUT"))
        .and(path("/contents/medici.json"))
        .and(body_partial_json(json!({"sha": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": {"sha": "r2"},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut roster = load_roster(&server, &dir).await;
    let added = roster.add("bianchi luca ").await.unwrap();

    assert_eq!(added.as_str(), "Bianchi Luca");
    assert_eq!(displays(&roster), vec!["Bianchi Luca", "Rossi Mario"]);
    assert_eq!(roster.version(), Some(&VersionToken::from("r2")));

    // The document written is the sorted display-name array.
    let put = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method.as_str() == "PUT")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&put.body).unwrap();
    let content = STANDARD
        .decode(body["content"].as_str().unwrap())
        .unwrap();
    let written: serde_json::Value = serde_json::from_slice(&content).unwrap();
    assert_eq!(written, json!(["Bianchi Luca", "Rossi Mario"]));
}

// Validation failures never reach the store and leave roster and token
// untouched.
#[tokio::test]
async fn duplicates_and_unknown_names_fail_without_a_write() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_roster(&server, &json!(["Rossi Mario"]), "r1").await;
    Mock::given(method("PUT"))
        .and(path("/contents/medici.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut roster = load_roster(&server, &dir).await;

    // Case- and accent-insensitive duplicate.
    let err = roster.add("ROSSI màrio").await.unwrap_err();
    assert!(matches!(err, RosterError::Duplicate(_)));
    assert!(err.is_validation());

    let err = roster.add("x").await.unwrap_err();
    assert!(matches!(err, RosterError::InvalidName(_)));

    let err = roster.remove("Verdi Anna").await.unwrap_err();
    assert!(matches!(err, RosterError::Unknown(_)));

    assert_eq!(displays(&roster), vec!["Rossi Mario"]);
    assert_eq!(roster.version(), Some(&VersionToken::from("r1")));
}

// A concurrent writer moved the document: the write conflicts and the
// in-memory roster keeps its last-known-good state.
#[tokio::test]
async fn conflicting_write_leaves_roster_unchanged() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_roster(&server, &json!(["Rossi Mario"]), "stale").await;
    Mock::given(method("PUT"))
        .and(path("/contents/medici.json"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let mut roster = load_roster(&server, &dir).await;
    let err = roster.add("Verdi Anna").await.unwrap_err();

    assert!(matches!(err, RosterError::Store(StoreError::Conflict(_))));
    assert_eq!(displays(&roster), vec!["Rossi Mario"]);
    assert_eq!(roster.version(), Some(&VersionToken::from("stale")));
}

// Remote down after retries: the roster comes from the local backup and
// the session is flagged degraded.
#[tokio::test]
async fn unreachable_remote_falls_back_to_backup() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let backup = backup_in(&dir);
    backup
        .save("medici.json", &json!(["Bianchi Luca", "Rossi Mario"]))
        .await;

    Mock::given(method("GET"))
        .and(path("/contents/medici.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let roster = load_roster(&server, &dir).await;
    assert!(roster.is_degraded());
    assert_eq!(displays(&roster), vec!["Bianchi Luca", "Rossi Mario"]);
    assert_eq!(roster.version(), None);
}

// No backup either: empty roster, still degraded rather than an error.
#[tokio::test]
async fn unreachable_remote_without_backup_starts_empty() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/contents/medici.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let roster = load_roster(&server, &dir).await;
    assert!(roster.is_degraded());
    assert!(roster.names().is_empty());
}

// A corrupt remote payload is a load failure, not a crash: backup chain.
#[tokio::test]
async fn corrupt_remote_payload_falls_back_to_backup() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let backup = backup_in(&dir);
    backup.save("medici.json", &json!(["Rossi Mario"])).await;

    Mock::given(method("GET"))
        .and(path("/contents/medici.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": STANDARD.encode("not json"),
            "sha": "r1",
        })))
        .mount(&server)
        .await;

    let roster = load_roster(&server, &dir).await;
    assert!(roster.is_degraded());
    assert_eq!(displays(&roster), vec!["Rossi Mario"]);
}

// Bad credentials are fatal for the session, not degraded mode.
#[tokio::test]
async fn unauthorized_load_is_fatal() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/contents/medici.json"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = DoctorRoster::load(
        store_for(&server),
        fast_retry(),
        backup_in(&dir),
        "medici.json",
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        RosterError::Store(StoreError::Unauthorized(_))
    ));
}

// A successful load refreshes the local backup opportunistically.
#[tokio::test]
async fn successful_load_refreshes_backup() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_roster(&server, &json!(["Rossi Mario"]), "r1").await;
    load_roster(&server, &dir).await;

    assert_eq!(
        backup_in(&dir).load("medici.json").await,
        Some(json!(["Rossi Mario"]))
    );
}

async fn session_with(server: &MockServer, dir: &tempfile::TempDir) -> Session {
    let roster = load_roster(server, dir).await;
    Session::new(roster, Arc::new(NoHolidays), "IT", 2025, 3).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Changing the month regenerates the grid and intentionally drops edits.
#[tokio::test]
async fn month_change_resets_edited_cells() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_roster(&server, &json!(["Rossi Mario", "Bianchi Luca"]), "r1").await;

    let mut session = session_with(&server, &dir).await;
    session
        .on_select_doctors(["Rossi Mario", "Bianchi Luca"])
        .unwrap();

    session
        .on_cell_edit(date(2025, 3, 5), "Rossi Mario", AbsenceStatus::Vacation)
        .unwrap();
    let rossi = session.roster().find("Rossi Mario").unwrap().clone();
    assert_eq!(
        session.grid().unwrap().status(date(2025, 3, 5), &rossi),
        Some(AbsenceStatus::Vacation)
    );

    let redraw = session.on_month_change(2025, 4).unwrap();
    assert_eq!(redraw, Redraw::GRID);
    assert_eq!(
        session.grid().unwrap().status(date(2025, 4, 5), &rossi),
        Some(AbsenceStatus::Present)
    );
}

// Adding a doctor never touches the grid; removing an active one shrinks
// the selection and regenerates.
#[tokio::test]
async fn roster_mutations_drive_grid_invalidation() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_roster(&server, &json!(["Rossi Mario", "Bianchi Luca"]), "r1").await;
    Mock::given(method("PUT"))
        .and(path("/contents/medici.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": {"sha": "r2"},
        })))
        .mount(&server)
        .await;

    let mut session = session_with(&server, &dir).await;
    session
        .on_select_doctors(["Rossi Mario", "Bianchi Luca"])
        .unwrap();
    let tag_before = session.grid().unwrap().tag().clone();

    let redraw = session.on_add_doctor("Verdi Anna").await.unwrap();
    assert_eq!(redraw, Redraw::ROSTER);
    assert_eq!(session.grid().unwrap().tag(), &tag_before);

    let redraw = session.on_remove_doctor("Bianchi Luca").await.unwrap();
    assert_eq!(redraw, Redraw::ALL);
    let grid = session.grid().unwrap();
    assert_eq!(grid.doctors().len(), 1);
    assert!(session.roster().find("Bianchi Luca").is_none());
}

// Bulk edits from the table editor merge into the current grid; a copy
// from another generation is rejected without touching it.
#[tokio::test]
async fn bulk_edits_merge_only_within_one_generation() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_roster(&server, &json!(["Rossi Mario", "Bianchi Luca"]), "r1").await;

    let mut session = session_with(&server, &dir).await;
    session
        .on_select_doctors(["Rossi Mario", "Bianchi Luca"])
        .unwrap();
    let rossi = session.roster().find("Rossi Mario").unwrap().clone();

    let mut edited = session.grid().unwrap().clone();
    edited
        .set_status(date(2025, 3, 5), &rossi, AbsenceStatus::Sick)
        .unwrap();

    let redraw = session.on_grid_edits(&edited).unwrap();
    assert_eq!(redraw, Redraw::GRID);
    assert_eq!(
        session.grid().unwrap().status(date(2025, 3, 5), &rossi),
        Some(AbsenceStatus::Sick)
    );

    // A copy made before a month change belongs to the old generation.
    session.on_month_change(2025, 4).unwrap();
    assert!(session.on_grid_edits(&edited).is_err());
    assert_eq!(
        session.grid().unwrap().status(date(2025, 4, 5), &rossi),
        Some(AbsenceStatus::Present)
    );
}

// Selecting the same set again is a no-op; selecting an unknown doctor
// is rejected before anything changes.
#[tokio::test]
async fn selection_changes_are_minimal_and_validated() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_roster(&server, &json!(["Rossi Mario"]), "r1").await;

    let mut session = session_with(&server, &dir).await;
    assert_eq!(
        session.on_select_doctors(["Rossi Mario"]).unwrap(),
        Redraw::GRID
    );
    assert_eq!(
        session.on_select_doctors(["rossi mario"]).unwrap(),
        Redraw::NOTHING
    );
    assert!(session.on_select_doctors(["Verdi Anna"]).is_err());
    assert!(session.grid().is_some());
}
