use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

use common::{seeded_store, test_context, TestContext};
use tablero::api_router::configure_api_routes;
use tablero::store::MemoryTableStore;

fn app(ctx: &TestContext) -> Router {
    configure_api_routes().with_state(ctx.state.clone())
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

#[tokio::test]
async fn test_created_task_is_listed_for_its_assignee() {
    let ctx = test_context(seeded_store());
    let app = app(&ctx);

    let (status, created) = post(
        &app,
        "/api/tasks",
        json!({
            "action": "create",
            "description": "Draft report",
            "dueDate": "2024-05-01",
            "assignedTo": "alice@x.com"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["rowNumber"], 2);

    let (status, tasks) = get(&app, "/api/tasks?email=alice@x.com&scope=user").await;
    assert_eq!(status, StatusCode::OK);
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["status"], "Pendiente");
    assert_eq!(tasks[0]["description"], "Draft report");

    let sent = ctx.notifier.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].assigned_to, "alice@x.com");
}

#[tokio::test]
async fn test_milestone_progress_from_linked_tasks() {
    let ctx = test_context(seeded_store());
    let app = app(&ctx);

    let (status, milestone) = post(
        &app,
        "/api/cronograma",
        json!({
            "nombre": "Launch",
            "responsable": "ana@x.com",
            "fechaFin": "2024-06-30",
            "area": "Ops",
            "proyecto": "Alpha"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let hito_id = milestone["id"].as_str().unwrap().to_string();

    let mut rows = Vec::new();
    for description in ["Spec", "Build"] {
        let (_, created) = post(
            &app,
            "/api/tasks",
            json!({
                "action": "create",
                "description": description,
                "dueDate": "2024-06-01",
                "assignedTo": "bob@x.com",
                "hitoId": hito_id
            }),
        )
        .await;
        rows.push(created["rowNumber"].clone());
    }
    let (status, _) = post(
        &app,
        "/api/tasks",
        json!({ "action": "updateStatus", "rowNumber": rows[0], "newStatus": "Cumplida" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, report) =
        get(&app, "/api/dashboard/progress?email=ana@x.com&scope=all&role=Admin").await;
    assert_eq!(status, StatusCode::OK);
    let area = &report["areas"][0];
    assert_eq!(area["area"], "Ops");
    assert_eq!(area["projects"][0]["proyecto"], "Alpha");
    assert_eq!(area["projects"][0]["milestones"][0]["percentage"], 50);
    assert_eq!(area["projects"][0]["percentage"], 50);

    let sent = ctx.notifier.wait_for(3).await;
    assert!(sent
        .iter()
        .any(|n| n.description == "HITO ESTRATÉGICO: Launch" && n.project == "Alpha"));
}

#[tokio::test]
async fn test_checklist_save_replaces_previous_entries() {
    let store = seeded_store().with_table(
        "Checklist",
        vec![
            vec!["ID", "Actividad", "Bloque", "Frecuencia", "bob@x.com"],
            vec!["A1", "Abrir caja", "Apertura", "Diaria", "X"],
            vec!["A2", "Revisar stock", "Durante el día", "Diaria", "X"],
            vec!["A3", "Cerrar caja", "Cierre", "Diaria", "X"],
        ],
    );
    let ctx = test_context(store);
    let app = app(&ctx);

    let entry = |id: &str| json!({ "activityId": id, "isPlanned": true, "isCompleted": false });
    let (status, _) = post(
        &app,
        "/api/checklist",
        json!({
            "email": "bob@x.com",
            "dateId": "2024-05-01",
            "progress": [entry("A1"), entry("A2"), entry("A3")]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(
        &app,
        "/api/checklist",
        json!({
            "email": "bob@x.com",
            "dateId": "2024-05-01",
            "progress": [entry("A1"), entry("A3")]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let log = ctx.store.snapshot("ChecklistLog").await.unwrap();
    assert_eq!(log.len(), 3);

    let (status, items) = get(&app, "/api/checklist?email=bob@x.com&dateId=2024-05-01").await;
    assert_eq!(status, StatusCode::OK);
    let planned: Vec<&str> = items
        .as_array()
        .unwrap()
        .iter()
        .filter(|i| i["isPlanned"] == true)
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(planned, ["A1", "A3"]);
}

#[tokio::test]
async fn test_evaluation_keeps_expected_result() {
    let ctx = test_context(seeded_store());
    let app = app(&ctx);

    let (status, saved) = post(
        &app,
        "/api/resultados",
        json!({
            "action": "saveResult",
            "userEmail": "ana@x.com",
            "weekId": "2024-W20",
            "expectedResult": "Cerrar Q2"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        &app,
        "/api/resultados",
        json!({ "action": "saveEvaluation", "rowNumber": saved["rowNumber"], "evaluation": "Verde" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, results) = get(&app, "/api/resultados?email=ana@x.com&weekId=2024-W20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results[0]["evaluation"], "Verde");
    assert_eq!(results[0]["expectedResult"], "Cerrar Q2");
}

#[tokio::test]
async fn test_unknown_agenda_date_is_not_found() {
    let ctx = test_context(MemoryTableStore::new());
    let app = app(&ctx);

    let (status, body) = get(&app, "/api/agenda?date=2024-01-01").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());

    let (status, _) = post(
        &app,
        "/api/agenda",
        json!({ "date": "2024-01-01", "moderator": "ana@x.com", "attendees": ["ana", "bob"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = get(&app, "/api/agenda?date=2024-01-01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attendees"], "ana, bob");
}

#[tokio::test]
async fn test_request_errors() {
    let ctx = test_context(seeded_store());
    let app = app(&ctx);

    let (status, _) = send(&app, Method::DELETE, "/api/tasks", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, body) = post(&app, "/api/tasks", json!({ "action": "archive" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("archive"));

    let (status, _) = get(&app, "/api/tasks").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/api/dashboard/team?role=Usuario").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = get(&app, "/api/dashboard/team?role=Admin&weekId=2024-W20").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_stale_row_handle_is_a_conflict() {
    let ctx = test_context(seeded_store());
    let app = app(&ctx);

    let mut ids = Vec::new();
    for description in ["A", "B"] {
        let (_, created) = post(
            &app,
            "/api/tasks",
            json!({ "action": "create", "description": description, "assignedTo": "ana@x.com" }),
        )
        .await;
        ids.push(created["id"].as_str().unwrap().to_string());
    }

    let (status, _) = post(
        &app,
        "/api/tasks",
        json!({ "action": "updateStatus", "rowNumber": "3", "id": ids[0], "newStatus": "Cumplida" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = post(
        &app,
        "/api/tasks",
        json!({ "action": "updateStatus", "rowNumber": "3", "id": ids[1], "newStatus": "Cumplida" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
