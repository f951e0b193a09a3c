mod common;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use common::RecordingDriver;
use domain::{NewTodo, TodoRoutes};
use load_runner::{
    Behavior, IndecisivePlanner, PlannerDelete, ReqwestTransport, ScenarioContext,
    StudyingStudent, IS_STATUS_200,
};
use serde_json::{json, Value};
use shared::{Config, LogFormat, RunMetrics};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 作成された ToDo と削除された ID を覚えておくだけのスタブ
#[derive(Default)]
struct Stub {
    next_id: AtomicU64,
    created: Mutex<Vec<NewTodo>>,
    deleted: Mutex<Vec<String>>,
}

async fn list_todos() -> Json<Value> {
    Json(json!([]))
}

async fn create_todo(State(stub): State<Arc<Stub>>, Json(todo): Json<NewTodo>) -> Json<Value> {
    let id = stub.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    stub.created.lock().unwrap().push(todo);
    Json(json!({ "id": id }))
}

async fn delete_todo(State(stub): State<Arc<Stub>>, Path(id): Path<String>) -> StatusCode {
    stub.deleted.lock().unwrap().push(id);
    StatusCode::OK
}

async fn spawn_stub() -> (String, Arc<Stub>) {
    let stub = Arc::new(Stub::default());
    let app = Router::new()
        .route("/api/v1/todos", get(list_todos).post(create_todo))
        .route("/api/v1/todos/:id", delete(delete_todo))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), stub)
}

fn http_context(
    base: &str,
    pacer: Arc<RecordingDriver>,
    behavior: Arc<dyn Behavior>,
) -> ScenarioContext {
    let config = Config {
        endpoint: base.to_string(),
        http_timeout: Duration::from_secs(5),
        user_agent: "todo-load-test".to_string(),
        log_format: LogFormat::Pretty,
    };

    ScenarioContext {
        name: "http".to_string(),
        behavior,
        transport: Arc::new(ReqwestTransport::new(&config).unwrap()),
        pacer,
        metrics: RunMetrics::new().unwrap(),
        routes: TodoRoutes::new(base),
    }
}

#[tokio::test]
async fn test_studying_student_over_http() {
    let (base, _stub) = spawn_stub().await;
    let pacer = RecordingDriver::responding(200, "");
    let ctx = http_context(&base, pacer.clone(), Arc::new(StudyingStudent::default()));
    let vu = ctx.virtual_user(1);

    for _ in 0..3 {
        ctx.run_iteration(&vu).await;
    }

    let snapshot = ctx.metrics.snapshot();
    assert_eq!(snapshot.checks[IS_STATUS_200].passes, 3);
    assert_eq!(snapshot.http_reqs, 3);
    assert_eq!(snapshot.http_req_failed, 0);
    assert_eq!(snapshot.requests_by_method["GET"], 3);
    assert_eq!(pacer.pauses().len(), 3);
}

#[tokio::test]
async fn test_indecisive_planner_literal_delete_never_reaches_server() {
    let (base, stub) = spawn_stub().await;
    let pacer = RecordingDriver::responding(200, "");
    let ctx = http_context(&base, pacer.clone(), Arc::new(IndecisivePlanner::default()));
    let vu = ctx.virtual_user(1);

    ctx.run_iteration(&vu).await;

    assert_eq!(
        stub.created.lock().unwrap().clone(),
        vec![NewTodo::indecisive_plan().unwrap()]
    );
    assert!(stub.deleted.lock().unwrap().is_empty());

    let snapshot = ctx.metrics.snapshot();
    assert_eq!(snapshot.checks[IS_STATUS_200].passes, 1);
    assert_eq!(snapshot.checks[IS_STATUS_200].fails, 1);
    assert_eq!(snapshot.request_errors["INVALID_URL"], 1);
    assert_eq!(snapshot.http_reqs, 2);
    assert_eq!(snapshot.http_req_failed, 1);
    assert_eq!(pacer.pauses(), vec![Duration::from_secs(10); 2]);
}

#[tokio::test]
async fn test_indecisive_planner_created_id_deletes_created_todo() {
    let (base, stub) = spawn_stub().await;
    let pacer = RecordingDriver::responding(200, "");
    let planner = IndecisivePlanner::new(PlannerDelete::CreatedId);
    let ctx = http_context(&base, pacer.clone(), Arc::new(planner));
    let vu = ctx.virtual_user(1);

    ctx.run_iteration(&vu).await;
    ctx.run_iteration(&vu).await;

    assert_eq!(stub.deleted.lock().unwrap().clone(), vec!["1", "2"]);

    let snapshot = ctx.metrics.snapshot();
    assert_eq!(snapshot.checks[IS_STATUS_200].passes, 4);
    assert_eq!(snapshot.checks[IS_STATUS_200].fails, 0);
    assert_eq!(snapshot.requests_by_method["POST"], 2);
    assert_eq!(snapshot.requests_by_method["DELETE"], 2);
    assert_eq!(snapshot.http_req_failed, 0);
}
