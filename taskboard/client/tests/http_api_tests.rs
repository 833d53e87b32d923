use serde_json::json;
use taskboard_client::{ApiError, AuthApi, FetchState, HttpTaskApi, RequestState, Store, TaskApi};
use taskboard_core::{NewTask, Priority, PriorityUpdate, Status};
use wiremock::matchers::{bearer_token, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn task_json(id: i32, title: &str, status: &str, priority: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": null,
        "status": status,
        "priority": priority,
        "owner": 1,
        "createdAt": "2025-10-01T09:00:00Z",
        "updatedAt": "2025-10-01T09:00:00Z"
    })
}

fn card_json(id: i32, title: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": null,
        "priority": "P3",
        "status": status,
        "date": "2025-10-01T09:00:00Z"
    })
}

#[tokio::test]
async fn lists_tasks_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(bearer_token("token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "todo": [card_json(1, "One", "todo")],
            "inProgress": [],
            "done": [card_json(2, "Two", "done")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let api = HttpTaskApi::new(server.uri()).with_token("token");

    let grouped = api.list_tasks().await.expect("Failed to list tasks");

    assert_eq!(grouped.todo.len(), 1);
    assert_eq!(grouped.done[0].title, "Two");
}

#[tokio::test]
async fn sends_new_task_and_decodes_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .and(body_json(json!({"title": "Write docs", "priority": "P1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(task_json(5, "Write docs", "todo", "P1")))
        .expect(1)
        .mount(&server)
        .await;
    let api = HttpTaskApi::new(server.uri()).with_token("token");

    let task = api
        .create_task(NewTask::new("Write docs").with_priority(Priority::P1))
        .await
        .expect("Failed to create task");

    assert_eq!(task.id, 5);
    assert_eq!(task.priority, Priority::P1);
}

#[tokio::test]
async fn reports_server_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/tasks/3/status"))
        .and(body_json(json!({"status": "done"})))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "NOT_FOUND",
            "message": "Task with ID 3 not found"
        })))
        .mount(&server)
        .await;
    let api = HttpTaskApi::new(server.uri()).with_token("token");

    let err = api.set_status(3, Status::Done).await.unwrap_err();

    match err {
        ApiError::Server {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 404);
            assert_eq!(code.as_deref(), Some("NOT_FOUND"));
            assert_eq!(message, "Task with ID 3 not found");
        }
        other => panic!("Expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy page</html>"))
        .mount(&server)
        .await;
    let api = HttpTaskApi::new(server.uri());

    let err = api.list_tasks().await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn bulk_priority_returns_updated_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/bulk-priority"))
        .and(body_json(json!({"updates": [{"id": 1, "priority": "P1"}, {"id": 99, "priority": "P2"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Updated priority of 1 of 2 tasks",
            "tasks": [task_json(1, "One", "todo", "P1")]
        })))
        .mount(&server)
        .await;
    let api = HttpTaskApi::new(server.uri()).with_token("token");

    let tasks = api
        .bulk_set_priority(vec![
            PriorityUpdate {
                id: 1,
                priority: Priority::P1,
            },
            PriorityUpdate {
                id: 99,
                priority: Priority::P2,
            },
        ])
        .await
        .unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].priority, Priority::P1);
}

#[tokio::test]
async fn store_logs_in_then_loads_board() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "alice@example.com", "password": "secret123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "fresh-token",
            "user": {
                "id": 1,
                "name": "Alice",
                "email": "alice@example.com",
                "createdAt": "2025-10-01T09:00:00Z"
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(bearer_token("fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "todo": [card_json(1, "One", "todo")],
            "inProgress": [],
            "done": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    let mut store = Store::new(HttpTaskApi::new(server.uri()));

    let login = store.login("alice@example.com", "secret123").await;
    assert!(login.is_success());

    assert_eq!(store.fetch_tasks().await, RequestState::Success(()));
    assert_eq!(store.board().fetch, FetchState::Ready);
    assert_eq!(store.board().total_task_count(), 1);
}

#[tokio::test]
async fn unreachable_server_shows_connectivity_error() {
    // Nothing listens on a port that was just released.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let mut store = Store::new(HttpTaskApi::new(uri).with_token("token"));

    let outcome = store.fetch_tasks().await;

    assert!(matches!(outcome, RequestState::Failure(_)));
    assert_eq!(
        store.board().fetch,
        FetchState::Errored(
            "Unable to connect to the server. Please check your connection.".to_string()
        )
    );
}

#[tokio::test]
async fn duplicate_registration_reports_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "CONFLICT",
            "message": "A user with email 'alice@example.com' is already registered"
        })))
        .mount(&server)
        .await;
    let api = HttpTaskApi::new(server.uri());

    let err = api
        .register(
            "Alice".to_string(),
            "alice@example.com".to_string(),
            "secret123".to_string(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        ApiError::Server { status: 409, code: Some(code), .. } if code == "CONFLICT"
    ));
    assert_eq!(
        err.to_string(),
        "A user with email 'alice@example.com' is already registered"
    );
}
