//! In-process HTTP server used by the courier integration tests.
//!
//! Serves the same resources in several media types so the client's
//! content-type dispatch can be exercised over real sockets:
//! a JSON todo list, an XML status document, a form-encoded payload, plain text,
//! and echo endpoints that reflect request headers and bodies.

use std::{collections::BTreeMap, collections::HashMap, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const STATUS_XML: &str =
    "<Status><service>mock-server</service><healthy>true</healthy></Status>";
pub const STATUS_FORM: &str = "service=mock-server&healthy=true";

/// How long `/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Todo>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/health", get(health))
        .route("/status.xml", get(status_xml))
        .route("/status.form", get(status_form))
        .route("/slow", get(slow))
        .route("/echo", post(echo_body).put(echo_body))
        .route("/echo/headers", get(echo_headers))
        .route("/todos", get(list_todos).post(create_todo).delete(clear_todos))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn health() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], "ok")
}

async fn status_xml() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/xml")], STATUS_XML)
}

async fn status_form() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/x-www-form-urlencoded")],
        STATUS_FORM,
    )
}

async fn slow() -> &'static str {
    tokio::time::sleep(SLOW_DELAY).await;
    "done"
}

/// Reflect the request body with the request's content type.
async fn echo_body(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    ([(header::CONTENT_TYPE, content_type)], body)
}

/// Every request header as name -> values, in arrival order per name.
async fn echo_headers(headers: HeaderMap) -> Json<BTreeMap<String, Vec<String>>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &headers {
        out.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    Json(out)
}

async fn list_todos(State(db): State<Db>) -> Json<Vec<Todo>> {
    let todos = db.read().await;
    Json(todos.values().cloned().collect())
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> (StatusCode, Json<Todo>) {
    let todo = Todo {
        id: Uuid::new_v4(),
        title: input.title,
        completed: input.completed,
    };
    db.write().await.insert(todo.id, todo.clone());
    (StatusCode::CREATED, Json(todo))
}

/// Empty the store; answers 204 with no body.
async fn clear_todos(State(db): State<Db>) -> StatusCode {
    db.write().await.clear();
    StatusCode::NO_CONTENT
}
