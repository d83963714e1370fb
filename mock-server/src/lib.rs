use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: u64,
    pub name: String,
}

#[derive(Deserialize)]
pub struct NewItem {
    pub name: String,
}

#[derive(Deserialize)]
pub struct UpdateItem {
    pub name: Option<String>,
}

/// Shared server state. `token`, when set, is required as a bearer token on
/// every mutating `/items` route.
#[derive(Clone, Default)]
pub struct AppState {
    items: Arc<RwLock<HashMap<u64, Item>>>,
    next_id: Arc<AtomicU64>,
    hits: Arc<AtomicU64>,
    token: Option<Arc<str>>,
}

type Rejection = (StatusCode, Json<Value>);

pub fn app() -> Router {
    router(AppState::default())
}

pub fn app_with_token(token: &str) -> Router {
    router(AppState {
        token: Some(Arc::from(token)),
        ..AppState::default()
    })
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/status/{code}", get(status))
        .route("/hits", get(hits))
        .route("/text", get(text))
        .route("/list", get(list))
        .route("/empty", put(empty))
        .route("/large/{bytes}", get(large))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock server listening");
    }
    axum::serve(listener, app).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Rejection> {
    let Some(expected) = state.token.as_deref() else {
        return Ok(());
    };
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if presented == Some(expected) {
        Ok(())
    } else {
        tracing::debug!("rejecting request without a valid bearer token");
        Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"}))))
    }
}

fn not_found(id: u64) -> Rejection {
    (StatusCode::NOT_FOUND, Json(json!({"error": "not found", "id": id})))
}

async fn list_items(State(state): State<AppState>) -> Json<Value> {
    let items = state.items.read().await;
    let mut all: Vec<Item> = items.values().cloned().collect();
    all.sort_by_key(|item| item.id);
    Json(json!({ "items": all }))
}

async fn create_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<NewItem>,
) -> Result<(StatusCode, Json<Item>), Rejection> {
    authorize(&state, &headers)?;
    let item = Item {
        id: state.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        name: input.name,
    };
    state.items.write().await.insert(item.id, item.clone());
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Item>, Rejection> {
    let items = state.items.read().await;
    items.get(&id).cloned().map(Json).ok_or_else(|| not_found(id))
}

async fn update_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<UpdateItem>,
) -> Result<Json<Item>, Rejection> {
    authorize(&state, &headers)?;
    let mut items = state.items.write().await;
    let item = items.get_mut(&id).ok_or_else(|| not_found(id))?;
    if let Some(name) = input.name {
        item.name = name;
    }
    Ok(Json(item.clone()))
}

async fn delete_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Value>, Rejection> {
    authorize(&state, &headers)?;
    let mut items = state.items.write().await;
    items
        .remove(&id)
        .map(|item| Json(json!({ "deleted": item.id })))
        .ok_or_else(|| not_found(id))
}

/// Answer with the requested status and a JSON object naming it.
async fn status(Path(code): Path<u16>) -> Rejection {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, Json(json!({ "status": code }))),
        Err(_) => (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid status"}))),
    }
}

async fn hits(State(state): State<AppState>) -> Json<Value> {
    let n = state.hits.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({ "hits": n }))
}

async fn text() -> &'static str {
    "plain text body"
}

async fn list() -> Json<Value> {
    Json(json!([1, 2, 3]))
}

async fn empty() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// A JSON object whose `data` string is `bytes` long.
async fn large(Path(bytes): Path<usize>) -> Json<Value> {
    Json(json!({ "data": "a".repeat(bytes) }))
}
