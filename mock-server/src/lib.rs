//! In-memory v1beta1 API server for exercising the client over real HTTP.
//!
//! Serves `pods`, `replicationControllers` and `services` under
//! `/api/v1beta1/`. Objects are stored as raw JSON keyed by `id`; a missing
//! `id` on create is filled with a fresh UUID. `GET /api/v1beta1/pods`
//! honours `?labels=k=v,k=v`. `app_with_auth` additionally requires HTTP
//! Basic credentials on every request.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Collections the server knows about.
pub const KINDS: [&str; 3] = ["pods", "replicationControllers", "services"];

pub type Db = Arc<RwLock<HashMap<&'static str, BTreeMap<String, Value>>>>;

type ApiResult<T> = Result<T, (StatusCode, String)>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(
        KINDS.iter().map(|kind| (*kind, BTreeMap::new())).collect(),
    ));
    Router::new()
        .route("/api/v1beta1/{kind}", get(list_objects).post(create_object))
        .route(
            "/api/v1beta1/{kind}/{id}",
            get(get_object).put(update_object).delete(delete_object),
        )
        .with_state(db)
}

/// `app()` behind a check for `Authorization: Basic base64(user:password)`.
pub fn app_with_auth(user: &str, password: &str) -> Router {
    let expected = format!("Basic {}", BASE64_STANDARD.encode(format!("{user}:{password}")));
    app().layer(middleware::from_fn_with_state(Arc::new(expected), require_basic_auth))
}

pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

async fn require_basic_auth(State(expected): State<Arc<String>>, request: Request, next: Next) -> Response {
    let supplied = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if supplied != Some(expected.as_str()) {
        debug!("rejecting request without valid credentials");
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }
    next.run(request).await
}

fn collection(kind: &str) -> ApiResult<&'static str> {
    KINDS
        .iter()
        .find(|known| **known == kind)
        .copied()
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown resource {kind:?}")))
}

fn not_found(kind: &str, id: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{kind} {id:?} not found"))
}

/// Parse `k=v,k=v`, ignoring fragments that are not a single pair.
fn parse_labels(raw: &str) -> HashMap<&str, &str> {
    raw.split(',')
        .filter_map(|part| {
            let mut pieces = part.split('=');
            match (pieces.next(), pieces.next(), pieces.next()) {
                (Some(key), Some(value), None) => Some((key, value)),
                _ => None,
            }
        })
        .collect()
}

fn has_labels(object: &Value, wanted: &HashMap<&str, &str>) -> bool {
    wanted
        .iter()
        .all(|(key, value)| object["labels"][*key].as_str() == Some(*value))
}

async fn list_objects(
    State(db): State<Db>,
    Path(kind): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let kind = collection(&kind)?;
    let wanted = params.get("labels").map(|raw| parse_labels(raw)).unwrap_or_default();
    let db = db.read().await;
    let items: Vec<Value> = db
        .get(kind)
        .into_iter()
        .flat_map(|store| store.values())
        .filter(|object| has_labels(object, &wanted))
        .cloned()
        .collect();
    Ok(Json(json!({ "items": items })))
}

async fn create_object(
    State(db): State<Db>,
    Path(kind): Path<String>,
    Json(mut object): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let kind = collection(&kind)?;
    let Some(fields) = object.as_object_mut() else {
        return Err((StatusCode::BAD_REQUEST, "expected a JSON object".to_string()));
    };
    let id = match fields.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    };
    fields.insert("id".to_string(), Value::String(id.clone()));

    let mut db = db.write().await;
    let store = db.entry(kind).or_default();
    if store.contains_key(&id) {
        return Err((StatusCode::CONFLICT, format!("{kind} {id:?} already exists")));
    }
    store.insert(id.clone(), object.clone());
    info!(kind, id = %id, "created");
    Ok((StatusCode::CREATED, Json(object)))
}

async fn get_object(
    State(db): State<Db>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let kind = collection(&kind)?;
    let db = db.read().await;
    db.get(kind)
        .and_then(|store| store.get(&id))
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(kind, &id))
}

async fn update_object(
    State(db): State<Db>,
    Path((kind, id)): Path<(String, String)>,
    Json(mut object): Json<Value>,
) -> ApiResult<Json<Value>> {
    let kind = collection(&kind)?;
    let Some(fields) = object.as_object_mut() else {
        return Err((StatusCode::BAD_REQUEST, "expected a JSON object".to_string()));
    };
    fields.insert("id".to_string(), Value::String(id.clone()));

    let mut db = db.write().await;
    let existing = db
        .get_mut(kind)
        .and_then(|store| store.get_mut(&id))
        .ok_or_else(|| not_found(kind, &id))?;
    *existing = object.clone();
    Ok(Json(object))
}

async fn delete_object(
    State(db): State<Db>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let kind = collection(&kind)?;
    let mut db = db.write().await;
    db.get_mut(kind)
        .and_then(|store| store.remove(&id))
        .ok_or_else(|| not_found(kind, &id))?;
    info!(kind, id = %id, "deleted");
    Ok(Json(json!({ "status": "success" })))
}
