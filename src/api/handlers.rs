use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::options::RequestOptions;
use crate::config::ApiConfig;
use crate::logic::{delete_record, filters};
use crate::model::Id;
use crate::serializers::{self, render, Mapper, RenderContext};
use crate::store::{RecordStoreExt, Store};

/// Shared handler state: the store plus the API settings handlers need.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub api: ApiConfig,
}

impl<S> AppState<S> {
    pub fn new(store: Arc<S>, api: ApiConfig) -> Self {
        Self { store, api }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            api: self.api.clone(),
        }
    }
}

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// One page of a list endpoint.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Value>,
}

pub async fn list<R: Mapper, S: Store + 'static>(
    State(state): State<AppState<S>>,
    options: RequestOptions,
) -> Result<Json<ListResponse>, ApiError> {
    let store = &*state.store;
    let records: Vec<R> = store.list().await.map_err(crate::error::Error::from)?;
    let matching = filters::apply(store, records, &options.filters).await?;
    let count = matching.len();

    let mut ctx = RenderContext::new(store, options.render.clone());
    let mut results = Vec::new();
    for record in options.page(matching) {
        results.push(render(&mut ctx, &record).await?);
    }

    Ok(Json(ListResponse {
        count,
        next: options.next_link(count),
        previous: options.previous_link(),
        results,
    }))
}

pub async fn retrieve<R: Mapper, S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<Id>,
    options: RequestOptions,
) -> Result<Json<Value>, ApiError> {
    let store = &*state.store;
    let record: R = store
        .get(&id)
        .await
        .map_err(crate::error::Error::from)?
        .ok_or_else(|| crate::error::Error::not_found(R::KIND, id))?;

    let mut ctx = RenderContext::new(store, options.render);
    Ok(Json(render(&mut ctx, &record).await?))
}

pub async fn create<R: Mapper, S: Store + 'static>(
    State(state): State<AppState<S>>,
    options: RequestOptions,
    RequestJson(body): RequestJson<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let store = &*state.store;
    let record: R = serializers::create(store, body).await?;

    let mut ctx = RenderContext::new(store, options.render);
    Ok((StatusCode::CREATED, Json(render(&mut ctx, &record).await?)))
}

async fn write<R: Mapper, S: Store + 'static>(
    state: AppState<S>,
    id: Id,
    options: RequestOptions,
    body: Value,
    partial: bool,
) -> Result<Json<Value>, ApiError> {
    let store = &*state.store;
    let record: R = serializers::update(store, id, body, partial).await?;

    let mut ctx = RenderContext::new(store, options.render);
    Ok(Json(render(&mut ctx, &record).await?))
}

pub async fn replace<R: Mapper, S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<Id>,
    options: RequestOptions,
    RequestJson(body): RequestJson<Value>,
) -> Result<Json<Value>, ApiError> {
    write::<R, S>(state, id, options, body, false).await
}

pub async fn partial_update<R: Mapper, S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<Id>,
    options: RequestOptions,
    RequestJson(body): RequestJson<Value>,
) -> Result<Json<Value>, ApiError> {
    write::<R, S>(state, id, options, body, true).await
}

pub async fn destroy<R: Mapper, S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<Id>,
) -> Result<StatusCode, ApiError> {
    delete_record(&*state.store, R::KIND, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
