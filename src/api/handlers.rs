use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::links::{LinkError, LinkService};
use crate::models::{CreateLinkRequest, LinkScope, TrackingLink, UpdateLinkRequest};
use crate::storage::Storage;

pub struct AppState {
    pub links: Arc<LinkService>,
    pub storage: Arc<dyn Storage>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Create a new tracking link
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<TrackingLink>), (StatusCode, Json<ErrorResponse>)> {
    if payload.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Name cannot be empty".to_string(),
            }),
        ));
    }
    if payload.destination_url.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Destination URL cannot be empty".to_string(),
            }),
        ));
    }

    match state.links.create(payload).await {
        Ok(link) => Ok((StatusCode::CREATED, Json(link))),
        Err(LinkError::CodeExhausted) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to generate a unique tracking code".to_string(),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to create link: {}", e),
            }),
        )),
    }
}

/// Get a tracking link by code
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<TrackingLink>, (StatusCode, Json<ErrorResponse>)> {
    match state.links.get(&code).await {
        Ok(Some(link)) => Ok(Json(link)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Link not found".to_string(),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to get link: {}", e),
            }),
        )),
    }
}

/// Update a link's name and/or destination
pub async fn update_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<SuccessResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .links
        .update(
            &code,
            payload.name.as_deref(),
            payload.destination_url.as_deref(),
        )
        .await
    {
        Ok(true) => Ok(Json(SuccessResponse {
            message: "Link updated successfully".to_string(),
        })),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Link not found".to_string(),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to update link: {}", e),
            }),
        )),
    }
}

/// Delete a link; its click history is kept
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<SuccessResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.links.delete(&code).await {
        Ok(true) => Ok(Json(SuccessResponse {
            message: "Link deleted successfully".to_string(),
        })),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Link not found".to_string(),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to delete link: {}", e),
            }),
        )),
    }
}

/// List links in scope, newest first
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    Query(scope): Query<LinkScope>,
) -> Result<Json<Vec<TrackingLink>>, (StatusCode, Json<ErrorResponse>)> {
    match state.links.list(&scope).await {
        Ok(links) => Ok(Json(links)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to list links: {}", e),
            }),
        )),
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
