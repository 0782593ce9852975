use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::dto::sync_dto::{
    CancelDraftRequest, CreateDraftRequest, DraftActionRequest, DraftActionResponse,
    DraftEditRequest, SyncStatusResponse,
};
use crate::services::session_store::{DraftError, SharedStore};

pub fn draft_router(store: SharedStore) -> Router {
    Router::new()
        .route("/draft-action", post(submit_draft_action))
        .route("/draft-sync-status", get(draft_sync_status))
        .route("/draft-edit", post(request_draft_edit))
        .route("/draft/create", post(create_draft))
        .route("/draft/cancel", post(cancel_draft))
        .layer(Extension(store))
        .layer(CorsLayer::permissive())
}

fn rejection(err: DraftError) -> (StatusCode, Json<DraftActionResponse>) {
    let status = match err {
        DraftError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        DraftError::SessionCompleted(_) => StatusCode::CONFLICT,
        DraftError::Storage(_) | DraftError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(DraftActionResponse {
            success: false,
            message: err.to_string(),
        }),
    )
}

fn accepted(message: impl Into<String>) -> (StatusCode, Json<DraftActionResponse>) {
    (
        StatusCode::OK,
        Json(DraftActionResponse {
            success: true,
            message: message.into(),
        }),
    )
}

async fn submit_draft_action(
    Extension(store): Extension<SharedStore>,
    Json(payload): Json<DraftActionRequest>,
) -> impl IntoResponse {
    info!(
        "Draft action from {} for match {}: {:?} champion {}.",
        payload.actor_id, payload.match_id, payload.action, payload.champion_id
    );
    match store
        .submit_action(
            payload.match_id,
            &payload.actor_id,
            payload.champion_id,
            payload.action,
        )
        .await
    {
        Ok(_) => accepted("Draft action committed."),
        Err(e) => {
            warn!("Rejected draft action: {e}");
            rejection(e)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncStatusQuery {
    actor_id: Option<String>,
    match_id: Option<i64>,
}

async fn draft_sync_status(
    Extension(store): Extension<SharedStore>,
    Query(query): Query<SyncStatusQuery>,
) -> Response {
    let found = match (query.match_id, query.actor_id.as_deref()) {
        (Some(match_id), _) => store
            .snapshot(match_id)
            .await
            .ok()
            .map(|snap| (match_id, snap)),
        (None, Some(actor_id)) => store.snapshot_for_actor(actor_id).await,
        (None, None) => {
            return rejection_message(
                StatusCode::BAD_REQUEST,
                "Either matchId or actorId is required.",
            );
        }
    };

    match found {
        Some((match_id, snapshot)) => {
            let total_actions = snapshot.total_actions();
            Json(SyncStatusResponse {
                status: "ok".to_string(),
                match_id,
                pick_ban_data: snapshot,
                total_actions,
            })
            .into_response()
        }
        None => rejection_message(StatusCode::NOT_FOUND, "No draft session found."),
    }
}

fn rejection_message(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(DraftActionResponse {
            success: false,
            message: message.to_string(),
        }),
    )
        .into_response()
}

async fn request_draft_edit(
    Extension(store): Extension<SharedStore>,
    Json(payload): Json<DraftEditRequest>,
) -> impl IntoResponse {
    info!(
        "Edit request from {} for slot {} (match {}).",
        payload.actor_id, payload.slot_index, payload.match_id
    );
    match store
        .request_edit(payload.match_id, &payload.actor_id, payload.slot_index)
        .await
    {
        Ok(()) => accepted("Pick reopened."),
        Err(e) => {
            warn!("Rejected edit request: {e}");
            rejection(e)
        }
    }
}

async fn create_draft(
    Extension(store): Extension<SharedStore>,
    Json(payload): Json<CreateDraftRequest>,
) -> impl IntoResponse {
    match store
        .create_session(payload.match_id, payload.team1, payload.team2)
        .await
    {
        Ok(()) => accepted("Draft session created."),
        Err(e) => rejection(e),
    }
}

async fn cancel_draft(
    Extension(store): Extension<SharedStore>,
    Json(payload): Json<CancelDraftRequest>,
) -> impl IntoResponse {
    match store.cancel_session(payload.match_id).await {
        Ok(()) => accepted("Draft session cancelled."),
        Err(e) => rejection(e),
    }
}
