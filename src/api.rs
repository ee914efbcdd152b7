//! HTTP API endpoints.
//!
//! Rooms are addressed by their short code; open views by the id returned when
//! the view was opened.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::protocol::*;
use crate::state::AppState;

/// All API routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/rooms", post(create_room))
        .route("/api/rooms/{code}", get(get_room))
        .route("/api/rooms/{code}/status", get(room_status))
        .route("/api/rooms/{code}/submissions", post(submit_list))
        .route("/api/rooms/{code}/views", post(open_view))
        .route("/api/views/{id}", get(refresh_view))
        .route("/api/views/{id}/submissions", post(submit_in_view))
        .route("/api/views/{id}/reveal", post(reveal_view))
        .route("/api/views/{id}/reload", post(reload_view))
}

/// Create a room.
///
/// POST /api/rooms
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Response, AppError> {
    let code = state.create_room(&request.names).await?;
    let location = format!("/room/{}", code);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location.clone())],
        Json(CreateRoomResponse { code, location }),
    )
        .into_response())
}

/// GET /api/rooms/{code}
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<RoomInfo>, AppError> {
    let room = state.get_room(&code).await?;
    Ok(Json(room.into()))
}

/// GET /api/rooms/{code}/status
pub async fn room_status(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<RoomStatus>, AppError> {
    Ok(Json(state.room_status(&code).await?))
}

/// Submit a list without an open view.
///
/// POST /api/rooms/{code}/submissions
pub async fn submit_list(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(request): Json<SubmitListRequest>,
) -> Result<Json<RoomStatus>, AppError> {
    let room = state.get_room(&code).await?;
    state
        .submit_to_room(&room, &request.name, &request.games)
        .await?;
    Ok(Json(state.room_status(&code).await?))
}

/// POST /api/rooms/{code}/views
pub async fn open_view(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let snapshot = state.open_view(&code).await?;
    Ok((StatusCode::CREATED, Json(snapshot)).into_response())
}

/// Re-fetch submissions into the view.
///
/// GET /api/views/{id}
pub async fn refresh_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    view_response(&state, &id, state.refresh_view(&id).await).await
}

/// POST /api/views/{id}/submissions
///
/// On failure the response carries the view, whose draft still holds the
/// submitted input.
pub async fn submit_in_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<SubmitListRequest>,
) -> Response {
    let result = state
        .submit_in_view(&id, request.name, request.games)
        .await;
    view_response(&state, &id, result).await
}

/// POST /api/views/{id}/reveal
pub async fn reveal_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    view_response(&state, &id, state.reveal_view(&id).await).await
}

/// POST /api/views/{id}/reload
pub async fn reload_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    view_response(&state, &id, state.reload_view(&id).await).await
}

/// Turn a view action result into a response. Errors on a known view come
/// back together with the view as it stands after the failed action.
async fn view_response(
    state: &AppState,
    id: &str,
    result: Result<ViewSnapshot, AppError>,
) -> Response {
    let err = match result {
        Ok(snapshot) => return Json(snapshot).into_response(),
        Err(err) => err,
    };

    match state.view_snapshot(id).await {
        Ok(view) => {
            tracing::warn!("View {} action failed: {}", id, err);
            let status = err.status();
            let body = ViewError {
                code: err.code().to_string(),
                msg: err.to_string(),
                view,
            };
            (status, Json(body)).into_response()
        }
        Err(_) => err.into_response(),
    }
}
