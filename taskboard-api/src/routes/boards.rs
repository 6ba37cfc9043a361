/// Board endpoints
///
/// All endpoints require a bearer token. Reading a board requires ownership
/// or membership; updating, deleting and adding members are owner-only.
///
/// # Endpoints
///
/// - `POST   /boards` - Create board (caller becomes owner)
/// - `GET    /boards` - Boards the caller owns or is a member of
/// - `GET    /boards/:id` - Get board
/// - `PATCH  /boards/:id` - Update board
/// - `DELETE /boards/:id` - Delete board with its columns and cards
/// - `POST   /boards/:id/members` - Add member
/// - `DELETE /boards/:id/members/:member_id` - Remove member

use crate::{app::AppState, error::ApiResult, routes::validate_hex_color};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::middleware::AuthContext,
    ids::{BoardId, UserId},
    models::{BoardView, CreateBoard, UpdateBoard},
};
use validator::Validate;

/// Create board request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardRequest {
    #[validate(length(min = 3, max = 50, message = "Name must be 3 to 50 characters"))]
    pub name: String,

    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}

/// Update board request; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBoardRequest {
    #[validate(length(min = 3, max = 50, message = "Name must be 3 to 50 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}

/// Add member request
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: UserId,
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateBoardRequest>,
) -> ApiResult<(StatusCode, Json<BoardView>)> {
    req.validate()?;

    let board = state
        .services
        .boards
        .create(
            auth.user_id,
            CreateBoard {
                name: req.name,
                description: req.description,
                color: req.color,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<BoardView>>> {
    let boards = state.services.boards.find_all(auth.user_id).await?;
    Ok(Json(boards))
}

pub async fn get_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<BoardId>,
) -> ApiResult<Json<BoardView>> {
    let board = state.services.boards.find_one(id, auth.user_id).await?;
    Ok(Json(board))
}

/// Update board (owner only)
pub async fn update_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<BoardId>,
    Json(req): Json<UpdateBoardRequest>,
) -> ApiResult<Json<BoardView>> {
    req.validate()?;

    let board = state
        .services
        .boards
        .update(
            id,
            auth.user_id,
            UpdateBoard {
                name: req.name,
                description: req.description,
                color: req.color,
            },
        )
        .await?;

    Ok(Json(board))
}

/// Delete board (owner only)
///
/// Returns `204 No Content`.
pub async fn delete_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<BoardId>,
) -> ApiResult<StatusCode> {
    state.services.boards.remove(id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add member (owner only)
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the owner
/// - `404 Not Found`: Board or user does not exist
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<BoardId>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<BoardView>> {
    let board = state
        .services
        .boards
        .add_member(id, auth.user_id, req.user_id)
        .await?;

    Ok(Json(board))
}

/// Remove member
///
/// The owner may remove any member but themselves; a member may remove
/// themselves.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, member_id)): Path<(BoardId, UserId)>,
) -> ApiResult<Json<BoardView>> {
    let board = state
        .services
        .boards
        .remove_member(id, auth.user_id, member_id)
        .await?;

    Ok(Json(board))
}
