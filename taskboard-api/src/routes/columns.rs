/// Column endpoints
///
/// All endpoints require a bearer token and membership of the column's
/// board.
///
/// # Endpoints
///
/// - `POST   /columns` - Create column (appended unless `order` is given)
/// - `GET    /columns/board/:board_id` - Columns of a board, by order
/// - `GET    /columns/:id` - Get column
/// - `PATCH  /columns/:id` - Update column; `order` moves it
/// - `DELETE /columns/:id` - Delete column with its cards
/// - `PATCH  /columns/:id/reorder` - Move column to `new_order`

use crate::{app::AppState, error::ApiResult, routes::validate_hex_color};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::middleware::AuthContext,
    ids::{BoardId, ColumnId},
    models::{Column, NewColumn, UpdateColumn},
};
use validator::Validate;

/// Create column request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateColumnRequest {
    #[validate(length(min = 2, max = 30, message = "Name must be 2 to 30 characters"))]
    pub name: String,

    pub board_id: BoardId,

    #[validate(range(min = 0, message = "Order must not be negative"))]
    pub order: Option<i32>,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}

/// Update column request; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateColumnRequest {
    #[validate(length(min = 2, max = 30, message = "Name must be 2 to 30 characters"))]
    pub name: Option<String>,

    #[validate(range(min = 0, message = "Order must not be negative"))]
    pub order: Option<i32>,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}

/// Reorder request
#[derive(Debug, Deserialize, Validate)]
pub struct ReorderColumnRequest {
    #[validate(range(min = 0, message = "Order must not be negative"))]
    pub new_order: i32,
}

pub async fn create_column(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateColumnRequest>,
) -> ApiResult<(StatusCode, Json<Column>)> {
    req.validate()?;

    let column = state
        .services
        .columns
        .create(
            auth.user_id,
            NewColumn {
                name: req.name,
                board_id: req.board_id,
                order: req.order,
                color: req.color,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(column)))
}

pub async fn list_board_columns(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<BoardId>,
) -> ApiResult<Json<Vec<Column>>> {
    let columns = state
        .services
        .columns
        .find_all_by_board(board_id, auth.user_id)
        .await?;
    Ok(Json(columns))
}

pub async fn get_column(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<ColumnId>,
) -> ApiResult<Json<Column>> {
    let column = state.services.columns.find_one(id, auth.user_id).await?;
    Ok(Json(column))
}

pub async fn update_column(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<ColumnId>,
    Json(req): Json<UpdateColumnRequest>,
) -> ApiResult<Json<Column>> {
    req.validate()?;

    let column = state
        .services
        .columns
        .update(
            id,
            auth.user_id,
            UpdateColumn {
                name: req.name,
                order: req.order,
                color: req.color,
            },
        )
        .await?;

    Ok(Json(column))
}

/// Delete column and its cards
///
/// Returns `204 No Content`.
pub async fn delete_column(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<ColumnId>,
) -> ApiResult<StatusCode> {
    state.services.columns.remove(id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a column; orders past the last column are clamped to it
pub async fn reorder_column(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<ColumnId>,
    Json(req): Json<ReorderColumnRequest>,
) -> ApiResult<Json<Column>> {
    req.validate()?;

    let column = state
        .services
        .columns
        .reorder(id, auth.user_id, req.new_order)
        .await?;

    Ok(Json(column))
}
