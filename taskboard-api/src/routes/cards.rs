/// Card endpoints
///
/// All endpoints require a bearer token and membership of the board that
/// owns the card's column.
///
/// # Endpoints
///
/// - `POST   /cards` - Create card (appended unless `order` is given)
/// - `GET    /cards/column/:column_id` - Cards of a column, by order
/// - `GET    /cards/board/:board_id` - Cards of every column of a board
/// - `GET    /cards/:id` - Get card
/// - `PATCH  /cards/:id` - Update card; `order` moves it within its column
/// - `DELETE /cards/:id` - Delete card
/// - `POST   /cards/:id/move` - Move card to `new_order` in `target_column_id`
/// - `POST   /cards/:id/watchers` - Add watcher
/// - `DELETE /cards/:id/watchers/:watcher_id` - Remove watcher
/// - `POST   /cards/:id/assign/:assignee_id` - Assign card
/// - `PATCH  /cards/:id/progress/:progress` - Set progress and derive status

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskboard_shared::{
    auth::middleware::AuthContext,
    ids::{BoardId, CardId, ColumnId, UserId},
    models::{CardStatus, CardView, NewCard, UpdateCard},
};
use validator::Validate;

/// Create card request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCardRequest {
    #[validate(length(min = 2, max = 100, message = "Title must be 2 to 100 characters"))]
    pub title: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    pub column_id: ColumnId,

    pub assignee_id: Option<UserId>,

    #[validate(range(min = 0, message = "Order must not be negative"))]
    pub order: Option<i32>,

    #[serde(default)]
    pub labels: Vec<String>,

    pub due_date: Option<DateTime<Utc>>,

    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress: Option<i32>,

    pub cover_image: Option<String>,
}

/// Update card request; omitted fields are left unchanged
///
/// `status` is written as given and is not re-derived from `progress`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCardRequest {
    #[validate(length(min = 2, max = 100, message = "Title must be 2 to 100 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    pub assignee_id: Option<UserId>,

    #[validate(range(min = 0, message = "Order must not be negative"))]
    pub order: Option<i32>,

    pub labels: Option<Vec<String>>,

    pub due_date: Option<DateTime<Utc>>,

    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress: Option<i32>,

    pub status: Option<CardStatus>,

    pub cover_image: Option<String>,
}

/// Move card request
#[derive(Debug, Deserialize, Validate)]
pub struct MoveCardRequest {
    pub target_column_id: ColumnId,

    #[validate(range(min = 0, message = "Order must not be negative"))]
    pub new_order: i32,
}

/// Add watcher request
#[derive(Debug, Deserialize)]
pub struct AddWatcherRequest {
    pub user_id: UserId,
}

pub async fn create_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCardRequest>,
) -> ApiResult<(StatusCode, Json<CardView>)> {
    req.validate()?;

    let card = state
        .services
        .cards
        .create(
            auth.user_id,
            NewCard {
                title: req.title,
                description: req.description,
                column_id: req.column_id,
                assignee_id: req.assignee_id,
                order: req.order,
                labels: req.labels,
                due_date: req.due_date,
                progress: req.progress,
                cover_image: req.cover_image,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn list_column_cards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(column_id): Path<ColumnId>,
) -> ApiResult<Json<Vec<CardView>>> {
    let cards = state
        .services
        .cards
        .find_all_by_column(column_id, auth.user_id)
        .await?;
    Ok(Json(cards))
}

pub async fn list_board_cards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<BoardId>,
) -> ApiResult<Json<Vec<CardView>>> {
    let cards = state
        .services
        .cards
        .find_all_by_board(board_id, auth.user_id)
        .await?;
    Ok(Json(cards))
}

pub async fn get_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<CardId>,
) -> ApiResult<Json<CardView>> {
    let card = state.services.cards.find_one(id, auth.user_id).await?;
    Ok(Json(card))
}

pub async fn update_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<CardId>,
    Json(req): Json<UpdateCardRequest>,
) -> ApiResult<Json<CardView>> {
    req.validate()?;

    let card = state
        .services
        .cards
        .update(
            id,
            auth.user_id,
            UpdateCard {
                title: req.title,
                description: req.description,
                assignee_id: req.assignee_id,
                order: req.order,
                labels: req.labels,
                due_date: req.due_date,
                progress: req.progress,
                status: req.status,
                cover_image: req.cover_image,
            },
        )
        .await?;

    Ok(Json(card))
}

/// Delete card
///
/// Returns `204 No Content`.
pub async fn delete_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<CardId>,
) -> ApiResult<StatusCode> {
    state.services.cards.remove(id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a card within its column or to another column
///
/// The caller needs access to both the card's board and the target
/// column's board.
pub async fn move_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<CardId>,
    Json(req): Json<MoveCardRequest>,
) -> ApiResult<Json<CardView>> {
    req.validate()?;

    let card = state
        .services
        .cards
        .move_card(id, auth.user_id, req.target_column_id, req.new_order)
        .await?;

    Ok(Json(card))
}

pub async fn add_watcher(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<CardId>,
    Json(req): Json<AddWatcherRequest>,
) -> ApiResult<Json<CardView>> {
    let card = state
        .services
        .cards
        .add_watcher(id, auth.user_id, req.user_id)
        .await?;

    Ok(Json(card))
}

pub async fn remove_watcher(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, watcher_id)): Path<(CardId, UserId)>,
) -> ApiResult<Json<CardView>> {
    let card = state
        .services
        .cards
        .remove_watcher(id, auth.user_id, watcher_id)
        .await?;

    Ok(Json(card))
}

pub async fn assign_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, assignee_id)): Path<(CardId, UserId)>,
) -> ApiResult<Json<CardView>> {
    let card = state
        .services
        .cards
        .assign(id, auth.user_id, assignee_id)
        .await?;

    Ok(Json(card))
}

/// Set progress; status follows (0 todo, 1-49 in-progress, 50-99 review,
/// 100 done)
pub async fn update_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, progress)): Path<(CardId, i32)>,
) -> ApiResult<Json<CardView>> {
    if !(0..=100).contains(&progress) {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "progress".to_string(),
            message: "Progress must be between 0 and 100".to_string(),
        }]));
    }

    let card = state
        .services
        .cards
        .update_progress(id, auth.user_id, progress)
        .await?;

    Ok(Json(card))
}
