//! Storage seam
//!
//! [`BoardStore`] is the only thing the services talk to. It exposes domain
//! operations rather than raw queries so each backend can make the compound
//! ordering operations atomic in its own way:
//!
//! - [`PgStore`] runs each of them in one transaction that first takes
//!   `FOR UPDATE` row locks on the parent board (column ordering) or on the
//!   parent column(s) (card ordering), in ascending id order.
//! - [`MemoryStore`] runs each of them under one write guard over the whole
//!   state.
//!
//! Both compute their range shifts with [`crate::ordering`].
//!
//! Lookups return `Ok(None)` for a missing entity; the services turn that
//! into NotFound. Mutations that target a single entity return the entity as
//! it is after the write, or `None` if it vanished.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::ids::{BoardId, CardId, ColumnId, UserId};
use crate::models::{
    Board, Card, CardStatus, Column, CreateBoard, CreateUser, NewCard, NewColumn, UpdateBoard,
    UpdateCard, UpdateColumn, User, UserSummary,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Short backend name for health output and logs
    fn backend(&self) -> &'static str;

    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    // Users

    /// Fails with [`StoreError::Conflict`] if the email is taken, ignoring case
    async fn create_user(&self, input: CreateUser) -> StoreResult<User>;

    /// Case-insensitive lookup
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Populated `{id, name, email}` for every id that exists
    async fn user_summaries(&self, ids: &[UserId]) -> StoreResult<Vec<UserSummary>>;

    // Boards

    /// Creates the board with the owner as its first member
    async fn create_board(&self, owner_id: UserId, input: CreateBoard) -> StoreResult<Board>;

    async fn find_board(&self, id: BoardId) -> StoreResult<Option<Board>>;

    /// Boards the user owns or is a member of, oldest first
    async fn list_boards_for_user(&self, user_id: UserId) -> StoreResult<Vec<Board>>;

    async fn update_board(&self, id: BoardId, input: UpdateBoard) -> StoreResult<Option<Board>>;

    /// Deletes the board with all of its columns and cards
    async fn delete_board(&self, id: BoardId) -> StoreResult<bool>;

    /// Adds a member; adding an existing member changes nothing
    async fn add_board_member(&self, id: BoardId, user_id: UserId) -> StoreResult<Option<Board>>;

    async fn remove_board_member(
        &self,
        id: BoardId,
        user_id: UserId,
    ) -> StoreResult<Option<Board>>;

    // Columns

    /// Inserts a column at `input.order`, or after the last column of the
    /// board when that is `None`. Returns `None` if the board is gone.
    async fn insert_column(&self, input: NewColumn) -> StoreResult<Option<Column>>;

    async fn find_column(&self, id: ColumnId) -> StoreResult<Option<Column>>;

    /// Columns of a board sorted by order
    async fn list_columns(&self, board_id: BoardId) -> StoreResult<Vec<Column>>;

    /// Writes `name` and `color`; `order` is not read here
    async fn update_column(&self, id: ColumnId, input: &UpdateColumn)
        -> StoreResult<Option<Column>>;

    /// Deletes the column and its cards and closes the gap it leaves
    async fn delete_column(&self, id: ColumnId) -> StoreResult<bool>;

    /// Moves a column to `new_order` (clamped into range), shifting the
    /// columns in between. Writes nothing when the order is unchanged.
    async fn reorder_column(&self, id: ColumnId, new_order: i32) -> StoreResult<Option<Column>>;

    // Cards

    /// Inserts a card at `input.order`, or after the last card of the column
    /// when that is `None`. Returns `None` if the column is gone.
    async fn insert_card(&self, input: NewCard) -> StoreResult<Option<Card>>;

    async fn find_card(&self, id: CardId) -> StoreResult<Option<Card>>;

    /// Cards of a column sorted by order
    async fn list_cards(&self, column_id: ColumnId) -> StoreResult<Vec<Card>>;

    /// Cards of several columns sorted by order, ties broken by the position
    /// of their column in `column_ids`
    async fn list_cards_in_columns(&self, column_ids: &[ColumnId]) -> StoreResult<Vec<Card>>;

    /// Writes every set field except `order`
    async fn update_card(&self, id: CardId, input: &UpdateCard) -> StoreResult<Option<Card>>;

    /// Deletes the card and closes the gap it leaves
    async fn delete_card(&self, id: CardId) -> StoreResult<bool>;

    /// Moves a card to `new_order` in `target_column`
    ///
    /// Within the same column this is a reorder (clamped to the last slot,
    /// no writes when unchanged). Across columns it closes the gap in the
    /// source, opens one in the target (clamped to the append slot) and
    /// reassigns the card. Returns `None` if the card or target column is gone.
    async fn move_card(
        &self,
        id: CardId,
        target_column: ColumnId,
        new_order: i32,
    ) -> StoreResult<Option<Card>>;

    /// Adds a watcher; adding an existing watcher changes nothing
    async fn add_card_watcher(&self, id: CardId, user_id: UserId) -> StoreResult<Option<Card>>;

    async fn remove_card_watcher(&self, id: CardId, user_id: UserId)
        -> StoreResult<Option<Card>>;

    async fn assign_card(&self, id: CardId, assignee_id: UserId) -> StoreResult<Option<Card>>;

    async fn set_card_progress(
        &self,
        id: CardId,
        progress: i32,
        status: CardStatus,
    ) -> StoreResult<Option<Card>>;
}
