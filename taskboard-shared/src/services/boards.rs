//! Boards and their membership
//!
//! [`Boards::resolve_access`] is the access gate every other component goes
//! through: the board must exist (NotFound) and the caller must be its owner
//! or a member (Forbidden). Updating and deleting a board and adding members
//! are owner-only.

use std::sync::Arc;

use tracing::info;

use super::load_summaries;
use crate::auth::authorization::{require_board_access, require_board_owner, require_member_removal};
use crate::error::{ServiceError, ServiceResult};
use crate::ids::{BoardId, UserId};
use crate::models::{Board, BoardView, CreateBoard, UpdateBoard};
use crate::store::BoardStore;

#[derive(Clone)]
pub struct Boards {
    store: Arc<dyn BoardStore>,
}

impl Boards {
    pub fn new(store: Arc<dyn BoardStore>) -> Self {
        Self { store }
    }

    /// Loads a board the caller may access
    pub async fn resolve_access(&self, board_id: BoardId, user_id: UserId) -> ServiceResult<Board> {
        let board = self.load(board_id).await?;
        require_board_access(&board, user_id)?;
        Ok(board)
    }

    pub async fn create(&self, owner_id: UserId, input: CreateBoard) -> ServiceResult<BoardView> {
        let board = self.store.create_board(owner_id, input).await?;
        info!(board_id = %board.id, owner_id = %owner_id, "Created board");
        self.view(board).await
    }

    /// Boards the caller owns or is a member of
    pub async fn find_all(&self, user_id: UserId) -> ServiceResult<Vec<BoardView>> {
        let boards = self.store.list_boards_for_user(user_id).await?;

        let referenced = boards.iter().flat_map(Board::referenced_users).collect();
        let users = load_summaries(self.store.as_ref(), referenced).await?;

        Ok(boards
            .into_iter()
            .map(|board| BoardView::populate(board, &users))
            .collect())
    }

    pub async fn find_one(&self, board_id: BoardId, user_id: UserId) -> ServiceResult<BoardView> {
        let board = self.resolve_access(board_id, user_id).await?;
        self.view(board).await
    }

    pub async fn update(
        &self,
        board_id: BoardId,
        user_id: UserId,
        input: UpdateBoard,
    ) -> ServiceResult<BoardView> {
        let board = self.load(board_id).await?;
        require_board_owner(&board, user_id)?;

        let board = self
            .store
            .update_board(board_id, input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Board"))?;
        self.view(board).await
    }

    /// Deletes the board with all of its columns and cards
    pub async fn remove(&self, board_id: BoardId, user_id: UserId) -> ServiceResult<()> {
        let board = self.load(board_id).await?;
        require_board_owner(&board, user_id)?;

        if !self.store.delete_board(board_id).await? {
            return Err(ServiceError::not_found("Board"));
        }

        info!(board_id = %board_id, "Deleted board");
        Ok(())
    }

    pub async fn add_member(
        &self,
        board_id: BoardId,
        user_id: UserId,
        member_id: UserId,
    ) -> ServiceResult<BoardView> {
        let board = self.load(board_id).await?;
        require_board_owner(&board, user_id)?;

        if self.store.find_user(member_id).await?.is_none() {
            return Err(ServiceError::not_found("User"));
        }

        let board = self
            .store
            .add_board_member(board_id, member_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Board"))?;
        self.view(board).await
    }

    /// Owners may remove anyone but themselves; members may remove themselves
    pub async fn remove_member(
        &self,
        board_id: BoardId,
        user_id: UserId,
        member_id: UserId,
    ) -> ServiceResult<BoardView> {
        let board = self.resolve_access(board_id, user_id).await?;
        require_member_removal(&board, user_id, member_id)?;

        let board = self
            .store
            .remove_board_member(board_id, member_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Board"))?;
        self.view(board).await
    }

    async fn load(&self, board_id: BoardId) -> ServiceResult<Board> {
        self.store
            .find_board(board_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Board"))
    }

    async fn view(&self, board: Board) -> ServiceResult<BoardView> {
        let users = load_summaries(self.store.as_ref(), board.referenced_users()).await?;
        Ok(BoardView::populate(board, &users))
    }
}
