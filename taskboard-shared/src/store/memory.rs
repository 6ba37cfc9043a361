//! In-memory [`BoardStore`]
//!
//! Used when no `DATABASE_URL` is configured and by the test suites. All
//! state sits behind one `tokio::sync::RwLock`; every mutation holds the write
//! guard from its first read to its last write, which makes each range shift
//! and the write that follows it one atomic step.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{BoardStore, StoreResult};
use crate::error::StoreError;
use crate::ids::{BoardId, CardId, ColumnId, UserId};
use crate::models::board::DEFAULT_BOARD_COLOR;
use crate::models::user::DEFAULT_ROLE;
use crate::models::{
    Board, Card, CardStatus, Column, CreateBoard, CreateUser, NewCard, NewColumn, UpdateBoard,
    UpdateCard, UpdateColumn, User, UserSummary,
};
use crate::ordering::{clamp_order, close_gap, next_order, open_gap, reorder_shift, RangeShift};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    boards: HashMap<BoardId, Board>,
    columns: HashMap<ColumnId, Column>,
    cards: HashMap<CardId, Card>,
}

impl State {
    fn column_count(&self, board_id: BoardId) -> i32 {
        self.columns
            .values()
            .filter(|c| c.board_id == board_id)
            .count() as i32
    }

    fn card_count(&self, column_id: ColumnId) -> i32 {
        self.cards
            .values()
            .filter(|c| c.column_id == column_id)
            .count() as i32
    }

    /// Applies `shift` to every column of the board except `except`
    fn shift_columns(&mut self, board_id: BoardId, shift: RangeShift, except: ColumnId) -> usize {
        let now = Utc::now();
        let mut shifted = 0;
        for column in self.columns.values_mut() {
            if column.board_id == board_id && column.id != except && shift.contains(column.order) {
                column.order = shift.apply(column.order);
                column.updated_at = now;
                shifted += 1;
            }
        }
        shifted
    }

    /// Applies `shift` to every card of the column except `except`
    fn shift_cards(&mut self, column_id: ColumnId, shift: RangeShift, except: CardId) -> usize {
        let now = Utc::now();
        let mut shifted = 0;
        for card in self.cards.values_mut() {
            if card.column_id == column_id && card.id != except && shift.contains(card.order) {
                card.order = shift.apply(card.order);
                card.updated_at = now;
                shifted += 1;
            }
        }
        shifted
    }

    fn remove_cards_of(&mut self, column_ids: &[ColumnId]) -> usize {
        let before = self.cards.len();
        self.cards.retain(|_, card| !column_ids.contains(&card.column_id));
        before - self.cards.len()
    }
}

/// [`BoardStore`] backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_order<T>(mut items: Vec<T>, order: impl Fn(&T) -> i32) -> Vec<T> {
    items.sort_by_key(order);
    items
}

#[async_trait]
impl BoardStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, input: CreateUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        let taken = state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&input.email));
        if taken {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: input.email,
            password_hash: input.password_hash,
            name: input.name,
            role: DEFAULT_ROLE.to_string(),
            avatar: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn user_summaries(&self, ids: &[UserId]) -> StoreResult<Vec<UserSummary>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id))
            .map(User::summary)
            .collect())
    }

    async fn create_board(&self, owner_id: UserId, input: CreateBoard) -> StoreResult<Board> {
        let now = Utc::now();
        let board = Board {
            id: BoardId::new(),
            name: input.name,
            description: input.description.unwrap_or_default(),
            color: input
                .color
                .unwrap_or_else(|| DEFAULT_BOARD_COLOR.to_string()),
            owner_id,
            members: vec![owner_id],
            created_at: now,
            updated_at: now,
        };

        self.state
            .write()
            .await
            .boards
            .insert(board.id, board.clone());

        Ok(board)
    }

    async fn find_board(&self, id: BoardId) -> StoreResult<Option<Board>> {
        Ok(self.state.read().await.boards.get(&id).cloned())
    }

    async fn list_boards_for_user(&self, user_id: UserId) -> StoreResult<Vec<Board>> {
        let state = self.state.read().await;
        let mut boards: Vec<Board> = state
            .boards
            .values()
            .filter(|b| b.has_access(user_id))
            .cloned()
            .collect();
        boards.sort_by_key(|b| (b.created_at, b.id));
        Ok(boards)
    }

    async fn update_board(&self, id: BoardId, input: UpdateBoard) -> StoreResult<Option<Board>> {
        let mut state = self.state.write().await;
        let Some(board) = state.boards.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = input.name {
            board.name = name;
        }
        if let Some(description) = input.description {
            board.description = description;
        }
        if let Some(color) = input.color {
            board.color = color;
        }
        board.updated_at = Utc::now();

        Ok(Some(board.clone()))
    }

    async fn delete_board(&self, id: BoardId) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.boards.remove(&id).is_none() {
            return Ok(false);
        }

        let column_ids: Vec<ColumnId> = state
            .columns
            .values()
            .filter(|c| c.board_id == id)
            .map(|c| c.id)
            .collect();
        let cards = state.remove_cards_of(&column_ids);
        state.columns.retain(|_, c| c.board_id != id);

        debug!(board_id = %id, columns = column_ids.len(), cards, "Deleted board with children");
        Ok(true)
    }

    async fn add_board_member(&self, id: BoardId, user_id: UserId) -> StoreResult<Option<Board>> {
        let mut state = self.state.write().await;
        let Some(board) = state.boards.get_mut(&id) else {
            return Ok(None);
        };

        if !board.members.contains(&user_id) {
            board.members.push(user_id);
            board.updated_at = Utc::now();
        }

        Ok(Some(board.clone()))
    }

    async fn remove_board_member(
        &self,
        id: BoardId,
        user_id: UserId,
    ) -> StoreResult<Option<Board>> {
        let mut state = self.state.write().await;
        let Some(board) = state.boards.get_mut(&id) else {
            return Ok(None);
        };

        let before = board.members.len();
        board.members.retain(|&m| m != user_id);
        if board.members.len() != before {
            board.updated_at = Utc::now();
        }

        Ok(Some(board.clone()))
    }

    async fn insert_column(&self, input: NewColumn) -> StoreResult<Option<Column>> {
        let mut state = self.state.write().await;
        if !state.boards.contains_key(&input.board_id) {
            return Ok(None);
        }

        let order = match input.order {
            Some(order) => order,
            None => next_order(
                state
                    .columns
                    .values()
                    .filter(|c| c.board_id == input.board_id)
                    .map(|c| c.order)
                    .max(),
            ),
        };

        let now = Utc::now();
        let column = Column {
            id: ColumnId::new(),
            name: input.name,
            board_id: input.board_id,
            order,
            color: input.color,
            created_at: now,
            updated_at: now,
        };
        state.columns.insert(column.id, column.clone());

        debug!(column_id = %column.id, board_id = %column.board_id, order, "Inserted column");
        Ok(Some(column))
    }

    async fn find_column(&self, id: ColumnId) -> StoreResult<Option<Column>> {
        Ok(self.state.read().await.columns.get(&id).cloned())
    }

    async fn list_columns(&self, board_id: BoardId) -> StoreResult<Vec<Column>> {
        let state = self.state.read().await;
        let columns: Vec<Column> = state
            .columns
            .values()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect();
        Ok(sorted_by_order(columns, |c| c.order))
    }

    async fn update_column(
        &self,
        id: ColumnId,
        input: &UpdateColumn,
    ) -> StoreResult<Option<Column>> {
        let mut state = self.state.write().await;
        let Some(column) = state.columns.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = &input.name {
            column.name = name.clone();
        }
        if let Some(color) = &input.color {
            column.color = Some(color.clone());
        }
        column.updated_at = Utc::now();

        Ok(Some(column.clone()))
    }

    async fn delete_column(&self, id: ColumnId) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(column) = state.columns.remove(&id) else {
            return Ok(false);
        };

        let cards = state.remove_cards_of(&[id]);
        let shifted = state.shift_columns(column.board_id, close_gap(column.order), id);

        debug!(column_id = %id, order = column.order, cards, shifted, "Deleted column");
        Ok(true)
    }

    async fn reorder_column(&self, id: ColumnId, new_order: i32) -> StoreResult<Option<Column>> {
        let mut state = self.state.write().await;
        let Some(column) = state.columns.get(&id).cloned() else {
            return Ok(None);
        };

        let old_order = column.order;
        let new_order = clamp_order(new_order, state.column_count(column.board_id) - 1);
        let Some(shift) = reorder_shift(old_order, new_order) else {
            return Ok(Some(column));
        };

        let shifted = state.shift_columns(column.board_id, shift, id);
        let Some(column) = state.columns.get_mut(&id) else {
            return Ok(None);
        };
        column.order = new_order;
        column.updated_at = Utc::now();

        debug!(column_id = %id, old_order, new_order, shifted, "Reordered column");
        Ok(Some(column.clone()))
    }

    async fn insert_card(&self, input: NewCard) -> StoreResult<Option<Card>> {
        let mut state = self.state.write().await;
        if !state.columns.contains_key(&input.column_id) {
            return Ok(None);
        }

        let order = match input.order {
            Some(order) => order,
            None => next_order(
                state
                    .cards
                    .values()
                    .filter(|c| c.column_id == input.column_id)
                    .map(|c| c.order)
                    .max(),
            ),
        };

        let now = Utc::now();
        let card = Card {
            id: CardId::new(),
            title: input.title,
            description: input.description.unwrap_or_default(),
            column_id: input.column_id,
            assignee_id: input.assignee_id,
            order,
            labels: input.labels,
            due_date: input.due_date,
            watchers: Vec::new(),
            status: CardStatus::Todo,
            progress: input.progress.unwrap_or(0),
            cover_image: input.cover_image,
            created_at: now,
            updated_at: now,
        };
        state.cards.insert(card.id, card.clone());

        debug!(card_id = %card.id, column_id = %card.column_id, order, "Inserted card");
        Ok(Some(card))
    }

    async fn find_card(&self, id: CardId) -> StoreResult<Option<Card>> {
        Ok(self.state.read().await.cards.get(&id).cloned())
    }

    async fn list_cards(&self, column_id: ColumnId) -> StoreResult<Vec<Card>> {
        let state = self.state.read().await;
        let cards: Vec<Card> = state
            .cards
            .values()
            .filter(|c| c.column_id == column_id)
            .cloned()
            .collect();
        Ok(sorted_by_order(cards, |c| c.order))
    }

    async fn list_cards_in_columns(&self, column_ids: &[ColumnId]) -> StoreResult<Vec<Card>> {
        let state = self.state.read().await;
        let mut cards: Vec<(usize, Card)> = state
            .cards
            .values()
            .filter_map(|card| {
                column_ids
                    .iter()
                    .position(|&id| id == card.column_id)
                    .map(|rank| (rank, card.clone()))
            })
            .collect();
        cards.sort_by_key(|(rank, card)| (card.order, *rank));
        Ok(cards.into_iter().map(|(_, card)| card).collect())
    }

    async fn update_card(&self, id: CardId, input: &UpdateCard) -> StoreResult<Option<Card>> {
        let mut state = self.state.write().await;
        let Some(card) = state.cards.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = &input.title {
            card.title = title.clone();
        }
        if let Some(description) = &input.description {
            card.description = description.clone();
        }
        if let Some(assignee_id) = input.assignee_id {
            card.assignee_id = Some(assignee_id);
        }
        if let Some(labels) = &input.labels {
            card.labels = labels.clone();
        }
        if let Some(due_date) = input.due_date {
            card.due_date = Some(due_date);
        }
        if let Some(progress) = input.progress {
            card.progress = progress;
        }
        if let Some(status) = input.status {
            card.status = status;
        }
        if let Some(cover_image) = &input.cover_image {
            card.cover_image = Some(cover_image.clone());
        }
        card.updated_at = Utc::now();

        Ok(Some(card.clone()))
    }

    async fn delete_card(&self, id: CardId) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(card) = state.cards.remove(&id) else {
            return Ok(false);
        };

        let shifted = state.shift_cards(card.column_id, close_gap(card.order), id);

        debug!(card_id = %id, column_id = %card.column_id, order = card.order, shifted, "Deleted card");
        Ok(true)
    }

    async fn move_card(
        &self,
        id: CardId,
        target_column: ColumnId,
        new_order: i32,
    ) -> StoreResult<Option<Card>> {
        let mut state = self.state.write().await;
        let Some(card) = state.cards.get(&id).cloned() else {
            return Ok(None);
        };
        if !state.columns.contains_key(&target_column) {
            return Ok(None);
        }

        let source_column = card.column_id;
        let old_order = card.order;

        let new_order = if source_column == target_column {
            let new_order = clamp_order(new_order, state.card_count(source_column) - 1);
            let Some(shift) = reorder_shift(old_order, new_order) else {
                return Ok(Some(card));
            };
            state.shift_cards(source_column, shift, id);
            new_order
        } else {
            let new_order = clamp_order(new_order, state.card_count(target_column));
            state.shift_cards(source_column, close_gap(old_order), id);
            state.shift_cards(target_column, open_gap(new_order), id);
            new_order
        };

        let Some(card) = state.cards.get_mut(&id) else {
            return Ok(None);
        };
        card.column_id = target_column;
        card.order = new_order;
        card.updated_at = Utc::now();

        debug!(
            card_id = %id,
            source_column = %source_column,
            target_column = %target_column,
            old_order,
            new_order,
            "Moved card"
        );
        Ok(Some(card.clone()))
    }

    async fn add_card_watcher(&self, id: CardId, user_id: UserId) -> StoreResult<Option<Card>> {
        let mut state = self.state.write().await;
        let Some(card) = state.cards.get_mut(&id) else {
            return Ok(None);
        };

        if !card.watchers.contains(&user_id) {
            card.watchers.push(user_id);
            card.updated_at = Utc::now();
        }

        Ok(Some(card.clone()))
    }

    async fn remove_card_watcher(
        &self,
        id: CardId,
        user_id: UserId,
    ) -> StoreResult<Option<Card>> {
        let mut state = self.state.write().await;
        let Some(card) = state.cards.get_mut(&id) else {
            return Ok(None);
        };

        let before = card.watchers.len();
        card.watchers.retain(|&w| w != user_id);
        if card.watchers.len() != before {
            card.updated_at = Utc::now();
        }

        Ok(Some(card.clone()))
    }

    async fn assign_card(&self, id: CardId, assignee_id: UserId) -> StoreResult<Option<Card>> {
        let mut state = self.state.write().await;
        let Some(card) = state.cards.get_mut(&id) else {
            return Ok(None);
        };

        card.assignee_id = Some(assignee_id);
        card.updated_at = Utc::now();

        Ok(Some(card.clone()))
    }

    async fn set_card_progress(
        &self,
        id: CardId,
        progress: i32,
        status: CardStatus,
    ) -> StoreResult<Option<Card>> {
        let mut state = self.state.write().await;
        let Some(card) = state.cards.get_mut(&id) else {
            return Ok(None);
        };

        card.progress = progress;
        card.status = status;
        card.updated_at = Utc::now();

        Ok(Some(card.clone()))
    }
}
