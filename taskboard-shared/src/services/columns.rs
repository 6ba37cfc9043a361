//! Ordered columns of a board
//!
//! Every operation is gated by board membership only; unlike board edits,
//! members may create, rename, reorder and delete columns.

use std::sync::Arc;

use tracing::debug;

use super::boards::Boards;
use crate::error::{ServiceError, ServiceResult};
use crate::ids::{BoardId, ColumnId, UserId};
use crate::models::{Board, Column, NewColumn, UpdateColumn};
use crate::store::BoardStore;

#[derive(Clone)]
pub struct Columns {
    store: Arc<dyn BoardStore>,
    boards: Boards,
}

impl Columns {
    pub fn new(store: Arc<dyn BoardStore>, boards: Boards) -> Self {
        Self { store, boards }
    }

    /// Loads a column and checks access to its board
    pub async fn resolve(&self, column_id: ColumnId, user_id: UserId) -> ServiceResult<(Column, Board)> {
        let column = self
            .store
            .find_column(column_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Column"))?;
        let board = self.boards.resolve_access(column.board_id, user_id).await?;
        Ok((column, board))
    }

    /// Appends the column unless `input.order` names a slot; a named slot is
    /// stored as given
    pub async fn create(&self, user_id: UserId, input: NewColumn) -> ServiceResult<Column> {
        self.boards.resolve_access(input.board_id, user_id).await?;

        let column = self
            .store
            .insert_column(input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Board"))?;
        Ok(column)
    }

    pub async fn find_all_by_board(
        &self,
        board_id: BoardId,
        user_id: UserId,
    ) -> ServiceResult<Vec<Column>> {
        self.boards.resolve_access(board_id, user_id).await?;
        Ok(self.store.list_columns(board_id).await?)
    }

    pub async fn find_one(&self, column_id: ColumnId, user_id: UserId) -> ServiceResult<Column> {
        let (column, _) = self.resolve(column_id, user_id).await?;
        Ok(column)
    }

    /// Applies `name` and `color`, then moves the column if `order` is set
    pub async fn update(
        &self,
        column_id: ColumnId,
        user_id: UserId,
        input: UpdateColumn,
    ) -> ServiceResult<Column> {
        let (mut column, _) = self.resolve(column_id, user_id).await?;

        if input.name.is_some() || input.color.is_some() {
            column = self
                .store
                .update_column(column_id, &input)
                .await?
                .ok_or_else(|| ServiceError::not_found("Column"))?;
        }

        if let Some(order) = input.order {
            column = self.reorder_resolved(column_id, order).await?;
        }

        Ok(column)
    }

    /// Deletes the column and its cards; the columns after it move up
    pub async fn remove(&self, column_id: ColumnId, user_id: UserId) -> ServiceResult<()> {
        self.resolve(column_id, user_id).await?;

        if !self.store.delete_column(column_id).await? {
            return Err(ServiceError::not_found("Column"));
        }
        Ok(())
    }

    /// Moves the column to `new_order`, shifting the columns in between
    ///
    /// Asking for the current order returns the column unchanged.
    pub async fn reorder(
        &self,
        column_id: ColumnId,
        user_id: UserId,
        new_order: i32,
    ) -> ServiceResult<Column> {
        let (column, _) = self.resolve(column_id, user_id).await?;
        debug!(column_id = %column_id, old_order = column.order, new_order, "Reorder requested");

        self.reorder_resolved(column_id, new_order).await
    }

    async fn reorder_resolved(&self, column_id: ColumnId, new_order: i32) -> ServiceResult<Column> {
        self.store
            .reorder_column(column_id, new_order)
            .await?
            .ok_or_else(|| ServiceError::not_found("Column"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateBoard, CreateUser};
    use crate::ordering::is_dense;
    use crate::store::MemoryStore;

    struct Fixture {
        columns: Columns,
        owner: UserId,
        outsider: UserId,
        board_id: BoardId,
    }

    async fn setup() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for (email, name) in [("owner@example.com", "Owner"), ("out@example.com", "Out")] {
            let user = store
                .create_user(CreateUser {
                    email: email.to_string(),
                    password_hash: "x".to_string(),
                    name: name.to_string(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }

        let boards = Boards::new(store.clone());
        let board = boards
            .create(
                ids[0],
                CreateBoard {
                    name: "Sprint".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        Fixture {
            columns: Columns::new(store, boards),
            owner: ids[0],
            outsider: ids[1],
            board_id: board.id,
        }
    }

    fn new_column(board_id: BoardId, name: &str) -> NewColumn {
        NewColumn {
            name: name.to_string(),
            board_id,
            order: None,
            color: None,
        }
    }

    #[tokio::test]
    async fn test_create_appends_and_reorder_shifts() {
        let f = setup().await;
        let mut ids = Vec::new();
        for name in ["Todo", "Doing", "Done"] {
            let column = f
                .columns
                .create(f.owner, new_column(f.board_id, name))
                .await
                .unwrap();
            ids.push(column.id);
        }

        let moved = f.columns.reorder(ids[2], f.owner, 0).await.unwrap();
        assert_eq!(moved.order, 0);

        let names: Vec<_> = f
            .columns
            .find_all_by_board(f.board_id, f.owner)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Done", "Todo", "Doing"]);
    }

    #[tokio::test]
    async fn test_reorder_to_current_order_is_noop() {
        let f = setup().await;
        f.columns
            .create(f.owner, new_column(f.board_id, "Todo"))
            .await
            .unwrap();
        let doing = f
            .columns
            .create(f.owner, new_column(f.board_id, "Doing"))
            .await
            .unwrap();

        let same = f.columns.reorder(doing.id, f.owner, 1).await.unwrap();
        assert_eq!(same, doing);
    }

    #[tokio::test]
    async fn test_update_routes_order_through_reorder() {
        let f = setup().await;
        let mut ids = Vec::new();
        for name in ["A", "B", "C"] {
            ids.push(
                f.columns
                    .create(f.owner, new_column(f.board_id, name))
                    .await
                    .unwrap()
                    .id,
            );
        }

        let updated = f
            .columns
            .update(
                ids[0],
                f.owner,
                UpdateColumn {
                    name: Some("First".to_string()),
                    order: Some(2),
                    color: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "First");
        assert_eq!(updated.order, 2);

        let columns = f.columns.find_all_by_board(f.board_id, f.owner).await.unwrap();
        assert!(is_dense(columns.iter().map(|c| c.order)));
    }

    #[tokio::test]
    async fn test_outsider_is_forbidden() {
        let f = setup().await;
        let column = f
            .columns
            .create(f.owner, new_column(f.board_id, "Todo"))
            .await
            .unwrap();

        assert!(matches!(
            f.columns.find_one(column.id, f.outsider).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            f.columns.create(f.outsider, new_column(f.board_id, "Mine")).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            f.columns.reorder(ColumnId::new(), f.outsider, 0).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
