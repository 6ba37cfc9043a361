//! Ordered cards of a column
//!
//! Access is re-derived from the card's column on every call. Moving a card
//! to another column additionally requires access to the target column's
//! board, which may be a different board.

use std::sync::Arc;

use tracing::debug;

use super::columns::Columns;
use super::load_summaries;
use crate::error::{ServiceError, ServiceResult};
use crate::ids::{BoardId, CardId, ColumnId, UserId};
use crate::models::{Card, CardStatus, CardView, Column, NewCard, UpdateCard};
use crate::store::BoardStore;

#[derive(Clone)]
pub struct Cards {
    store: Arc<dyn BoardStore>,
    columns: Columns,
}

impl Cards {
    pub fn new(store: Arc<dyn BoardStore>, columns: Columns) -> Self {
        Self { store, columns }
    }

    /// Loads a card and checks access through its column
    pub async fn resolve(&self, card_id: CardId, user_id: UserId) -> ServiceResult<(Card, Column)> {
        let card = self
            .store
            .find_card(card_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Card"))?;
        let (column, _) = self.columns.resolve(card.column_id, user_id).await?;
        Ok((card, column))
    }

    /// Appends the card unless `input.order` names a slot; new cards always
    /// start as `todo`
    pub async fn create(&self, user_id: UserId, input: NewCard) -> ServiceResult<CardView> {
        self.columns.resolve(input.column_id, user_id).await?;

        if let Some(assignee_id) = input.assignee_id {
            self.require_user(assignee_id).await?;
        }

        let card = self
            .store
            .insert_card(input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Column"))?;
        self.view(card).await
    }

    pub async fn find_all_by_column(
        &self,
        column_id: ColumnId,
        user_id: UserId,
    ) -> ServiceResult<Vec<CardView>> {
        self.columns.resolve(column_id, user_id).await?;
        let cards = self.store.list_cards(column_id).await?;
        self.views(cards).await
    }

    /// Every card on the board, sorted by order and then by column position
    pub async fn find_all_by_board(
        &self,
        board_id: BoardId,
        user_id: UserId,
    ) -> ServiceResult<Vec<CardView>> {
        let columns = self.columns.find_all_by_board(board_id, user_id).await?;
        let column_ids: Vec<ColumnId> = columns.iter().map(|c| c.id).collect();

        let cards = self.store.list_cards_in_columns(&column_ids).await?;
        self.views(cards).await
    }

    pub async fn find_one(&self, card_id: CardId, user_id: UserId) -> ServiceResult<CardView> {
        let (card, _) = self.resolve(card_id, user_id).await?;
        self.view(card).await
    }

    /// Writes the set fields as given, then moves the card within its column
    /// if `order` is set
    ///
    /// `status` and `progress` are written raw here; only
    /// [`Cards::update_progress`] derives one from the other.
    pub async fn update(
        &self,
        card_id: CardId,
        user_id: UserId,
        input: UpdateCard,
    ) -> ServiceResult<CardView> {
        let (mut card, _) = self.resolve(card_id, user_id).await?;

        if let Some(assignee_id) = input.assignee_id {
            self.require_user(assignee_id).await?;
        }

        if has_field_changes(&input) {
            card = self
                .store
                .update_card(card_id, &input)
                .await?
                .ok_or_else(|| ServiceError::not_found("Card"))?;
        }

        if let Some(order) = input.order {
            card = self.move_resolved(card_id, card.column_id, order).await?;
        }

        self.view(card).await
    }

    /// Deletes the card; the cards after it move up
    pub async fn remove(&self, card_id: CardId, user_id: UserId) -> ServiceResult<()> {
        self.resolve(card_id, user_id).await?;

        if !self.store.delete_card(card_id).await? {
            return Err(ServiceError::not_found("Card"));
        }
        Ok(())
    }

    /// Moves the card to `new_order` in `target_column_id`
    ///
    /// Moving to the card's current column and order returns it unchanged.
    pub async fn move_card(
        &self,
        card_id: CardId,
        user_id: UserId,
        target_column_id: ColumnId,
        new_order: i32,
    ) -> ServiceResult<CardView> {
        let (card, source) = self.resolve(card_id, user_id).await?;
        if target_column_id != source.id {
            self.columns.resolve(target_column_id, user_id).await?;
        }

        debug!(
            card_id = %card_id,
            source_column = %source.id,
            target_column = %target_column_id,
            old_order = card.order,
            new_order,
            "Move requested"
        );

        let card = self.move_resolved(card_id, target_column_id, new_order).await?;
        self.view(card).await
    }

    pub async fn add_watcher(
        &self,
        card_id: CardId,
        user_id: UserId,
        watcher_id: UserId,
    ) -> ServiceResult<CardView> {
        self.resolve(card_id, user_id).await?;
        self.require_user(watcher_id).await?;

        let card = self
            .store
            .add_card_watcher(card_id, watcher_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Card"))?;
        self.view(card).await
    }

    pub async fn remove_watcher(
        &self,
        card_id: CardId,
        user_id: UserId,
        watcher_id: UserId,
    ) -> ServiceResult<CardView> {
        self.resolve(card_id, user_id).await?;

        let card = self
            .store
            .remove_card_watcher(card_id, watcher_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Card"))?;
        self.view(card).await
    }

    pub async fn assign(
        &self,
        card_id: CardId,
        user_id: UserId,
        assignee_id: UserId,
    ) -> ServiceResult<CardView> {
        self.resolve(card_id, user_id).await?;
        self.require_user(assignee_id).await?;

        let card = self
            .store
            .assign_card(card_id, assignee_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Card"))?;
        self.view(card).await
    }

    /// Sets progress and derives status from it
    pub async fn update_progress(
        &self,
        card_id: CardId,
        user_id: UserId,
        progress: i32,
    ) -> ServiceResult<CardView> {
        if !(0..=100).contains(&progress) {
            return Err(ServiceError::Invalid(
                "Progress must be between 0 and 100".to_string(),
            ));
        }

        self.resolve(card_id, user_id).await?;

        let status = CardStatus::from_progress(progress);
        let card = self
            .store
            .set_card_progress(card_id, progress, status)
            .await?
            .ok_or_else(|| ServiceError::not_found("Card"))?;
        self.view(card).await
    }

    async fn move_resolved(
        &self,
        card_id: CardId,
        target_column_id: ColumnId,
        new_order: i32,
    ) -> ServiceResult<Card> {
        if let Some(card) = self
            .store
            .move_card(card_id, target_column_id, new_order)
            .await?
        {
            return Ok(card);
        }

        // Either side may have been deleted since it was resolved
        match self.store.find_card(card_id).await? {
            Some(_) => Err(ServiceError::not_found("Column")),
            None => Err(ServiceError::not_found("Card")),
        }
    }

    async fn require_user(&self, user_id: UserId) -> ServiceResult<()> {
        match self.store.find_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("User")),
        }
    }

    async fn view(&self, card: Card) -> ServiceResult<CardView> {
        let users = load_summaries(self.store.as_ref(), card.referenced_users()).await?;
        Ok(CardView::populate(card, &users))
    }

    async fn views(&self, cards: Vec<Card>) -> ServiceResult<Vec<CardView>> {
        let referenced = cards.iter().flat_map(Card::referenced_users).collect();
        let users = load_summaries(self.store.as_ref(), referenced).await?;

        Ok(cards
            .into_iter()
            .map(|card| CardView::populate(card, &users))
            .collect())
    }
}

fn has_field_changes(input: &UpdateCard) -> bool {
    input.title.is_some()
        || input.description.is_some()
        || input.assignee_id.is_some()
        || input.labels.is_some()
        || input.due_date.is_some()
        || input.progress.is_some()
        || input.status.is_some()
        || input.cover_image.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateBoard, CreateUser, NewColumn};
    use crate::ordering::is_dense;
    use crate::services::Boards;
    use crate::store::MemoryStore;

    struct Fixture {
        cards: Cards,
        owner: UserId,
        outsider: UserId,
        todo: ColumnId,
        doing: ColumnId,
    }

    async fn setup() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let mut users = Vec::new();
        for (email, name) in [("owner@example.com", "Owner"), ("out@example.com", "Out")] {
            let user = store
                .create_user(CreateUser {
                    email: email.to_string(),
                    password_hash: "x".to_string(),
                    name: name.to_string(),
                })
                .await
                .unwrap();
            users.push(user.id);
        }

        let boards = Boards::new(store.clone());
        let columns = Columns::new(store.clone(), boards.clone());
        let board = boards
            .create(
                users[0],
                CreateBoard {
                    name: "Sprint".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let mut column_ids = Vec::new();
        for name in ["Todo", "Doing"] {
            let column = columns
                .create(
                    users[0],
                    NewColumn {
                        name: name.to_string(),
                        board_id: board.id,
                        order: None,
                        color: None,
                    },
                )
                .await
                .unwrap();
            column_ids.push(column.id);
        }

        Fixture {
            cards: Cards::new(store, columns),
            owner: users[0],
            outsider: users[1],
            todo: column_ids[0],
            doing: column_ids[1],
        }
    }

    fn new_card(column_id: ColumnId, title: &str) -> NewCard {
        NewCard {
            title: title.to_string(),
            description: None,
            column_id,
            assignee_id: None,
            order: None,
            labels: Vec::new(),
            due_date: None,
            progress: None,
            cover_image: None,
        }
    }

    async fn orders(f: &Fixture, column_id: ColumnId) -> Vec<(String, i32)> {
        f.cards
            .find_all_by_column(column_id, f.owner)
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.title, c.order))
            .collect()
    }

    #[tokio::test]
    async fn test_move_across_columns_closes_and_opens_gaps() {
        let f = setup().await;
        let x = f.cards.create(f.owner, new_card(f.todo, "X")).await.unwrap();
        f.cards.create(f.owner, new_card(f.todo, "Y")).await.unwrap();
        f.cards.create(f.owner, new_card(f.doing, "Z")).await.unwrap();

        let moved = f.cards.move_card(x.id, f.owner, f.doing, 0).await.unwrap();
        assert_eq!(moved.column_id, f.doing);
        assert_eq!(moved.order, 0);

        assert_eq!(orders(&f, f.todo).await, [("Y".to_string(), 0)]);
        assert_eq!(
            orders(&f, f.doing).await,
            [("X".to_string(), 0), ("Z".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_move_to_same_slot_returns_card_unchanged() {
        let f = setup().await;
        f.cards.create(f.owner, new_card(f.todo, "A")).await.unwrap();
        let b = f.cards.create(f.owner, new_card(f.todo, "B")).await.unwrap();

        let same = f.cards.move_card(b.id, f.owner, f.todo, 1).await.unwrap();
        assert_eq!(same.order, 1);
        assert_eq!(same.updated_at, b.updated_at);
    }

    #[tokio::test]
    async fn test_update_progress_derives_status() {
        let f = setup().await;
        let card = f.cards.create(f.owner, new_card(f.todo, "A")).await.unwrap();
        assert_eq!(card.status, CardStatus::Todo);

        for (progress, status) in [
            (37, CardStatus::InProgress),
            (50, CardStatus::Review),
            (99, CardStatus::Review),
            (100, CardStatus::Done),
            (0, CardStatus::Todo),
        ] {
            let card = f.cards.update_progress(card.id, f.owner, progress).await.unwrap();
            assert_eq!(card.progress, progress);
            assert_eq!(card.status, status);
        }

        assert!(matches!(
            f.cards.update_progress(card.id, f.owner, 101).await,
            Err(ServiceError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_patch_writes_status_raw() {
        let f = setup().await;
        let card = f.cards.create(f.owner, new_card(f.todo, "A")).await.unwrap();

        let card = f
            .cards
            .update(
                card.id,
                f.owner,
                UpdateCard {
                    progress: Some(10),
                    status: Some(CardStatus::Done),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(card.progress, 10);
        assert_eq!(card.status, CardStatus::Done);
    }

    #[tokio::test]
    async fn test_update_order_moves_within_column() {
        let f = setup().await;
        let a = f.cards.create(f.owner, new_card(f.todo, "A")).await.unwrap();
        f.cards.create(f.owner, new_card(f.todo, "B")).await.unwrap();
        f.cards.create(f.owner, new_card(f.todo, "C")).await.unwrap();

        f.cards
            .update(
                a.id,
                f.owner,
                UpdateCard {
                    order: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let titles: Vec<_> = orders(&f, f.todo).await.into_iter().map(|(t, _)| t).collect();
        assert_eq!(titles, ["B", "C", "A"]);
    }

    #[tokio::test]
    async fn test_watchers_and_assignee_are_populated() {
        let f = setup().await;
        let card = f.cards.create(f.owner, new_card(f.todo, "A")).await.unwrap();

        let card = f.cards.add_watcher(card.id, f.owner, f.owner).await.unwrap();
        let card = f.cards.add_watcher(card.id, f.owner, f.owner).await.unwrap();
        assert_eq!(card.watchers.len(), 1);
        assert_eq!(card.watchers[0].name, "Owner");

        let card = f.cards.assign(card.id, f.owner, f.owner).await.unwrap();
        assert_eq!(card.assignee.as_ref().map(|a| a.id), Some(f.owner));

        assert!(matches!(
            f.cards.assign(card.id, f.owner, UserId::new()).await,
            Err(ServiceError::NotFound(_))
        ));

        let card = f.cards.remove_watcher(card.id, f.owner, f.owner).await.unwrap();
        assert!(card.watchers.is_empty());
    }

    #[tokio::test]
    async fn test_outsider_is_forbidden() {
        let f = setup().await;
        let card = f.cards.create(f.owner, new_card(f.todo, "A")).await.unwrap();

        assert!(matches!(
            f.cards.find_one(card.id, f.outsider).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            f.cards.move_card(card.id, f.outsider, f.doing, 0).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            f.cards.find_one(CardId::new(), f.outsider).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_keeps_orders_dense() {
        let f = setup().await;
        let mut ids = Vec::new();
        for title in ["A", "B", "C", "D"] {
            ids.push(f.cards.create(f.owner, new_card(f.todo, title)).await.unwrap().id);
        }

        f.cards.remove(ids[1], f.owner).await.unwrap();

        let remaining = orders(&f, f.todo).await;
        assert_eq!(remaining.len(), 3);
        assert!(is_dense(remaining.iter().map(|(_, o)| *o)));
    }

    #[tokio::test]
    async fn test_store_miss_on_move_names_the_missing_entity() {
        let f = setup().await;
        let card = f.cards.create(f.owner, new_card(f.todo, "A")).await.unwrap();

        // A target column deleted after it was resolved
        match f.cards.move_resolved(card.id, ColumnId::new(), 0).await {
            Err(ServiceError::NotFound(message)) => assert_eq!(message, "Column not found"),
            other => panic!("expected missing column, got {:?}", other),
        }

        match f.cards.move_resolved(CardId::new(), f.doing, 0).await {
            Err(ServiceError::NotFound(message)) => assert_eq!(message, "Card not found"),
            other => panic!("expected missing card, got {:?}", other),
        }

        // The failed move left the card where it was
        assert_eq!(orders(&f, f.todo).await.len(), 1);
    }
}
