//! PostgreSQL [`BoardStore`]
//!
//! # Locking
//!
//! Column ordering operations lock the parent `boards` row and card ordering
//! operations lock the parent `board_columns` row(s) with `SELECT ... FOR
//! UPDATE` before reading any order value. All range shifts and the final
//! write then happen in the same transaction, so concurrent reorders on one
//! board or column queue up behind each other instead of interleaving.
//!
//! A cross-column move locks both columns in ascending id order. Because a
//! card can change column between the unlocked read that finds its column
//! and the lock, the card row is re-read `FOR UPDATE` after locking and the
//! lock is retried if it moved.
//!
//! The dense rank is stored in a column named `position`; `order` is reserved
//! in SQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{BoardStore, StoreResult};
use crate::db::pool::health_check;
use crate::error::StoreError;
use crate::ids::{to_uuids, BoardId, CardId, ColumnId, UserId};
use crate::models::board::DEFAULT_BOARD_COLOR;
use crate::models::{
    Board, Card, CardStatus, Column, CreateBoard, CreateUser, NewCard, NewColumn, UpdateBoard,
    UpdateCard, UpdateColumn, User, UserSummary,
};
use crate::ordering::{clamp_order, close_gap, next_order, open_gap, reorder_shift, RangeShift};

/// How often a card lock is retried when the card keeps changing column
const CARD_LOCK_ATTEMPTS: usize = 3;

const USER_SELECT: &str = "SELECT id, email::text AS email, password_hash, name, role, avatar, \
     created_at, updated_at FROM users";

const BOARD_SELECT: &str = "SELECT b.id, b.name, b.description, b.color, b.owner_id, \
     ARRAY(SELECT m.user_id FROM board_members m WHERE m.board_id = b.id \
           ORDER BY m.added_at) AS members, \
     b.created_at, b.updated_at FROM boards b";

const COLUMN_SELECT: &str =
    "SELECT id, name, board_id, position, color, created_at, updated_at FROM board_columns";

const CARD_SELECT: &str = "SELECT c.id, c.title, c.description, c.column_id, c.assignee_id, \
     c.position, c.labels, c.due_date, \
     ARRAY(SELECT w.user_id FROM card_watchers w WHERE w.card_id = c.id \
           ORDER BY w.added_at) AS watchers, \
     c.status, c.progress, c.cover_image, c.created_at, c.updated_at FROM cards c";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: String,
    role: String,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id.into(),
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            role: row.role,
            avatar: row.avatar,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BoardRow {
    id: Uuid,
    name: String,
    description: String,
    color: String,
    owner_id: Uuid,
    members: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BoardRow> for Board {
    fn from(row: BoardRow) -> Self {
        Board {
            id: row.id.into(),
            name: row.name,
            description: row.description,
            color: row.color,
            owner_id: row.owner_id.into(),
            members: row.members.into_iter().map(UserId::from).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ColumnRow {
    id: Uuid,
    name: String,
    board_id: Uuid,
    position: i32,
    color: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ColumnRow> for Column {
    fn from(row: ColumnRow) -> Self {
        Column {
            id: row.id.into(),
            name: row.name,
            board_id: row.board_id.into(),
            order: row.position,
            color: row.color,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CardRow {
    id: Uuid,
    title: String,
    description: String,
    column_id: Uuid,
    assignee_id: Option<Uuid>,
    position: i32,
    labels: Vec<String>,
    due_date: Option<DateTime<Utc>>,
    watchers: Vec<Uuid>,
    status: String,
    progress: i32,
    cover_image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CardRow> for Card {
    type Error = StoreError;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<CardStatus>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(Card {
            id: row.id.into(),
            title: row.title,
            description: row.description,
            column_id: row.column_id.into(),
            assignee_id: row.assignee_id.map(UserId::from),
            order: row.position,
            labels: row.labels,
            due_date: row.due_date,
            watchers: row.watchers.into_iter().map(UserId::from).collect(),
            status,
            progress: row.progress,
            cover_image: row.cover_image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn cards_from_rows(rows: Vec<CardRow>) -> StoreResult<Vec<Card>> {
    rows.into_iter().map(Card::try_from).collect()
}

/// A card whose column(s) are locked for the rest of the transaction
struct LockedCard {
    column_id: ColumnId,
    position: i32,

    /// Whether the requested target column exists (and is now locked)
    target_locked: bool,
}

/// [`BoardStore`] backed by PostgreSQL through sqlx
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_column(conn: &mut PgConnection, id: ColumnId) -> StoreResult<Option<Column>> {
        let sql = format!("{} WHERE id = $1", COLUMN_SELECT);
        let row = sqlx::query_as::<_, ColumnRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(conn)
            .await?;
        Ok(row.map(Column::from))
    }

    async fn fetch_card(conn: &mut PgConnection, id: CardId) -> StoreResult<Option<Card>> {
        let sql = format!("{} WHERE c.id = $1", CARD_SELECT);
        let row = sqlx::query_as::<_, CardRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(conn)
            .await?;
        row.map(Card::try_from).transpose()
    }

    /// Locks the board row; `false` if the board does not exist
    async fn lock_board(conn: &mut PgConnection, id: BoardId) -> StoreResult<bool> {
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM boards WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(conn)
                .await?;
        Ok(locked.is_some())
    }

    /// Locks column rows in ascending id order and returns the ids locked
    async fn lock_columns(
        conn: &mut PgConnection,
        ids: &[ColumnId],
    ) -> StoreResult<Vec<ColumnId>> {
        let locked: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM board_columns WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(to_uuids(ids))
        .fetch_all(conn)
        .await?;
        Ok(locked.into_iter().map(ColumnId::from).collect())
    }

    /// Locks the card's current column (and `target`, if given), then the card
    async fn lock_card(
        tx: &mut Transaction<'static, Postgres>,
        id: CardId,
        target: Option<ColumnId>,
    ) -> StoreResult<Option<LockedCard>> {
        for attempt in 1..=CARD_LOCK_ATTEMPTS {
            let current: Option<Uuid> =
                sqlx::query_scalar("SELECT column_id FROM cards WHERE id = $1")
                    .bind(id.as_uuid())
                    .fetch_optional(&mut **tx)
                    .await?;
            let Some(current) = current.map(ColumnId::from) else {
                return Ok(None);
            };

            let mut wanted = vec![current];
            if let Some(target) = target.filter(|&t| t != current) {
                wanted.push(target);
            }
            let locked = Self::lock_columns(&mut **tx, &wanted).await?;

            let row: Option<(Uuid, i32)> =
                sqlx::query_as("SELECT column_id, position FROM cards WHERE id = $1 FOR UPDATE")
                    .bind(id.as_uuid())
                    .fetch_optional(&mut **tx)
                    .await?;
            let Some((column_id, position)) = row else {
                return Ok(None);
            };

            let column_id = ColumnId::from(column_id);
            if column_id == current {
                return Ok(Some(LockedCard {
                    column_id,
                    position,
                    target_locked: target.map_or(true, |t| locked.contains(&t)),
                }));
            }

            debug!(card_id = %id, attempt, "Card changed column while locking, retrying");
        }

        Err(StoreError::Conflict(format!(
            "Card {} is being moved concurrently",
            id
        )))
    }

    async fn count_columns(conn: &mut PgConnection, board_id: BoardId) -> StoreResult<i32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM board_columns WHERE board_id = $1")
            .bind(board_id.as_uuid())
            .fetch_one(conn)
            .await?;
        Ok(count as i32)
    }

    async fn count_cards(conn: &mut PgConnection, column_id: ColumnId) -> StoreResult<i32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cards WHERE column_id = $1")
            .bind(column_id.as_uuid())
            .fetch_one(conn)
            .await?;
        Ok(count as i32)
    }

    async fn shift_columns(
        conn: &mut PgConnection,
        board_id: BoardId,
        shift: RangeShift,
        except: ColumnId,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE board_columns SET position = position + $1, updated_at = NOW() \
             WHERE board_id = $2 AND position BETWEEN $3 AND $4 AND id <> $5",
        )
        .bind(shift.delta)
        .bind(board_id.as_uuid())
        .bind(shift.lower)
        .bind(shift.upper)
        .bind(except.as_uuid())
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    async fn shift_cards(
        conn: &mut PgConnection,
        column_id: ColumnId,
        shift: RangeShift,
        except: CardId,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE cards SET position = position + $1, updated_at = NOW() \
             WHERE column_id = $2 AND position BETWEEN $3 AND $4 AND id <> $5",
        )
        .bind(shift.delta)
        .bind(column_id.as_uuid())
        .bind(shift.lower)
        .bind(shift.upper)
        .bind(except.as_uuid())
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl BoardStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, input: CreateUser) -> StoreResult<User> {
        let sql = "INSERT INTO users (id, email, password_hash, name) VALUES ($1, $2, $3, $4) \
                   RETURNING id, email::text AS email, password_hash, name, role, avatar, \
                   created_at, updated_at";

        let row = sqlx::query_as::<_, UserRow>(sql)
            .bind(Uuid::new_v4())
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict("Email already registered".to_string())
                } else {
                    StoreError::Database(e)
                }
            })?;

        Ok(row.into())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("{} WHERE email = $1::citext", USER_SELECT);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let sql = format!("{} WHERE id = $1", USER_SELECT);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn user_summaries(&self, ids: &[UserId]) -> StoreResult<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(Uuid, String, String)> =
            sqlx::query_as("SELECT id, name, email::text FROM users WHERE id = ANY($1)")
                .bind(to_uuids(ids))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, email)| UserSummary {
                id: id.into(),
                name,
                email,
            })
            .collect())
    }

    async fn create_board(&self, owner_id: UserId, input: CreateBoard) -> StoreResult<Board> {
        let id = BoardId::new();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO boards (id, name, description, color, owner_id) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id.as_uuid())
        .bind(&input.name)
        .bind(input.description.unwrap_or_default())
        .bind(input.color.unwrap_or_else(|| DEFAULT_BOARD_COLOR.to_string()))
        .bind(owner_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO board_members (board_id, user_id) VALUES ($1, $2)")
            .bind(id.as_uuid())
            .bind(owner_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        let sql = format!("{} WHERE b.id = $1", BOARD_SELECT);
        let row = sqlx::query_as::<_, BoardRow>(&sql)
            .bind(id.as_uuid())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn find_board(&self, id: BoardId) -> StoreResult<Option<Board>> {
        let sql = format!("{} WHERE b.id = $1", BOARD_SELECT);
        let row = sqlx::query_as::<_, BoardRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Board::from))
    }

    async fn list_boards_for_user(&self, user_id: UserId) -> StoreResult<Vec<Board>> {
        let sql = format!(
            "{} WHERE b.owner_id = $1 OR EXISTS ( \
                 SELECT 1 FROM board_members m WHERE m.board_id = b.id AND m.user_id = $1) \
             ORDER BY b.created_at, b.id",
            BOARD_SELECT
        );
        let rows = sqlx::query_as::<_, BoardRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Board::from).collect())
    }

    async fn update_board(&self, id: BoardId, input: UpdateBoard) -> StoreResult<Option<Board>> {
        let result = sqlx::query(
            "UPDATE boards SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 color = COALESCE($4, color), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(input.name)
        .bind(input.description)
        .bind(input.color)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_board(id).await
    }

    async fn delete_board(&self, id: BoardId) -> StoreResult<bool> {
        // Columns, cards, members and watchers go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        debug!(board_id = %id, deleted = result.rows_affected(), "Deleted board");
        Ok(result.rows_affected() > 0)
    }

    async fn add_board_member(&self, id: BoardId, user_id: UserId) -> StoreResult<Option<Board>> {
        sqlx::query(
            "INSERT INTO board_members (board_id, user_id) \
             SELECT $1, $2 WHERE EXISTS (SELECT 1 FROM boards WHERE id = $1) \
             ON CONFLICT DO NOTHING",
        )
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await?;

        self.find_board(id).await
    }

    async fn remove_board_member(
        &self,
        id: BoardId,
        user_id: UserId,
    ) -> StoreResult<Option<Board>> {
        sqlx::query("DELETE FROM board_members WHERE board_id = $1 AND user_id = $2")
            .bind(id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        self.find_board(id).await
    }

    async fn insert_column(&self, input: NewColumn) -> StoreResult<Option<Column>> {
        let mut tx = self.pool.begin().await?;
        if !Self::lock_board(&mut tx, input.board_id).await? {
            return Ok(None);
        }

        let order = match input.order {
            Some(order) => order,
            None => {
                let max: Option<i32> =
                    sqlx::query_scalar("SELECT MAX(position) FROM board_columns WHERE board_id = $1")
                        .bind(input.board_id.as_uuid())
                        .fetch_one(&mut *tx)
                        .await?;
                next_order(max)
            }
        };

        let sql = "INSERT INTO board_columns (id, name, board_id, position, color) \
                   VALUES ($1, $2, $3, $4, $5) \
                   RETURNING id, name, board_id, position, color, created_at, updated_at";
        let row = sqlx::query_as::<_, ColumnRow>(sql)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(input.board_id.as_uuid())
            .bind(order)
            .bind(&input.color)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        let column = Column::from(row);
        debug!(column_id = %column.id, board_id = %column.board_id, order, "Inserted column");
        Ok(Some(column))
    }

    async fn find_column(&self, id: ColumnId) -> StoreResult<Option<Column>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_column(&mut conn, id).await
    }

    async fn list_columns(&self, board_id: BoardId) -> StoreResult<Vec<Column>> {
        let sql = format!("{} WHERE board_id = $1 ORDER BY position, created_at", COLUMN_SELECT);
        let rows = sqlx::query_as::<_, ColumnRow>(&sql)
            .bind(board_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Column::from).collect())
    }

    async fn update_column(
        &self,
        id: ColumnId,
        input: &UpdateColumn,
    ) -> StoreResult<Option<Column>> {
        let sql = "UPDATE board_columns SET \
                       name = COALESCE($2, name), \
                       color = COALESCE($3, color), \
                       updated_at = NOW() \
                   WHERE id = $1 \
                   RETURNING id, name, board_id, position, color, created_at, updated_at";
        let row = sqlx::query_as::<_, ColumnRow>(sql)
            .bind(id.as_uuid())
            .bind(&input.name)
            .bind(&input.color)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Column::from))
    }

    async fn delete_column(&self, id: ColumnId) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Columns never change board, so the unlocked read is stable
        let Some(column) = Self::fetch_column(&mut tx, id).await? else {
            return Ok(false);
        };
        if !Self::lock_board(&mut tx, column.board_id).await? {
            return Ok(false);
        }

        let deleted: Option<i32> =
            sqlx::query_scalar("DELETE FROM board_columns WHERE id = $1 RETURNING position")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        let Some(position) = deleted else {
            return Ok(false);
        };

        let shifted = Self::shift_columns(&mut tx, column.board_id, close_gap(position), id).await?;
        tx.commit().await?;

        debug!(column_id = %id, order = position, shifted, "Deleted column");
        Ok(true)
    }

    async fn reorder_column(&self, id: ColumnId, new_order: i32) -> StoreResult<Option<Column>> {
        let mut tx = self.pool.begin().await?;

        let Some(column) = Self::fetch_column(&mut tx, id).await? else {
            return Ok(None);
        };
        if !Self::lock_board(&mut tx, column.board_id).await? {
            return Ok(None);
        }

        // Re-read under the board lock
        let Some(column) = Self::fetch_column(&mut tx, id).await? else {
            return Ok(None);
        };

        let old_order = column.order;
        let count = Self::count_columns(&mut tx, column.board_id).await?;
        let new_order = clamp_order(new_order, count - 1);
        let Some(shift) = reorder_shift(old_order, new_order) else {
            return Ok(Some(column));
        };

        let shifted = Self::shift_columns(&mut tx, column.board_id, shift, id).await?;

        let sql = "UPDATE board_columns SET position = $2, updated_at = NOW() WHERE id = $1 \
                   RETURNING id, name, board_id, position, color, created_at, updated_at";
        let row = sqlx::query_as::<_, ColumnRow>(sql)
            .bind(id.as_uuid())
            .bind(new_order)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(column_id = %id, old_order, new_order, shifted, "Reordered column");
        Ok(Some(row.into()))
    }

    async fn insert_card(&self, input: NewCard) -> StoreResult<Option<Card>> {
        let mut tx = self.pool.begin().await?;
        if Self::lock_columns(&mut tx, &[input.column_id]).await?.is_empty() {
            return Ok(None);
        }

        let order = match input.order {
            Some(order) => order,
            None => {
                let max: Option<i32> =
                    sqlx::query_scalar("SELECT MAX(position) FROM cards WHERE column_id = $1")
                        .bind(input.column_id.as_uuid())
                        .fetch_one(&mut *tx)
                        .await?;
                next_order(max)
            }
        };

        let id = CardId::new();
        sqlx::query(
            "INSERT INTO cards (id, title, description, column_id, assignee_id, position, \
                                labels, due_date, status, progress, cover_image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(id.as_uuid())
        .bind(&input.title)
        .bind(input.description.unwrap_or_default())
        .bind(input.column_id.as_uuid())
        .bind(input.assignee_id.map(Uuid::from))
        .bind(order)
        .bind(&input.labels)
        .bind(input.due_date)
        .bind(CardStatus::Todo.as_str())
        .bind(input.progress.unwrap_or(0))
        .bind(&input.cover_image)
        .execute(&mut *tx)
        .await?;

        let card = Self::fetch_card(&mut tx, id).await?;
        tx.commit().await?;

        debug!(card_id = %id, column_id = %input.column_id, order, "Inserted card");
        Ok(card)
    }

    async fn find_card(&self, id: CardId) -> StoreResult<Option<Card>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_card(&mut conn, id).await
    }

    async fn list_cards(&self, column_id: ColumnId) -> StoreResult<Vec<Card>> {
        let sql = format!(
            "{} WHERE c.column_id = $1 ORDER BY c.position, c.created_at",
            CARD_SELECT
        );
        let rows = sqlx::query_as::<_, CardRow>(&sql)
            .bind(column_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        cards_from_rows(rows)
    }

    async fn list_cards_in_columns(&self, column_ids: &[ColumnId]) -> StoreResult<Vec<Card>> {
        if column_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{} WHERE c.column_id = ANY($1) \
             ORDER BY c.position, array_position($1, c.column_id), c.created_at",
            CARD_SELECT
        );
        let rows = sqlx::query_as::<_, CardRow>(&sql)
            .bind(to_uuids(column_ids))
            .fetch_all(&self.pool)
            .await?;
        cards_from_rows(rows)
    }

    async fn update_card(&self, id: CardId, input: &UpdateCard) -> StoreResult<Option<Card>> {
        let result = sqlx::query(
            "UPDATE cards SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 assignee_id = COALESCE($4, assignee_id), \
                 labels = COALESCE($5, labels), \
                 due_date = COALESCE($6, due_date), \
                 progress = COALESCE($7, progress), \
                 status = COALESCE($8, status), \
                 cover_image = COALESCE($9, cover_image), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.assignee_id.map(Uuid::from))
        .bind(&input.labels)
        .bind(input.due_date)
        .bind(input.progress)
        .bind(input.status.map(|s| s.as_str()))
        .bind(&input.cover_image)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_card(id).await
    }

    async fn delete_card(&self, id: CardId) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let Some(locked) = Self::lock_card(&mut tx, id, None).await? else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        let shifted =
            Self::shift_cards(&mut tx, locked.column_id, close_gap(locked.position), id).await?;
        tx.commit().await?;

        debug!(card_id = %id, column_id = %locked.column_id, order = locked.position, shifted, "Deleted card");
        Ok(true)
    }

    async fn move_card(
        &self,
        id: CardId,
        target_column: ColumnId,
        new_order: i32,
    ) -> StoreResult<Option<Card>> {
        let mut tx = self.pool.begin().await?;
        let Some(locked) = Self::lock_card(&mut tx, id, Some(target_column)).await? else {
            return Ok(None);
        };
        if !locked.target_locked {
            return Ok(None);
        }

        let source_column = locked.column_id;
        let old_order = locked.position;

        let new_order = if source_column == target_column {
            let count = Self::count_cards(&mut tx, source_column).await?;
            let new_order = clamp_order(new_order, count - 1);
            let Some(shift) = reorder_shift(old_order, new_order) else {
                return Self::fetch_card(&mut tx, id).await;
            };
            Self::shift_cards(&mut tx, source_column, shift, id).await?;
            new_order
        } else {
            let count = Self::count_cards(&mut tx, target_column).await?;
            let new_order = clamp_order(new_order, count);
            Self::shift_cards(&mut tx, source_column, close_gap(old_order), id).await?;
            Self::shift_cards(&mut tx, target_column, open_gap(new_order), id).await?;
            new_order
        };

        sqlx::query(
            "UPDATE cards SET column_id = $2, position = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(target_column.as_uuid())
        .bind(new_order)
        .execute(&mut *tx)
        .await?;

        let card = Self::fetch_card(&mut tx, id).await?;
        tx.commit().await?;

        debug!(
            card_id = %id,
            source_column = %source_column,
            target_column = %target_column,
            old_order,
            new_order,
            "Moved card"
        );
        Ok(card)
    }

    async fn add_card_watcher(&self, id: CardId, user_id: UserId) -> StoreResult<Option<Card>> {
        sqlx::query(
            "INSERT INTO card_watchers (card_id, user_id) \
             SELECT $1, $2 WHERE EXISTS (SELECT 1 FROM cards WHERE id = $1) \
             ON CONFLICT DO NOTHING",
        )
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await?;

        self.find_card(id).await
    }

    async fn remove_card_watcher(
        &self,
        id: CardId,
        user_id: UserId,
    ) -> StoreResult<Option<Card>> {
        sqlx::query("DELETE FROM card_watchers WHERE card_id = $1 AND user_id = $2")
            .bind(id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        self.find_card(id).await
    }

    async fn assign_card(&self, id: CardId, assignee_id: UserId) -> StoreResult<Option<Card>> {
        let result =
            sqlx::query("UPDATE cards SET assignee_id = $2, updated_at = NOW() WHERE id = $1")
                .bind(id.as_uuid())
                .bind(assignee_id.as_uuid())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_card(id).await
    }

    async fn set_card_progress(
        &self,
        id: CardId,
        progress: i32,
        status: CardStatus,
    ) -> StoreResult<Option<Card>> {
        let result = sqlx::query(
            "UPDATE cards SET progress = $2, status = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(progress)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_card(id).await
    }
}
