/// Cards
///
/// `order` is the card's dense rank within its column, see
/// [`crate::ordering`]. `status` is normally derived from `progress` by
/// [`CardStatus::from_progress`] on the progress endpoint; a direct status
/// edit through the card patch bypasses that derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::user::UserSummary;
use crate::ids::{CardId, ColumnId, UserId};

/// Workflow state of a card
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

impl CardStatus {
    /// Maps progress onto a status
    ///
    /// ```
    /// use taskboard_shared::models::CardStatus;
    ///
    /// assert_eq!(CardStatus::from_progress(0), CardStatus::Todo);
    /// assert_eq!(CardStatus::from_progress(37), CardStatus::InProgress);
    /// assert_eq!(CardStatus::from_progress(50), CardStatus::Review);
    /// assert_eq!(CardStatus::from_progress(100), CardStatus::Done);
    /// ```
    pub fn from_progress(progress: i32) -> Self {
        if progress >= 100 {
            CardStatus::Done
        } else if progress >= 50 {
            CardStatus::Review
        } else if progress > 0 {
            CardStatus::InProgress
        } else {
            CardStatus::Todo
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Todo => "todo",
            CardStatus::InProgress => "in-progress",
            CardStatus::Review => "review",
            CardStatus::Done => "done",
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown card status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for CardStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(CardStatus::Todo),
            "in-progress" => Ok(CardStatus::InProgress),
            "review" => Ok(CardStatus::Review),
            "done" => Ok(CardStatus::Done),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    pub description: String,
    pub column_id: ColumnId,
    pub assignee_id: Option<UserId>,
    pub order: i32,
    pub labels: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub watchers: Vec<UserId>,
    pub status: CardStatus,

    /// 0 to 100
    pub progress: i32,

    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Every user id this card references, for population
    pub fn referenced_users(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.assignee_id.into_iter().collect();
        for watcher in &self.watchers {
            if !ids.contains(watcher) {
                ids.push(*watcher);
            }
        }
        ids
    }
}

/// Card with `assignee` and `watchers` populated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardView {
    pub id: CardId,
    pub title: String,
    pub description: String,
    pub column_id: ColumnId,
    pub assignee: Option<UserSummary>,
    pub order: i32,
    pub labels: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub watchers: Vec<UserSummary>,
    pub status: CardStatus,
    pub progress: i32,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CardView {
    /// Joins a card with the summaries of the users it references
    pub fn populate(card: Card, users: &HashMap<UserId, UserSummary>) -> Self {
        Self {
            assignee: card.assignee_id.and_then(|id| users.get(&id).cloned()),
            watchers: card
                .watchers
                .iter()
                .filter_map(|id| users.get(id).cloned())
                .collect(),
            id: card.id,
            title: card.title,
            description: card.description,
            column_id: card.column_id,
            order: card.order,
            labels: card.labels,
            due_date: card.due_date,
            status: card.status,
            progress: card.progress,
            cover_image: card.cover_image,
            created_at: card.created_at,
            updated_at: card.updated_at,
        }
    }
}

/// Input for creating a card
///
/// New cards always start as [`CardStatus::Todo`] with no watchers, even
/// when an initial `progress` is given.
#[derive(Debug, Clone)]
pub struct NewCard {
    pub title: String,
    pub description: Option<String>,
    pub column_id: ColumnId,
    pub assignee_id: Option<UserId>,

    /// Explicit slot; appended after the last card when `None`
    pub order: Option<i32>,

    pub labels: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub progress: Option<i32>,
    pub cover_image: Option<String>,
}

/// Card patch; `None` fields are left unchanged
///
/// A new `order` is applied as a same-column move, never written raw.
#[derive(Debug, Clone, Default)]
pub struct UpdateCard {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee_id: Option<UserId>,
    pub order: Option<i32>,
    pub labels: Option<Vec<String>>,
    pub due_date: Option<DateTime<Utc>>,
    pub progress: Option<i32>,
    pub status: Option<CardStatus>,
    pub cover_image: Option<String>,
}
