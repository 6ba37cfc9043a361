/// Boards
///
/// A board is owned by exactly one user and shared with a member set. The
/// owner is always part of `members` (inserted at creation), but access
/// checks treat ownership and membership separately so a board whose member
/// list lost the owner still admits them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::user::UserSummary;
use crate::ids::{BoardId, UserId};

/// Color given to boards created without one
pub const DEFAULT_BOARD_COLOR: &str = "#5048e5";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    pub description: String,
    pub color: String,
    pub owner_id: UserId,

    /// Member set in insertion order, owner included
    pub members: Vec<UserId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Board {
    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.members.contains(&user_id)
    }

    /// Owner or member
    pub fn has_access(&self, user_id: UserId) -> bool {
        self.is_owner(user_id) || self.is_member(user_id)
    }

    /// Every user id this board references, for population
    pub fn referenced_users(&self) -> Vec<UserId> {
        let mut ids = Vec::with_capacity(self.members.len() + 1);
        ids.push(self.owner_id);
        ids.extend(self.members.iter().copied().filter(|&id| id != self.owner_id));
        ids
    }
}

/// Board with `owner` and `members` populated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardView {
    pub id: BoardId,
    pub name: String,
    pub description: String,
    pub color: String,
    pub owner: UserSummary,
    pub members: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoardView {
    /// Joins a board with the summaries of the users it references
    ///
    /// Member ids with no summary are dropped. Users are never deleted, so
    /// in practice every reference resolves; an unresolved owner keeps its id
    /// with empty name and email.
    pub fn populate(board: Board, users: &HashMap<UserId, UserSummary>) -> Self {
        let owner = users.get(&board.owner_id).cloned().unwrap_or(UserSummary {
            id: board.owner_id,
            name: String::new(),
            email: String::new(),
        });

        let members = board
            .members
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect();

        Self {
            id: board.id,
            name: board.name,
            description: board.description,
            color: board.color,
            owner,
            members,
            created_at: board.created_at,
            updated_at: board.updated_at,
        }
    }
}

/// Input for creating a board
#[derive(Debug, Clone, Default)]
pub struct CreateBoard {
    pub name: String,

    /// Defaults to the empty string
    pub description: Option<String>,

    /// Defaults to [`DEFAULT_BOARD_COLOR`]
    pub color: Option<String>,
}

/// Board patch; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateBoard {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}
