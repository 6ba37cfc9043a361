/// Columns
///
/// `order` is the column's dense rank within its board, see
/// [`crate::ordering`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BoardId, ColumnId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    pub board_id: BoardId,
    pub order: i32,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a column
#[derive(Debug, Clone)]
pub struct NewColumn {
    pub name: String,
    pub board_id: BoardId,

    /// Explicit slot; appended after the last column when `None`
    pub order: Option<i32>,

    pub color: Option<String>,
}

/// Column patch; `None` fields are left unchanged
///
/// A new `order` is applied through the reorder path, never written raw.
#[derive(Debug, Clone, Default)]
pub struct UpdateColumn {
    pub name: Option<String>,
    pub order: Option<i32>,
    pub color: Option<String>,
}
