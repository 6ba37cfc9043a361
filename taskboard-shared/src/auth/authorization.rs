/// Board access checks
///
/// Every board, column and card operation resolves its parent board first
/// and then runs one of these checks against it. They are pure functions over
/// a loaded [`Board`], so the "missing entity" case is already handled (as
/// NotFound) by the time a check can fail with [`AuthzError`].
///
/// # Permission Model
///
/// | Action                                  | Who                      |
/// |-----------------------------------------|--------------------------|
/// | read board, any column or card action   | owner or member          |
/// | update/delete board, add member         | owner                    |
/// | remove member                           | owner, or the member self|
/// | remove the owner                        | nobody                   |
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::{require_board_access, require_board_owner};
/// use taskboard_shared::ids::UserId;
/// use taskboard_shared::models::Board;
///
/// fn rename_allowed(board: &Board, caller: UserId) -> bool {
///     require_board_access(board, caller).is_ok() && require_board_owner(board, caller).is_ok()
/// }
/// ```

use crate::ids::{BoardId, UserId};
use crate::models::Board;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller is neither owner nor member
    #[error("No access to board {0}")]
    NoAccess(BoardId),

    /// Owner-only action attempted by someone else
    #[error("Only the board owner can do this")]
    NotOwner,

    /// Removing the owner from their own board
    #[error("The board owner cannot be removed")]
    OwnerRemoval,

    /// Removing another member without being the owner
    #[error("Only the board owner can remove other members")]
    NotOwnerOrSelf,
}

/// Whether `user_id` may see and work on the board
pub fn has_board_access(board: &Board, user_id: UserId) -> bool {
    board.has_access(user_id)
}

pub fn require_board_access(board: &Board, user_id: UserId) -> Result<(), AuthzError> {
    if !has_board_access(board, user_id) {
        tracing::warn!(board_id = %board.id, user_id = %user_id, "Board access denied");
        return Err(AuthzError::NoAccess(board.id));
    }
    Ok(())
}

pub fn require_board_owner(board: &Board, user_id: UserId) -> Result<(), AuthzError> {
    if !board.is_owner(user_id) {
        tracing::warn!(board_id = %board.id, user_id = %user_id, "Owner-only action denied");
        return Err(AuthzError::NotOwner);
    }
    Ok(())
}

/// Checks that `caller` may remove `member` from the board
///
/// The owner can never be removed, whoever asks. Otherwise the owner may
/// remove anyone and a member may remove themselves.
pub fn require_member_removal(
    board: &Board,
    caller: UserId,
    member: UserId,
) -> Result<(), AuthzError> {
    if board.is_owner(member) {
        tracing::warn!(board_id = %board.id, caller = %caller, "Attempt to remove board owner");
        return Err(AuthzError::OwnerRemoval);
    }

    if !board.is_owner(caller) && caller != member {
        tracing::warn!(board_id = %board.id, caller = %caller, member = %member, "Member removal denied");
        return Err(AuthzError::NotOwnerOrSelf);
    }

    Ok(())
}
