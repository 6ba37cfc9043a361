/// Domain models
///
/// Plain data types shared by the services and both storage backends. Every
/// cross-reference is a typed ID from [`crate::ids`]; the `*View` types carry
/// the populated `{id, name, email}` form of those references.
///
/// # Models
///
/// - `user`: accounts and the populated [`UserSummary`](user::UserSummary)
/// - `board`: boards with owner and member set
/// - `column`: ordered columns within a board
/// - `card`: ordered cards within a column, plus [`CardStatus`](card::CardStatus)

pub mod board;
pub mod card;
pub mod column;
pub mod user;

pub use board::{Board, BoardView, CreateBoard, UpdateBoard};
pub use card::{Card, CardStatus, CardView, NewCard, UpdateCard};
pub use column::{Column, NewColumn, UpdateColumn};
pub use user::{CreateUser, User, UserSummary};
