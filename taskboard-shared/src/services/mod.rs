//! Component services
//!
//! Each service takes the caller's [`UserId`] explicitly and re-derives board
//! access on every call by walking Card → Column → Board. A break anywhere in
//! that chain is NotFound; only a fully resolved board can yield Forbidden.
//!
//! Services hold an `Arc<dyn BoardStore>` and are cheap to clone.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ServiceResult;
use crate::ids::UserId;
use crate::models::UserSummary;
use crate::store::BoardStore;

pub mod accounts;
pub mod boards;
pub mod cards;
pub mod columns;

pub use accounts::{Accounts, AuthResponse};
pub use boards::Boards;
pub use cards::Cards;
pub use columns::Columns;

/// All four component services over one store
#[derive(Clone)]
pub struct TaskBoard {
    pub accounts: Accounts,
    pub boards: Boards,
    pub columns: Columns,
    pub cards: Cards,
    store: Arc<dyn BoardStore>,
}

impl TaskBoard {
    pub fn new(store: Arc<dyn BoardStore>, jwt_secret: impl Into<String>) -> Self {
        let boards = Boards::new(store.clone());
        let columns = Columns::new(store.clone(), boards.clone());
        let cards = Cards::new(store.clone(), columns.clone());

        Self {
            accounts: Accounts::new(store.clone(), jwt_secret),
            boards,
            columns,
            cards,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn BoardStore> {
        &self.store
    }
}

/// Loads `{id, name, email}` for every referenced user, keyed by id
async fn load_summaries(
    store: &dyn BoardStore,
    mut ids: Vec<UserId>,
) -> ServiceResult<HashMap<UserId, UserSummary>> {
    ids.sort();
    ids.dedup();

    let summaries = store.user_summaries(&ids).await?;
    Ok(summaries.into_iter().map(|s| (s.id, s)).collect())
}
