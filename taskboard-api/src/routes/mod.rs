/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token refresh and profile
/// - `boards`: Boards and membership
/// - `columns`: Columns and column reordering
/// - `cards`: Cards, moves, watchers, assignment and progress

use std::borrow::Cow;

use validator::ValidationError;

pub mod auth;
pub mod boards;
pub mod cards;
pub mod columns;
pub mod health;

/// Accepts `#rgb` and `#rrggbb` (and the 4/8-digit alpha forms)
pub(crate) fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .strip_prefix('#')
        .map(|hex| matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("hex_color");
        err.message = Some(Cow::Borrowed("Color must be a hex color like #5048e5"));
        Err(err)
    }
}
