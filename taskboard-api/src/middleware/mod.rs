/// Middleware modules for the API server
///
/// Bearer-token authentication lives in `taskboard_shared::auth::middleware`;
/// this crate only adds response hardening.

pub mod security;
