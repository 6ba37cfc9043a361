/// PostgreSQL plumbing
///
/// - `pool`: connection pool with health checks
/// - `migrations`: embedded migration runner
///
/// The queries themselves live in [`crate::store::postgres`].

pub mod migrations;
pub mod pool;
