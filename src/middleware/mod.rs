/// Middleware module
///
/// Access-token guard for protected scopes.

mod access_guard;

pub use access_guard::{AccessGuard, Identity};
