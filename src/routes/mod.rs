mod health_check;
mod me;
mod session;

pub use health_check::health_check;
pub use me::current_principal;
pub use session::{logout, refresh, session};
