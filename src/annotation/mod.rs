pub(crate) mod crud;
pub mod dto;
mod session;
mod store;

pub use session::{Export, Session};
pub use store::{clean_expired_sessions, SessionStore};
