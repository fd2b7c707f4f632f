pub mod ports;
pub mod tokens;

pub use ports::{SessionRepository, UserSession, SESSION_TTL_DAYS};
pub use tokens::{generate_session_token, hash_session_token, is_well_formed_session_token};
