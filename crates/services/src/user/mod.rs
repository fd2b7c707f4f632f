pub mod ports;

pub use ports::{UpsertUserParams, User, UserRepository};
