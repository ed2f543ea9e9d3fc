pub mod memory;
pub mod repo;
pub mod repo_types;

pub use repo::{PgUsers, UserStore};
pub use repo_types::{CreateUserError, NewUser, ProfilePatch, User};
