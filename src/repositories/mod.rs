pub mod file_repository;
pub mod user_repository;

pub use file_repository::{FileRepository, NewFile, PgFileRepository};
pub use user_repository::{NewUser, UserRepository, UserChanges};
