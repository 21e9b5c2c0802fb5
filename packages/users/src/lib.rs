// ABOUTME: User accounts for Casebook
// ABOUTME: Types and SQLite storage for users and their workflow roles

pub mod storage;
pub mod types;

pub use storage::UserStorage;
pub use types::{ParseRoleError, User, UserCreateInput, UserRole};
