// ABOUTME: Core constants and utilities for Casebook
// ABOUTME: Foundational package shared by storage, domain, and API packages

pub mod constants;
pub mod utils;

// Re-export constants
pub use constants::{casebook_dir, default_database_path, DATABASE_FILE_NAME};

// Re-export utilities
pub use utils::{generate_id, normalize_text, truncate};
