// ABOUTME: Filesystem locations shared across Casebook packages
// ABOUTME: Resolves the data directory and the default SQLite database path

use std::env;
use std::path::PathBuf;

/// File name of the SQLite database inside the data directory
pub const DATABASE_FILE_NAME: &str = "casebook.db";

/// Get the path to the Casebook data directory (~/.casebook)
pub fn casebook_dir() -> PathBuf {
    // HOME first so tests can redirect it
    if let Ok(home) = env::var("HOME") {
        return PathBuf::from(home).join(".casebook");
    }

    dirs::home_dir()
        .unwrap_or_else(env::temp_dir)
        .join(".casebook")
}

/// Get the default database path (~/.casebook/casebook.db)
pub fn default_database_path() -> PathBuf {
    casebook_dir().join(DATABASE_FILE_NAME)
}
