//! NutriScale Tools module
//!
//! MCP tool implementations for NutriScale.

pub mod foods;
pub mod logs;
pub mod plans;
pub mod status;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use crate::db::Database;
    pub(crate) use crate::models::user::tests::sample_user;

    /// File-backed database in a temporary directory, migrated
    pub(crate) fn test_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("test.db")).unwrap();
        (dir, db)
    }
}
