//! User model
//!
//! A registered user and the biometric profile the estimator runs on.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::{ActivityLevel, Gender, Profile, ProfileError};

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub target_weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for registering a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub target_weight_kg: f64,
    #[serde(default)]
    pub activity_level: ActivityLevel,
}

impl User {
    /// Create a User from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            name: row.get("name")?,
            age: row.get("age")?,
            gender: Gender::from_str(row.get::<_, String>("gender")?.as_str()),
            height_cm: row.get("height_cm")?,
            weight_kg: row.get("weight_kg")?,
            target_weight_kg: row.get("target_weight_kg")?,
            activity_level: ActivityLevel::from_str(
                row.get::<_, String>("activity_level")?.as_str(),
            ),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Profile for the metabolic estimator
    pub fn profile(&self) -> Result<Profile, ProfileError> {
        Profile::new(
            self.weight_kg,
            self.height_cm,
            self.age,
            self.gender,
            self.activity_level,
            self.target_weight_kg,
        )
    }

    /// Insert a new user
    pub fn create(conn: &Connection, data: &UserCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO users (
                username, name, age, gender, height_cm, weight_kg,
                target_weight_kg, activity_level
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                data.username,
                data.name,
                data.age,
                data.gender.as_str(),
                data.height_cm,
                data.weight_kg,
                data.target_weight_kg,
                data.activity_level.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a user by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a user by username (case-insensitive)
    pub fn get_by_username(conn: &Connection, username: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE username = ?1 COLLATE NOCASE")?;

        let result = stmt.query_row([username.trim()], Self::from_row);
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all users ordered by username
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM users ORDER BY username ASC")?;
        let users = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Record a new current weight
    pub fn update_weight(conn: &Connection, id: i64, weight_kg: f64) -> DbResult<Option<Self>> {
        conn.execute(
            "UPDATE users SET weight_kg = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![weight_kg, id],
        )?;
        Self::get_by_id(conn, id)
    }

    /// Delete a user along with their logs and plans
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Count registered users
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    pub(crate) fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    pub(crate) fn sample_user(username: &str) -> UserCreate {
        UserCreate {
            username: username.to_string(),
            name: "Sam Example".to_string(),
            age: 30,
            gender: Gender::Male,
            height_cm: 175.0,
            weight_kg: 70.0,
            target_weight_kg: 65.0,
            activity_level: ActivityLevel::Moderate,
        }
    }

    #[test]
    fn test_create_and_lookup_case_insensitive() {
        let conn = test_conn();
        let user = User::create(&conn, &sample_user("sam")).unwrap();
        assert_eq!(user.gender, Gender::Male);
        assert_eq!(user.activity_level, ActivityLevel::Moderate);

        let found = User::get_by_username(&conn, "SAM").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(User::get_by_username(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let conn = test_conn();
        User::create(&conn, &sample_user("sam")).unwrap();
        assert!(User::create(&conn, &sample_user("Sam")).is_err());
    }

    #[test]
    fn test_update_weight_and_profile() {
        let conn = test_conn();
        let user = User::create(&conn, &sample_user("sam")).unwrap();
        let updated = User::update_weight(&conn, user.id, 68.5).unwrap().unwrap();
        assert_eq!(updated.weight_kg, 68.5);

        let profile = updated.profile().unwrap();
        assert_eq!(profile.weight_kg, 68.5);
        assert_eq!(profile.target_weight_kg, 65.0);
    }

    #[test]
    fn test_list_count_delete() {
        let conn = test_conn();
        let a = User::create(&conn, &sample_user("bea")).unwrap();
        User::create(&conn, &sample_user("al")).unwrap();
        let names: Vec<_> = User::list(&conn).unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["al", "bea"]);
        assert!(User::delete(&conn, a.id).unwrap());
        assert_eq!(User::count(&conn).unwrap(), 1);
    }
}
