//! User MCP Tools
//!
//! Registration and profile maintenance.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::Database;
use crate::models::{CustomPlan, DailyLog, User, UserCreate};
use crate::nutrition::{ActivityLevel, Gender, Profile};

/// Summary of a user for list results
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
        }
    }
}

/// Last saved log, shown alongside a user's profile
#[derive(Debug, Serialize)]
pub struct LastLogSummary {
    pub date: String,
    pub total_calories: i64,
    pub foods: String,
}

/// Full user detail
#[derive(Debug, Serialize)]
pub struct UserDetail {
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
    pub last_log: Option<LastLogSummary>,
}

impl UserDetail {
    fn from_user(user: User, last_log: Option<LastLogSummary>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            age: user.age,
            gender: user.gender,
            height_cm: user.height_cm,
            weight_kg: user.weight_kg,
            target_weight_kg: user.target_weight_kg,
            activity_level: user.activity_level,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_log,
        }
    }
}

/// Response for register_user
#[derive(Debug, Serialize)]
pub struct RegisterUserResponse {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

/// Response for list_users
#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserSummary>,
    pub total: usize,
}

/// Response for update_user_weight
#[derive(Debug, Serialize)]
pub struct UpdateWeightResponse {
    pub success: bool,
    pub username: String,
    pub weight_kg: f64,
    pub updated_at: String,
}

/// Response for delete_user
#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub username: String,
    pub deleted: bool,
    pub logs_removed: usize,
    pub plans_removed: usize,
}

const MAX_USERNAME_LEN: usize = 64;

/// Usernames name export files, so they must stay a single plain path component
pub(crate) fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(format!(
            "Username cannot be longer than {} characters",
            MAX_USERNAME_LEN
        ));
    }
    if username.starts_with('.') || username.contains("..") {
        return Err(format!("Username '{}' cannot start with '.' or contain '..'", username));
    }
    if let Some(bad) = username
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(format!(
            "Username '{}' contains {:?}; use letters, digits, '_', '-' or '.'",
            username.escape_debug(),
            bad
        ));
    }
    Ok(())
}

/// Look up a user or fail with a readable message
pub(crate) fn load_user(conn: &Connection, username: &str) -> Result<User, String> {
    find_user(conn, username)?.ok_or_else(|| format!("User '{}' not found", username.trim()))
}

/// Username lookup ignoring case beyond ASCII, which SQLite's NOCASE misses
fn find_user(conn: &Connection, username: &str) -> Result<Option<User>, String> {
    if let Some(user) =
        User::get_by_username(conn, username).map_err(|e| format!("Database error: {}", e))?
    {
        return Ok(Some(user));
    }
    let wanted = username.trim().to_lowercase();
    let users = User::list(conn).map_err(|e| format!("Database error: {}", e))?;
    Ok(users
        .into_iter()
        .find(|user| user.username.to_lowercase() == wanted))
}

/// Register a new user
pub fn register_user(db: &Database, data: UserCreate) -> Result<RegisterUserResponse, String> {
    let username = data.username.trim();
    validate_username(username)?;
    if data.name.trim().is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    Profile::new(
        data.weight_kg,
        data.height_cm,
        data.age,
        data.gender,
        data.activity_level,
        data.target_weight_kg,
    )
    .map_err(|e| format!("Invalid profile: {}", e))?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if find_user(&conn, username)?.is_some() {
        return Err(format!("Username '{}' already exists", username));
    }

    let data = UserCreate {
        username: username.to_string(),
        name: data.name.trim().to_string(),
        ..data
    };
    let user = User::create(&conn, &data).map_err(|e| format!("Failed to create user: {}", e))?;

    tracing::info!(username = %user.username, "registered user");

    Ok(RegisterUserResponse {
        id: user.id,
        username: user.username,
        created_at: user.created_at,
    })
}

/// Get a user's profile and their last saved log
pub fn get_user(db: &Database, username: &str) -> Result<Option<UserDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let user = match find_user(&conn, username)? {
        Some(user) => user,
        None => return Ok(None),
    };

    let last_log = DailyLog::latest_for_user(&conn, user.id)
        .map_err(|e| format!("Database error: {}", e))?
        .map(|log| LastLogSummary {
            foods: log.foods_summary(),
            date: log.date,
            total_calories: log.total_calories,
        });

    Ok(Some(UserDetail::from_user(user, last_log)))
}

/// List registered users
pub fn list_users(db: &Database) -> Result<ListUsersResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let users = User::list(&conn).map_err(|e| format!("List failed: {}", e))?;
    let summaries: Vec<UserSummary> = users.iter().map(UserSummary::from).collect();
    let total = summaries.len();
    Ok(ListUsersResponse {
        users: summaries,
        total,
    })
}

/// Record a new current weight for a user
pub fn update_user_weight(
    db: &Database,
    username: &str,
    weight_kg: f64,
) -> Result<UpdateWeightResponse, String> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(format!("weight_kg must be a positive number, got {}", weight_kg));
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let user = load_user(&conn, username)?;

    let updated = User::update_weight(&conn, user.id, weight_kg)
        .map_err(|e| format!("Failed to update weight: {}", e))?
        .ok_or_else(|| format!("User '{}' not found", username.trim()))?;

    tracing::info!(username = %updated.username, weight_kg, "updated user weight");

    Ok(UpdateWeightResponse {
        success: true,
        username: updated.username,
        weight_kg: updated.weight_kg,
        updated_at: updated.updated_at,
    })
}

/// Remove a user together with their logs and custom plans
pub fn delete_user(db: &Database, username: &str) -> Result<DeleteUserResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let user = load_user(&conn, username)?;

    let logs_removed = DailyLog::list_for_user(&conn, user.id)
        .map_err(|e| format!("Database error: {}", e))?
        .len();
    let plans_removed = CustomPlan::list_for_user(&conn, user.id)
        .map_err(|e| format!("Database error: {}", e))?
        .len();

    // logs, log items and plans go with the user through ON DELETE CASCADE
    let deleted =
        User::delete(&conn, user.id).map_err(|e| format!("Failed to delete user: {}", e))?;

    tracing::info!(
        username = %user.username,
        logs_removed,
        plans_removed,
        "deleted user"
    );

    Ok(DeleteUserResponse {
        success: true,
        username: user.username,
        deleted,
        logs_removed,
        plans_removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::NoopHook;
    use crate::tools::logs::{log_day, LogFoodInput};
    use crate::tools::plans::create_custom_plan;
    use crate::tools::test_support::{sample_user, test_db};

    #[test]
    fn test_register_validates_profile() {
        let (_dir, db) = test_db();
        let mut bad = sample_user("sam");
        bad.height_cm = 0.0;
        let err = register_user(&db, bad).unwrap_err();
        assert!(err.contains("height_cm"));

        let mut blank = sample_user("  ");
        blank.name = "x".to_string();
        assert!(register_user(&db, blank).is_err());
    }

    #[test]
    fn test_register_rejects_duplicates_ignoring_case() {
        let (_dir, db) = test_db();
        register_user(&db, sample_user("sam")).unwrap();
        let err = register_user(&db, sample_user("SAM")).unwrap_err();
        assert!(err.contains("already exists"));
    }

    #[test]
    fn test_get_and_update_weight() {
        let (_dir, db) = test_db();
        register_user(&db, sample_user("sam")).unwrap();

        let detail = get_user(&db, "Sam").unwrap().unwrap();
        assert_eq!(detail.weight_kg, 70.0);
        assert!(detail.last_log.is_none());
        assert!(get_user(&db, "nobody").unwrap().is_none());

        let updated = update_user_weight(&db, "sam", 69.2).unwrap();
        assert_eq!(updated.weight_kg, 69.2);
        assert!(update_user_weight(&db, "sam", -1.0).is_err());
        assert!(update_user_weight(&db, "nobody", 60.0).is_err());

        assert_eq!(list_users(&db).unwrap().total, 1);
    }

    #[test]
    fn test_register_rejects_path_like_usernames() {
        let (_dir, db) = test_db();
        for bad in ["../escaped", "a/b", "a\\b", "..", ".hidden", "tab\there", "nul\0"] {
            let err = register_user(&db, sample_user(bad)).unwrap_err();
            assert!(err.contains("Username"), "{bad:?} gave {err}");
        }
        assert_eq!(list_users(&db).unwrap().total, 0);

        assert!(register_user(&db, sample_user("sam.o-k_1")).is_ok());
        assert!(register_user(&db, sample_user("Zoë")).is_ok());
        let dup = register_user(&db, sample_user("ZOË")).unwrap_err();
        assert!(dup.contains("already exists"));
        assert_eq!(get_user(&db, "zoë").unwrap().unwrap().username, "Zoë");
    }

    #[test]
    fn test_delete_user_removes_logs_and_plans() {
        let (_dir, db) = test_db();
        register_user(&db, sample_user("sam")).unwrap();
        register_user(&db, sample_user("alex")).unwrap();

        let food = LogFoodInput {
            name: "Toast".to_string(),
            calories: Some(120),
            add_to_catalog: false,
        };
        let logged = log_day(
            &db,
            "sam",
            Some("2025-03-01"),
            std::slice::from_ref(&food),
            None,
            false,
            &NoopHook,
        )
        .unwrap();
        log_day(&db, "alex", Some("2025-03-01"), &[food], None, false, &NoopHook).unwrap();
        create_custom_plan(&db, "sam", "Oatmeal+Milk; Fish+Rice").unwrap();

        let removed = delete_user(&db, "SAM").unwrap();
        assert!(removed.deleted);
        assert_eq!(removed.username, "sam");
        assert_eq!(removed.logs_removed, 1);
        assert_eq!(removed.plans_removed, 1);

        assert!(get_user(&db, "sam").unwrap().is_none());
        let conn = db.get_conn().unwrap();
        assert!(DailyLog::get_by_id(&conn, logged.id).unwrap().is_none());
        let plans: i64 = conn
            .query_row("SELECT COUNT(*) FROM custom_plans", [], |row| row.get(0))
            .unwrap();
        assert_eq!(plans, 0);
        let items: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM daily_log_items WHERE log_id = ?1",
                [logged.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(items, 0);

        let alex = load_user(&conn, "alex").unwrap();
        assert_eq!(DailyLog::list_for_user(&conn, alex.id).unwrap().len(), 1);
        assert!(delete_user(&db, "sam").is_err());
    }
}
