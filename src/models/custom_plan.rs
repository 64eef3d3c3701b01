//! Custom plan model
//!
//! Hand-written weekly meal plans attached to a user.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A custom weekly plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPlan {
    pub id: i64,
    pub user_id: i64,
    pub plan: String,
    pub created_on: String,
    pub created_at: String,
}

impl CustomPlan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            plan: row.get("plan")?,
            created_on: row.get("created_on")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Plan split into its per-day entries
    pub fn days(&self) -> Vec<String> {
        self.plan
            .split(';')
            .map(str::trim)
            .filter(|day| !day.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn create(conn: &Connection, user_id: i64, plan: &str, created_on: &str) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO custom_plans (user_id, plan, created_on) VALUES (?1, ?2, ?3)",
            params![user_id, plan, created_on],
        )?;

        let id = conn.last_insert_rowid();
        let mut stmt = conn.prepare("SELECT * FROM custom_plans WHERE id = ?1")?;
        Ok(stmt.query_row([id], Self::from_row)?)
    }

    /// All plans for a user, oldest first
    pub fn list_for_user(conn: &Connection, user_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM custom_plans WHERE user_id = ?1 ORDER BY id ASC")?;
        let plans = stmt
            .query_map([user_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(plans)
    }

    pub fn latest_for_user(conn: &Connection, user_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM custom_plans WHERE user_id = ?1 ORDER BY id DESC LIMIT 1",
        )?;
        match stmt.query_row([user_id], Self::from_row) {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::tests::{sample_user, test_conn};
    use crate::models::User;

    #[test]
    fn test_latest_plan_wins() {
        let conn = test_conn();
        let user = User::create(&conn, &sample_user("sam")).unwrap();
        CustomPlan::create(&conn, user.id, "Oatmeal+Milk", "2025-03-01").unwrap();
        CustomPlan::create(&conn, user.id, "Salad+Chicken; Fish+Rice;", "2025-03-08").unwrap();

        let latest = CustomPlan::latest_for_user(&conn, user.id).unwrap().unwrap();
        assert_eq!(latest.created_on, "2025-03-08");
        assert_eq!(latest.days(), vec!["Salad+Chicken", "Fish+Rice"]);
        assert_eq!(CustomPlan::list_for_user(&conn, user.id).unwrap().len(), 2);
    }

    #[test]
    fn test_plan_requires_existing_user() {
        let conn = test_conn();
        assert!(CustomPlan::create(&conn, 999, "Oats", "2025-03-01").is_err());
    }
}
