//! Daily log model
//!
//! A user's record of what they ate on a date. Items are snapshots, so later
//! catalog edits do not rewrite history.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::catalog::total_calories;
use crate::nutrition::FoodItem;

/// How the foods in a log were chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Suggested,
    Custom,
}

impl LogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Suggested => "suggested",
            LogSource::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "suggested" => LogSource::Suggested,
            _ => LogSource::Custom,
        }
    }
}

/// A daily log with its items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLog {
    pub id: i64,
    pub user_id: i64,
    pub date: String,
    pub total_calories: i64,
    pub weight_kg: Option<f64>,
    pub source: LogSource,
    pub items: Vec<FoodItem>,
    pub created_at: String,
}

/// Data for creating a daily log
#[derive(Debug, Clone)]
pub struct DailyLogCreate {
    pub user_id: i64,
    pub date: String,
    pub weight_kg: Option<f64>,
    pub source: LogSource,
    pub items: Vec<FoodItem>,
}

impl DailyLog {
    /// Create from a database row (items loaded separately)
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            date: row.get("date")?,
            total_calories: row.get("total_calories")?,
            weight_kg: row.get("weight_kg")?,
            source: LogSource::from_str(row.get::<_, String>("source")?.as_str()),
            items: Vec::new(),
            created_at: row.get("created_at")?,
        })
    }

    fn load_items(conn: &Connection, log_id: i64) -> DbResult<Vec<FoodItem>> {
        let mut stmt = conn.prepare(
            "SELECT food_name, calories FROM daily_log_items WHERE log_id = ?1 ORDER BY position",
        )?;
        let items = stmt
            .query_map([log_id], |row| Ok(FoodItem::new(row.get::<_, String>(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Save a log and its items.
    ///
    /// Runs on whatever it is given, so pass a transaction to keep the log and
    /// its items (and any other writes made alongside) atomic.
    pub fn create(conn: &Connection, data: &DailyLogCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO daily_logs (user_id, date, total_calories, weight_kg, source)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.user_id,
                data.date,
                total_calories(&data.items),
                data.weight_kg,
                data.source.as_str(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        {
            let mut stmt = conn.prepare(
                r#"
                INSERT INTO daily_log_items (log_id, position, food_name, calories)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for (position, item) in data.items.iter().enumerate() {
                stmt.execute(params![id, position as i64, item.name, item.calories])?;
            }
        }

        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a log by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM daily_logs WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(mut log) => {
                log.items = Self::load_items(conn, log.id)?;
                Ok(Some(log))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All logs for a user, oldest first
    pub fn list_for_user(conn: &Connection, user_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM daily_logs WHERE user_id = ?1 ORDER BY date ASC, id ASC")?;
        let mut logs = stmt
            .query_map([user_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for log in &mut logs {
            log.items = Self::load_items(conn, log.id)?;
        }
        Ok(logs)
    }

    /// Most recently saved log for a user
    pub fn latest_for_user(conn: &Connection, user_id: i64) -> DbResult<Option<Self>> {
        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM daily_logs WHERE user_id = ?1 ORDER BY id DESC LIMIT 1",
                [user_id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                e => Err(e),
            })?;

        match id {
            Some(id) => Self::get_by_id(conn, id),
            None => Ok(None),
        }
    }

    /// Foods formatted as `Name(123kcal); ...`
    pub fn foods_summary(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("{}({}kcal)", item.name, item.calories))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::tests::{sample_user, test_conn};
    use crate::models::User;

    fn log_for(user_id: i64, date: &str, items: Vec<FoodItem>) -> DailyLogCreate {
        DailyLogCreate {
            user_id,
            date: date.to_string(),
            weight_kg: Some(70.0),
            source: LogSource::Custom,
            items,
        }
    }

    #[test]
    fn test_create_keeps_item_order_and_total() {
        let conn = test_conn();
        let user = User::create(&conn, &sample_user("sam")).unwrap();
        let log = DailyLog::create(
            &conn,
            &log_for(
                user.id,
                "2025-03-01",
                vec![FoodItem::new("Oatmeal", 150), FoodItem::new("Eggs", 155)],
            ),
        )
        .unwrap();

        assert_eq!(log.total_calories, 305);
        assert_eq!(log.items[0].name, "Oatmeal");
        assert_eq!(log.items[1].name, "Eggs");
        assert_eq!(log.foods_summary(), "Oatmeal(150kcal); Eggs(155kcal)");
    }

    #[test]
    fn test_list_and_latest() {
        let conn = test_conn();
        let user = User::create(&conn, &sample_user("sam")).unwrap();
        assert!(DailyLog::latest_for_user(&conn, user.id).unwrap().is_none());

        DailyLog::create(&conn, &log_for(user.id, "2025-03-02", vec![FoodItem::new("Rice", 180)]))
            .unwrap();
        DailyLog::create(&conn, &log_for(user.id, "2025-03-01", vec![FoodItem::new("Fish", 220)]))
            .unwrap();

        let logs = DailyLog::list_for_user(&conn, user.id).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].date, "2025-03-01");

        let latest = DailyLog::latest_for_user(&conn, user.id).unwrap().unwrap();
        assert_eq!(latest.items[0].name, "Fish");
    }

    #[test]
    fn test_logs_removed_with_user() {
        let conn = test_conn();
        let user = User::create(&conn, &sample_user("sam")).unwrap();
        let log = DailyLog::create(&conn, &log_for(user.id, "2025-03-01", vec![])).unwrap();
        User::delete(&conn, user.id).unwrap();
        assert!(DailyLog::get_by_id(&conn, log.id).unwrap().is_none());
    }
}
