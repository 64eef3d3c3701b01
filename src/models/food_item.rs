//! Catalog food model
//!
//! Stored catalog entries. Names are unique ignoring case.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::{FoodItem, SortOrder};

/// A stored catalog food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFood {
    pub id: i64,
    pub name: String,
    pub calories: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a catalog food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFoodCreate {
    pub name: String,
    pub calories: u32,
}

/// Column to sort catalog listings by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoodSort {
    #[default]
    Name,
    Calories,
}

impl FoodSort {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "calories" => FoodSort::Calories,
            _ => FoodSort::Name,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            FoodSort::Name => "name",
            FoodSort::Calories => "calories",
        }
    }
}

impl CatalogFood {
    /// Create a CatalogFood from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            calories: row.get("calories")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Core representation used by the recommender
    pub fn to_item(&self) -> FoodItem {
        FoodItem::new(self.name.clone(), self.calories)
    }

    /// Insert a new catalog food
    pub fn create(conn: &Connection, data: &CatalogFoodCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO food_items (name, calories) VALUES (?1, ?2)",
            params![data.name, data.calories],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a catalog food by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_items WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a catalog food by name (case-insensitive)
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_items WHERE name = ?1 COLLATE NOCASE")?;

        let result = stmt.query_row([name.trim()], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List catalog foods with sorting and pagination
    pub fn list(
        conn: &Connection,
        sort_by: FoodSort,
        order: SortOrder,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        // id keeps equal-calorie rows in insertion order
        let sql = format!(
            "SELECT * FROM food_items ORDER BY {} {}, id ASC LIMIT ?1 OFFSET ?2",
            sort_by.column(),
            order.as_sql()
        );

        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Whole catalog as core items, in insertion order
    pub fn all_items(conn: &Connection) -> DbResult<Vec<FoodItem>> {
        let mut stmt = conn.prepare("SELECT * FROM food_items ORDER BY id ASC")?;
        let items = stmt
            .query_map([], Self::from_row)?
            .map(|row| row.map(|food| food.to_item()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Set the calories of the food named `name`
    pub fn update_calories(conn: &Connection, name: &str, calories: u32) -> DbResult<Option<Self>> {
        let rows = conn.execute(
            r#"
            UPDATE food_items SET calories = ?1, updated_at = datetime('now')
            WHERE name = ?2 COLLATE NOCASE
            "#,
            params![calories, name.trim()],
        )?;
        if rows == 0 {
            return Ok(None);
        }
        Self::get_by_name(conn, name)
    }

    /// Delete the food named `name`. Returns false when nothing matched.
    pub fn delete_by_name(conn: &Connection, name: &str) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM food_items WHERE name = ?1 COLLATE NOCASE",
            [name.trim()],
        )?;
        Ok(rows > 0)
    }

    /// Count catalog foods
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM food_items", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Insert foods that are not in the catalog yet; returns how many were added
    pub fn seed(conn: &Connection, items: &[FoodItem]) -> DbResult<usize> {
        let tx = conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO food_items (name, calories) VALUES (?1, ?2)")?;
            for item in items {
                inserted += stmt.execute(params![item.name, item.calories])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::tests::test_conn;
    use crate::nutrition::default_catalog;

    fn add(conn: &Connection, name: &str, calories: u32) -> CatalogFood {
        CatalogFood::create(
            conn,
            &CatalogFoodCreate {
                name: name.to_string(),
                calories,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_names_unique_ignoring_case() {
        let conn = test_conn();
        add(&conn, "Apple", 80);
        let dup = CatalogFood::create(
            &conn,
            &CatalogFoodCreate {
                name: "APPLE".to_string(),
                calories: 90,
            },
        );
        assert!(dup.is_err());
        assert_eq!(CatalogFood::get_by_name(&conn, "apple").unwrap().unwrap().calories, 80);
    }

    #[test]
    fn test_update_and_delete_by_name() {
        let conn = test_conn();
        add(&conn, "Banana", 100);
        let updated = CatalogFood::update_calories(&conn, "banana", 105).unwrap().unwrap();
        assert_eq!(updated.calories, 105);
        assert!(CatalogFood::update_calories(&conn, "kiwi", 40).unwrap().is_none());

        assert!(CatalogFood::delete_by_name(&conn, "BANANA").unwrap());
        assert!(!CatalogFood::delete_by_name(&conn, "banana").unwrap());
    }

    #[test]
    fn test_list_sorting_and_all_items() {
        let conn = test_conn();
        add(&conn, "Rice", 180);
        add(&conn, "Apple", 80);
        add(&conn, "Pineapple", 50);

        let by_cal: Vec<_> = CatalogFood::list(&conn, FoodSort::Calories, SortOrder::Desc, 10, 0)
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(by_cal, vec!["Rice", "Apple", "Pineapple"]);

        let items = CatalogFood::all_items(&conn).unwrap();
        assert_eq!(items[0], FoodItem::new("Rice", 180));
    }

    #[test]
    fn test_seed_is_idempotent() {
        let conn = test_conn();
        let catalog = default_catalog();
        assert_eq!(CatalogFood::seed(&conn, &catalog).unwrap(), catalog.len());
        assert_eq!(CatalogFood::seed(&conn, &catalog).unwrap(), 0);
        assert_eq!(CatalogFood::count(&conn).unwrap(), catalog.len() as i64);
    }
}
