//! Food catalog MCP Tools
//!
//! Tools for managing the food catalog.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::Database;
use crate::models::{CatalogFood, CatalogFoodCreate, FoodSort};
use crate::nutrition::catalog::{find_by_name, search};
use crate::nutrition::{default_catalog, FoodItem, SortOrder};

/// Summary of a catalog food for list/search results
#[derive(Debug, Serialize)]
pub struct FoodSummary {
    pub id: i64,
    pub name: String,
    pub calories: u32,
}

impl From<&CatalogFood> for FoodSummary {
    fn from(food: &CatalogFood) -> Self {
        Self {
            id: food.id,
            name: food.name.clone(),
            calories: food.calories,
        }
    }
}

/// Response for add_food
#[derive(Debug, Serialize)]
pub struct AddFoodResponse {
    pub id: i64,
    pub name: String,
    pub calories: u32,
    pub created_at: String,
}

/// Response for update_food
#[derive(Debug, Serialize)]
pub struct UpdateFoodResponse {
    pub success: bool,
    pub food: FoodSummary,
    pub updated_at: String,
}

/// Response for delete_food
#[derive(Debug, Serialize)]
pub struct DeleteFoodResponse {
    pub success: bool,
    pub name: String,
    pub deleted: bool,
}

/// Response for search_foods
#[derive(Debug, Serialize)]
pub struct SearchFoodsResponse {
    pub items: Vec<FoodSummary>,
    pub total: usize,
}

/// Response for list_foods
#[derive(Debug, Serialize)]
pub struct ListFoodsResponse {
    pub items: Vec<FoodSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for seed_default_catalog
#[derive(Debug, Serialize)]
pub struct SeedCatalogResponse {
    pub inserted: usize,
    pub total: i64,
}

/// Validate a calorie value coming from the outside
pub(crate) fn validate_calories(calories: i64) -> Result<u32, String> {
    if calories < 0 {
        return Err("calories cannot be negative".to_string());
    }
    u32::try_from(calories).map_err(|_| format!("calories value {} is too large", calories))
}

/// Whole catalog as core items, in insertion order
pub(crate) fn load_catalog(conn: &Connection) -> Result<Vec<FoodItem>, String> {
    CatalogFood::all_items(conn).map_err(|e| format!("Database error: {}", e))
}

/// Stored food matching `name` ignoring case.
///
/// SQLite's NOCASE only folds ASCII, so matching happens on the core items
/// where `Éclair` and `éclair` are the same food.
pub(crate) fn find_catalog_food(conn: &Connection, name: &str) -> Result<Option<FoodItem>, String> {
    let catalog = load_catalog(conn)?;
    let hits = find_by_name(&catalog, name);
    if hits.len() > 1 {
        tracing::warn!(
            name = name.trim(),
            matches = hits.len(),
            "several catalog foods share this name, using the oldest"
        );
    }
    Ok(hits.first().map(|item| (*item).clone()))
}

/// Add a new food to the catalog
pub fn add_food(db: &Database, name: &str, calories: i64) -> Result<AddFoodResponse, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Food name cannot be empty".to_string());
    }
    let calories = validate_calories(calories)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if let Some(existing) = find_catalog_food(&conn, name)? {
        return Err(format!(
            "Food '{}' already exists ({} kcal); use update_food to change it",
            existing.name, existing.calories
        ));
    }

    let food = CatalogFood::create(
        &conn,
        &CatalogFoodCreate {
            name: name.to_string(),
            calories,
        },
    )
    .map_err(|e| format!("Failed to create food: {}", e))?;

    tracing::info!(name = %food.name, calories = food.calories, "added catalog food");

    Ok(AddFoodResponse {
        id: food.id,
        name: food.name,
        calories: food.calories,
        created_at: food.created_at,
    })
}

/// Change the calories of an existing food
pub fn update_food(db: &Database, name: &str, calories: i64) -> Result<UpdateFoodResponse, String> {
    let calories = validate_calories(calories)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let stored = find_catalog_food(&conn, name)?
        .ok_or_else(|| format!("Food '{}' not found", name.trim()))?;

    let food = CatalogFood::update_calories(&conn, &stored.name, calories)
        .map_err(|e| format!("Failed to update food: {}", e))?
        .ok_or_else(|| format!("Food '{}' not found", stored.name))?;

    tracing::info!(name = %food.name, calories = food.calories, "updated catalog food");

    Ok(UpdateFoodResponse {
        success: true,
        food: FoodSummary::from(&food),
        updated_at: food.updated_at,
    })
}

/// Remove a food from the catalog if it exists
///
/// Past daily logs keep their own copy of the food, so deleting is always allowed.
pub fn delete_food(db: &Database, name: &str) -> Result<DeleteFoodResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let stored = match find_catalog_food(&conn, name)? {
        Some(food) => food,
        None => {
            return Ok(DeleteFoodResponse {
                success: true,
                name: name.trim().to_string(),
                deleted: false,
            })
        }
    };

    let deleted = CatalogFood::delete_by_name(&conn, &stored.name)
        .map_err(|e| format!("Failed to delete food: {}", e))?;

    if deleted {
        tracing::info!(name = %stored.name, "deleted catalog food");
    }

    Ok(DeleteFoodResponse {
        success: true,
        name: stored.name,
        deleted,
    })
}

/// Search foods by name, ordered by name
pub fn search_foods(db: &Database, query: &str, limit: i64) -> Result<SearchFoodsResponse, String> {
    let limit = limit.clamp(1, 100) as usize;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let catalog = load_catalog(&conn)?;
    let mut matches = search(&catalog, query);
    matches.sort_by_cached_key(|item| item.name.to_lowercase());
    matches.truncate(limit);

    // all_items carries no ids, so pair the hits back up with their rows
    let mut summaries = Vec::with_capacity(matches.len());
    for item in matches {
        if let Some(food) = CatalogFood::get_by_name(&conn, &item.name)
            .map_err(|e| format!("Search failed: {}", e))?
        {
            summaries.push(FoodSummary::from(&food));
        }
    }
    let total = summaries.len();

    Ok(SearchFoodsResponse {
        items: summaries,
        total,
    })
}

/// List foods sorted by name or calories
pub fn list_foods(
    db: &Database,
    sort_by: &str,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> Result<ListFoodsResponse, String> {
    let limit = limit.clamp(1, 500);
    let offset = offset.max(0);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = CatalogFood::list(
        &conn,
        FoodSort::from_str(sort_by),
        SortOrder::from_str(sort_order),
        limit,
        offset,
    )
    .map_err(|e| format!("List failed: {}", e))?;

    let total = CatalogFood::count(&conn).map_err(|e| format!("Count failed: {}", e))?;

    Ok(ListFoodsResponse {
        items: items.iter().map(FoodSummary::from).collect(),
        total,
        limit,
        offset,
    })
}

/// Insert the starter catalog, skipping names that already exist
pub fn seed_default_catalog(db: &Database) -> Result<SeedCatalogResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let inserted = CatalogFood::seed(&conn, &default_catalog())
        .map_err(|e| format!("Failed to seed catalog: {}", e))?;
    let total = CatalogFood::count(&conn).map_err(|e| format!("Count failed: {}", e))?;

    tracing::info!(inserted, total, "seeded default catalog");

    Ok(SeedCatalogResponse { inserted, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::test_db;

    #[test]
    fn test_add_food_validates_input() {
        let (_dir, db) = test_db();
        assert!(add_food(&db, "   ", 100).is_err());
        assert!(add_food(&db, "Toast", -1).is_err());

        let added = add_food(&db, " Toast ", 120).unwrap();
        assert_eq!(added.name, "Toast");

        let dup = add_food(&db, "toast", 90).unwrap_err();
        assert!(dup.contains("already exists"));
    }

    #[test]
    fn test_update_and_delete() {
        let (_dir, db) = test_db();
        add_food(&db, "Toast", 120).unwrap();

        let updated = update_food(&db, "TOAST", 130).unwrap();
        assert_eq!(updated.food.calories, 130);
        assert!(update_food(&db, "Bagel", 250).is_err());

        assert!(delete_food(&db, "toast").unwrap().deleted);
        assert!(!delete_food(&db, "toast").unwrap().deleted);
    }

    #[test]
    fn test_seed_then_list_and_search() {
        let (_dir, db) = test_db();
        let seeded = seed_default_catalog(&db).unwrap();
        assert!(seeded.inserted > 0);
        assert_eq!(seed_default_catalog(&db).unwrap().inserted, 0);

        let listed = list_foods(&db, "calories", "desc", 3, 0).unwrap();
        assert_eq!(listed.items.len(), 3);
        assert_eq!(listed.items[0].name, "Raisins");
        assert_eq!(listed.total, seeded.total);

        let found = search_foods(&db, "beans", 10).unwrap();
        assert_eq!(found.total, 3);
    }

    #[test]
    fn test_names_match_ignoring_accented_case() {
        let (_dir, db) = test_db();
        add_food(&db, "Éclair", 262).unwrap();

        let dup = add_food(&db, "éclair", 250).unwrap_err();
        assert!(dup.contains("already exists"));

        let updated = update_food(&db, "ÉCLAIR", 270).unwrap();
        assert_eq!(updated.food.name, "Éclair");
        assert_eq!(updated.food.calories, 270);

        let found = search_foods(&db, "éCL", 10).unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].name, "Éclair");

        let deleted = delete_food(&db, "éclair").unwrap();
        assert!(deleted.deleted);
        assert_eq!(deleted.name, "Éclair");
    }
}
