//! NutriScale Status Tool
//!
//! Provides runtime status information about the NutriScale service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::migrations::get_schema_version;
use crate::db::Database;
use crate::models::{CatalogFood, User};

/// Usage instructions for AI assistants
pub const USAGE_INSTRUCTIONS: &str = r#"
# NutriScale Usage Instructions

NutriScale estimates a daily calorie goal from a user's profile and suggests a
set of catalog foods whose calories add up close to that goal.

## 1. Set up the catalog

- `seed_default_catalog` loads the starter list (about 95 common foods). It is
  safe to call more than once; existing names are skipped.
- `add_food(name, calories)` adds a single food. Names are unique ignoring case.
- `update_food`, `delete_food`, `search_foods`, `list_foods` manage entries.

Calories are whole kilocalories for one typical portion.

## 2. Register a user

```
register_user(
  username: "sam",
  name: "Sam Example",
  age: 30,
  gender: "male",            # male | female | other
  height_cm: 175,
  weight_kg: 70,
  target_weight_kg: 65,
  activity_level: "moderate" # sedentary | light | moderate | active | very_active
)
```

Unknown gender or activity values fall back to `other` and `sedentary`.
Height and weights must be positive numbers. Usernames may use letters,
digits, `_`, `-` and `.`, and cannot start with `.`.

`delete_user(username)` removes a user with all of their logs and plans.

## 3. Get a plan

`get_nutrition_plan(username)` returns:
- BMI with category and advice
- BMR (Mifflin-St Jeor), TDEE and the recommended daily calories
  (TDEE - 500 to lose, + 500 to gain, never below 1000)
- Macro split in grams (25% protein, 25% fat, 50% carbs)
- A suggested set of foods within 8% of the goal, and the strategy used
  (`search`, `greedy` or `top_n`)
- The latest custom plan, if any

`recommend_meal(target, tolerance?)` runs the same suggestion for any target.

## 4. Log what was eaten

- `log_day(username, foods, date?, weight_kg?, update_profile_weight?)`
  Each food is either `{"name": "Oatmeal"}` (calories taken from the catalog)
  or `{"name": "Smoothie", "calories": 250, "add_to_catalog": true}`.
- `accept_suggestion(username, date?)` saves the current suggestion as the log.

The response compares the day's total against the goal: below (more than 10%
under), within range, or above (more than 10% over).

Dates use ISO format: YYYY-MM-DD. They default to today.

## 5. History

- `list_logs(username)` shows saved days, oldest first.
- `export_logs(username, format)` writes a CSV or JSON file to the export
  directory and returns its path.
- `create_custom_plan(username, plan)` stores a hand-written weekly plan with
  days separated by `;`. `list_custom_plans` returns them.
"#;

/// Runtime status of the NutriScale service
#[derive(Debug, Clone, Serialize)]
pub struct NutriScaleStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub schema_version: Option<i32>,
    pub catalog_foods: Option<i64>,
    pub users: Option<i64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> NutriScaleStatus {
        let build_info = BuildInfo::current();

        // Get database size if it exists
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let conn = db.get_conn().ok();
        let schema_version = conn.as_ref().and_then(|c| get_schema_version(c).ok());
        let catalog_foods = conn.as_ref().and_then(|c| CatalogFood::count(c).ok());
        let users = conn.as_ref().and_then(|c| User::count(c).ok());

        // Get process info
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        NutriScaleStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            schema_version,
            catalog_foods,
            users,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::SCHEMA_VERSION;
    use crate::tools::foods::add_food;
    use crate::tools::test_support::test_db;

    #[test]
    fn test_status_reports_database() {
        let (dir, db) = test_db();
        add_food(&db, "Toast", 120).unwrap();

        let tracker = StatusTracker::new(dir.path().join("test.db"));
        let status = tracker.get_status(&db);

        assert_eq!(status.schema_version, Some(SCHEMA_VERSION));
        assert_eq!(status.catalog_foods, Some(1));
        assert_eq!(status.users, Some(0));
        assert!(status.database_size_bytes.is_some());
        assert_eq!(status.process_id, std::process::id());
    }
}
