//! Daily log MCP Tools
//!
//! Saving what a user ate, checking it against their goal, and exporting history.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::models::{CatalogFood, CatalogFoodCreate, DailyLog, DailyLogCreate, LogSource, User};
use crate::nutrition::{
    estimate, first_by_name, intake_status, observe, tolerance_for, CoreHook, FoodItem,
    IntakeStatus, Recommender,
};

use super::foods::{load_catalog, validate_calories};
use super::plans::suggest;
use super::users::load_user;

/// One food entry submitted with log_day
#[derive(Debug, Clone, Deserialize)]
pub struct LogFoodInput {
    pub name: String,
    /// Omit to take the calories from the catalog
    #[serde(default)]
    pub calories: Option<i64>,
    /// Also store a custom food in the catalog when it is not there yet
    #[serde(default)]
    pub add_to_catalog: bool,
}

/// Response for log_day and accept_suggestion
#[derive(Debug, Serialize)]
pub struct LogDayResponse {
    pub id: i64,
    pub username: String,
    pub date: String,
    pub source: LogSource,
    pub items: Vec<FoodItem>,
    pub total_calories: i64,
    pub weight_kg: Option<f64>,
    pub goal_calories: i64,
    pub intake_status: IntakeStatus,
    pub message: String,
    pub added_to_catalog: Vec<String>,
}

/// Log entry in list results
#[derive(Debug, Serialize)]
pub struct LogSummary {
    pub id: i64,
    pub date: String,
    pub source: LogSource,
    pub total_calories: i64,
    pub weight_kg: Option<f64>,
    pub foods: String,
}

impl From<&DailyLog> for LogSummary {
    fn from(log: &DailyLog) -> Self {
        Self {
            id: log.id,
            date: log.date.clone(),
            source: log.source,
            total_calories: log.total_calories,
            weight_kg: log.weight_kg,
            foods: log.foods_summary(),
        }
    }
}

/// Response for list_logs
#[derive(Debug, Serialize)]
pub struct ListLogsResponse {
    pub username: String,
    pub logs: Vec<LogSummary>,
    pub total: usize,
}

/// File format for export_logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("Unsupported export format '{}', use csv or json", other)),
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Row written by export_logs
#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    date: &'a str,
    username: &'a str,
    foods: String,
    total_calories: i64,
    weight_kg: Option<f64>,
}

/// Response for export_logs
#[derive(Debug, Serialize)]
pub struct ExportLogsResponse {
    pub path: String,
    pub format: ExportFormat,
    pub records: usize,
}

/// Accept `YYYY-MM-DD` or default to today
fn resolve_date(date: Option<&str>) -> Result<String, String> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map(|parsed| parsed.format("%Y-%m-%d").to_string())
            .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", d)),
        None => Ok(Local::now().format("%Y-%m-%d").to_string()),
    }
}

fn validate_weight(weight_kg: Option<f64>) -> Result<(), String> {
    match weight_kg {
        Some(w) if !w.is_finite() || w <= 0.0 => {
            Err(format!("weight_kg must be a positive number, got {}", w))
        }
        _ => Ok(()),
    }
}

/// Submitted entries resolved against the catalog, before anything is written
#[derive(Debug, Default)]
struct ResolvedFoods {
    items: Vec<FoodItem>,
    /// Custom foods to store in the catalog along with the log
    new_catalog_foods: Vec<FoodItem>,
}

/// Turn submitted entries into log items without touching the database
fn resolve_foods(catalog: &[FoodItem], foods: &[LogFoodInput]) -> Result<ResolvedFoods, String> {
    let mut resolved = ResolvedFoods::default();

    for food in foods {
        let name = food.name.trim();
        if name.is_empty() {
            return Err("Food name cannot be empty".to_string());
        }

        match food.calories {
            Some(calories) => {
                let calories = validate_calories(calories)?;
                let item = FoodItem::new(name, calories);
                if food.add_to_catalog
                    && first_by_name(catalog, name).is_none()
                    && first_by_name(&resolved.new_catalog_foods, name).is_none()
                {
                    resolved.new_catalog_foods.push(item.clone());
                }
                resolved.items.push(item);
            }
            None => {
                let found = first_by_name(catalog, name).ok_or_else(|| {
                    format!(
                        "Food '{}' not in catalog; pass calories to log it as a custom item",
                        name
                    )
                })?;
                resolved.items.push(found.clone());
            }
        }
    }

    Ok(resolved)
}

/// What a log write needs besides the connection
struct LogWrite {
    date: String,
    weight_kg: Option<f64>,
    update_profile_weight: bool,
    source: LogSource,
    items: Vec<FoodItem>,
    new_catalog_foods: Vec<FoodItem>,
}

/// Store new catalog foods, the weight and the log in one transaction, then
/// compare the day against the goal. Nothing is kept if any step fails.
fn save_log(
    conn: &Connection,
    user: User,
    write: LogWrite,
    hook: &dyn CoreHook,
) -> Result<(DailyLog, User, i64), String> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| format!("Database error: {}", e))?;

    for food in &write.new_catalog_foods {
        CatalogFood::create(
            &tx,
            &CatalogFoodCreate {
                name: food.name.clone(),
                calories: food.calories,
            },
        )
        .map_err(|e| format!("Failed to add '{}' to catalog: {}", food.name, e))?;
    }

    let user = match write.weight_kg {
        Some(weight) if write.update_profile_weight => User::update_weight(&tx, user.id, weight)
            .map_err(|e| format!("Failed to update weight: {}", e))?
            .ok_or_else(|| format!("User '{}' not found", user.username))?,
        _ => user,
    };

    let profile = user
        .profile()
        .map_err(|e| format!("Stored profile is invalid: {}", e))?;
    let goal = observe(hook, "estimate", || estimate(&profile)).recommended_calories;

    let log = DailyLog::create(
        &tx,
        &DailyLogCreate {
            user_id: user.id,
            date: write.date,
            weight_kg: write.weight_kg,
            source: write.source,
            items: write.items,
        },
    )
    .map_err(|e| format!("Failed to save log: {}", e))?;

    tx.commit().map_err(|e| format!("Failed to save log: {}", e))?;

    tracing::info!(
        username = %user.username,
        date = %log.date,
        total = log.total_calories,
        source = log.source.as_str(),
        added_to_catalog = write.new_catalog_foods.len(),
        "saved daily log"
    );

    Ok((log, user, goal))
}

fn log_response(log: DailyLog, user: User, goal: i64, added: Vec<String>) -> LogDayResponse {
    let status = intake_status(log.total_calories, goal);
    LogDayResponse {
        id: log.id,
        username: user.username,
        date: log.date,
        source: log.source,
        items: log.items,
        total_calories: log.total_calories,
        weight_kg: log.weight_kg,
        goal_calories: goal,
        intake_status: status,
        message: status.message().to_string(),
        added_to_catalog: added,
    }
}

/// Log the foods a user ate on a date
pub fn log_day(
    db: &Database,
    username: &str,
    date: Option<&str>,
    foods: &[LogFoodInput],
    weight_kg: Option<f64>,
    update_profile_weight: bool,
    hook: &dyn CoreHook,
) -> Result<LogDayResponse, String> {
    if foods.is_empty() {
        return Err("At least one food is required".to_string());
    }
    let date = resolve_date(date)?;
    validate_weight(weight_kg)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let user = load_user(&conn, username)?;
    let catalog = load_catalog(&conn)?;
    let resolved = resolve_foods(&catalog, foods)?;
    let added = resolved
        .new_catalog_foods
        .iter()
        .map(|food| food.name.clone())
        .collect();

    let write = LogWrite {
        date,
        weight_kg,
        update_profile_weight,
        source: LogSource::Custom,
        items: resolved.items,
        new_catalog_foods: resolved.new_catalog_foods,
    };
    let (log, user, goal) = save_log(&conn, user, write, hook)?;
    Ok(log_response(log, user, goal, added))
}

/// Save today's suggested meal as the user's log
pub fn accept_suggestion(
    db: &Database,
    username: &str,
    date: Option<&str>,
    weight_kg: Option<f64>,
    update_profile_weight: bool,
    recommender: &Recommender,
    hook: &dyn CoreHook,
) -> Result<LogDayResponse, String> {
    let date = resolve_date(date)?;
    validate_weight(weight_kg)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let user = load_user(&conn, username)?;
    let profile = user
        .profile()
        .map_err(|e| format!("Stored profile is invalid: {}", e))?;

    let target = observe(hook, "estimate", || estimate(&profile)).recommended_calories;
    let catalog = load_catalog(&conn)?;
    let suggestion = suggest(recommender, hook, &catalog, target, tolerance_for(target))?;
    if suggestion.is_empty() {
        return Err("Catalog is empty; add foods before accepting a suggestion".to_string());
    }

    let write = LogWrite {
        date,
        weight_kg,
        update_profile_weight,
        source: LogSource::Suggested,
        items: suggestion.items,
        new_catalog_foods: Vec::new(),
    };
    let (log, user, goal) = save_log(&conn, user, write, hook)?;
    Ok(log_response(log, user, goal, Vec::new()))
}

/// A user's logs, oldest first
pub fn list_logs(db: &Database, username: &str) -> Result<ListLogsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let user = load_user(&conn, username)?;

    let logs =
        DailyLog::list_for_user(&conn, user.id).map_err(|e| format!("Database error: {}", e))?;
    let summaries: Vec<LogSummary> = logs.iter().map(LogSummary::from).collect();
    let total = summaries.len();

    Ok(ListLogsResponse {
        username: user.username,
        logs: summaries,
        total,
    })
}

/// Username reduced to characters that are safe in a file name
fn file_stem(username: &str) -> String {
    let stem: String = username
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "user".to_string()
    } else {
        stem
    }
}

/// `<export_dir>/<username>_logs_<timestamp>.<ext>`, refusing anything that lands elsewhere
fn export_path(export_dir: &Path, username: &str, format: ExportFormat) -> Result<PathBuf, String> {
    let filename = format!(
        "{}_logs_{}.{}",
        file_stem(username),
        Local::now().format("%Y%m%d%H%M%S"),
        format.extension()
    );
    let path = export_dir.join(filename);
    if path.parent() != Some(export_dir) {
        return Err(format!(
            "Refusing to write outside '{}'",
            export_dir.display()
        ));
    }
    Ok(path)
}

/// Write a user's logs to `<export_dir>/<username>_logs_<timestamp>.<ext>`
pub fn export_logs(
    db: &Database,
    username: &str,
    format: &str,
    export_dir: &Path,
) -> Result<ExportLogsResponse, String> {
    let format = ExportFormat::from_str(format)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let user = load_user(&conn, username)?;
    let logs =
        DailyLog::list_for_user(&conn, user.id).map_err(|e| format!("Database error: {}", e))?;
    if logs.is_empty() {
        return Err(format!("No logs to export for '{}'", user.username));
    }

    let records: Vec<ExportRecord> = logs
        .iter()
        .map(|log| ExportRecord {
            date: &log.date,
            username: &user.username,
            foods: log.foods_summary(),
            total_calories: log.total_calories,
            weight_kg: log.weight_kg,
        })
        .collect();

    std::fs::create_dir_all(export_dir).map_err(|e| {
        format!(
            "Failed to create export directory '{}': {}",
            export_dir.display(),
            e
        )
    })?;

    let path = export_path(export_dir, &user.username, format)?;

    match format {
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_path(&path)
                .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
            for record in &records {
                writer
                    .serialize(record)
                    .map_err(|e| format!("Failed to write record: {}", e))?;
            }
            writer
                .flush()
                .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
        }
        ExportFormat::Json => {
            let json = serde_json::to_string_pretty(&records)
                .map_err(|e| format!("Serialization error: {}", e))?;
            std::fs::write(&path, json)
                .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
        }
    }

    tracing::info!(
        username = %user.username,
        path = %path.display(),
        records = records.len(),
        "exported logs"
    );

    Ok(ExportLogsResponse {
        path: path.display().to_string(),
        format,
        records: records.len(),
    })
}
