//! NutriScale MCP Server Implementation
//!
//! Implements the MCP server with all NutriScale tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::Database;
use crate::models::UserCreate;
use crate::nutrition::{ActivityLevel, CoreHook, Gender, Recommender, TracingHook};
use crate::tools::logs::{self, LogFoodInput};
use crate::tools::status::StatusTracker;
use crate::tools::{foods, plans, users};

/// NutriScale MCP Service
#[derive(Clone)]
pub struct NutriScaleService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    hook: Arc<dyn CoreHook>,
    recommender: Recommender,
    export_dir: PathBuf,
    tool_router: ToolRouter<NutriScaleService>,
}

impl NutriScaleService {
    pub fn new(config: &Config, database: Database) -> Self {
        Self::with_hook(config, database, Arc::new(TracingHook))
    }

    /// Build the service with a custom hook around core calls
    pub fn with_hook(config: &Config, database: Database, hook: Arc<dyn CoreHook>) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(config.database_path.clone()))),
            database,
            hook,
            recommender: Recommender::new(config.recommender),
            export_dir: config.export_dir.clone(),
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Food Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddFoodParams {
    pub name: String,
    /// Whole kilocalories per portion
    pub calories: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateFoodParams {
    pub name: String,
    pub calories: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FoodNameParams {
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodsParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodsParams {
    /// "name" or "calories"
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    /// "asc" or "desc"
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_sort_by() -> String { "name".to_string() }
fn default_sort_order() -> String { "asc".to_string() }
fn default_list_limit() -> i64 { 100 }

// ============================================================================
// User Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RegisterUserParams {
    pub username: String,
    pub name: String,
    pub age: u32,
    /// male, female or other
    pub gender: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub target_weight_kg: f64,
    /// sedentary, light, moderate, active or very_active
    #[serde(default)]
    pub activity_level: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UsernameParams {
    pub username: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateUserWeightParams {
    pub username: String,
    pub weight_kg: f64,
}

// ============================================================================
// Plan Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecommendMealParams {
    /// Target calories, must be positive
    pub target: i64,
    /// Allowed overshoot in kcal; defaults to 8% of the target
    pub tolerance: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateCustomPlanParams {
    pub username: String,
    /// Days separated by ';', e.g. "Oats+Milk; Salad+Chicken"
    pub plan: String,
}

// ============================================================================
// Log Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogFoodParam {
    pub name: String,
    /// Omit to use the catalog calories for this name
    pub calories: Option<i64>,
    /// Store a custom food in the catalog if it is missing
    #[serde(default)]
    pub add_to_catalog: bool,
}

impl From<LogFoodParam> for LogFoodInput {
    fn from(p: LogFoodParam) -> Self {
        Self {
            name: p.name,
            calories: p.calories,
            add_to_catalog: p.add_to_catalog,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogDayParams {
    pub username: String,
    pub foods: Vec<LogFoodParam>,
    /// Date in ISO format: YYYY-MM-DD (defaults to today)
    pub date: Option<String>,
    pub weight_kg: Option<f64>,
    /// Also store weight_kg as the user's current weight
    #[serde(default)]
    pub update_profile_weight: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AcceptSuggestionParams {
    pub username: String,
    /// Date in ISO format: YYYY-MM-DD (defaults to today)
    pub date: Option<String>,
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub update_profile_weight: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExportLogsParams {
    pub username: String,
    /// "csv" or "json"
    #[serde(default = "default_export_format")]
    pub format: String,
}

fn default_export_format() -> String { "csv".to_string() }

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl NutriScaleService {
    // --- Status ---

    #[tool(description = "Get the current status of the NutriScale service including build info, database status, and process information")]
    async fn nutriscale_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database);
        to_json(&status)
    }

    #[tool(description = "Get step-by-step instructions for registering users, getting calorie plans and logging meals. Call this when unsure how to use the NutriScale tools.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::USAGE_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(USAGE_INSTRUCTIONS)]))
    }

    // --- Foods ---

    #[tool(description = "Add a food to the catalog with its calories per portion")]
    fn add_food(&self, Parameters(p): Parameters<AddFoodParams>) -> Result<CallToolResult, McpError> {
        let result = foods::add_food(&self.database, &p.name, p.calories).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Change the calories of a catalog food")]
    fn update_food(&self, Parameters(p): Parameters<UpdateFoodParams>) -> Result<CallToolResult, McpError> {
        let result = foods::update_food(&self.database, &p.name, p.calories).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a food from the catalog. Saved logs keep their own copy.")]
    fn delete_food(&self, Parameters(p): Parameters<FoodNameParams>) -> Result<CallToolResult, McpError> {
        let result = foods::delete_food(&self.database, &p.name).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Search catalog foods by name")]
    fn search_foods(&self, Parameters(p): Parameters<SearchFoodsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::search_foods(&self.database, &p.query, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List catalog foods sorted by name or calories, with pagination")]
    fn list_foods(&self, Parameters(p): Parameters<ListFoodsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::list_foods(&self.database, &p.sort_by, &p.sort_order, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Load the starter food catalog. Foods that already exist are left unchanged.")]
    fn seed_default_catalog(&self) -> Result<CallToolResult, McpError> {
        let result = foods::seed_default_catalog(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Users ---

    #[tool(description = "Register a user with age, gender, height, weight, target weight and activity level")]
    fn register_user(&self, Parameters(p): Parameters<RegisterUserParams>) -> Result<CallToolResult, McpError> {
        let data = UserCreate {
            username: p.username, name: p.name, age: p.age,
            gender: Gender::from_str(&p.gender),
            height_cm: p.height_cm, weight_kg: p.weight_kg, target_weight_kg: p.target_weight_kg,
            activity_level: p.activity_level.as_deref().map(ActivityLevel::from_str).unwrap_or_default(),
        };
        let result = users::register_user(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a user's profile and their most recent log")]
    fn get_user(&self, Parameters(p): Parameters<UsernameParams>) -> Result<CallToolResult, McpError> {
        let result = users::get_user(&self.database, &p.username).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(user) => to_json(&user),
            None => to_json(&serde_json::json!({"error": "User not found", "username": p.username})),
        }
    }

    #[tool(description = "List registered users")]
    fn list_users(&self) -> Result<CallToolResult, McpError> {
        let result = users::list_users(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Record a user's current weight in kg")]
    fn update_user_weight(&self, Parameters(p): Parameters<UpdateUserWeightParams>) -> Result<CallToolResult, McpError> {
        let result = users::update_user_weight(&self.database, &p.username, p.weight_kg)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a user along with all of their daily logs and custom plans. This cannot be undone.")]
    fn delete_user(&self, Parameters(p): Parameters<UsernameParams>) -> Result<CallToolResult, McpError> {
        let result = users::delete_user(&self.database, &p.username).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Plans ---

    #[tool(description = "Get a user's BMI, BMR, TDEE, daily calorie goal, macro split in grams and a suggested set of foods near the goal")]
    fn get_nutrition_plan(&self, Parameters(p): Parameters<UsernameParams>) -> Result<CallToolResult, McpError> {
        let result = plans::get_nutrition_plan(&self.database, &p.username, &self.recommender, self.hook.as_ref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Suggest catalog foods whose calories add up close to a target")]
    fn recommend_meal(&self, Parameters(p): Parameters<RecommendMealParams>) -> Result<CallToolResult, McpError> {
        let result = plans::recommend_meal(&self.database, p.target, p.tolerance, &self.recommender, self.hook.as_ref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Save a hand-written weekly plan for a user, with days separated by ';'")]
    fn create_custom_plan(&self, Parameters(p): Parameters<CreateCustomPlanParams>) -> Result<CallToolResult, McpError> {
        let result = plans::create_custom_plan(&self.database, &p.username, &p.plan)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List a user's custom plans, oldest first")]
    fn list_custom_plans(&self, Parameters(p): Parameters<UsernameParams>) -> Result<CallToolResult, McpError> {
        let result = plans::list_custom_plans(&self.database, &p.username).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Logs ---

    #[tool(description = "Log the foods a user ate on a date. Each food is a catalog name, or a name with calories for a custom item. Returns the total and how it compares to the goal.")]
    fn log_day(&self, Parameters(p): Parameters<LogDayParams>) -> Result<CallToolResult, McpError> {
        let foods: Vec<LogFoodInput> = p.foods.into_iter().map(LogFoodInput::from).collect();
        let result = logs::log_day(
            &self.database, &p.username, p.date.as_deref(), &foods,
            p.weight_kg, p.update_profile_weight, self.hook.as_ref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Save the current meal suggestion as the user's log for a date")]
    fn accept_suggestion(&self, Parameters(p): Parameters<AcceptSuggestionParams>) -> Result<CallToolResult, McpError> {
        let result = logs::accept_suggestion(
            &self.database, &p.username, p.date.as_deref(),
            p.weight_kg, p.update_profile_weight, &self.recommender, self.hook.as_ref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List a user's saved logs, oldest first")]
    fn list_logs(&self, Parameters(p): Parameters<UsernameParams>) -> Result<CallToolResult, McpError> {
        let result = logs::list_logs(&self.database, &p.username).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Export a user's logs to a CSV or JSON file in the export directory and return its path")]
    fn export_logs(&self, Parameters(p): Parameters<ExportLogsParams>) -> Result<CallToolResult, McpError> {
        let result = logs::export_logs(&self.database, &p.username, &p.format, &self.export_dir)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for NutriScaleService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutriscale".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("NutriScale".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "NutriScale - Calorie goals, macro splits and meal suggestions. \
                 IMPORTANT: Call usage_instructions first if unsure. \
                 Catalog: add/update/delete_food, search_foods, list_foods, seed_default_catalog. \
                 Users: register_user, get_user, list_users, update_user_weight, delete_user. \
                 Plans: get_nutrition_plan, recommend_meal, create_custom_plan, list_custom_plans. \
                 Logs: log_day, accept_suggestion, list_logs, export_logs."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::RecommenderConfig;
    use tempfile::TempDir;

    #[test]
    fn test_service_uses_config() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            database_path: dir.path().join("test.db"),
            export_dir: dir.path().join("exports"),
            recommender: RecommenderConfig {
                max_search_items: 10,
                ..RecommenderConfig::default()
            },
        };
        let database = Database::open(&config.database_path).unwrap();
        let service = NutriScaleService::new(&config, database);

        assert_eq!(service.recommender.config().max_search_items, 10);
        assert_eq!(service.export_dir, config.export_dir);
        assert_eq!(service.get_info().server_info.name, "nutriscale");
    }
}
