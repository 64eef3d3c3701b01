//! Plan MCP Tools
//!
//! Calorie targets, macro splits and meal suggestions.

use chrono::Local;
use serde::Serialize;

use crate::db::Database;
use crate::models::{CatalogFood, CustomPlan};
use crate::nutrition::{
    bmi_report, estimate, macro_split, observe, tolerance_for, BmiReport, CalorieTarget, CoreHook,
    FoodItem, MacroRatios, MacroSplit, Recommendation, Recommender,
};

use super::users::load_user;

/// Latest custom plan attached to a user
#[derive(Debug, Serialize)]
pub struct CustomPlanSummary {
    pub id: i64,
    pub created_on: String,
    pub days: Vec<String>,
}

impl From<&CustomPlan> for CustomPlanSummary {
    fn from(plan: &CustomPlan) -> Self {
        Self {
            id: plan.id,
            created_on: plan.created_on.clone(),
            days: plan.days(),
        }
    }
}

/// Response for get_nutrition_plan
#[derive(Debug, Serialize)]
pub struct NutritionPlanResponse {
    pub username: String,
    pub bmi: Option<BmiReport>,
    pub calories: CalorieTarget,
    pub macros: MacroSplit,
    pub tolerance: i64,
    pub suggestion: Recommendation,
    pub custom_plan: Option<CustomPlanSummary>,
}

/// Response for recommend_meal
#[derive(Debug, Serialize)]
pub struct RecommendMealResponse {
    pub target: i64,
    pub tolerance: i64,
    pub catalog_size: usize,
    pub suggestion: Recommendation,
}

/// Response for create_custom_plan
#[derive(Debug, Serialize)]
pub struct CreatePlanResponse {
    pub id: i64,
    pub username: String,
    pub created_on: String,
    pub days: Vec<String>,
}

/// Response for list_custom_plans
#[derive(Debug, Serialize)]
pub struct ListPlansResponse {
    pub username: String,
    pub plans: Vec<CustomPlanSummary>,
    pub total: usize,
}

/// Run the recommender under the hook and log when it had to give up early
pub(crate) fn suggest(
    recommender: &Recommender,
    hook: &dyn CoreHook,
    catalog: &[FoodItem],
    target: i64,
    tolerance: i64,
) -> Result<Recommendation, String> {
    let recommendation = observe(hook, "recommend", || {
        recommender.recommend(catalog, target, tolerance)
    })
    .map_err(|e| e.to_string())?;

    if recommendation.budget_exhausted {
        tracing::warn!(
            target,
            nodes = recommendation.nodes_visited,
            "combination search hit its node budget"
        );
    }
    if catalog.len() > recommender.config().max_search_items {
        tracing::warn!(
            catalog_size = catalog.len(),
            max = recommender.config().max_search_items,
            "catalog too large for combination search, using fallback"
        );
    }

    Ok(recommendation)
}

/// Full plan for a user: BMI, calorie target, macros and a meal suggestion
pub fn get_nutrition_plan(
    db: &Database,
    username: &str,
    recommender: &Recommender,
    hook: &dyn CoreHook,
) -> Result<NutritionPlanResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let user = load_user(&conn, username)?;
    let profile = user
        .profile()
        .map_err(|e| format!("Stored profile is invalid: {}", e))?;

    let calories = observe(hook, "estimate", || estimate(&profile));
    let macros = macro_split(calories.recommended_calories, MacroRatios::default());
    let bmi = bmi_report(
        profile.weight_kg,
        profile.height_cm,
        calories.recommended_calories,
    );

    let catalog = CatalogFood::all_items(&conn).map_err(|e| format!("Database error: {}", e))?;
    let tolerance = tolerance_for(calories.recommended_calories);
    let suggestion = suggest(
        recommender,
        hook,
        &catalog,
        calories.recommended_calories,
        tolerance,
    )?;

    let custom_plan = CustomPlan::latest_for_user(&conn, user.id)
        .map_err(|e| format!("Database error: {}", e))?
        .as_ref()
        .map(CustomPlanSummary::from);

    Ok(NutritionPlanResponse {
        username: user.username,
        bmi,
        calories,
        macros,
        tolerance,
        suggestion,
        custom_plan,
    })
}

/// Suggest foods for an arbitrary calorie target
pub fn recommend_meal(
    db: &Database,
    target: i64,
    tolerance: Option<i64>,
    recommender: &Recommender,
    hook: &dyn CoreHook,
) -> Result<RecommendMealResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let catalog = CatalogFood::all_items(&conn).map_err(|e| format!("Database error: {}", e))?;

    let tolerance = tolerance.unwrap_or_else(|| tolerance_for(target));
    let suggestion = suggest(recommender, hook, &catalog, target, tolerance)?;

    Ok(RecommendMealResponse {
        target,
        tolerance,
        catalog_size: catalog.len(),
        suggestion,
    })
}

/// Save a custom weekly plan; days are separated by `;`
pub fn create_custom_plan(
    db: &Database,
    username: &str,
    plan: &str,
) -> Result<CreatePlanResponse, String> {
    let plan = plan.trim();
    if plan.is_empty() {
        return Err("Plan cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let user = load_user(&conn, username)?;

    let created_on = Local::now().format("%Y-%m-%d").to_string();
    let saved = CustomPlan::create(&conn, user.id, plan, &created_on)
        .map_err(|e| format!("Failed to save plan: {}", e))?;

    tracing::info!(username = %user.username, plan_id = saved.id, "saved custom plan");

    Ok(CreatePlanResponse {
        id: saved.id,
        username: user.username,
        days: saved.days(),
        created_on: saved.created_on,
    })
}

/// All custom plans for a user, oldest first
pub fn list_custom_plans(db: &Database, username: &str) -> Result<ListPlansResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let user = load_user(&conn, username)?;

    let plans = CustomPlan::list_for_user(&conn, user.id)
        .map_err(|e| format!("Database error: {}", e))?;
    let summaries: Vec<CustomPlanSummary> = plans.iter().map(CustomPlanSummary::from).collect();
    let total = summaries.len();

    Ok(ListPlansResponse {
        username: user.username,
        plans: summaries,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::{NoopHook, Strategy};
    use crate::tools::foods::{add_food, seed_default_catalog};
    use crate::tools::test_support::{sample_user, test_db};
    use crate::tools::users::register_user;

    #[test]
    fn test_nutrition_plan_for_user() {
        let (_dir, db) = test_db();
        seed_default_catalog(&db).unwrap();
        register_user(&db, sample_user("sam")).unwrap();

        let plan = get_nutrition_plan(&db, "sam", &Recommender::default(), &NoopHook).unwrap();
        // 70 kg, 175 cm, 30 y male, moderate, losing weight
        assert_eq!(plan.calories.bmr, 1648.75);
        assert_eq!(plan.calories.tdee, 2556.0);
        assert_eq!(plan.calories.recommended_calories, 2056);
        assert_eq!(plan.tolerance, 164);
        assert_eq!(plan.suggestion.strategy, Strategy::Search);
        assert_eq!(plan.suggestion.total, 2056);
        assert!(plan.bmi.is_some());
        assert!(plan.custom_plan.is_none());

        assert!(get_nutrition_plan(&db, "nobody", &Recommender::default(), &NoopHook).is_err());
    }

    #[test]
    fn test_recommend_meal_rejects_bad_target() {
        let (_dir, db) = test_db();
        add_food(&db, "Rice", 200).unwrap();
        add_food(&db, "Beans", 300).unwrap();

        let meal = recommend_meal(&db, 500, Some(0), &Recommender::default(), &NoopHook).unwrap();
        assert_eq!(meal.suggestion.total, 500);
        assert_eq!(meal.catalog_size, 2);

        assert!(recommend_meal(&db, 0, None, &Recommender::default(), &NoopHook).is_err());
        assert!(recommend_meal(&db, 500, Some(-1), &Recommender::default(), &NoopHook).is_err());
    }

    #[test]
    fn test_custom_plans_round_trip() {
        let (_dir, db) = test_db();
        register_user(&db, sample_user("sam")).unwrap();
        assert!(create_custom_plan(&db, "sam", "  ").is_err());

        let created = create_custom_plan(&db, "sam", "Oats+Milk; Salad+Chicken").unwrap();
        assert_eq!(created.days, vec!["Oats+Milk", "Salad+Chicken"]);

        let listed = list_custom_plans(&db, "SAM").unwrap();
        assert_eq!(listed.total, 1);

        let plan = get_nutrition_plan(&db, "sam", &Recommender::default(), &NoopHook).unwrap();
        assert_eq!(plan.custom_plan.unwrap().id, created.id);
    }
}
