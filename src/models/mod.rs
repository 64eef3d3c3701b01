//! Data models
//!
//! Rust structs representing database entities.

mod custom_plan;
mod daily_log;
mod food_item;
pub(crate) mod user;

pub use custom_plan::CustomPlan;
pub use daily_log::{DailyLog, DailyLogCreate, LogSource};
pub use food_item::{CatalogFood, CatalogFoodCreate, FoodSort};
pub use user::{User, UserCreate};
