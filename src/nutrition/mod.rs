//! Nutrition core
//!
//! Pure calorie and recommendation logic. Nothing here touches storage.

pub mod catalog;
pub mod hooks;
pub mod metabolic;
pub mod profile;
pub mod recommender;

pub use catalog::{default_catalog, first_by_name, FoodItem, SortOrder};
pub use hooks::{observe, CoreHook, NoopHook, TracingHook};
pub use metabolic::{
    bmi, bmi_report, estimate, intake_status, macro_split, BmiCategory, BmiReport,
    CalorieTarget, IntakeStatus, MacroRatios, MacroSplit,
};
pub use profile::{ActivityLevel, Gender, Profile, ProfileError};
pub use recommender::{
    recommend, tolerance_for, Recommendation, RecommendError, Recommender, RecommenderConfig,
    Strategy,
};
