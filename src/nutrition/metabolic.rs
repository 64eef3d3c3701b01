//! Metabolic estimation
//!
//! BMR (Mifflin-St Jeor), TDEE, calorie targets, macro splits and BMI.

use serde::{Deserialize, Serialize};

use super::profile::{ActivityLevel, Gender, Profile};

/// Daily calorie target never goes below this
pub const CALORIE_FLOOR: i64 = 1000;

/// Deficit or surplus applied when the target weight differs from the current one
pub const GOAL_ADJUSTMENT: f64 = 500.0;

/// Energy density of protein and carbohydrate (kcal/g)
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
/// Energy density of fat (kcal/g)
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Band used to judge a day's intake against its goal
pub const INTAKE_BAND_LOW: f64 = 0.9;
pub const INTAKE_BAND_HIGH: f64 = 1.1;

/// Result of `estimate`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalorieTarget {
    pub bmr: f64,
    pub tdee: f64,
    pub recommended_calories: i64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Basal metabolic rate in kcal/day, rounded to 2 decimals
pub fn bmr(weight_kg: f64, height_cm: f64, age: u32, gender: Gender) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    let value = match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
        Gender::Other => ((base + 5.0) + (base - 161.0)) / 2.0,
    };
    round2(value)
}

/// Total daily energy expenditure, rounded to a whole number
pub fn tdee(bmr: f64, activity_level: ActivityLevel) -> f64 {
    (bmr * activity_level.multiplier()).round()
}

/// Calorie target for moving from `weight_kg` towards `target_weight_kg`
pub fn recommended_calories(tdee: f64, weight_kg: f64, target_weight_kg: f64) -> i64 {
    let adjusted = if target_weight_kg < weight_kg {
        tdee - GOAL_ADJUSTMENT
    } else if target_weight_kg > weight_kg {
        tdee + GOAL_ADJUSTMENT
    } else {
        tdee
    };
    (adjusted.round() as i64).max(CALORIE_FLOOR)
}

/// Run the full profile -> calorie target pipeline
pub fn estimate(profile: &Profile) -> CalorieTarget {
    let bmr = bmr(
        profile.weight_kg,
        profile.height_cm,
        profile.age,
        profile.gender,
    );
    let tdee = tdee(bmr, profile.activity_level);
    let recommended_calories =
        recommended_calories(tdee, profile.weight_kg, profile.target_weight_kg);

    CalorieTarget {
        bmr,
        tdee,
        recommended_calories,
    }
}

/// Share of calories per macronutrient. Expected to sum to 1.0; not renormalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroRatios {
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl Default for MacroRatios {
    fn default() -> Self {
        Self {
            protein: 0.25,
            fat: 0.25,
            carbs: 0.5,
        }
    }
}

/// Macronutrient targets in grams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroSplit {
    pub protein_g: i64,
    pub fat_g: i64,
    pub carbs_g: i64,
}

/// Split a calorie budget into grams of protein, fat and carbs
pub fn macro_split(calories: i64, ratios: MacroRatios) -> MacroSplit {
    let calories = calories as f64;
    let grams =
        |ratio: f64, kcal_per_g: f64| ((calories * ratio / kcal_per_g).round() as i64).max(0);

    MacroSplit {
        protein_g: grams(ratios.protein, KCAL_PER_G_PROTEIN),
        fat_g: grams(ratios.fat, KCAL_PER_G_FAT),
        carbs_g: grams(ratios.carbs, KCAL_PER_G_CARBS),
    }
}

/// Body mass index rounded to 2 decimals; `None` when height is not positive
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    let height_m = height_cm / 100.0;
    if height_m.is_nan() || height_m <= 0.0 {
        return None;
    }
    Some(round2(weight_kg / (height_m * height_m)))
}

/// BMI category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
    Underweight,
    Healthy,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Classify a BMI value. Lower bounds are inclusive.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Healthy
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Healthy => "Healthy",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => {
                "You are underweight (BMI < 18.5). Increase calorie intake with nutrient-dense \
                 foods (nuts, dairy, lean proteins). Aim for a modest calorie surplus and \
                 resistance training."
            }
            BmiCategory::Healthy => {
                "Healthy weight (BMI 18.5-24.9). Maintain with balanced macronutrients and \
                 regular physical activity."
            }
            BmiCategory::Overweight => {
                "Overweight (BMI 25.0-29.9). Consider portion control, reduce refined carbs, \
                 increase daily activity and cardio."
            }
            BmiCategory::Obese => {
                "Obese (BMI >= 30.0). Consider consulting a healthcare professional, focus on \
                 whole foods, reduced portions and gradually increased activity."
            }
        }
    }

    /// One-line intake suggestion for a recommended calorie value
    pub fn calorie_suggestion(&self, recommended_calories: i64) -> String {
        match self {
            BmiCategory::Underweight => format!(
                "Aim for a calorie intake around {} kcal (or a +250-500 kcal surplus) to gain gradually.",
                recommended_calories
            ),
            BmiCategory::Healthy => format!(
                "Aim to maintain around {} kcal to keep weight stable.",
                recommended_calories
            ),
            BmiCategory::Overweight => format!(
                "Aim for a calorie intake around {} kcal (a modest deficit) and try to increase activity.",
                recommended_calories
            ),
            BmiCategory::Obese => "Aim for supervised calorie reduction and gentle activity; \
                 consult a professional if needed."
                .to_string(),
        }
    }
}

/// BMI with its category and advisory text
#[derive(Debug, Clone, Serialize)]
pub struct BmiReport {
    pub bmi: f64,
    pub category: BmiCategory,
    pub advice: &'static str,
    pub calorie_suggestion: String,
}

/// Build a BMI report; `None` when BMI is undefined
pub fn bmi_report(weight_kg: f64, height_cm: f64, recommended_calories: i64) -> Option<BmiReport> {
    let bmi = bmi(weight_kg, height_cm)?;
    let category = BmiCategory::from_bmi(bmi);
    Some(BmiReport {
        bmi,
        category,
        advice: category.advice(),
        calorie_suggestion: category.calorie_suggestion(recommended_calories),
    })
}

/// How a day's intake compares to its calorie goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStatus {
    Below,
    WithinRange,
    Above,
}

impl IntakeStatus {
    pub fn message(&self) -> &'static str {
        match self {
            IntakeStatus::Below => "Total below recommended by more than 10%",
            IntakeStatus::WithinRange => "Total within recommended range",
            IntakeStatus::Above => "Total exceeds recommended by more than 10%",
        }
    }
}

pub fn intake_status(total_calories: i64, goal_calories: i64) -> IntakeStatus {
    let total = total_calories as f64;
    let goal = goal_calories as f64;
    if total > goal * INTAKE_BAND_HIGH {
        IntakeStatus::Above
    } else if total < goal * INTAKE_BAND_LOW {
        IntakeStatus::Below
    } else {
        IntakeStatus::WithinRange
    }
}
