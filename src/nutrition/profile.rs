//! Biometric profile
//!
//! Input to the metabolic estimator, plus the categorical values it depends on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Oldest age accepted by `Profile::new`
pub const MAX_AGE: u32 = 150;

/// Profile validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("{field} must be a positive number, got {value}")]
    InvalidMeasurement { field: &'static str, value: f64 },

    #[error("age must be between 0 and {max}, got {age}")]
    InvalidAge { age: u32, max: u32 },
}

/// Gender used to pick the BMR formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    /// Parse leniently: "m..." is male, "f..." is female, anything else is other
    pub fn from_str(s: &str) -> Self {
        let lower = s.trim().to_lowercase();
        if lower.starts_with('m') {
            Gender::Male
        } else if lower.starts_with('f') {
            Gender::Female
        } else {
            Gender::Other
        }
    }
}

/// Activity level used to scale BMR into TDEE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }

    /// Parse an activity level; unknown values fall back to sedentary
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "light" => ActivityLevel::Light,
            "moderate" => ActivityLevel::Moderate,
            "active" => ActivityLevel::Active,
            "very active" | "very_active" | "very-active" | "veryactive" => {
                ActivityLevel::VeryActive
            }
            _ => ActivityLevel::Sedentary,
        }
    }

    /// TDEE multiplier for this level
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

/// A user's biometric profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub target_weight_kg: f64,
}

impl Profile {
    /// Build a validated profile
    ///
    /// Measurements must be finite and positive. Categorical values never fail
    /// here; they are parsed leniently by `Gender::from_str` and
    /// `ActivityLevel::from_str`.
    pub fn new(
        weight_kg: f64,
        height_cm: f64,
        age: u32,
        gender: Gender,
        activity_level: ActivityLevel,
        target_weight_kg: f64,
    ) -> Result<Self, ProfileError> {
        let profile = Self {
            weight_kg,
            height_cm,
            age,
            gender,
            activity_level,
            target_weight_kg,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Check measurements and age
    pub fn validate(&self) -> Result<(), ProfileError> {
        check_measurement("weight_kg", self.weight_kg)?;
        check_measurement("height_cm", self.height_cm)?;
        check_measurement("target_weight_kg", self.target_weight_kg)?;
        if self.age > MAX_AGE {
            return Err(ProfileError::InvalidAge {
                age: self.age,
                max: MAX_AGE,
            });
        }
        Ok(())
    }
}

fn check_measurement(field: &'static str, value: f64) -> Result<(), ProfileError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ProfileError::InvalidMeasurement { field, value })
    }
}
