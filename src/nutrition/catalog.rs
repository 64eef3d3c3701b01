//! Food catalog
//!
//! The in-memory food list the recommender draws from, plus lookup and sort helpers.

use serde::{Deserialize, Serialize};

/// A food with its calorie count. Names compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub calories: u32,
}

impl FoodItem {
    pub fn new(name: impl Into<String>, calories: u32) -> Self {
        Self {
            name: name.into(),
            calories,
        }
    }

    /// Case-insensitive name comparison
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// Sort direction for calorie listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_str(s: &str) -> Self {
        if s.trim().to_lowercase().starts_with("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// All items whose name matches `name` case-insensitively, in catalog order
pub fn find_by_name<'a>(catalog: &'a [FoodItem], name: &str) -> Vec<&'a FoodItem> {
    catalog.iter().filter(|item| item.matches_name(name)).collect()
}

/// First case-insensitive name match
pub fn first_by_name<'a>(catalog: &'a [FoodItem], name: &str) -> Option<&'a FoodItem> {
    catalog.iter().find(|item| item.matches_name(name))
}

/// Items whose name contains `term`, ignoring case
pub fn search<'a>(catalog: &'a [FoodItem], term: &str) -> Vec<&'a FoodItem> {
    let needle = term.trim().to_lowercase();
    catalog
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .collect()
}

/// Stable sort by calories. Equal-calorie items keep their catalog order.
pub fn sorted_by_calories(catalog: &[FoodItem], order: SortOrder) -> Vec<FoodItem> {
    let mut items = catalog.to_vec();
    match order {
        SortOrder::Asc => items.sort_by_key(|item| item.calories),
        SortOrder::Desc => items.sort_by(|a, b| b.calories.cmp(&a.calories)),
    }
    items
}

pub fn total_calories(items: &[FoodItem]) -> i64 {
    items.iter().map(|item| i64::from(item.calories)).sum()
}

/// Starter catalog (name, kcal per typical portion)
pub const DEFAULT_CATALOG: &[(&str, u32)] = &[
    ("Oatmeal", 150), ("Eggs", 155), ("Chicken Breast", 200), ("Rice", 180),
    ("Salad", 120), ("Fish", 220), ("Apple", 80), ("Banana", 100),
    ("Milk", 130), ("Yogurt", 95), ("Almonds", 160), ("Peanut Butter", 190),
    ("Cheese", 200), ("Broccoli", 55), ("Carrots", 50), ("Sweet Potato", 100),
    ("Quinoa", 120), ("Lentils", 115), ("Tofu", 150), ("Turkey", 180),
    ("Spinach", 25), ("Avocado", 160), ("Strawberries", 45), ("Blueberries", 50),
    ("Orange", 62), ("Watermelon", 30), ("Cucumber", 16), ("Tomato", 20),
    ("Beef", 250), ("Pork", 220), ("Shrimp", 100), ("Salmon", 208),
    ("Tuna", 180), ("Pasta", 210), ("Bread", 80), ("Bagel", 250),
    ("Cereal", 110), ("Granola", 120), ("Honey", 64), ("Jam", 50),
    ("Chocolate", 210), ("Ice Cream", 207), ("Chickpeas", 120), ("Black Beans", 110),
    ("Kidney Beans", 115), ("Rice Cakes", 35), ("Popcorn", 90), ("Walnuts", 180),
    ("Cashews", 160), ("Sunflower Seeds", 170), ("Pumpkin Seeds", 150), ("Oats", 130),
    ("Cottage Cheese", 120), ("Egg Whites", 17), ("Green Peas", 81), ("Zucchini", 20),
    ("Mushrooms", 22), ("Onions", 40), ("Garlic", 5), ("Bell Pepper", 30),
    ("Cabbage", 25), ("Cauliflower", 25), ("Green Beans", 35), ("Brussels Sprouts", 38),
    ("Asparagus", 20), ("Pineapple", 50), ("Mango", 60), ("Papaya", 43),
    ("Kiwi", 42), ("Grapes", 70), ("Pear", 57), ("Peach", 59),
    ("Plum", 46), ("Apricot", 48), ("Pomegranate", 83), ("Dates", 277),
    ("Raisins", 299), ("Figs", 74), ("Brown Rice", 215), ("Barley", 193),
    ("Millet", 207), ("Bulgur", 150), ("Buckwheat", 155), ("Rye Bread", 83),
    ("Sourdough", 120), ("Tortilla", 140), ("Avocado Toast", 190), ("Hummus", 75),
    ("Falafel", 150), ("Tempeh", 190), ("Soy Milk", 80), ("Coconut Milk", 45),
    ("Green Tea", 0), ("Black Coffee", 5), ("Protein Shake", 200),
];

pub fn default_catalog() -> Vec<FoodItem> {
    DEFAULT_CATALOG
        .iter()
        .map(|(name, calories)| FoodItem::new(*name, *calories))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<FoodItem> {
        vec![
            FoodItem::new("Apple", 80),
            FoodItem::new("Banana", 100),
            FoodItem::new("apple", 95),
            FoodItem::new("Pineapple", 50),
        ]
    }

    #[test]
    fn test_find_by_name_returns_all_case_insensitive_hits() {
        let items = catalog();
        let hits = find_by_name(&items, "APPLE");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].calories, 80);
        assert_eq!(hits[1].calories, 95);
        assert_eq!(first_by_name(&items, " apple ").map(|i| i.calories), Some(80));
        assert!(first_by_name(&items, "kiwi").is_none());
    }

    #[test]
    fn test_search_is_substring_match() {
        let items = catalog();
        let names: Vec<_> = search(&items, "APP").iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "apple", "Pineapple"]);
    }

    #[test]
    fn test_sorted_by_calories_is_stable() {
        let items = vec![
            FoodItem::new("a", 10),
            FoodItem::new("b", 5),
            FoodItem::new("c", 10),
        ];
        let asc: Vec<_> = sorted_by_calories(&items, SortOrder::Asc)
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(asc, vec!["b", "a", "c"]);

        let desc: Vec<_> = sorted_by_calories(&items, SortOrder::Desc)
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(desc, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!(SortOrder::from_str("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::from_str("DESCENDING"), SortOrder::Desc);
        assert_eq!(SortOrder::from_str("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::from_str("whatever"), SortOrder::Asc);
    }

    #[test]
    fn test_default_catalog() {
        let items = default_catalog();
        assert_eq!(items.len(), DEFAULT_CATALOG.len());
        assert_eq!(total_calories(&items[..2]), 305);
        assert!(first_by_name(&items, "green tea").is_some());
    }
}
