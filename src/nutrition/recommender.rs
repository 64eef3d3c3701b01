//! Calorie-match recommender
//!
//! Picks a set of foods whose calories add up close to a target. A bounded
//! depth-first search over combinations looks for the closest in-tolerance sum;
//! when it finds nothing, a greedy pass and finally a top-N pick take over so a
//! non-empty catalog always yields a non-empty selection.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::{sorted_by_calories, total_calories, FoodItem, SortOrder};

/// Tolerance as a share of the target used by `tolerance_for`
pub const DEFAULT_TOLERANCE_RATIO: f64 = 0.08;

/// Greedy fallback accepts items while the total stays under target * this
pub const GREEDY_CEILING_RATIO: f64 = 1.05;

/// Greedy fallback stops once the total reaches target * this
pub const GREEDY_FLOOR_RATIO: f64 = 0.9;

/// Recommender input errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecommendError {
    #[error("target calories must be positive, got {0}")]
    NonPositiveTarget(i64),

    #[error("tolerance cannot be negative, got {0}")]
    NegativeTolerance(i64),
}

/// Which stage produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Search,
    Greedy,
    TopN,
}

/// Selected foods and their calorie total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub items: Vec<FoodItem>,
    pub total: i64,
    pub strategy: Strategy,
    /// Nodes expanded by the combination search (0 when it was skipped)
    pub nodes_visited: usize,
    /// The search stopped on its node budget before exhausting the space
    pub budget_exhausted: bool,
}

impl Recommendation {
    fn new(items: Vec<FoodItem>, strategy: Strategy) -> Self {
        let total = total_calories(&items);
        Self {
            items,
            total,
            strategy,
            nodes_visited: 0,
            budget_exhausted: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Search and fallback limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Catalogs longer than this skip the combination search
    pub max_search_items: usize,
    /// Maximum nodes the combination search may expand
    pub node_budget: usize,
    /// How many items the last-resort fallback returns
    pub fallback_count: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            max_search_items: 128,
            node_budget: 250_000,
            fallback_count: 5,
        }
    }
}

/// Default tolerance for a target: 8% of it, truncated
pub fn tolerance_for(target: i64) -> i64 {
    (target as f64 * DEFAULT_TOLERANCE_RATIO).trunc() as i64
}

/// Result of `search_combination`
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Best in-tolerance combination, in ascending-calorie order
    pub best: Option<Vec<FoodItem>>,
    /// `best` hits the target exactly; the search stopped there
    pub exact: bool,
    pub nodes_visited: usize,
    pub budget_exhausted: bool,
}

#[derive(Debug, Clone)]
struct Candidate {
    diff: i64,
    picks: Vec<usize>,
}

#[derive(Debug, Default)]
struct Branch {
    best: Option<Candidate>,
    exact: bool,
}

impl Branch {
    /// Keep the strictly closer candidate; earlier finds win ties
    fn absorb(&mut self, other: Branch) {
        if let Some(candidate) = other.best {
            let closer = match &self.best {
                Some(current) => candidate.diff < current.diff,
                None => true,
            };
            if closer {
                self.best = Some(candidate);
            }
        }
        self.exact |= other.exact;
    }
}

struct Walker<'a> {
    items: &'a [FoodItem],
    target: i64,
    tolerance: i64,
    ceiling: i64,
    budget: usize,
    visited: usize,
    exhausted: bool,
    path: Vec<usize>,
}

impl Walker<'_> {
    fn descend(&mut self, start: usize, sum: i64) -> Branch {
        self.visited += 1;
        let mut branch = Branch::default();

        let diff = (sum - self.target).abs();
        if !self.path.is_empty() && diff <= self.tolerance {
            branch.best = Some(Candidate {
                diff,
                picks: self.path.clone(),
            });
            if diff == 0 {
                branch.exact = true;
                return branch;
            }
        }

        if sum > self.ceiling {
            return branch;
        }

        for index in start..self.items.len() {
            let next = sum + i64::from(self.items[index].calories);
            // Ascending order: every later item overshoots too
            if next > self.ceiling {
                break;
            }
            if self.visited >= self.budget {
                self.exhausted = true;
                break;
            }

            self.path.push(index);
            let child = self.descend(index + 1, next);
            self.path.pop();

            branch.absorb(child);
            if branch.exact {
                break;
            }
        }

        branch
    }
}

/// Depth-first search for the combination whose sum is closest to `target`
/// within `tolerance`
///
/// Items are tried in ascending calorie order, each at most once. A branch is
/// cut as soon as its sum passes `target + tolerance`, and an exact hit ends
/// the whole search.
pub fn search_combination(
    catalog: &[FoodItem],
    target: i64,
    tolerance: i64,
    node_budget: usize,
) -> SearchOutcome {
    let sorted = sorted_by_calories(catalog, SortOrder::Asc);
    let mut walker = Walker {
        items: &sorted,
        target,
        tolerance,
        ceiling: target.saturating_add(tolerance),
        budget: node_budget,
        visited: 0,
        exhausted: false,
        path: Vec::new(),
    };

    let branch = walker.descend(0, 0);
    let best: Option<Vec<FoodItem>> = branch
        .best
        .map(|candidate| candidate.picks.iter().map(|&i| sorted[i].clone()).collect());

    SearchOutcome {
        best,
        exact: branch.exact,
        nodes_visited: walker.visited,
        budget_exhausted: walker.exhausted,
    }
}

/// Largest-first accumulation into the [0.9, 1.05] * target band
pub fn greedy_selection(catalog: &[FoodItem], target: i64) -> Vec<FoodItem> {
    let ceiling = target as f64 * GREEDY_CEILING_RATIO;
    let floor = target as f64 * GREEDY_FLOOR_RATIO;

    let mut chosen = Vec::new();
    let mut total: i64 = 0;
    for item in sorted_by_calories(catalog, SortOrder::Desc) {
        let calories = i64::from(item.calories);
        if (total + calories) as f64 <= ceiling {
            total += calories;
            chosen.push(item);
        }
        if total as f64 >= floor {
            break;
        }
    }
    chosen
}

/// The `count` highest-calorie items
pub fn top_n(catalog: &[FoodItem], count: usize) -> Vec<FoodItem> {
    let mut items = sorted_by_calories(catalog, SortOrder::Desc);
    items.truncate(count);
    items
}

/// Calorie-match recommender with explicit limits
#[derive(Debug, Clone, Copy, Default)]
pub struct Recommender {
    config: RecommenderConfig,
}

impl Recommender {
    pub fn new(config: RecommenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Select foods summing close to `target`
    pub fn recommend(
        &self,
        catalog: &[FoodItem],
        target: i64,
        tolerance: i64,
    ) -> Result<Recommendation, RecommendError> {
        if target <= 0 {
            return Err(RecommendError::NonPositiveTarget(target));
        }
        if tolerance < 0 {
            return Err(RecommendError::NegativeTolerance(tolerance));
        }

        let mut nodes_visited = 0;
        let mut budget_exhausted = false;
        if catalog.len() <= self.config.max_search_items {
            let outcome = search_combination(catalog, target, tolerance, self.config.node_budget);
            nodes_visited = outcome.nodes_visited;
            budget_exhausted = outcome.budget_exhausted;
            if let Some(items) = outcome.best {
                let mut recommendation = Recommendation::new(items, Strategy::Search);
                recommendation.nodes_visited = nodes_visited;
                recommendation.budget_exhausted = budget_exhausted;
                return Ok(recommendation);
            }
        }

        let greedy = greedy_selection(catalog, target);
        let mut recommendation = if greedy.is_empty() {
            Recommendation::new(top_n(catalog, self.config.fallback_count), Strategy::TopN)
        } else {
            Recommendation::new(greedy, Strategy::Greedy)
        };
        recommendation.nodes_visited = nodes_visited;
        recommendation.budget_exhausted = budget_exhausted;
        Ok(recommendation)
    }
}

/// Recommend with default limits
pub fn recommend(
    catalog: &[FoodItem],
    target: i64,
    tolerance: i64,
) -> Result<Recommendation, RecommendError> {
    Recommender::default().recommend(catalog, target, tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::catalog::default_catalog;

    fn items(pairs: &[(&str, u32)]) -> Vec<FoodItem> {
        pairs.iter().map(|(n, c)| FoodItem::new(*n, *c)).collect()
    }

    fn names(items: &[FoodItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_exact_match_short_circuits() {
        let catalog = items(&[("C", 250), ("A", 100), ("B", 150)]);
        let outcome = search_combination(&catalog, 250, 0, 1_000);
        assert!(outcome.exact);
        let best = outcome.best.unwrap();
        assert_eq!(total_calories(&best), 250);
        // Ascending enumeration reaches A+B before C on its own
        assert_eq!(names(&best), vec!["A", "B"]);
        // root, A, A+B
        assert_eq!(outcome.nodes_visited, 3);
    }

    #[test]
    fn test_search_prefers_closest_within_tolerance() {
        let catalog = items(&[("X", 90), ("Y", 120), ("Z", 200)]);
        let outcome = search_combination(&catalog, 300, 20, 1_000);
        assert!(!outcome.exact);
        let best = outcome.best.unwrap();
        // 90+200=290 (diff 10) beats 90+120=210 (out) and 120+200=320 (diff 20)
        assert_eq!(names(&best), vec!["X", "Z"]);
    }

    #[test]
    fn test_search_ties_keep_first_found() {
        let catalog = items(&[("P", 95), ("Q", 105)]);
        let outcome = search_combination(&catalog, 100, 5, 1_000);
        assert_eq!(names(&outcome.best.unwrap()), vec!["P"]);
    }

    #[test]
    fn test_search_never_returns_empty_combination() {
        let catalog = items(&[("Big", 500)]);
        let outcome = search_combination(&catalog, 10, 20, 1_000);
        assert!(outcome.best.is_none());
    }

    #[test]
    fn test_search_respects_node_budget() {
        let catalog: Vec<_> = (0..30).map(|i| FoodItem::new(format!("f{}", i), 7)).collect();
        let outcome = search_combination(&catalog, 1_000, 0, 50);
        assert!(outcome.budget_exhausted);
        assert!(outcome.nodes_visited <= 50);
        assert!(outcome.best.is_none());
    }

    #[test]
    fn test_recommend_uses_search_result() {
        let catalog = items(&[("A", 100), ("B", 150), ("C", 250)]);
        let rec = recommend(&catalog, 250, 0).unwrap();
        assert_eq!(rec.strategy, Strategy::Search);
        assert_eq!(rec.total, 250);
    }

    #[test]
    fn test_fallback_never_empty_for_nonempty_catalog() {
        let catalog = items(&[("X", 1000)]);
        let rec = recommend(&catalog, 1, 0).unwrap();
        assert_eq!(rec.strategy, Strategy::TopN);
        assert_eq!(names(&rec.items), vec!["X"]);
        assert_eq!(rec.total, 1000);
    }

    #[test]
    fn test_greedy_fallback_band() {
        // Nothing lands within 0..=tolerance of 1000, greedy gets to [900, 1050]
        let catalog = items(&[("a", 600), ("b", 330), ("c", 20), ("d", 5)]);
        let rec = recommend(&catalog, 1000, 0).unwrap();
        assert_eq!(rec.strategy, Strategy::Greedy);
        assert_eq!(names(&rec.items), vec!["a", "b"]);
        assert_eq!(rec.total, 930);
    }

    #[test]
    fn test_greedy_skips_items_over_ceiling() {
        let catalog = items(&[("huge", 5000), ("mid", 400), ("small", 300)]);
        let chosen = greedy_selection(&catalog, 1000);
        assert_eq!(names(&chosen), vec!["mid", "small"]);
    }

    #[test]
    fn test_top_n_limits_count() {
        let catalog: Vec<_> = (1..=8).map(|i| FoodItem::new(format!("f{}", i), i * 1000)).collect();
        let rec = Recommender::new(RecommenderConfig {
            fallback_count: 3,
            ..Default::default()
        })
        .recommend(&catalog, 10, 0)
        .unwrap();
        assert_eq!(rec.strategy, Strategy::TopN);
        assert_eq!(names(&rec.items), vec!["f8", "f7", "f6"]);
    }

    #[test]
    fn test_large_catalog_skips_search() {
        let catalog = items(&[("A", 100), ("B", 150), ("C", 250)]);
        let rec = Recommender::new(RecommenderConfig {
            max_search_items: 2,
            ..Default::default()
        })
        .recommend(&catalog, 250, 0)
        .unwrap();
        assert_eq!(rec.strategy, Strategy::Greedy);
        assert_eq!(rec.nodes_visited, 0);
        assert_eq!(names(&rec.items), vec!["C"]);
    }

    #[test]
    fn test_empty_catalog_yields_empty_selection() {
        let rec = recommend(&[], 2000, 160).unwrap();
        assert!(rec.is_empty());
        assert_eq!(rec.total, 0);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let catalog = items(&[("A", 100)]);
        assert_eq!(
            recommend(&catalog, 0, 10).unwrap_err(),
            RecommendError::NonPositiveTarget(0)
        );
        assert_eq!(
            recommend(&catalog, -50, 10).unwrap_err(),
            RecommendError::NonPositiveTarget(-50)
        );
        assert_eq!(
            recommend(&catalog, 100, -1).unwrap_err(),
            RecommendError::NegativeTolerance(-1)
        );
    }

    #[test]
    fn test_tolerance_for_truncates() {
        assert_eq!(tolerance_for(2000), 160);
        assert_eq!(tolerance_for(2056), 164);
        assert_eq!(tolerance_for(12), 0);
    }

    #[test]
    fn test_default_catalog_daily_target() {
        let catalog = default_catalog();
        let target = 2056;
        let rec = recommend(&catalog, target, tolerance_for(target)).unwrap();
        assert!(!rec.is_empty());
        assert_eq!(rec.strategy, Strategy::Search);
        assert!((rec.total - target).abs() <= tolerance_for(target));
    }
}
