//! Runtime configuration
//!
//! Everything is read from the environment with project-relative defaults.

use std::path::PathBuf;

use crate::nutrition::RecommenderConfig;

pub const DATABASE_PATH_VAR: &str = "NUTRISCALE_DATABASE_PATH";
pub const EXPORT_DIR_VAR: &str = "NUTRISCALE_EXPORT_DIR";
pub const MAX_SEARCH_ITEMS_VAR: &str = "NUTRISCALE_MAX_SEARCH_ITEMS";
pub const NODE_BUDGET_VAR: &str = "NUTRISCALE_NODE_BUDGET";
pub const FALLBACK_COUNT_VAR: &str = "NUTRISCALE_FALLBACK_COUNT";

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub export_dir: PathBuf,
    pub recommender: RecommenderConfig,
}

impl Config {
    /// Build the configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Build the configuration from values returned by `get`
    pub fn from_env_with<F>(mut get: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let database_path = get(DATABASE_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let export_dir = get(EXPORT_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_export_dir(&database_path));

        let defaults = RecommenderConfig::default();
        let recommender = RecommenderConfig {
            max_search_items: setting_usize(
                &mut get,
                MAX_SEARCH_ITEMS_VAR,
                defaults.max_search_items,
            ),
            node_budget: setting_usize(&mut get, NODE_BUDGET_VAR, defaults.node_budget),
            fallback_count: setting_usize(&mut get, FALLBACK_COUNT_VAR, defaults.fallback_count),
        };

        Self {
            database_path,
            export_dir,
            recommender,
        }
    }
}

/// `<project>/data/nutriscale.db`, resolved from the executable location
pub fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("nutriscale.db");
    path
}

/// `exports/` next to the database file
pub fn default_export_dir(database_path: &std::path::Path) -> PathBuf {
    database_path
        .parent()
        .map(|dir| dir.join("exports"))
        .unwrap_or_else(|| PathBuf::from("exports"))
}

fn setting_usize<F>(get: &mut F, var: &str, default: usize) -> usize
where
    F: FnMut(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => parse_usize(&raw).unwrap_or_else(|| {
            tracing::warn!(var, value = %raw, "ignoring invalid setting, using default");
            default
        }),
        None => default,
    }
}

fn parse_usize(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|value| *value > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_export_dir_sits_next_to_database() {
        assert_eq!(
            default_export_dir(Path::new("/srv/data/nutriscale.db")),
            PathBuf::from("/srv/data/exports")
        );
    }

    #[test]
    fn test_default_database_path_ends_in_data_dir() {
        let path = default_database_path();
        assert!(path.ends_with("data/nutriscale.db"));
    }

    #[test]
    fn test_from_env_with_reads_overrides() {
        let get = |key: &str| match key {
            DATABASE_PATH_VAR => Some("/srv/nutri/app.db".to_string()),
            NODE_BUDGET_VAR => Some("5000".to_string()),
            FALLBACK_COUNT_VAR => Some("zero".to_string()),
            _ => None,
        };
        let config = Config::from_env_with(get);

        assert_eq!(config.database_path, PathBuf::from("/srv/nutri/app.db"));
        assert_eq!(config.export_dir, PathBuf::from("/srv/nutri/exports"));
        assert_eq!(config.recommender.node_budget, 5000);
        assert_eq!(config.recommender.fallback_count, 5);
        assert_eq!(config.recommender.max_search_items, 128);
    }

    #[test]
    fn test_from_env_with_explicit_export_dir() {
        let get = |key: &str| match key {
            DATABASE_PATH_VAR => Some("/srv/nutri/app.db".to_string()),
            EXPORT_DIR_VAR => Some("/tmp/out".to_string()),
            _ => None,
        };
        let config = Config::from_env_with(get);
        assert_eq!(config.export_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_from_env_with_nothing_set_uses_defaults() {
        let config = Config::from_env_with(|_| None);
        assert!(config.database_path.ends_with("data/nutriscale.db"));
        assert_eq!(config.recommender, RecommenderConfig::default());
    }

    #[test]
    fn test_parse_usize_rejects_zero_and_garbage() {
        assert_eq!(parse_usize(" 64 "), Some(64));
        assert_eq!(parse_usize("0"), None);
        assert_eq!(parse_usize("lots"), None);
    }
}
