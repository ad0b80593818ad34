//! Serde data file structs for production data.
//!
//! These define the on-disk format for recipes and the schedule. They are
//! deserialized from RON, JSON, or TOML and then resolved into core types by
//! the loader. Names are plain strings here; item kinds are parsed and recipe
//! references are checked during resolution.

use serde::Deserialize;

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    /// Item kind the recipe produces, as `category:subtype`.
    pub product: String,
    /// `(item, per_unit)` pairs.
    pub ingredients: Vec<(String, f64)>,
}

// ===========================================================================
// Schedule
// ===========================================================================

/// Scheduler settings and the tier list. Every setting except `tiers` has a
/// default.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleData {
    #[serde(default = "default_batch_size")]
    pub batch_size: f64,
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,
    #[serde(default = "default_recount_interval_secs")]
    pub recount_interval_secs: u32,
    #[serde(default = "default_dispatch_history")]
    pub dispatch_history: usize,
    /// Minimum for tiers that don't set their own.
    #[serde(default = "default_minimum")]
    pub default_minimum: f64,
    /// Lowest tier first.
    pub tiers: Vec<TierData>,
}

/// One tier of the schedule.
#[derive(Debug, Clone, Deserialize)]
pub struct TierData {
    pub recipe: String,
    #[serde(default)]
    pub minimum: Option<f64>,
}

fn default_batch_size() -> f64 {
    100.0
}

fn default_retry_limit() -> u32 {
    10
}

fn default_recount_interval_secs() -> u32 {
    60
}

fn default_dispatch_history() -> usize {
    32
}

fn default_minimum() -> f64 {
    5000.0
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_data_from_ron() {
        let ron = r#"
            (
                name: "tech4x",
                product: "component:tech4x",
                ingredients: [("component:tech2x", 5.0), ("ingot:uranium", 10.0)],
            )
        "#;
        let recipe: RecipeData = ron::from_str(ron).unwrap();
        assert_eq!(recipe.name, "tech4x");
        assert_eq!(recipe.product, "component:tech4x");
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[1].0, "ingot:uranium");
        assert!((recipe.ingredients[1].1 - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn recipe_data_from_json() {
        let json = r#"{
            "name": "tech2x",
            "product": "component:tech2x",
            "ingredients": [["ingot:iron", 90], ["ingot:gold", 16.5]]
        }"#;
        let recipe: RecipeData = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.ingredients[0], ("ingot:iron".to_string(), 90.0));
        assert!((recipe.ingredients[1].1 - 16.5).abs() < f64::EPSILON);
    }

    #[test]
    fn recipe_data_from_toml() {
        let toml_str = r#"
            name = "tech8x"
            product = "component:tech8x"
            ingredients = [["component:tech4x", 5.0], ["ingot:platinum", 10.0]]
        "#;
        let recipe: RecipeData = toml::from_str(toml_str).unwrap();
        assert_eq!(recipe.name, "tech8x");
        assert_eq!(recipe.ingredients[0].0, "component:tech4x");
    }

    #[test]
    fn schedule_defaults_from_ron() {
        let ron = r#"(tiers: [(recipe: "tech2x"), (recipe: "tech4x")])"#;
        let schedule: ScheduleData = ron::from_str(ron).unwrap();
        assert!((schedule.batch_size - 100.0).abs() < f64::EPSILON);
        assert_eq!(schedule.retry_limit, 10);
        assert_eq!(schedule.recount_interval_secs, 60);
        assert_eq!(schedule.dispatch_history, 32);
        assert!((schedule.default_minimum - 5000.0).abs() < f64::EPSILON);
        assert_eq!(schedule.tiers.len(), 2);
        assert!(schedule.tiers[0].minimum.is_none());
    }

    #[test]
    fn schedule_overrides_from_toml() {
        let toml_str = r#"
            batch_size = 25.0
            retry_limit = 3
            recount_interval_secs = 5

            [[tiers]]
            recipe = "tech2x"
            minimum = 250.0

            [[tiers]]
            recipe = "tech4x"
        "#;
        let schedule: ScheduleData = toml::from_str(toml_str).unwrap();
        assert!((schedule.batch_size - 25.0).abs() < f64::EPSILON);
        assert_eq!(schedule.retry_limit, 3);
        assert_eq!(schedule.recount_interval_secs, 5);
        assert_eq!(schedule.tiers[0].minimum, Some(250.0));
        assert_eq!(schedule.tiers[1].minimum, None);
    }

    #[test]
    fn schedule_requires_tiers() {
        let result: Result<ScheduleData, _> = serde_json::from_str(r#"{"batch_size": 1.0}"#);
        assert!(result.is_err());
    }
}
