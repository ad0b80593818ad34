//! Threshold policy that picks the next production tier.
//!
//! Tiers are ordered lowest first. The lowest tier whose product stock is
//! strictly below its minimum wins; when every lower tier is stocked the top
//! tier is chosen. The top tier is a sink and is never counted.

use std::collections::HashSet;

use crate::catalog::RecipeCatalog;
use crate::fixed::Quantity;
use crate::id::{ItemKind, RecipeId};
use crate::ledger::StockTally;

/// A tier as configured: which recipe, and the stock it must be kept above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSpec {
    pub recipe: RecipeId,
    pub minimum: Quantity,
}

impl TierSpec {
    pub fn new(recipe: impl Into<RecipeId>, minimum: Quantity) -> Self {
        Self {
            recipe: recipe.into(),
            minimum,
        }
    }

    /// A top tier; its minimum is never consulted.
    pub fn top(recipe: impl Into<RecipeId>) -> Self {
        Self::new(recipe, Quantity::ZERO)
    }
}

/// A tier resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    pub recipe: RecipeId,
    pub product: ItemKind,
    pub minimum: Quantity,
}

/// The outcome of one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierDecision {
    /// Position in the policy, 0 = lowest.
    pub index: usize,
    pub recipe: RecipeId,
    /// Stock that triggered the choice. `None` when the top tier was chosen
    /// as the fallback.
    pub stock: Option<Quantity>,
}

impl TierDecision {
    pub fn is_fallback(&self) -> bool {
        self.stock.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct TierPolicy {
    tiers: Vec<Tier>,
}

impl TierPolicy {
    /// Resolve `specs` (lowest first) against `catalog`.
    pub fn new(specs: Vec<TierSpec>, catalog: &RecipeCatalog) -> Result<Self, PolicyError> {
        if specs.is_empty() {
            return Err(PolicyError::Empty);
        }

        let top = specs.len() - 1;
        let mut seen = HashSet::new();
        let mut tiers = Vec::with_capacity(specs.len());
        for (index, spec) in specs.into_iter().enumerate() {
            if !seen.insert(spec.recipe.clone()) {
                return Err(PolicyError::DuplicateTier(spec.recipe));
            }
            if index < top && spec.minimum < Quantity::ZERO {
                return Err(PolicyError::NegativeMinimum(spec.recipe));
            }
            let recipe = catalog
                .get(&spec.recipe)
                .ok_or_else(|| PolicyError::UnknownRecipe(spec.recipe.clone()))?;
            tiers.push(Tier {
                product: recipe.product.clone(),
                recipe: spec.recipe,
                minimum: spec.minimum,
            });
        }

        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn lowest(&self) -> &Tier {
        &self.tiers[0]
    }

    pub fn top(&self) -> &Tier {
        &self.tiers[self.tiers.len() - 1]
    }

    /// Products whose stock drives selection: every tier but the top.
    pub fn tracked_products(&self) -> Vec<ItemKind> {
        self.tiers[..self.tiers.len() - 1]
            .iter()
            .map(|t| t.product.clone())
            .collect()
    }

    pub fn select(&self, stock: &StockTally) -> TierDecision {
        let lower = &self.tiers[..self.tiers.len() - 1];
        for (index, tier) in lower.iter().enumerate() {
            let held = stock.get(&tier.product);
            if held < tier.minimum {
                return TierDecision {
                    index,
                    recipe: tier.recipe.clone(),
                    stock: Some(held),
                };
            }
        }

        TierDecision {
            index: self.tiers.len() - 1,
            recipe: self.top().recipe.clone(),
            stock: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("tier policy needs at least one tier")]
    Empty,
    #[error("tier recipe {0} is not in the catalog")]
    UnknownRecipe(RecipeId),
    #[error("recipe {0} appears in more than one tier")]
    DuplicateTier(RecipeId),
    #[error("tier {0} has a negative minimum")]
    NegativeMinimum(RecipeId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn stock(tech2_count: i32, tech4_count: i32) -> StockTally {
        let mut t = StockTally::new();
        t.set(tech2(), qty(tech2_count));
        t.set(tech4(), qty(tech4_count));
        t
    }

    #[test]
    fn tracked_products_exclude_top() {
        let policy = tech_policy(&tech_catalog(), 500);
        assert_eq!(policy.tracked_products(), vec![tech2(), tech4()]);
        assert_eq!(policy.lowest().recipe, recipe("tech2x"));
        assert_eq!(policy.top().product, tech8());
    }

    #[test]
    fn lowest_short_tier_wins() {
        let policy = tech_policy(&tech_catalog(), 500);
        let decision = policy.select(&stock(100, 0));
        assert_eq!(decision.index, 0);
        assert_eq!(decision.recipe, recipe("tech2x"));
        assert_eq!(decision.stock, Some(qty(100)));
    }

    #[test]
    fn stocked_lower_tier_moves_up() {
        let policy = tech_policy(&tech_catalog(), 500);
        let decision = policy.select(&stock(550, 100));
        assert_eq!(decision.recipe, recipe("tech4x"));
        assert_eq!(decision.stock, Some(qty(100)));
    }

    #[test]
    fn threshold_is_strict() {
        let policy = tech_policy(&tech_catalog(), 500);
        assert_eq!(policy.select(&stock(500, 0)).recipe, recipe("tech4x"));
        assert_eq!(policy.select(&stock(499, 0)).recipe, recipe("tech2x"));
    }

    #[test]
    fn everything_stocked_falls_back_to_top() {
        let policy = tech_policy(&tech_catalog(), 500);
        let decision = policy.select(&stock(500, 9000));
        assert_eq!(decision.recipe, recipe("tech8x"));
        assert_eq!(decision.index, 2);
        assert!(decision.is_fallback());
    }

    #[test]
    fn missing_counts_read_as_zero() {
        let policy = tech_policy(&tech_catalog(), 500);
        assert_eq!(policy.select(&StockTally::new()).recipe, recipe("tech2x"));
    }

    #[test]
    fn per_tier_minimums() {
        let catalog = tech_catalog();
        let policy = TierPolicy::new(
            vec![
                TierSpec::new("tech2x", qty(100)),
                TierSpec::new("tech4x", qty(1000)),
                TierSpec::top("tech8x"),
            ],
            &catalog,
        )
        .unwrap();
        assert_eq!(policy.select(&stock(150, 999)).recipe, recipe("tech4x"));
        assert_eq!(policy.select(&stock(150, 1000)).recipe, recipe("tech8x"));
    }

    #[test]
    fn single_tier_policy_always_selects_it() {
        let catalog = tech_catalog();
        let policy = TierPolicy::new(vec![TierSpec::top("tech2x")], &catalog).unwrap();
        assert!(policy.tracked_products().is_empty());
        assert_eq!(policy.select(&StockTally::new()).recipe, recipe("tech2x"));
    }

    #[test]
    fn invalid_policies_rejected() {
        let catalog = tech_catalog();
        assert_eq!(TierPolicy::new(vec![], &catalog).unwrap_err(), PolicyError::Empty);
        assert_eq!(
            TierPolicy::new(vec![TierSpec::top("tech16x")], &catalog).unwrap_err(),
            PolicyError::UnknownRecipe(recipe("tech16x"))
        );
        assert_eq!(
            TierPolicy::new(
                vec![TierSpec::new("tech2x", qty(1)), TierSpec::top("tech2x")],
                &catalog
            )
            .unwrap_err(),
            PolicyError::DuplicateTier(recipe("tech2x"))
        );
    }

    #[test]
    fn negative_minimum_rejected_below_the_top() {
        let catalog = tech_catalog();
        assert_eq!(
            TierPolicy::new(
                vec![TierSpec::new("tech2x", qty(-1)), TierSpec::top("tech8x")],
                &catalog
            )
            .unwrap_err(),
            PolicyError::NegativeMinimum(recipe("tech2x"))
        );
        // The top tier's minimum is never consulted.
        assert!(
            TierPolicy::new(
                vec![TierSpec::new("tech2x", qty(0)), TierSpec::new("tech8x", qty(-1))],
                &catalog
            )
            .is_ok()
        );
    }
}
