use crate::error::SchedulerError;
use crate::fixed::Quantity;
use crate::id::{ItemKind, RecipeId};
use std::collections::HashMap;

/// One ingredient line of a recipe: how much of `item` one unit consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub item: ItemKind,
    pub per_unit: Quantity,
}

impl Ingredient {
    pub fn new(item: ItemKind, per_unit: Quantity) -> Self {
        Self { item, per_unit }
    }
}

/// A recipe definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: RecipeId,
    /// The good one unit of this recipe yields.
    pub product: ItemKind,
    /// Ordered, non-empty.
    pub ingredients: Vec<Ingredient>,
}

/// Builder for an immutable [`RecipeCatalog`].
/// Register everything, then `build()` validates and freezes.
#[derive(Debug, Default)]
pub struct RecipeCatalogBuilder {
    recipes: Vec<Recipe>,
}

impl RecipeCatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipe. Validation is deferred to [`build`](Self::build).
    pub fn register(
        &mut self,
        id: impl Into<RecipeId>,
        product: ItemKind,
        ingredients: Vec<Ingredient>,
    ) -> &mut Self {
        self.recipes.push(Recipe {
            id: id.into(),
            product,
            ingredients,
        });
        self
    }

    pub fn build(self) -> Result<RecipeCatalog, CatalogError> {
        let mut index = HashMap::with_capacity(self.recipes.len());
        for (i, recipe) in self.recipes.iter().enumerate() {
            if recipe.ingredients.is_empty() {
                return Err(CatalogError::EmptyRecipe(recipe.id.clone()));
            }
            if let Some(bad) = recipe.ingredients.iter().find(|i| i.per_unit < Quantity::ZERO) {
                return Err(CatalogError::NegativeQuantity {
                    recipe: recipe.id.clone(),
                    item: bad.item.clone(),
                });
            }
            if index.insert(recipe.id.clone(), i).is_some() {
                return Err(CatalogError::Duplicate(recipe.id.clone()));
            }
        }

        Ok(RecipeCatalog {
            recipes: self.recipes,
            index,
        })
    }
}

/// Immutable recipe lookup. Frozen after build.
#[derive(Debug, Clone)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
    index: HashMap<RecipeId, usize>,
}

impl RecipeCatalog {
    pub fn recipe_for(&self, id: &RecipeId) -> Result<&Recipe, SchedulerError> {
        self.get(id)
            .ok_or_else(|| SchedulerError::UnknownRecipe(id.clone()))
    }

    pub fn get(&self, id: &RecipeId) -> Option<&Recipe> {
        self.index.get(id).map(|&i| &self.recipes[i])
    }

    pub fn contains(&self, id: &RecipeId) -> bool {
        self.index.contains_key(id)
    }

    /// Recipes in registration order.
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate recipe: {0}")]
    Duplicate(RecipeId),
    #[error("recipe {0} has no ingredients")]
    EmptyRecipe(RecipeId),
    #[error("recipe {recipe} has a negative quantity of {item}")]
    NegativeQuantity { recipe: RecipeId, item: ItemKind },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iron() -> ItemKind {
        ItemKind::new("ingot", "iron")
    }

    fn silicon() -> ItemKind {
        ItemKind::new("ingot", "silicon")
    }

    fn setup_builder() -> RecipeCatalogBuilder {
        let mut b = RecipeCatalogBuilder::new();
        b.register(
            "tech2x",
            ItemKind::new("component", "tech2x"),
            vec![
                Ingredient::new(iron(), Quantity::from_num(90)),
                Ingredient::new(silicon(), Quantity::from_num(80)),
            ],
        );
        b
    }

    #[test]
    fn register_and_lookup() {
        let catalog = setup_builder().build().unwrap();
        assert_eq!(catalog.len(), 1);
        let recipe = catalog.recipe_for(&"tech2x".into()).unwrap();
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].item, iron());
        assert_eq!(recipe.product, ItemKind::new("component", "tech2x"));
    }

    #[test]
    fn unknown_recipe_is_an_error() {
        let catalog = setup_builder().build().unwrap();
        let err = catalog.recipe_for(&"tech16x".into()).unwrap_err();
        assert_eq!(err, SchedulerError::UnknownRecipe("tech16x".into()));
        assert!(!catalog.contains(&"tech16x".into()));
    }

    #[test]
    fn ingredient_order_is_preserved() {
        let catalog = setup_builder().build().unwrap();
        let recipe = catalog.recipes().next().unwrap();
        let items: Vec<_> = recipe
            .ingredients
            .iter()
            .map(|i| i.item.subtype().to_string())
            .collect();
        assert_eq!(items, ["iron", "silicon"]);
    }

    #[test]
    fn empty_recipe_fails() {
        let mut b = RecipeCatalogBuilder::new();
        b.register("nothing", iron(), vec![]);
        assert_eq!(b.build().unwrap_err(), CatalogError::EmptyRecipe("nothing".into()));
    }

    #[test]
    fn duplicate_recipe_fails() {
        let mut b = setup_builder();
        b.register("tech2x", iron(), vec![Ingredient::new(silicon(), Quantity::from_num(1))]);
        assert!(matches!(b.build(), Err(CatalogError::Duplicate(_))));
    }

    #[test]
    fn negative_quantity_fails() {
        let mut b = RecipeCatalogBuilder::new();
        b.register("bad", iron(), vec![Ingredient::new(silicon(), Quantity::from_num(-1))]);
        match b.build() {
            Err(CatalogError::NegativeQuantity { recipe, item }) => {
                assert_eq!(recipe, RecipeId::new("bad"));
                assert_eq!(item, silicon());
            }
            other => panic!("expected NegativeQuantity, got: {other:?}"),
        }
    }

    #[test]
    fn empty_catalog_builds() {
        let catalog = RecipeCatalogBuilder::new().build().unwrap();
        assert!(catalog.is_empty());
    }
}
