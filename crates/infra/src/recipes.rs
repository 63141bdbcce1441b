//! In-memory recipe catalog. Recipe management itself lives elsewhere; this
//! only holds what order placement and stock deduction read.

use std::collections::HashMap;
use std::sync::RwLock;

use galley_core::{DomainError, RecipeId};
use galley_kitchen::{Recipe, RecipeCatalog};

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Default)]
pub struct InMemoryRecipeCatalog {
    recipes: RwLock<HashMap<RecipeId, Recipe>>,
}

impl InMemoryRecipeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, recipe: Recipe) -> ServiceResult<()> {
        if recipe.name.trim().is_empty() {
            return Err(DomainError::validation("recipe name cannot be empty").into());
        }
        if recipe.price < rust_decimal::Decimal::ZERO {
            return Err(DomainError::validation("recipe price cannot be negative").into());
        }
        let mut recipes = self
            .recipes
            .write()
            .map_err(|_| ServiceError::poisoned("recipes"))?;
        recipes.insert(recipe.id, recipe);
        Ok(())
    }

    pub fn list(&self) -> ServiceResult<Vec<Recipe>> {
        let recipes = self
            .recipes
            .read()
            .map_err(|_| ServiceError::poisoned("recipes"))?;
        let mut all: Vec<Recipe> = recipes.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }
}

impl RecipeCatalog for InMemoryRecipeCatalog {
    fn recipe(&self, id: RecipeId) -> Option<Recipe> {
        match self.recipes.read() {
            Ok(recipes) => recipes.get(&id).cloned(),
            Err(_) => {
                tracing::error!("recipe catalog lock poisoned");
                None
            }
        }
    }
}
