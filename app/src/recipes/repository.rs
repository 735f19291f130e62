use anyhow::{Context, Result};
use log::*;

use infra::ids::{Id, IdGen};
use infra::persistence::Storage;

use super::models::Recipe;

/// Loads and saves whole recipes. There is no way to save an
/// ingredient on its own; callers change the aggregate and save all of it.
pub struct RecipeRepository<'a, D> {
    docs: &'a mut D,
    idgen: IdGen,
}

impl<'a, D: Storage> RecipeRepository<'a, D> {
    pub fn new(docs: &'a mut D) -> Self {
        let idgen = IdGen::new();
        RecipeRepository { docs, idgen }
    }

    pub fn load_aggregate(&mut self, id: &Id<Recipe>) -> Result<Option<Recipe>> {
        let recipe = self.docs.load(id).context("load recipe")?;
        debug!("Load {} -> found: {}", id, recipe.is_some());
        Ok(recipe)
    }

    /// Ingredients without an identifier get one here; the returned recipe
    /// is the state that was written.
    pub fn save_aggregate(&mut self, mut recipe: Recipe) -> Result<Recipe> {
        let assigned = recipe.assign_ingredient_ids(&self.idgen);
        self.docs.save(&recipe).context("save recipe")?;
        info!(
            "Updated recipe: {} ({} ingredients, {} new)",
            recipe.meta.id,
            recipe.ingredients.len(),
            assigned
        );
        Ok(recipe)
    }
}
