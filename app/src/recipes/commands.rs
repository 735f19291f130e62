use serde::Serialize;

use crate::ingredients::IngredientCommand;

use super::models::{Category, Difficulty, Recipe};

/// What the recipe pages render; categories are flattened to their names.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecipeCommand {
    pub id: String,
    pub description: String,
    pub prep_time: u32,
    pub cook_time: u32,
    pub servings: u32,
    pub source: String,
    pub url: String,
    pub directions: String,
    pub difficulty: Difficulty,
    pub notes: String,
    pub categories: Vec<String>,
    pub ingredients: Vec<IngredientCommand>,
}

impl RecipeCommand {
    pub(crate) fn new(recipe: &Recipe, categories: &[Category]) -> Self {
        let mut categories = categories
            .iter()
            .filter(|c| recipe.categories.contains(&c.meta.id))
            .map(|c| c.description.clone())
            .collect::<Vec<_>>();
        categories.sort();

        let ingredients = recipe
            .ingredients
            .iter()
            .map(|i| IngredientCommand::from_ingredient(i, &recipe.meta.id))
            .collect();

        RecipeCommand {
            id: recipe.meta.id.to_string(),
            description: recipe.description.clone(),
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            servings: recipe.servings,
            source: recipe.source.clone(),
            url: recipe.url.clone(),
            directions: recipe.directions.clone(),
            difficulty: recipe.difficulty,
            notes: recipe.notes.clone(),
            categories,
            ingredients,
        }
    }
}
