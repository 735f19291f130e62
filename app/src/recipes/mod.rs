use anyhow::Result;
use log::*;
use r2d2::Pool;

use infra::persistence::Storage;

use crate::services::{parse_id, Queryable, Request};

mod commands;
mod models;
mod repository;
mod resources;

pub use self::commands::RecipeCommand;
pub use self::models::{Category, Difficulty, Ingredient, Recipe};
pub use self::repository::RecipeRepository;

#[derive(Debug, Clone, Copy)]
pub struct ListRecipes;

#[derive(Debug, Clone)]
pub struct ShowRecipe {
    pub recipe_id: String,
}

pub struct Recipes<M: r2d2::ManageConnection> {
    db: Pool<M>,
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Recipes<M> {
    pub fn new(db: Pool<M>) -> Self {
        Recipes { db }
    }

    pub fn find_command_by_id(&self, recipe_id: &str) -> Result<Option<RecipeCommand>> {
        let id = match parse_id::<Recipe>(recipe_id) {
            Some(id) => id,
            None => return Ok(None),
        };
        let mut docs = self.db.get()?;
        let recipe = match RecipeRepository::new(&mut *docs).load_aggregate(&id)? {
            Some(recipe) => recipe,
            None => {
                debug!("Recipe not found for id: {}", recipe_id);
                return Ok(None);
            }
        };
        let categories = docs.list::<Category>()?;
        Ok(Some(RecipeCommand::new(&recipe, &categories)))
    }

    pub fn list_recipes(&self) -> Result<Vec<RecipeCommand>> {
        let mut docs = self.db.get()?;
        let categories = docs.list::<Category>()?;
        let mut recipes = docs
            .list::<Recipe>()?
            .iter()
            .map(|recipe| RecipeCommand::new(recipe, &categories))
            .collect::<Vec<_>>();
        recipes.sort_by(|a, b| a.description.cmp(&b.description));
        debug!("Listed {} recipes", recipes.len());
        Ok(recipes)
    }
}

impl Request for ListRecipes {
    type Resp = Vec<RecipeCommand>;
}

impl Request for ShowRecipe {
    type Resp = Option<RecipeCommand>;
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Queryable<ListRecipes>
    for Recipes<M>
{
    fn query(&self, _: ListRecipes) -> Result<Vec<RecipeCommand>> {
        self.list_recipes()
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Queryable<ShowRecipe>
    for Recipes<M>
{
    fn query(&self, req: ShowRecipe) -> Result<Option<RecipeCommand>> {
        self.find_command_by_id(&req.recipe_id)
    }
}

impl<M: r2d2::ManageConnection> Clone for Recipes<M> {
    fn clone(&self) -> Self {
        let db = self.db.clone();
        Recipes { db }
    }
}
