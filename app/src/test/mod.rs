//! Guarded with `#[cfg(test)]` from `lib.rs`

use anyhow::Result;

use crate::ingredients::{IngredientCommand, IngredientService};
use crate::recipes::{Recipes, ShowRecipe};
use crate::services::Queryable;
use crate::units::{ListUnits, UnitOfMeasureCommand, Units};
use crate::Cookbook;


#[test]
fn add_then_remove_ingredient_on_seeded_recipe() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let cookbook = Cookbook::new(pool.clone());
    cookbook.seed()?;

    let recipes = Recipes::new(pool.clone());
    let guacamole = recipes
        .list_recipes()?
        .into_iter()
        .find(|r| r.description == "Perfect Guacamole")
        .expect("seeded guacamole");
    let recipe_id = guacamole.id.clone();
    let before = guacamole.ingredients.len();

    let pinch = Units::new(pool.clone())
        .query(ListUnits)?
        .into_iter()
        .find(|u| u.description.as_deref() == Some("Pinch"))
        .expect("seeded pinch");

    let service = IngredientService::new(pool.clone());
    let saved = service
        .upsert(IngredientCommand {
            id: None,
            recipe_id: Some(recipe_id.clone()),
            description: Some("Smoked paprika".to_string()),
            amount: Some(1.into()),
            uom: UnitOfMeasureCommand {
                id: pinch.id.clone(),
                description: None,
            },
        })?
        .expect("saved ingredient");
    let paprika = saved.id.clone().expect("paprika id");
    assert_eq!(saved.uom.description.as_deref(), Some("Pinch"));

    let shown = recipes
        .query(ShowRecipe {
            recipe_id: recipe_id.clone(),
        })?
        .expect("guacamole");
    assert_eq!(shown.ingredients.len(), before + 1);
    assert!(shown.ingredients.contains(&saved));

    service.delete_by_id(&recipe_id, &paprika)?;
    let shown = recipes.query(ShowRecipe { recipe_id })?.expect("guacamole");
    assert_eq!(shown.ingredients.len(), before);
    assert!(shown
        .ingredients
        .iter()
        .all(|i| i.id.as_deref() != Some(paprika.as_str())));
    Ok(())
}
