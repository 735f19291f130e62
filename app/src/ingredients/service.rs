use anyhow::{anyhow, Result};
use log::*;
use r2d2::Pool;

use infra::persistence::Storage;

use crate::recipes::{Ingredient, Recipe, RecipeRepository};
use crate::services::parse_id;
use crate::units::{self, UnitOfMeasure, UnitOfMeasureNotFound};

use super::models::IngredientCommand;

/// Reads and edits the ingredients embedded in a recipe.
///
/// Every change is a read-modify-write of the whole recipe document with no
/// locking around it. Two edits to the same recipe at once race, and the
/// later save wins.
pub struct IngredientService<M: r2d2::ManageConnection> {
    db: Pool<M>,
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> IngredientService<M> {
    pub fn new(db: Pool<M>) -> Self {
        IngredientService { db }
    }

    pub fn find_by_recipe_and_ingredient(
        &self,
        recipe_id: &str,
        ingredient_id: &str,
    ) -> Result<Option<IngredientCommand>> {
        let (recipe_id, ingredient_id) = match (
            parse_id::<Recipe>(recipe_id),
            parse_id::<Ingredient>(ingredient_id),
        ) {
            (Some(r), Some(i)) => (r, i),
            _ => return Ok(None),
        };

        let mut docs = self.db.get()?;
        let recipe = RecipeRepository::new(&mut *docs).load_aggregate(&recipe_id)?;
        let found = recipe.and_then(|recipe| {
            recipe
                .ingredient(&ingredient_id)
                .map(|i| IngredientCommand::from_ingredient(i, &recipe.id()))
        });
        debug!(
            "Find {}/{} -> found: {}",
            recipe_id,
            ingredient_id,
            found.is_some()
        );
        Ok(found)
    }

    /// Creates or updates an ingredient and reports it as saved.
    ///
    /// A missing recipe yields an empty command rather than an error. `None`
    /// means the saved ingredient could not be found again afterwards.
    pub fn upsert(&self, command: IngredientCommand) -> Result<Option<IngredientCommand>> {
        let mut docs = self.db.get()?;

        let recipe = match command.recipe_id.as_deref().and_then(parse_id::<Recipe>) {
            Some(id) => RecipeRepository::new(&mut *docs).load_aggregate(&id)?,
            None => None,
        };
        let mut recipe = match recipe {
            Some(recipe) => recipe,
            None => {
                error!("Recipe not found for id: {:?}", command.recipe_id);
                return Ok(Some(IngredientCommand::default()));
            }
        };

        let uom = resolve_uom(&mut *docs, &command)?;
        let description = command.description.clone().unwrap_or_default();
        let amount = command
            .amount
            .ok_or_else(|| anyhow!("Ingredient amount missing for recipe {}", recipe.id()))?;

        let ingredient_id = command.id.as_deref().and_then(parse_id::<Ingredient>);
        let updated = match &ingredient_id {
            Some(id) => recipe.update_ingredient(id, description.clone(), amount, uom.clone()),
            None => false,
        };
        if updated {
            debug!("Updated ingredient {:?} in place", command.id);
        } else {
            debug!("Adding new ingredient to {}", recipe.id());
            recipe.add_ingredient(Ingredient::new(description.clone(), amount, uom.clone()));
        }

        let saved = RecipeRepository::new(&mut *docs).save_aggregate(recipe)?;

        // New ingredients were only named by the save, so fall back to
        // matching on their fields.
        let located = ingredient_id
            .and_then(|id| saved.ingredient(&id))
            .or_else(|| saved.ingredient_by_fields(&description, &amount, &uom.id()));

        match located {
            Some(ingredient) => Ok(Some(IngredientCommand::from_ingredient(
                ingredient,
                &saved.id(),
            ))),
            None => {
                warn!(
                    "Saved ingredient not found again in {}: {:?}",
                    saved.id(),
                    command
                );
                Ok(None)
            }
        }
    }

    pub fn delete_by_id(&self, recipe_id: &str, ingredient_id: &str) -> Result<()> {
        debug!("Deleting ingredient: {}:{}", recipe_id, ingredient_id);

        let recipe_key = match parse_id::<Recipe>(recipe_id) {
            Some(id) => id,
            None => {
                debug!("Recipe not found for id: {}", recipe_id);
                return Ok(());
            }
        };

        let mut docs = self.db.get()?;
        let mut repo = RecipeRepository::new(&mut *docs);
        let mut recipe = match repo.load_aggregate(&recipe_key)? {
            Some(recipe) => recipe,
            None => {
                debug!("Recipe not found for id: {}", recipe_id);
                return Ok(());
            }
        };

        match parse_id::<Ingredient>(ingredient_id).and_then(|id| recipe.remove_ingredient(&id)) {
            Some(removed) => {
                debug!(
                    "Found ingredient to delete. RecipeID: {}, ID: {:?}",
                    recipe_id,
                    removed.id()
                );
                repo.save_aggregate(recipe)?;
            }
            None => debug!("No ingredient {} in {}", ingredient_id, recipe_id),
        }

        Ok(())
    }
}

fn resolve_uom<D: Storage>(docs: &mut D, command: &IngredientCommand) -> Result<UnitOfMeasure> {
    let uom = match command.uom.id.as_deref().and_then(parse_id::<UnitOfMeasure>) {
        Some(id) => units::find_by_id(docs, &id)?,
        None => None,
    };
    uom.ok_or_else(|| {
        UnitOfMeasureNotFound {
            id: command.uom.id.clone(),
        }
        .into()
    })
}

impl<M: r2d2::ManageConnection> Clone for IngredientService<M> {
    fn clone(&self) -> Self {
        let db = self.db.clone();
        IngredientService { db }
    }
}

#[cfg(test)]
mod test {
    use rust_decimal::Decimal;

    use infra::ids::{Id, IdGen};

    use super::*;
    use crate::test::junk_drawer::{self, Fixture};
    use crate::units::UnitOfMeasureCommand;

    fn load_recipe(fixture: &Fixture) -> Recipe {
        let mut docs = fixture.pool.get().expect("conn");
        RecipeRepository::new(&mut *docs)
            .load_aggregate(&fixture.recipe_id)
            .expect("load")
            .expect("recipe present")
    }

    fn command(
        fixture: &Fixture,
        id: Option<String>,
        description: &str,
        amount: i64,
        uom: Id<UnitOfMeasure>,
    ) -> IngredientCommand {
        IngredientCommand {
            id,
            recipe_id: Some(fixture.recipe_id.to_string()),
            description: Some(description.to_string()),
            amount: Some(Decimal::from(amount)),
            uom: UnitOfMeasureCommand {
                id: Some(uom.to_string()),
                description: None,
            },
        }
    }

    #[test]
    fn finds_ingredient_in_recipe() {
        env_logger::try_init().unwrap_or_default();
        let fixture = junk_drawer::fixture().expect("fixture");
        let service = IngredientService::new(fixture.pool.clone());

        let found = service
            .find_by_recipe_and_ingredient(
                &fixture.recipe_id.to_string(),
                &fixture.flour_id.to_string(),
            )
            .expect("find")
            .expect("flour present");

        assert_eq!(found.id, Some(fixture.flour_id.to_string()));
        assert_eq!(found.recipe_id, Some(fixture.recipe_id.to_string()));
        assert_eq!(found.description.as_deref(), Some("Flour"));
        assert_eq!(found.amount, Some(Decimal::from(2)));
        assert_eq!(found.uom.description.as_deref(), Some("Cup"));
    }

    #[test]
    fn find_ignores_identifier_case() {
        env_logger::try_init().unwrap_or_default();
        let fixture = junk_drawer::fixture().expect("fixture");
        let service = IngredientService::new(fixture.pool.clone());

        let found = service
            .find_by_recipe_and_ingredient(
                &fixture.recipe_id.to_string().to_uppercase(),
                &fixture.flour_id.to_string().to_uppercase(),
            )
            .expect("find");

        assert_eq!(
            found.and_then(|i| i.id),
            Some(fixture.flour_id.to_string())
        );
    }

    #[test]
    fn find_in_unknown_recipe_is_none() {
        env_logger::try_init().unwrap_or_default();
        let fixture = junk_drawer::fixture().expect("fixture");
        let service = IngredientService::new(fixture.pool.clone());

        let missing_recipe = service
            .find_by_recipe_and_ingredient(
                &IdGen::new().generate::<Recipe>().to_string(),
                &fixture.flour_id.to_string(),
            )
            .expect("find");
        let missing_ingredient = service
            .find_by_recipe_and_ingredient(
                &fixture.recipe_id.to_string(),
                &IdGen::new().generate::<Ingredient>().to_string(),
            )
            .expect("find");
        let garbage = service
            .find_by_recipe_and_ingredient("bread", "flour")
            .expect("find");

        assert_eq!(missing_recipe, None);
        assert_eq!(missing_ingredient, None);
        assert_eq!(garbage, None);
    }

    #[test]
    fn updates_existing_ingredient_in_place() {
        env_logger::try_init().unwrap_or_default();
        let fixture = junk_drawer::fixture().expect("fixture");
        let service = IngredientService::new(fixture.pool.clone());

        let saved = service
            .upsert(command(
                &fixture,
                Some(fixture.flour_id.to_string()),
                "Flour",
                3,
                fixture.cup,
            ))
            .expect("upsert")
            .expect("saved");

        assert_eq!(saved.id, Some(fixture.flour_id.to_string()));
        assert_eq!(saved.amount, Some(Decimal::from(3)));
        let recipe = load_recipe(&fixture);
        assert_eq!(recipe.ingredients().len(), 1);
        assert_eq!(recipe.ingredients()[0].amount(), Decimal::from(3));
    }

    #[test]
    fn update_can_change_unit() {
        env_logger::try_init().unwrap_or_default();
        let fixture = junk_drawer::fixture().expect("fixture");
        let service = IngredientService::new(fixture.pool.clone());

        let saved = service
            .upsert(command(
                &fixture,
                Some(fixture.flour_id.to_string()),
                "Flour",
                2,
                fixture.teaspoon,
            ))
            .expect("upsert")
            .expect("saved");

        assert_eq!(saved.uom.id, Some(fixture.teaspoon.to_string()));
        assert_eq!(saved.uom.description.as_deref(), Some("Teaspoon"));
        assert_eq!(
            load_recipe(&fixture).ingredients()[0].uom().id(),
            fixture.teaspoon
        );
    }

    #[test]
    fn creates_new_ingredient_with_assigned_id() {
        env_logger::try_init().unwrap_or_default();
        let fixture = junk_drawer::fixture().expect("fixture");
        let service = IngredientService::new(fixture.pool.clone());

        let saved = service
            .upsert(command(&fixture, None, "Sugar", 1, fixture.teaspoon))
            .expect("upsert")
            .expect("saved");

        let recipe = load_recipe(&fixture);
        assert_eq!(recipe.ingredients().len(), 2);
        let sugar = &recipe.ingredients()[1];
        assert_eq!(sugar.description(), "Sugar");
        assert_eq!(saved.id, sugar.id().map(|id| id.to_string()));
        assert_ne!(sugar.id(), Some(fixture.flour_id));
    }

    #[test]
    fn unknown_ingredient_id_is_added_as_new() {
        env_logger::try_init().unwrap_or_default();
        let fixture = junk_drawer::fixture().expect("fixture");
        let service = IngredientService::new(fixture.pool.clone());
        let stale = IdGen::new().generate::<Ingredient>();

        let saved = service
            .upsert(command(
                &fixture,
                Some(stale.to_string()),
                "Yeast",
                1,
                fixture.teaspoon,
            ))
            .expect("upsert")
            .expect("saved");

        let recipe = load_recipe(&fixture);
        assert_eq!(recipe.ingredients().len(), 2);
        assert_eq!(saved.description.as_deref(), Some("Yeast"));
        assert_ne!(saved.id, Some(stale.to_string()));
    }

    #[test]
    fn identical_new_ingredient_resolves_to_first_match() {
        env_logger::try_init().unwrap_or_default();
        let fixture = junk_drawer::fixture().expect("fixture");
        let service = IngredientService::new(fixture.pool.clone());

        let saved = service
            .upsert(command(&fixture, None, "Flour", 2, fixture.cup))
            .expect("upsert")
            .expect("saved");

        assert_eq!(load_recipe(&fixture).ingredients().len(), 2);
        assert_eq!(saved.id, Some(fixture.flour_id.to_string()));
    }

    #[test]
    fn unknown_unit_is_an_error_and_saves_nothing() {
        env_logger::try_init().unwrap_or_default();
        let fixture = junk_drawer::fixture().expect("fixture");
        let service = IngredientService::new(fixture.pool.clone());
        let before = load_recipe(&fixture);

        let err = service
            .upsert(command(
                &fixture,
                None,
                "Salt",
                1,
                Id::hashed("Furlong"),
            ))
            .expect_err("unknown unit");

        assert!(
            err.downcast_ref::<UnitOfMeasureNotFound>().is_some(),
            "Error: {:?}",
            err
        );
        assert_eq!(load_recipe(&fixture), before);
    }

    #[test]
    fn upsert_into_missing_recipe_returns_empty_command() {
        env_logger::try_init().unwrap_or_default();
        let fixture = junk_drawer::fixture().expect("fixture");
        let service = IngredientService::new(fixture.pool.clone());
        let mut cmd = command(&fixture, None, "Sugar", 1, fixture.cup);
        cmd.recipe_id = Some(IdGen::new().generate::<Recipe>().to_string());

        let saved = service.upsert(cmd).expect("upsert");

        assert_eq!(saved, Some(IngredientCommand::default()));
        assert_eq!(load_recipe(&fixture).ingredients().len(), 1);
    }

    #[test]
    fn deletes_one_ingredient() {
        env_logger::try_init().unwrap_or_default();
        let fixture = junk_drawer::fixture().expect("fixture");
        let service = IngredientService::new(fixture.pool.clone());
        let sugar = service
            .upsert(command(&fixture, None, "Sugar", 1, fixture.teaspoon))
            .expect("upsert")
            .and_then(|i| i.id)
            .expect("sugar id");

        service
            .delete_by_id(&fixture.recipe_id.to_string(), &fixture.flour_id.to_string())
            .expect("delete");

        let remaining = load_recipe(&fixture)
            .ingredients()
            .iter()
            .map(|i| i.id().map(|id| id.to_string()))
            .collect::<Vec<_>>();
        assert_eq!(remaining, vec![Some(sugar)]);
    }

    #[test]
    fn deleting_unknown_ingredient_changes_nothing() {
        env_logger::try_init().unwrap_or_default();
        let fixture = junk_drawer::fixture().expect("fixture");
        let service = IngredientService::new(fixture.pool.clone());
        let before = load_recipe(&fixture);

        service
            .delete_by_id(
                &fixture.recipe_id.to_string(),
                &IdGen::new().generate::<Ingredient>().to_string(),
            )
            .expect("delete");
        service
            .delete_by_id(
                &IdGen::new().generate::<Recipe>().to_string(),
                &fixture.flour_id.to_string(),
            )
            .expect("delete in missing recipe");

        assert_eq!(load_recipe(&fixture), before);
    }

    #[test]
    fn update_and_delete_ignore_identifier_case() {
        env_logger::try_init().unwrap_or_default();
        let fixture = junk_drawer::fixture().expect("fixture");
        let service = IngredientService::new(fixture.pool.clone());
        let flour = fixture.flour_id.to_string().to_uppercase();

        let saved = service
            .upsert(command(&fixture, Some(flour.clone()), "Flour", 5, fixture.cup))
            .expect("upsert")
            .expect("saved");
        assert_eq!(saved.id, Some(fixture.flour_id.to_string()));
        assert_eq!(load_recipe(&fixture).ingredients().len(), 1);

        service
            .delete_by_id(&fixture.recipe_id.to_string().to_uppercase(), &flour)
            .expect("delete");
        assert!(load_recipe(&fixture).ingredients().is_empty());
    }
}
