//! Reference data and sample recipes for a fresh store.
//!
//! Identifiers are hashed from the descriptions, so running this twice
//! finds the first run's documents instead of writing duplicates.

use anyhow::{anyhow, Result};
use log::*;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

use infra::documents::HasMeta;
use infra::ids::Id;
use infra::persistence::Storage;

use crate::recipes::{Category, Difficulty, Ingredient, Recipe, RecipeRepository};
use crate::units::UnitOfMeasure;

const UNITS: &[&str] = &[
    "Teaspoon",
    "Tablespoon",
    "Cup",
    "Pinch",
    "Ounce",
    "Each",
    "Dash",
    "Pint",
];

const CATEGORIES: &[&str] = &["American", "Italian", "Mexican", "Fast Food"];

/// (description, amount as mantissa and scale, unit)
type Line = (&'static str, i64, u32, &'static str);

const GUACAMOLE: &[Line] = &[
    ("ripe avocados", 2, 0, "Each"),
    ("Kosher salt", 5, 1, "Teaspoon"),
    ("fresh lime juice or lemon juice", 2, 0, "Tablespoon"),
    ("minced red onion or thinly sliced green onion", 2, 0, "Tablespoon"),
    ("serrano chiles, stems and seeds removed, minced", 2, 0, "Each"),
    ("Cilantro", 2, 0, "Tablespoon"),
    ("freshly grated black pepper", 2, 0, "Dash"),
    ("ripe tomato, seeds and pulp removed, chopped", 5, 1, "Each"),
];

const TACOS: &[Line] = &[
    ("Ancho Chili Powder", 2, 0, "Tablespoon"),
    ("Dried Oregano", 1, 0, "Teaspoon"),
    ("Dried Cumin", 1, 0, "Teaspoon"),
    ("Sugar", 1, 0, "Teaspoon"),
    ("Salt", 5, 1, "Teaspoon"),
    ("Clove of Garlic, Chopped", 1, 0, "Each"),
    ("finely grated orange zest", 1, 0, "Tablespoon"),
    ("fresh-squeezed orange juice", 3, 0, "Tablespoon"),
    ("Olive Oil", 2, 0, "Tablespoon"),
    ("boneless chicken thighs", 4, 0, "Each"),
    ("small corn tortillas", 8, 0, "Each"),
    ("packed baby arugula", 3, 0, "Cup"),
    ("medium ripe avocados, sliced", 2, 0, "Each"),
    ("radishes, thinly sliced", 4, 0, "Each"),
    ("cherry tomatoes, halved", 5, 1, "Pint"),
    ("red onion, thinly sliced", 25, 2, "Each"),
    ("Roughly chopped cilantro", 4, 0, "Each"),
    ("sour cream thinned with 1/4 cup milk", 4, 0, "Ounce"),
    ("lime, cut into wedges", 4, 0, "Each"),
];

pub fn seed<D: Storage>(docs: &mut D) -> Result<()> {
    let mut units = Vec::new();
    for name in UNITS {
        units.push(load_or_create(docs, Id::hashed(name), |id| {
            UnitOfMeasure::new(id, name)
        })?);
    }

    let mut categories = Vec::new();
    for name in CATEGORIES {
        categories.push(load_or_create(docs, Id::hashed(name), |id| {
            Category::new(id, name)
        })?);
    }
    let category = |name: &str| {
        categories
            .iter()
            .find(|c| c.description == name)
            .ok_or_else(|| anyhow!("No seed category {:?}", name))
    };

    let mut guacamole = Recipe::new(Id::hashed("Perfect Guacamole"), "Perfect Guacamole");
    guacamole.prep_time = 10;
    guacamole.servings = 4;
    guacamole.source = "Simply Recipes".to_string();
    guacamole.url = "http://www.simplyrecipes.com/recipes/perfect_guacamole/".to_string();
    guacamole.difficulty = Difficulty::Easy;
    guacamole.directions = "Cut the avocados, remove the pit and scoop out the flesh. \
        Mash with a fork, season with salt and lime juice, then fold in the rest."
        .to_string();
    guacamole.notes = "Chilling tomatoes hurts their flavor.".to_string();
    guacamole.add_category(category("American")?);
    guacamole.add_category(category("Mexican")?);
    add_lines(&mut guacamole, GUACAMOLE, &units)?;

    let mut tacos = Recipe::new(
        Id::hashed("Spicy Grilled Chicken Tacos"),
        "Spicy Grilled Chicken Tacos",
    );
    tacos.prep_time = 20;
    tacos.cook_time = 15;
    tacos.servings = 6;
    tacos.source = "Simply Recipes".to_string();
    tacos.url = "http://www.simplyrecipes.com/recipes/spicy_grilled_chicken_tacos/".to_string();
    tacos.difficulty = Difficulty::Moderate;
    tacos.directions = "Make the spice rub, coat the chicken and grill it. \
        Warm the tortillas and assemble the tacos with the toppings."
        .to_string();
    tacos.add_category(category("American")?);
    tacos.add_category(category("Mexican")?);
    add_lines(&mut tacos, TACOS, &units)?;

    let mut repo = RecipeRepository::new(docs);
    for recipe in vec![guacamole, tacos] {
        if repo.load_aggregate(&recipe.id())?.is_some() {
            debug!("Recipe {} already present", recipe.description);
            continue;
        }
        let saved = repo.save_aggregate(recipe)?;
        info!("Seeded recipe {}: {}", saved.id(), saved.description);
    }

    Ok(())
}

fn add_lines(recipe: &mut Recipe, lines: &[Line], units: &[UnitOfMeasure]) -> Result<()> {
    for &(description, mantissa, scale, unit) in lines {
        let uom = units
            .iter()
            .find(|u| u.description() == unit)
            .ok_or_else(|| anyhow!("No seed unit {:?}", unit))?;
        recipe.add_ingredient(Ingredient::new(
            description.to_string(),
            Decimal::new(mantissa, scale),
            uom.clone(),
        ));
    }
    Ok(())
}

fn load_or_create<D: Storage, T: Serialize + DeserializeOwned + HasMeta>(
    docs: &mut D,
    id: Id<T>,
    create: impl FnOnce(Id<T>) -> T,
) -> Result<T> {
    if let Some(found) = docs.load(&id)? {
        return Ok(found);
    }
    let doc = create(id);
    docs.save(&doc)?;
    debug!("Created {}", id);
    Ok(doc)
}
