use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use infra::documents::{DocMeta, HasMeta};
use infra::ids::{Entity, Id, IdGen};

use crate::units::UnitOfMeasure;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Category {
    #[serde(flatten)]
    pub(crate) meta: DocMeta<Category>,
    pub(crate) description: String,
}

/// The aggregate root. Ingredients only ever reach the store as part of the
/// recipe that holds them.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Recipe {
    #[serde(flatten)]
    pub(crate) meta: DocMeta<Recipe>,
    pub(crate) description: String,
    pub(crate) prep_time: u32,
    pub(crate) cook_time: u32,
    pub(crate) servings: u32,
    #[serde(default)]
    pub(crate) source: String,
    #[serde(default)]
    pub(crate) url: String,
    #[serde(default)]
    pub(crate) directions: String,
    pub(crate) difficulty: Difficulty,
    #[serde(default)]
    pub(crate) notes: String,
    #[serde(default)]
    pub(crate) categories: BTreeSet<Id<Category>>,
    #[serde(default)]
    pub(crate) ingredients: Vec<Ingredient>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Ingredient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<Id<Ingredient>>,
    pub(crate) description: String,
    pub(crate) amount: Decimal,
    pub(crate) uom: UnitOfMeasure,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Easy
    }
}

impl Category {
    pub(crate) fn new(id: Id<Category>, description: &str) -> Self {
        let meta = DocMeta::new_with_id(id);
        let description = description.to_string();
        Category { meta, description }
    }
}

impl Recipe {
    pub(crate) fn new(id: Id<Recipe>, description: &str) -> Self {
        Recipe {
            meta: DocMeta::new_with_id(id),
            description: description.to_string(),
            prep_time: 0,
            cook_time: 0,
            servings: 0,
            source: String::new(),
            url: String::new(),
            directions: String::new(),
            difficulty: Difficulty::default(),
            notes: String::new(),
            categories: BTreeSet::new(),
            ingredients: Vec::new(),
        }
    }

    pub fn id(&self) -> Id<Recipe> {
        self.meta.id
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn ingredient(&self, id: &Id<Ingredient>) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id.as_ref() == Some(id))
    }

    pub fn ingredient_mut(&mut self, id: &Id<Ingredient>) -> Option<&mut Ingredient> {
        self.ingredients.iter_mut().find(|i| i.id.as_ref() == Some(id))
    }

    /// First ingredient with exactly these fields. Nothing tells two
    /// identical ingredients apart, so the earlier one in the list wins.
    pub fn ingredient_by_fields(
        &self,
        description: &str,
        amount: &Decimal,
        uom: &Id<UnitOfMeasure>,
    ) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| {
            i.description == description && &i.amount == amount && &i.uom.meta.id == uom
        })
    }

    pub fn add_ingredient(&mut self, ingredient: Ingredient) {
        self.ingredients.push(ingredient);
    }

    /// Returns false when no ingredient has that id.
    pub fn update_ingredient(
        &mut self,
        id: &Id<Ingredient>,
        description: String,
        amount: Decimal,
        uom: UnitOfMeasure,
    ) -> bool {
        match self.ingredient_mut(id) {
            Some(found) => {
                found.description = description;
                found.amount = amount;
                found.uom = uom;
                true
            }
            None => false,
        }
    }

    pub fn remove_ingredient(&mut self, id: &Id<Ingredient>) -> Option<Ingredient> {
        let idx = self
            .ingredients
            .iter()
            .position(|i| i.id.as_ref() == Some(id))?;
        Some(self.ingredients.remove(idx))
    }

    pub(crate) fn add_category(&mut self, category: &Category) {
        self.categories.insert(category.meta.id);
    }

    pub(crate) fn assign_ingredient_ids(&mut self, idgen: &IdGen) -> usize {
        let mut assigned = 0;
        for ingredient in self.ingredients.iter_mut().filter(|i| i.id.is_none()) {
            ingredient.id = Some(idgen.generate());
            assigned += 1;
        }
        assigned
    }
}

impl Ingredient {
    pub fn new(description: String, amount: Decimal, uom: UnitOfMeasure) -> Self {
        Ingredient {
            id: None,
            description,
            amount,
            uom,
        }
    }

    pub fn id(&self) -> Option<Id<Ingredient>> {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn uom(&self) -> &UnitOfMeasure {
        &self.uom
    }
}

impl Entity for Recipe {
    const PREFIX: &'static str = "recipe";
}

impl HasMeta for Recipe {
    fn meta(&self) -> &DocMeta<Self> {
        &self.meta
    }
}

impl Entity for Ingredient {
    const PREFIX: &'static str = "ingredient";
}

impl Entity for Category {
    const PREFIX: &'static str = "category";
}

impl HasMeta for Category {
    fn meta(&self) -> &DocMeta<Self> {
        &self.meta
    }
}

#[cfg(test)]
mod test {
    use maplit::btreeset;

    use super::*;

    fn cup() -> UnitOfMeasure {
        UnitOfMeasure::new(Id::hashed("Cup"), "Cup")
    }

    fn recipe_with(names: &[&str]) -> Recipe {
        let mut recipe = Recipe::new(Id::hashed("Bread"), "Bread");
        for name in names {
            recipe.add_ingredient(Ingredient::new(name.to_string(), Decimal::from(1), cup()));
        }
        recipe.assign_ingredient_ids(&IdGen::new());
        recipe
    }

    #[test]
    fn assigns_ids_only_to_new_ingredients() {
        let mut recipe = recipe_with(&["Flour"]);
        let flour = recipe.ingredients()[0].id();
        recipe.add_ingredient(Ingredient::new("Salt".into(), Decimal::from(1), cup()));

        let assigned = recipe.assign_ingredient_ids(&IdGen::new());

        assert_eq!(assigned, 1);
        assert_eq!(recipe.ingredients()[0].id(), flour);
        assert!(recipe.ingredients()[1].id().is_some());
        assert_ne!(recipe.ingredients()[1].id(), flour);
    }

    #[test]
    fn removes_only_the_matching_ingredient() {
        let mut recipe = recipe_with(&["Flour", "Salt", "Yeast"]);
        let salt = recipe.ingredients()[1].id().expect("salt id");

        let removed = recipe.remove_ingredient(&salt);

        assert_eq!(removed.map(|i| i.description), Some("Salt".to_string()));
        let left = recipe
            .ingredients()
            .iter()
            .map(|i| i.description())
            .collect::<Vec<_>>();
        assert_eq!(left, vec!["Flour", "Yeast"]);
    }

    #[test]
    fn removing_unknown_ingredient_changes_nothing() {
        let mut recipe = recipe_with(&["Flour"]);
        let before = recipe.clone();

        assert_eq!(recipe.remove_ingredient(&IdGen::new().generate()), None);
        assert_eq!(recipe, before);
    }

    #[test]
    fn update_reports_unknown_ingredient() {
        let mut recipe = recipe_with(&["Flour"]);

        let updated = recipe.update_ingredient(
            &IdGen::new().generate(),
            "Rye".into(),
            Decimal::from(2),
            cup(),
        );

        assert!(!updated);
        assert_eq!(recipe.ingredients()[0].description(), "Flour");
    }

    #[test]
    fn field_lookup_prefers_first_of_duplicates() {
        let recipe = recipe_with(&["Egg", "Egg"]);

        let found = recipe
            .ingredient_by_fields("Egg", &Decimal::from(1), &cup().id())
            .and_then(|i| i.id());

        assert_eq!(found, recipe.ingredients()[0].id());
    }

    #[test]
    fn serializes_as_plain_document() {
        let recipe = recipe_with(&["Flour"]);

        let json = serde_json::to_value(&recipe).expect("to json");

        assert_eq!(json["_id"], serde_json::json!(recipe.id().to_string()));
        assert_eq!(json["ingredients"][0]["uom"]["description"], "Cup");
        let back: Recipe = serde_json::from_value(json).expect("from json");
        assert_eq!(back, recipe);
    }

    #[test]
    fn categories_are_a_set() {
        let mexican = Category::new(Id::hashed("Mexican"), "Mexican");
        let american = Category::new(Id::hashed("American"), "American");
        let mut recipe = recipe_with(&[]);

        recipe.add_category(&mexican);
        recipe.add_category(&american);
        recipe.add_category(&mexican);

        assert_eq!(recipe.categories, btreeset! {mexican.meta.id, american.meta.id});
    }

    #[test]
    fn ingredient_mut_edits_in_place() {
        let mut recipe = recipe_with(&["Flour", "Salt"]);
        let salt = recipe.ingredients()[1].id().expect("salt id");

        recipe
            .ingredient_mut(&salt)
            .expect("salt present")
            .amount = Decimal::from(4);

        assert_eq!(recipe.ingredients()[1].amount(), Decimal::from(4));
        assert_eq!(recipe.ingredients()[0].amount(), Decimal::from(1));
    }
}
