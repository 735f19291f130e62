use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use infra::ids::Id;

use crate::recipes::{Ingredient, Recipe};
use crate::units::UnitOfMeasureCommand;

pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Flat transfer shape for binding and rendering. Every field may be
/// missing, so an empty command stands for "nothing came back".
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct IngredientCommand {
    pub id: Option<String>,
    pub recipe_id: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub uom: UnitOfMeasureCommand,
}

/// Fields exactly as posted by the ingredient form.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct IngredientForm {
    pub id: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub uom_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl IngredientCommand {
    pub(crate) fn from_ingredient(ingredient: &Ingredient, recipe_id: &Id<Recipe>) -> Self {
        IngredientCommand {
            id: ingredient.id().map(|id| id.to_string()),
            recipe_id: Some(recipe_id.to_string()),
            description: Some(ingredient.description().to_string()),
            amount: Some(ingredient.amount()),
            uom: UnitOfMeasureCommand::from(ingredient.uom()),
        }
    }

    /// Starting point for the "new ingredient" form.
    pub fn blank(recipe_id: &str) -> Self {
        IngredientCommand {
            recipe_id: Some(recipe_id.to_string()),
            uom: UnitOfMeasureCommand::default(),
            ..Default::default()
        }
    }
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl IngredientForm {
    pub fn submitted_id(&self) -> Option<&str> {
        non_blank(&self.id)
    }

    /// Checks the submitted fields and, if they all pass, produces the
    /// command for the recipe named in the path.
    pub fn validate(&self, recipe_id: &str) -> Result<IngredientCommand, Vec<FieldError>> {
        let mut errors = Vec::new();

        match &self.description {
            None => errors.push(FieldError::new("description", "must not be null")),
            Some(d) => {
                let len = d.chars().count();
                if len < 1 || len > MAX_DESCRIPTION_LEN {
                    errors.push(FieldError::new(
                        "description",
                        format!("size must be between 1 and {}", MAX_DESCRIPTION_LEN),
                    ));
                }
            }
        }

        let amount = match non_blank(&self.amount) {
            None => {
                errors.push(FieldError::new("amount", "must not be null"));
                None
            }
            Some(raw) => match raw.parse::<Decimal>() {
                Ok(amount) if amount >= Decimal::from(1) => Some(amount),
                Ok(_) => {
                    errors.push(FieldError::new("amount", "must be greater than or equal to 1"));
                    None
                }
                Err(_) => {
                    errors.push(FieldError::new("amount", format!("{:?} is not a number", raw)));
                    None
                }
            },
        };

        let uom_id = non_blank(&self.uom_id);
        if uom_id.is_none() {
            errors.push(FieldError::new("uom", "must not be null"));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(IngredientCommand {
            id: self.submitted_id().map(str::to_string),
            recipe_id: Some(recipe_id.to_string()),
            description: self.description.clone(),
            amount,
            uom: UnitOfMeasureCommand {
                id: uom_id.map(str::to_string),
                description: None,
            },
        })
    }
}

impl FieldError {
    fn new<S: Into<String>>(field: &'static str, message: S) -> Self {
        let message = message.into();
        FieldError { field, message }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Field error in object 'ingredient' on field '{}': {}", self.field, self.message)
    }
}
