mod models;
mod resources;
mod service;

pub use self::models::{FieldError, IngredientCommand, IngredientForm, MAX_DESCRIPTION_LEN};
pub use self::resources::Ingredients;
pub use self::service::IngredientService;
