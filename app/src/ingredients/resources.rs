use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use r2d2::Pool;
use serde::Serialize;

use infra::persistence::Storage;

use crate::error::WebError;
use crate::recipes::{RecipeCommand, Recipes, ShowRecipe};
use crate::resources::{in_pool, redirect_home, redirect_to};
use crate::services::Queryable;
use crate::templates::{render, WithTemplate};
use crate::units::{ListUnits, UnitOfMeasureCommand, Units};

use super::models::{FieldError, IngredientCommand, IngredientForm};
use super::service::IngredientService;

const LIST_TEMPLATE: &str = "recipe/ingredient/list.html";
const SHOW_TEMPLATE: &str = "recipe/ingredient/show.html";
const FORM_TEMPLATE: &str = "recipe/ingredient/form.html";

const LIST: &str = "ingredient_list";
const NEW: &str = "ingredient_new";
const SHOW: &str = "ingredient_show";
const UPDATE: &str = "ingredient_update";

pub struct Ingredients<M: r2d2::ManageConnection> {
    service: IngredientService<M>,
    recipes: Recipes<M>,
    units: Units<M>,
}

#[derive(Debug, Serialize)]
struct ListView {
    recipe: RecipeCommand,
}

#[derive(Debug, Serialize)]
struct ShowView {
    ingredient: IngredientCommand,
}

#[derive(Debug, Serialize)]
struct FormView {
    ingredient: IngredientCommand,
    uom_list: Vec<UnitOfMeasureCommand>,
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Ingredients<M> {
    pub fn new(db: Pool<M>) -> Self {
        let service = IngredientService::new(db.clone());
        let recipes = Recipes::new(db.clone());
        let units = Units::new(db);
        Ingredients {
            service,
            recipes,
            units,
        }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.service({
            let me = self.clone();
            web::resource("/recipe/{recipe_id}/ingredients")
                .name(LIST)
                .route(web::get().to(move |req: HttpRequest, recipe_id: web::Path<String>| {
                    let me = me.clone();
                    async move { me.list(req, recipe_id.into_inner()).await }
                }))
        })
        .service({
            let me = self.clone();
            web::resource("/recipe/{recipe_id}/ingredient/new")
                .name(NEW)
                .route(web::get().to(move |req: HttpRequest, recipe_id: web::Path<String>| {
                    let me = me.clone();
                    async move { me.new_form(req, recipe_id.into_inner()).await }
                }))
        })
        .service({
            let me = self.clone();
            web::resource("/recipe/{recipe_id}/ingredient/{id}/show")
                .name(SHOW)
                .route(web::get().to(
                    move |req: HttpRequest, path: web::Path<(String, String)>| {
                        let me = me.clone();
                        let (recipe_id, id) = path.into_inner();
                        async move { me.show(req, recipe_id, id).await }
                    },
                ))
        })
        .service({
            let me = self.clone();
            web::resource("/recipe/{recipe_id}/ingredient/{id}/update")
                .name(UPDATE)
                .route(web::get().to(
                    move |req: HttpRequest, path: web::Path<(String, String)>| {
                        let me = me.clone();
                        let (recipe_id, id) = path.into_inner();
                        async move { me.update_form(req, recipe_id, id).await }
                    },
                ))
        })
        .service({
            let me = self.clone();
            web::resource("/recipe/{recipe_id}/ingredient/{id}/delete").route(web::get().to(
                move |req: HttpRequest, path: web::Path<(String, String)>| {
                    let me = me.clone();
                    let (recipe_id, id) = path.into_inner();
                    async move { me.delete(req, recipe_id, id).await }
                },
            ))
        })
        .service({
            let me = self.clone();
            web::resource("/recipe/{recipe_id}/ingredient").route(web::post().to(
                move |req: HttpRequest,
                      recipe_id: web::Path<String>,
                      form: web::Form<IngredientForm>| {
                    let me = me.clone();
                    let recipe_id = recipe_id.into_inner();
                    let form = form.into_inner();
                    let validated = form.validate(&recipe_id);
                    let submitted_id = form.submitted_id().map(str::to_string);
                    async move { me.submit(req, recipe_id, submitted_id, validated).await }
                },
            ))
        });
    }

    async fn list(&self, req: HttpRequest, recipe_id: String) -> Result<HttpResponse, WebError> {
        debug!("Getting ingredient list for recipe id: {}", recipe_id);
        let recipes = self.recipes.clone();
        let query = ShowRecipe {
            recipe_id: recipe_id.clone(),
        };
        match in_pool(move || recipes.query(query)).await? {
            Some(recipe) => render(WithTemplate::new(LIST_TEMPLATE, ListView { recipe })),
            None => {
                warn!("No recipe {}; back to index", recipe_id);
                redirect_home(&req)
            }
        }
    }

    async fn show(
        &self,
        req: HttpRequest,
        recipe_id: String,
        id: String,
    ) -> Result<HttpResponse, WebError> {
        match self.find(&recipe_id, &id).await? {
            Some(ingredient) => render(WithTemplate::new(SHOW_TEMPLATE, ShowView { ingredient })),
            None => redirect_to(&req, LIST, &[recipe_id]),
        }
    }

    async fn new_form(&self, req: HttpRequest, recipe_id: String) -> Result<HttpResponse, WebError> {
        let recipes = self.recipes.clone();
        let query = ShowRecipe {
            recipe_id: recipe_id.clone(),
        };
        if in_pool(move || recipes.query(query)).await?.is_none() {
            warn!("Cannot add ingredient to missing recipe {}", recipe_id);
            return redirect_home(&req);
        }

        let ingredient = IngredientCommand::blank(&recipe_id);
        let uom_list = self.uom_list().await?;
        render(WithTemplate::new(FORM_TEMPLATE, FormView { ingredient, uom_list }))
    }

    async fn update_form(
        &self,
        req: HttpRequest,
        recipe_id: String,
        id: String,
    ) -> Result<HttpResponse, WebError> {
        let ingredient = match self.find(&recipe_id, &id).await? {
            Some(ingredient) => ingredient,
            None => return redirect_to(&req, LIST, &[recipe_id]),
        };
        let uom_list = self.uom_list().await?;
        render(WithTemplate::new(FORM_TEMPLATE, FormView { ingredient, uom_list }))
    }

    async fn submit(
        &self,
        req: HttpRequest,
        recipe_id: String,
        submitted_id: Option<String>,
        validated: Result<IngredientCommand, Vec<FieldError>>,
    ) -> Result<HttpResponse, WebError> {
        let command = match validated {
            Ok(command) => command,
            Err(errors) => {
                for error in errors.iter() {
                    debug!("{}", error);
                }
                return match submitted_id {
                    Some(id) => redirect_to(&req, UPDATE, &[recipe_id, id]),
                    None => redirect_to(&req, NEW, &[recipe_id]),
                };
            }
        };

        let service = self.service.clone();
        let saved = in_pool(move || service.upsert(command)).await?;
        debug!("Saved ingredient: {:?}", saved);

        match saved {
            Some(IngredientCommand {
                recipe_id: Some(recipe_id),
                id,
                ..
            }) => match id.filter(|id| !id.is_empty()) {
                Some(id) => redirect_to(&req, SHOW, &[recipe_id, id]),
                None => redirect_to(&req, LIST, &[recipe_id]),
            },
            _ => redirect_home(&req),
        }
    }

    async fn delete(
        &self,
        req: HttpRequest,
        recipe_id: String,
        id: String,
    ) -> Result<HttpResponse, WebError> {
        debug!("deleting ingredient id: {}", id);
        let service = self.service.clone();
        let rid = recipe_id.clone();
        in_pool(move || service.delete_by_id(&rid, &id)).await?;
        redirect_to(&req, LIST, &[recipe_id])
    }

    async fn find(&self, recipe_id: &str, id: &str) -> Result<Option<IngredientCommand>, WebError> {
        let service = self.service.clone();
        let (recipe_id, id) = (recipe_id.to_string(), id.to_string());
        in_pool(move || service.find_by_recipe_and_ingredient(&recipe_id, &id)).await
    }

    async fn uom_list(&self) -> Result<Vec<UnitOfMeasureCommand>, WebError> {
        let units = self.units.clone();
        in_pool(move || units.query(ListUnits)).await
    }
}

impl<M: r2d2::ManageConnection> Clone for Ingredients<M> {
    fn clone(&self) -> Self {
        Ingredients {
            service: self.service.clone(),
            recipes: self.recipes.clone(),
            units: self.units.clone(),
        }
    }
}
