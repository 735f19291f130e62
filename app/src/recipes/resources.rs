use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use serde::Serialize;

use infra::persistence::Storage;

use crate::error::WebError;
use crate::resources::{in_pool, redirect_home};
use crate::services::Queryable;
use crate::templates::{render, WithTemplate};

use super::{ListRecipes, RecipeCommand, Recipes, ShowRecipe};

#[derive(Debug, Serialize)]
struct IndexView {
    recipes: Vec<RecipeCommand>,
}

#[derive(Debug, Serialize)]
struct RecipeView {
    recipe: RecipeCommand,
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Recipes<M> {
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.service({
            let me = self.clone();
            web::resource("/").name("index").route(web::get().to(move || {
                let me = me.clone();
                async move { me.index().await }
            }))
        })
        .service({
            let me = self.clone();
            web::resource("/recipe/{recipe_id}/show")
                .name("recipe_show")
                .route(web::get().to(move |req: HttpRequest, recipe_id: web::Path<String>| {
                    let me = me.clone();
                    async move { me.show(req, recipe_id.into_inner()).await }
                }))
        });
    }

    async fn index(&self) -> Result<HttpResponse, WebError> {
        info!("Handle index");
        let me = self.clone();
        let recipes = in_pool(move || me.query(ListRecipes)).await?;
        render(WithTemplate::new("index.html", IndexView { recipes }))
    }

    async fn show(&self, req: HttpRequest, recipe_id: String) -> Result<HttpResponse, WebError> {
        debug!("Show recipe: {}", recipe_id);
        let me = self.clone();
        let query = ShowRecipe {
            recipe_id: recipe_id.clone(),
        };
        match in_pool(move || me.query(query)).await? {
            Some(recipe) => render(WithTemplate::new("recipe/show.html", RecipeView { recipe })),
            None => {
                warn!("No recipe {}; back to index", recipe_id);
                redirect_home(&req)
            }
        }
    }
}
