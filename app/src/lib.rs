use actix_web::web;
use anyhow::{Context, Result};
use log::*;
use r2d2::Pool;

use infra::persistence::Storage;

pub mod config;
mod error;
pub mod ingredients;
pub mod recipes;
mod resources;
pub mod seed;
pub mod services;
mod templates;
#[cfg(test)]
mod test;
pub mod units;

pub use error::WebError;

pub struct Cookbook<M: r2d2::ManageConnection> {
    db: Pool<M>,
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Cookbook<M> {
    pub fn new(db: Pool<M>) -> Self {
        Cookbook { db }
    }

    pub fn setup(&self) -> Result<()> {
        debug!("Init schema");
        self.db.get()?.setup().context("Setup persistence")?;
        Ok(())
    }

    pub fn seed(&self) -> Result<()> {
        let mut docs = self.db.get()?;
        seed::seed(&mut *docs).context("Seed documents")?;
        Ok(())
    }

    pub fn recipes(&self) -> recipes::Recipes<M> {
        recipes::Recipes::new(self.db.clone())
    }

    pub fn units(&self) -> units::Units<M> {
        units::Units::new(self.db.clone())
    }

    pub fn ingredients(&self) -> ingredients::Ingredients<M> {
        ingredients::Ingredients::new(self.db.clone())
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        info!("Configuring cookbook routes");
        self.recipes().configure(cfg);
        self.ingredients().configure(cfg);
    }
}

impl<M: r2d2::ManageConnection> Clone for Cookbook<M> {
    fn clone(&self) -> Self {
        let db = self.db.clone();
        Cookbook { db }
    }
}
