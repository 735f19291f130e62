use anyhow::Result;
use err_derive::Error;
use log::*;
use r2d2::Pool;

use infra::ids::Id;
use infra::persistence::Storage;

use crate::services::{Queryable, Request};

mod models;

pub use self::models::{UnitOfMeasure, UnitOfMeasureCommand};

/// Raised when an ingredient refers to a unit the store does not know.
/// Nothing is saved once this has been seen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(display = "UoM not found: {:?}", id)]
pub struct UnitOfMeasureNotFound {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ListUnits;

pub struct Units<M: r2d2::ManageConnection> {
    db: Pool<M>,
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Units<M> {
    pub fn new(db: Pool<M>) -> Self {
        Units { db }
    }

    pub fn find_by_id(&self, id: &Id<UnitOfMeasure>) -> Result<Option<UnitOfMeasure>> {
        find_by_id(&mut *self.db.get()?, id)
    }
}

pub(crate) fn find_by_id<D: Storage>(
    docs: &mut D,
    id: &Id<UnitOfMeasure>,
) -> Result<Option<UnitOfMeasure>> {
    let res = docs.load(id)?;
    debug!("Load {} -> {:?}", id, res);
    Ok(res)
}

pub(crate) fn list_all<D: Storage>(docs: &mut D) -> Result<Vec<UnitOfMeasureCommand>> {
    let mut units = docs.list::<UnitOfMeasure>()?;
    units.sort_by(|a, b| a.description.cmp(&b.description));
    Ok(units.iter().map(UnitOfMeasureCommand::from).collect())
}

impl Request for ListUnits {
    type Resp = Vec<UnitOfMeasureCommand>;
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Queryable<ListUnits>
    for Units<M>
{
    fn query(&self, _: ListUnits) -> Result<Vec<UnitOfMeasureCommand>> {
        list_all(&mut *self.db.get()?)
    }
}

impl<M: r2d2::ManageConnection> Clone for Units<M> {
    fn clone(&self) -> Self {
        let db = self.db.clone();
        Units { db }
    }
}
