use anyhow::Result;
use log::*;

use infra::ids::{Entity, Id};

pub trait Request {
    type Resp;
}

pub trait Queryable<Req>
where
    Req: Request,
{
    fn query(&self, req: Req) -> Result<Req::Resp>;
}

/// Identifiers arrive as strings from paths and forms; one that cannot be
/// parsed names nothing, so it is treated like a missing document.
pub(crate) fn parse_id<T: Entity>(src: &str) -> Option<Id<T>> {
    match src.parse() {
        Ok(id) => Some(id),
        Err(e) => {
            debug!("Ignoring unparseable {} id {:?}: {}", T::PREFIX, src, e);
            None
        }
    }
}
