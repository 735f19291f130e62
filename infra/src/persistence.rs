use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use err_derive::Error;
use log::*;
use postgres::{Client, NoTls};
use r2d2::ManageConnection;
use r2d2_postgres::PostgresConnectionManager;
use serde::{de::DeserializeOwned, Serialize};

use crate::documents::HasMeta;
use crate::ids::{Entity, Id, DIVIDER};

/// A JSON document store. Documents are keyed by their typed id, so the
/// entity prefix also groups documents of one kind together.
///
/// Saves overwrite unconditionally; there is no version check, so the last
/// writer of a document wins.
pub trait Storage {
    fn setup(&mut self) -> Result<()>;
    fn load<D: DeserializeOwned + Entity>(&mut self, id: &Id<D>) -> Result<Option<D>>;
    fn save<D: Serialize + HasMeta>(&mut self, document: &D) -> Result<()>;
    fn list<D: DeserializeOwned + Entity>(&mut self) -> Result<Vec<D>>;
}

fn prefix_of<D: Entity>() -> String {
    format!("{}{}", D::PREFIX, DIVIDER)
}

const SETUP_SQL: &str = include_str!("persistence.sql");
const LOAD_SQL: &str = "SELECT body FROM documents WHERE id = $1";
const SAVE_SQL: &str = "INSERT INTO documents (id, body) VALUES ($1, $2) \
                        ON CONFLICT (id) DO UPDATE SET body = EXCLUDED.body";
const LIST_SQL: &str = "SELECT body FROM documents WHERE id LIKE $1 ORDER BY id";

pub struct Documents {
    connection: Client,
}

pub struct DocumentConnectionManager {
    inner: PostgresConnectionManager<NoTls>,
}

impl Documents {
    pub fn get_mut(&mut self) -> &mut Client {
        &mut self.connection
    }
}

impl fmt::Debug for Documents {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Documents").finish()
    }
}

impl Storage for Documents {
    fn setup(&mut self) -> Result<()> {
        self.connection
            .batch_execute(SETUP_SQL)
            .context("create documents table")?;
        Ok(())
    }

    fn load<D: DeserializeOwned + Entity>(&mut self, id: &Id<D>) -> Result<Option<D>> {
        let row = self.connection.query_opt(LOAD_SQL, &[&id.to_string()])?;

        if let Some(row) = row {
            let json: serde_json::Value = row.try_get(0)?;
            let doc = serde_json::from_value(json).with_context(|| format!("decode {}", id))?;
            Ok(Some(doc))
        } else {
            Ok(None)
        }
    }

    fn save<D: Serialize + HasMeta>(&mut self, document: &D) -> Result<()> {
        let id = document.meta().id.to_string();
        let json = serde_json::to_value(document)?;
        let nrows = self.connection.execute(SAVE_SQL, &[&id, &json])?;
        debug!("Save of {} modified {} rows", id, nrows);
        Ok(())
    }

    fn list<D: DeserializeOwned + Entity>(&mut self) -> Result<Vec<D>> {
        let pattern = format!("{}%", prefix_of::<D>());
        let rows = self.connection.query(LIST_SQL, &[&pattern])?;
        debug!("Listed {} documents matching {:?}", rows.len(), pattern);

        rows.into_iter()
            .map(|row| -> Result<D> {
                let json: serde_json::Value = row.try_get(0)?;
                Ok(serde_json::from_value(json)?)
            })
            .collect()
    }
}

impl DocumentConnectionManager {
    pub fn new(url: &str) -> Result<Self> {
        let config = url
            .parse::<postgres::Config>()
            .context("parse postgres url")?;
        let inner = PostgresConnectionManager::new(config, NoTls);
        Ok(DocumentConnectionManager { inner })
    }
}

impl fmt::Debug for DocumentConnectionManager {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("DocumentConnectionManager").finish()
    }
}

impl ManageConnection for DocumentConnectionManager {
    type Connection = Documents;
    type Error = postgres::Error;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let connection = self.inner.connect()?;
        Ok(Documents { connection })
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        self.inner.is_valid(&mut conn.connection)
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        self.inner.has_broken(&mut conn.connection)
    }
}

type MemoryMap = Arc<Mutex<BTreeMap<String, serde_json::Value>>>;

#[derive(Debug, Error)]
#[error(display = "memory store lock poisoned")]
pub struct PoisonedStore;

/// Keeps documents as JSON values in a shared map. Every connection handed
/// out by one manager sees the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnectionManager {
    docs: MemoryMap,
}

#[derive(Debug)]
pub struct MemoryDocuments {
    docs: MemoryMap,
}

impl MemoryConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ManageConnection for MemoryConnectionManager {
    type Connection = MemoryDocuments;
    type Error = PoisonedStore;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let docs = self.docs.clone();
        Ok(MemoryDocuments { docs })
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.docs.lock().map(|_| ()).map_err(|_| PoisonedStore)
    }

    fn has_broken(&self, _: &mut Self::Connection) -> bool {
        false
    }
}

impl MemoryDocuments {
    fn lock(&self) -> Result<MutexGuard<BTreeMap<String, serde_json::Value>>> {
        self.docs.lock().map_err(|_| PoisonedStore.into())
    }
}

impl Storage for MemoryDocuments {
    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    fn load<D: DeserializeOwned + Entity>(&mut self, id: &Id<D>) -> Result<Option<D>> {
        let json = self.lock()?.get(&id.to_string()).cloned();
        match json {
            Some(json) => {
                let doc = serde_json::from_value(json).with_context(|| format!("decode {}", id))?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    fn save<D: Serialize + HasMeta>(&mut self, document: &D) -> Result<()> {
        let id = document.meta().id.to_string();
        let json = serde_json::to_value(document)?;
        let prev = self.lock()?.insert(id.clone(), json);
        debug!("Saved {} (replaced: {})", id, prev.is_some());
        Ok(())
    }

    fn list<D: DeserializeOwned + Entity>(&mut self) -> Result<Vec<D>> {
        let prefix = prefix_of::<D>();
        let docs = self.lock()?;
        docs.range(prefix.clone()..)
            .take_while(|(id, _)| id.starts_with(&prefix))
            .map(|(_, json)| -> Result<D> { Ok(serde_json::from_value(json.clone())?) })
            .collect()
    }
}
