use serde::{Deserialize, Serialize};

use infra::documents::{DocMeta, HasMeta};
use infra::ids::{Entity, Id};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UnitOfMeasure {
    #[serde(flatten)]
    pub(crate) meta: DocMeta<UnitOfMeasure>,
    pub(crate) description: String,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitOfMeasureCommand {
    pub id: Option<String>,
    pub description: Option<String>,
}

impl UnitOfMeasure {
    pub(crate) fn new(id: Id<UnitOfMeasure>, description: &str) -> Self {
        let meta = DocMeta::new_with_id(id);
        let description = description.to_string();
        UnitOfMeasure { meta, description }
    }

    pub fn id(&self) -> Id<UnitOfMeasure> {
        self.meta.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Entity for UnitOfMeasure {
    const PREFIX: &'static str = "uom";
}

impl HasMeta for UnitOfMeasure {
    fn meta(&self) -> &DocMeta<Self> {
        &self.meta
    }
}

impl From<&UnitOfMeasure> for UnitOfMeasureCommand {
    fn from(uom: &UnitOfMeasure) -> Self {
        UnitOfMeasureCommand {
            id: Some(uom.meta.id.to_string()),
            description: Some(uom.description.clone()),
        }
    }
}
