use serde::{Deserialize, Serialize};

use crate::model::{generate_id, Id, Record, RecordKind, Timestamps};

/// Classification applied to peer groups and templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeeringRole {
    pub id: Id,
    pub name: String,
    pub slug: String,
    /// Six hex digits, no leading `#`.
    pub color: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl PeeringRole {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            slug: slug.into(),
            color: color.into(),
            description: String::new(),
            timestamps: Timestamps::now(),
        }
    }
}

impl Record for PeeringRole {
    const KIND: RecordKind = RecordKind::PeeringRole;

    fn id(&self) -> Id {
        self.id
    }

    fn touch(&mut self) {
        self.timestamps.touch();
    }
}
