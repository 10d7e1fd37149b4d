use serde::{Deserialize, Serialize};

use crate::model::common::push_core;
use crate::model::{generate_id, CoreKind, Id, Record, RecordKind, Reference, Target, Timestamps};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutonomousSystem {
    pub id: Id,
    pub asn: u32,
    #[serde(default)]
    pub description: String,
    /// Status slug.
    pub status: String,
    #[serde(default)]
    pub provider: Option<Id>,
    #[serde(default)]
    pub tags: Vec<Id>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl AutonomousSystem {
    pub fn new(asn: u32, status: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            asn,
            description: String::new(),
            status: status.into(),
            provider: None,
            tags: Vec::new(),
            timestamps: Timestamps::now(),
        }
    }
}

impl Record for AutonomousSystem {
    const KIND: RecordKind = RecordKind::AutonomousSystem;

    fn id(&self) -> Id {
        self.id
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![Reference {
            field: "status",
            target: Target::Status(self.status.clone()),
        }];
        push_core(&mut refs, "provider", CoreKind::Provider, self.provider);
        refs.extend(self.tags.iter().map(|tag| Reference::core("tags", CoreKind::Tag, *tag)));
        refs
    }

    fn touch(&mut self) {
        self.timestamps.touch();
    }
}
