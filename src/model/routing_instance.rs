use serde::{Deserialize, Serialize};

use crate::model::common::{push_core, push_record};
use crate::model::{generate_id, CoreKind, Id, Record, RecordKind, Reference, Timestamps};

/// BGP configuration bound to a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingInstance {
    pub id: Id,
    pub device: Id,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub router_id: Option<Id>,
    #[serde(default)]
    pub autonomous_system: Option<Id>,
    #[serde(default)]
    pub extra_attributes: Option<serde_json::Value>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl RoutingInstance {
    pub fn new(device: Id) -> Self {
        Self {
            id: generate_id(),
            device,
            description: String::new(),
            router_id: None,
            autonomous_system: None,
            extra_attributes: None,
            timestamps: Timestamps::now(),
        }
    }
}

impl Record for RoutingInstance {
    const KIND: RecordKind = RecordKind::RoutingInstance;

    fn id(&self) -> Id {
        self.id
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![Reference::core("device", CoreKind::Device, self.device)];
        push_core(&mut refs, "router_id", CoreKind::IpAddress, self.router_id);
        push_record(&mut refs, "autonomous_system", RecordKind::AutonomousSystem, self.autonomous_system);
        refs
    }

    fn touch(&mut self) {
        self.timestamps.touch();
    }
}
