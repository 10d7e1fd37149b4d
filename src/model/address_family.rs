use serde::{Deserialize, Serialize};

use crate::model::common::push_core;
use crate::model::{generate_id, AfiSafi, CoreKind, Id, Record, RecordKind, Reference, Timestamps};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressFamily {
    pub id: Id,
    pub afi_safi: AfiSafi,
    pub routing_instance: Id,
    #[serde(default)]
    pub vrf: Option<Id>,
    #[serde(default)]
    pub import_policy: String,
    #[serde(default)]
    pub export_policy: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl AddressFamily {
    pub fn new(afi_safi: AfiSafi, routing_instance: Id) -> Self {
        Self {
            id: generate_id(),
            afi_safi,
            routing_instance,
            vrf: None,
            import_policy: String::new(),
            export_policy: String::new(),
            timestamps: Timestamps::now(),
        }
    }
}

impl Record for AddressFamily {
    const KIND: RecordKind = RecordKind::AddressFamily;

    fn id(&self) -> Id {
        self.id
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![Reference::record(
            "routing_instance",
            RecordKind::RoutingInstance,
            self.routing_instance,
        )];
        push_core(&mut refs, "vrf", CoreKind::Vrf, self.vrf);
        refs
    }

    fn touch(&mut self) {
        self.timestamps.touch();
    }
}
