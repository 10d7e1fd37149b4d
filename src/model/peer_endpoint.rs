use serde::{Deserialize, Serialize};

use crate::model::common::{push_core, push_record, VIA_PEER_GROUP, VIA_ROUTING_INSTANCE, VIA_TEMPLATE};
use crate::model::peer_group::enabled_by_default;
use crate::model::{
    generate_id, CoreKind, Hop, Id, InheritanceRule, Record, RecordKind, Reference, Timestamps,
};

/// One side of a BGP peering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerEndpoint {
    pub id: Id,
    #[serde(default)]
    pub routing_instance: Option<Id>,
    #[serde(default)]
    pub source_ip: Option<Id>,
    #[serde(default)]
    pub source_interface: Option<Id>,
    #[serde(default)]
    pub autonomous_system: Option<Id>,
    #[serde(default)]
    pub peer_group: Option<Id>,
    /// The other endpoint of the same peering, maintained by the peering sync.
    #[serde(default)]
    pub peer: Option<Id>,
    #[serde(default)]
    pub import_policy: String,
    #[serde(default)]
    pub export_policy: String,
    pub peering: Id,
    #[serde(default)]
    pub secret: Option<Id>,
    #[serde(default)]
    pub tags: Vec<Id>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub extra_attributes: Option<serde_json::Value>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl PeerEndpoint {
    pub fn new(peering: Id) -> Self {
        Self {
            id: generate_id(),
            routing_instance: None,
            source_ip: None,
            source_interface: None,
            autonomous_system: None,
            peer_group: None,
            peer: None,
            import_policy: String::new(),
            export_policy: String::new(),
            peering,
            secret: None,
            tags: Vec::new(),
            enabled: true,
            extra_attributes: None,
            timestamps: Timestamps::now(),
        }
    }
}

const FROM_GROUP: &[&[Hop]] = &[&[VIA_PEER_GROUP]];
const FROM_GROUP_OR_TEMPLATE: &[&[Hop]] = &[&[VIA_PEER_GROUP], &[VIA_PEER_GROUP, VIA_TEMPLATE]];

impl Record for PeerEndpoint {
    const KIND: RecordKind = RecordKind::PeerEndpoint;

    const INHERITANCE: &'static [InheritanceRule] = &[
        InheritanceRule { field: "source_ip", chain: FROM_GROUP },
        InheritanceRule { field: "source_interface", chain: FROM_GROUP },
        InheritanceRule {
            field: "autonomous_system",
            chain: &[&[VIA_PEER_GROUP], &[VIA_PEER_GROUP, VIA_TEMPLATE], &[VIA_ROUTING_INSTANCE]],
        },
        InheritanceRule { field: "secret", chain: FROM_GROUP_OR_TEMPLATE },
        InheritanceRule { field: "import_policy", chain: FROM_GROUP_OR_TEMPLATE },
        InheritanceRule { field: "export_policy", chain: FROM_GROUP_OR_TEMPLATE },
    ];

    const EXTRA_ATTRIBUTE_CHAIN: &'static [&'static [Hop]] = &[
        &[VIA_ROUTING_INSTANCE],
        &[VIA_PEER_GROUP, VIA_TEMPLATE],
        &[VIA_PEER_GROUP],
    ];

    fn id(&self) -> Id {
        self.id
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![Reference::record("peering", RecordKind::Peering, self.peering)];
        push_record(&mut refs, "routing_instance", RecordKind::RoutingInstance, self.routing_instance);
        push_core(&mut refs, "source_ip", CoreKind::IpAddress, self.source_ip);
        push_core(&mut refs, "source_interface", CoreKind::Interface, self.source_interface);
        push_record(&mut refs, "autonomous_system", RecordKind::AutonomousSystem, self.autonomous_system);
        push_record(&mut refs, "peer_group", RecordKind::PeerGroup, self.peer_group);
        push_record(&mut refs, "peer", RecordKind::PeerEndpoint, self.peer);
        push_core(&mut refs, "secret", CoreKind::Secret, self.secret);
        refs.extend(self.tags.iter().map(|tag| Reference::core("tags", CoreKind::Tag, *tag)));
        refs
    }

    fn touch(&mut self) {
        self.timestamps.touch();
    }
}
