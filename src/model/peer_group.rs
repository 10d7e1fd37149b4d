use serde::{Deserialize, Serialize};

use crate::model::common::{push_core, push_record, VIA_ROUTING_INSTANCE, VIA_TEMPLATE};
use crate::model::{
    generate_id, CoreKind, Hop, Id, InheritanceRule, Record, RecordKind, Reference, Timestamps,
};

/// Reusable peer group configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerGroupTemplate {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub role: Option<Id>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub autonomous_system: Option<Id>,
    #[serde(default)]
    pub import_policy: String,
    #[serde(default)]
    pub export_policy: String,
    #[serde(default)]
    pub secret: Option<Id>,
    #[serde(default)]
    pub extra_attributes: Option<serde_json::Value>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

pub(crate) fn enabled_by_default() -> bool {
    true
}

impl PeerGroupTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            role: None,
            description: String::new(),
            enabled: true,
            autonomous_system: None,
            import_policy: String::new(),
            export_policy: String::new(),
            secret: None,
            extra_attributes: None,
            timestamps: Timestamps::now(),
        }
    }
}

impl Record for PeerGroupTemplate {
    const KIND: RecordKind = RecordKind::PeerGroupTemplate;

    fn id(&self) -> Id {
        self.id
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        push_record(&mut refs, "role", RecordKind::PeeringRole, self.role);
        push_record(&mut refs, "autonomous_system", RecordKind::AutonomousSystem, self.autonomous_system);
        push_core(&mut refs, "secret", CoreKind::Secret, self.secret);
        refs
    }

    fn touch(&mut self) {
        self.timestamps.touch();
    }
}

/// A named group of peer endpoints configured under one routing instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerGroup {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub source_ip: Option<Id>,
    #[serde(default)]
    pub source_interface: Option<Id>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub autonomous_system: Option<Id>,
    pub routing_instance: Id,
    #[serde(default)]
    pub template: Option<Id>,
    #[serde(default)]
    pub secret: Option<Id>,
    #[serde(default)]
    pub role: Option<Id>,
    #[serde(default)]
    pub import_policy: String,
    #[serde(default)]
    pub export_policy: String,
    #[serde(default)]
    pub extra_attributes: Option<serde_json::Value>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl PeerGroup {
    pub fn new(name: impl Into<String>, routing_instance: Id) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            source_ip: None,
            source_interface: None,
            description: String::new(),
            enabled: true,
            autonomous_system: None,
            routing_instance,
            template: None,
            secret: None,
            role: None,
            import_policy: String::new(),
            export_policy: String::new(),
            extra_attributes: None,
            timestamps: Timestamps::now(),
        }
    }
}

const FROM_TEMPLATE: &[&[Hop]] = &[&[VIA_TEMPLATE]];

impl Record for PeerGroup {
    const KIND: RecordKind = RecordKind::PeerGroup;

    const INHERITANCE: &'static [InheritanceRule] = &[
        InheritanceRule { field: "autonomous_system", chain: FROM_TEMPLATE },
        InheritanceRule { field: "description", chain: FROM_TEMPLATE },
        InheritanceRule { field: "role", chain: FROM_TEMPLATE },
        InheritanceRule { field: "secret", chain: FROM_TEMPLATE },
        InheritanceRule { field: "import_policy", chain: FROM_TEMPLATE },
        InheritanceRule { field: "export_policy", chain: FROM_TEMPLATE },
    ];

    const EXTRA_ATTRIBUTE_CHAIN: &'static [&'static [Hop]] = &[&[VIA_ROUTING_INSTANCE], &[VIA_TEMPLATE]];

    fn id(&self) -> Id {
        self.id
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![Reference::record(
            "routing_instance",
            RecordKind::RoutingInstance,
            self.routing_instance,
        )];
        push_core(&mut refs, "source_ip", CoreKind::IpAddress, self.source_ip);
        push_core(&mut refs, "source_interface", CoreKind::Interface, self.source_interface);
        push_record(&mut refs, "autonomous_system", RecordKind::AutonomousSystem, self.autonomous_system);
        push_record(&mut refs, "template", RecordKind::PeerGroupTemplate, self.template);
        push_core(&mut refs, "secret", CoreKind::Secret, self.secret);
        push_record(&mut refs, "role", RecordKind::PeeringRole, self.role);
        refs
    }

    fn touch(&mut self) {
        self.timestamps.touch();
    }
}
