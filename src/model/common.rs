use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::model::CoreKind;

pub type Id = Uuid;

pub fn generate_id() -> Id {
    Uuid::new_v4()
}

/// Every record type this crate owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    AutonomousSystem,
    PeeringRole,
    PeerGroupTemplate,
    PeerGroup,
    PeerEndpoint,
    Peering,
    RoutingInstance,
    AddressFamily,
}

impl RecordKind {
    pub const ALL: [RecordKind; 8] = [
        RecordKind::AutonomousSystem,
        RecordKind::PeeringRole,
        RecordKind::PeerGroupTemplate,
        RecordKind::PeerGroup,
        RecordKind::PeerEndpoint,
        RecordKind::Peering,
        RecordKind::RoutingInstance,
        RecordKind::AddressFamily,
    ];

    /// Key used by the stores.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::AutonomousSystem => "autonomous_system",
            RecordKind::PeeringRole => "peering_role",
            RecordKind::PeerGroupTemplate => "peer_group_template",
            RecordKind::PeerGroup => "peer_group",
            RecordKind::PeerEndpoint => "peer_endpoint",
            RecordKind::Peering => "peering",
            RecordKind::RoutingInstance => "routing_instance",
            RecordKind::AddressFamily => "address_family",
        }
    }

    /// URL segment under the plugin API root.
    pub fn path(&self) -> &'static str {
        match self {
            RecordKind::AutonomousSystem => "autonomous-systems",
            RecordKind::PeeringRole => "peering-roles",
            RecordKind::PeerGroupTemplate => "peer-group-templates",
            RecordKind::PeerGroup => "peer-groups",
            RecordKind::PeerEndpoint => "peer-endpoints",
            RecordKind::Peering => "peerings",
            RecordKind::RoutingInstance => "routing-instances",
            RecordKind::AddressFamily => "address-families",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::AutonomousSystem => "autonomous system",
            RecordKind::PeeringRole => "peering role",
            RecordKind::PeerGroupTemplate => "peer group template",
            RecordKind::PeerGroup => "peer group",
            RecordKind::PeerEndpoint => "peer endpoint",
            RecordKind::Peering => "peering",
            RecordKind::RoutingInstance => "BGP routing instance",
            RecordKind::AddressFamily => "address family",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step along a relation: the attribute holding the target id and the
/// kind of record it points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub attribute: &'static str,
    pub target: RecordKind,
}

impl Hop {
    pub const fn new(attribute: &'static str, target: RecordKind) -> Self {
        Self { attribute, target }
    }
}

pub const VIA_PEER_GROUP: Hop = Hop::new("peer_group", RecordKind::PeerGroup);
pub const VIA_TEMPLATE: Hop = Hop::new("template", RecordKind::PeerGroupTemplate);
pub const VIA_ROUTING_INSTANCE: Hop = Hop::new("routing_instance", RecordKind::RoutingInstance);

/// An inheritable field and the ordered ancestor paths consulted when the
/// record's own value is unset.
#[derive(Debug, Clone, Copy)]
pub struct InheritanceRule {
    pub field: &'static str,
    pub chain: &'static [&'static [Hop]],
}

/// Something a record points at, used for reference validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Record(RecordKind, Id),
    Core(CoreKind, Id),
    Status(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub target: Target,
}

impl Reference {
    pub fn record(field: &'static str, kind: RecordKind, id: Id) -> Self {
        Self {
            field,
            target: Target::Record(kind, id),
        }
    }

    pub fn core(field: &'static str, kind: CoreKind, id: Id) -> Self {
        Self {
            field,
            target: Target::Core(kind, id),
        }
    }
}

/// Push a reference for an optional relation.
pub(crate) fn push_record(refs: &mut Vec<Reference>, field: &'static str, kind: RecordKind, id: Option<Id>) {
    if let Some(id) = id {
        refs.push(Reference::record(field, kind, id));
    }
}

pub(crate) fn push_core(refs: &mut Vec<Reference>, field: &'static str, kind: CoreKind, id: Option<Id>) {
    if let Some(id) = id {
        refs.push(Reference::core(field, kind, id));
    }
}

/// A stored record. Stores persist the serde JSON form, so attribute names
/// here are also the names used by inheritance paths.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: RecordKind;

    /// Fields resolved through ancestors when `include_inherited` is set.
    const INHERITANCE: &'static [InheritanceRule] = &[];

    /// Ancestor paths merged (in order, before the record itself) into the
    /// resolved extra attributes.
    const EXTRA_ATTRIBUTE_CHAIN: &'static [&'static [Hop]] = &[];

    fn id(&self) -> Id;

    /// Relations and catalog objects this record points at.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Refresh the modification timestamp before a write.
    fn touch(&mut self);
}

/// Audit timestamps carried by every record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Timestamps {
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created: now,
            last_updated: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

impl Default for Timestamps {
    fn default() -> Self {
        Self::now()
    }
}

/// True when a stored value counts as "not set" for inheritance purposes.
pub fn is_unset(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unset_values() {
        assert!(is_unset(&json!(null)));
        assert!(is_unset(&json!("")));
        assert!(!is_unset(&json!("import-all")));
        assert!(!is_unset(&json!(false)));
        assert!(!is_unset(&json!(0)));
    }

    #[test]
    fn test_record_kind_paths_are_distinct() {
        let mut paths: Vec<&str> = RecordKind::ALL.iter().map(|k| k.path()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), RecordKind::ALL.len());
    }
}
