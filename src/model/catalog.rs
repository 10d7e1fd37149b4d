use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Id;

/// Host-application object types that BGP records point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreKind {
    Device,
    Interface,
    IpAddress,
    Vrf,
    Provider,
    Secret,
    Tag,
    Status,
}

impl CoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoreKind::Device => "device",
            CoreKind::Interface => "interface",
            CoreKind::IpAddress => "ip_address",
            CoreKind::Vrf => "vrf",
            CoreKind::Provider => "provider",
            CoreKind::Secret => "secret",
            CoreKind::Tag => "tag",
            CoreKind::Status => "status",
        }
    }

    /// Path of the owning application's API endpoint, relative to the host.
    pub fn path(&self) -> &'static str {
        match self {
            CoreKind::Device => "/api/dcim/devices",
            CoreKind::Interface => "/api/dcim/interfaces",
            CoreKind::IpAddress => "/api/ipam/ip-addresses",
            CoreKind::Vrf => "/api/ipam/vrfs",
            CoreKind::Provider => "/api/circuits/providers",
            CoreKind::Secret => "/api/extras/secrets",
            CoreKind::Tag => "/api/extras/tags",
            CoreKind::Status => "/api/extras/statuses",
        }
    }
}

impl fmt::Display for CoreKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal catalog entry for an object owned by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreObject {
    pub kind: CoreKind,
    pub id: Id,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl CoreObject {
    pub fn new(kind: CoreKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: crate::model::generate_id(),
            name: name.into(),
            slug: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn status(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self::new(CoreKind::Status, name).with_slug(slug)
    }
}
