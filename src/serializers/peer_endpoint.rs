use crate::error::{FieldErrors, Result};
use crate::logic::{create_endpoint, update_endpoint, validate_attachment};
use crate::model::{CoreKind, Id, PeerEndpoint, PeerGroup, RecordKind};
use crate::serializers::input::Input;
use crate::serializers::representation::{Capabilities, FieldSource, Mapper};
use crate::store::{RecordStoreExt, Store};

#[async_trait::async_trait]
impl Mapper for PeerEndpoint {
    const FIELDS: &'static [&'static str] = &[
        "id",
        "url",
        "routing_instance",
        "source_ip",
        "source_interface",
        "autonomous_system",
        "peer_group",
        "peer",
        "import_policy",
        "export_policy",
        "peering",
        "secret",
        "tags",
        "enabled",
    ];
    const REQUIRED: &'static [&'static str] = &["peering"];
    const CAPABILITIES: Capabilities = Capabilities {
        inheritance: true,
        extra_attributes: true,
        tags: true,
        ..Capabilities::NONE
    };
    const GATED_WRITES: bool = true;

    fn blank() -> Self {
        PeerEndpoint::new(Id::nil())
    }

    fn map(&self) -> Vec<(&'static str, FieldSource)> {
        vec![
            (
                "routing_instance",
                FieldSource::Record(RecordKind::RoutingInstance, self.routing_instance),
            ),
            ("source_ip", FieldSource::Core(CoreKind::IpAddress, self.source_ip)),
            ("source_interface", FieldSource::Core(CoreKind::Interface, self.source_interface)),
            (
                "autonomous_system",
                FieldSource::Record(RecordKind::AutonomousSystem, self.autonomous_system),
            ),
            ("peer_group", FieldSource::Record(RecordKind::PeerGroup, self.peer_group)),
            ("peer", FieldSource::Record(RecordKind::PeerEndpoint, self.peer)),
            ("import_policy", FieldSource::value(self.import_policy.clone())),
            ("export_policy", FieldSource::value(self.export_policy.clone())),
            ("peering", FieldSource::Record(RecordKind::Peering, Some(self.peering))),
            ("secret", FieldSource::Core(CoreKind::Secret, self.secret)),
            ("tags", FieldSource::CoreMany(CoreKind::Tag, self.tags.clone())),
            ("enabled", FieldSource::value(self.enabled)),
        ]
    }

    fn apply(&mut self, input: &mut Input) {
        if let Some(instance) = input.relation("routing_instance") {
            self.routing_instance = instance;
        }
        if let Some(ip) = input.relation("source_ip") {
            self.source_ip = ip;
        }
        if let Some(interface) = input.relation("source_interface") {
            self.source_interface = interface;
        }
        if let Some(asn) = input.relation("autonomous_system") {
            self.autonomous_system = asn;
        }
        if let Some(group) = input.relation("peer_group") {
            self.peer_group = group;
        }
        if let Some(peer) = input.relation("peer") {
            self.peer = peer;
        }
        if let Some(policy) = input.text("import_policy") {
            self.import_policy = policy;
        }
        if let Some(policy) = input.text("export_policy") {
            self.export_policy = policy;
        }
        if let Some(peering) = input.required_relation("peering") {
            self.peering = peering;
        }
        if let Some(secret) = input.relation("secret") {
            self.secret = secret;
        }
        if let Some(tags) = input.relations("tags") {
            self.tags = tags;
        }
        if let Some(enabled) = input.take("enabled") {
            self.enabled = enabled;
        }
        if self.source_ip.is_some() && self.source_interface.is_some() {
            input.error("source_ip", "Source IP and source interface cannot both be set.");
        }
    }

    async fn validate<S: Store + ?Sized>(&self, store: &S, previous: Option<&Self>) -> Result<FieldErrors> {
        let mut errors = validate_attachment(store, self, previous).await?;

        if let (Some(group), Some(instance)) = (self.peer_group, self.routing_instance) {
            let group: Option<PeerGroup> = store.get(&group).await?;
            if group.is_some_and(|g| g.routing_instance != instance) {
                errors.add("peer_group", "Peer group belongs to a different routing instance.");
            }
        }
        Ok(errors)
    }

    async fn persist<S: Store + ?Sized>(store: &S, record: Self, previous: Option<&Self>) -> Result<Self> {
        let outcome = match previous {
            Some(previous) => update_endpoint(store, previous, record).await?,
            None => create_endpoint(store, record).await?,
        };
        Ok(outcome.endpoint)
    }
}
