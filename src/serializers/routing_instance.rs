use crate::model::{CoreKind, Id, RecordKind, RoutingInstance};
use crate::serializers::input::Input;
use crate::serializers::representation::{Capabilities, FieldSource, Mapper};

#[async_trait::async_trait]
impl Mapper for RoutingInstance {
    const FIELDS: &'static [&'static str] = &[
        "id",
        "url",
        "device",
        "description",
        "router_id",
        "autonomous_system",
        "endpoints",
    ];
    const READ_ONLY: &'static [&'static str] = &["id", "url", "endpoints"];
    const REQUIRED: &'static [&'static str] = &["device"];
    const CAPABILITIES: Capabilities = Capabilities {
        extra_attributes: true,
        ..Capabilities::NONE
    };

    fn blank() -> Self {
        RoutingInstance::new(Id::nil())
    }

    fn map(&self) -> Vec<(&'static str, FieldSource)> {
        vec![
            ("device", FieldSource::Core(CoreKind::Device, Some(self.device))),
            ("description", FieldSource::value(self.description.clone())),
            ("router_id", FieldSource::Core(CoreKind::IpAddress, self.router_id)),
            (
                "autonomous_system",
                FieldSource::Record(RecordKind::AutonomousSystem, self.autonomous_system),
            ),
            (
                "endpoints",
                FieldSource::Reverse {
                    kind: RecordKind::PeerEndpoint,
                    attribute: "routing_instance",
                },
            ),
        ]
    }

    fn apply(&mut self, input: &mut Input) {
        if let Some(device) = input.required_relation("device") {
            self.device = device;
        }
        if let Some(description) = input.text("description") {
            self.description = description;
        }
        if let Some(router_id) = input.relation("router_id") {
            self.router_id = router_id;
        }
        if let Some(asn) = input.relation("autonomous_system") {
            self.autonomous_system = asn;
        }
    }
}
