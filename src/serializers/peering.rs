use crate::model::{Peering, RecordKind};
use crate::serializers::input::Input;
use crate::serializers::representation::{Capabilities, FieldSource, Mapper};

#[async_trait::async_trait]
impl Mapper for Peering {
    const FIELDS: &'static [&'static str] = &["id", "url", "status", "endpoints"];
    const READ_ONLY: &'static [&'static str] = &["id", "url", "endpoints"];
    const REQUIRED: &'static [&'static str] = &["status"];
    const CAPABILITIES: Capabilities = Capabilities {
        status: true,
        ..Capabilities::NONE
    };

    fn blank() -> Self {
        Peering::new("")
    }

    fn map(&self) -> Vec<(&'static str, FieldSource)> {
        vec![
            ("status", FieldSource::Status(self.status.clone())),
            (
                "endpoints",
                FieldSource::Reverse {
                    kind: RecordKind::PeerEndpoint,
                    attribute: "peering",
                },
            ),
        ]
    }

    fn apply(&mut self, input: &mut Input) {
        if let Some(status) = input.take("status") {
            self.status = status;
        }
    }
}
