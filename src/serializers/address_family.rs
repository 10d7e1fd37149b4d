use crate::error::{FieldErrors, Result};
use crate::model::{AddressFamily, AfiSafi, CoreKind, Id, RecordKind};
use crate::serializers::input::Input;
use crate::serializers::representation::{conflicts, FieldSource, Mapper};
use crate::store::Store;

#[async_trait::async_trait]
impl Mapper for AddressFamily {
    const FIELDS: &'static [&'static str] = &[
        "id",
        "url",
        "afi_safi",
        "routing_instance",
        "vrf",
        "export_policy",
        "import_policy",
    ];
    const REQUIRED: &'static [&'static str] = &["afi_safi", "routing_instance"];

    fn blank() -> Self {
        AddressFamily::new(AfiSafi::Ipv4Unicast, Id::nil())
    }

    fn map(&self) -> Vec<(&'static str, FieldSource)> {
        vec![
            (
                "afi_safi",
                FieldSource::Choice {
                    value: self.afi_safi.value(),
                    label: self.afi_safi.label(),
                },
            ),
            (
                "routing_instance",
                FieldSource::Record(RecordKind::RoutingInstance, Some(self.routing_instance)),
            ),
            ("vrf", FieldSource::Core(CoreKind::Vrf, self.vrf)),
            ("export_policy", FieldSource::value(self.export_policy.clone())),
            ("import_policy", FieldSource::value(self.import_policy.clone())),
        ]
    }

    fn apply(&mut self, input: &mut Input) {
        if let Some(afi_safi) = input.choice::<AfiSafi>("afi_safi") {
            self.afi_safi = afi_safi;
        }
        if let Some(instance) = input.required_relation("routing_instance") {
            self.routing_instance = instance;
        }
        if let Some(vrf) = input.relation("vrf") {
            self.vrf = vrf;
        }
        if let Some(policy) = input.text("export_policy") {
            self.export_policy = policy;
        }
        if let Some(policy) = input.text("import_policy") {
            self.import_policy = policy;
        }
    }

    async fn validate<S: Store + ?Sized>(&self, store: &S, _previous: Option<&Self>) -> Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        let clash = |other: &Self| {
            other.routing_instance == self.routing_instance && other.vrf == self.vrf && other.afi_safi == self.afi_safi
        };
        if conflicts(store, self, clash).await? {
            errors.add(
                "afi_safi",
                "Address family with this routing instance, VRF and AFI-SAFI already exists.",
            );
        }
        Ok(errors)
    }
}
