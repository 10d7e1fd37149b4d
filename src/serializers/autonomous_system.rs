use crate::error::{FieldErrors, Result};
use crate::model::{AutonomousSystem, CoreKind};
use crate::serializers::input::Input;
use crate::serializers::representation::{conflicts, Capabilities, FieldSource, Mapper};
use crate::store::Store;

#[async_trait::async_trait]
impl Mapper for AutonomousSystem {
    const FIELDS: &'static [&'static str] = &["id", "url", "asn", "description", "status", "provider", "tags"];
    const REQUIRED: &'static [&'static str] = &["asn", "status"];
    const CAPABILITIES: Capabilities = Capabilities {
        status: true,
        tags: true,
        ..Capabilities::NONE
    };

    fn blank() -> Self {
        AutonomousSystem::new(0, "")
    }

    fn map(&self) -> Vec<(&'static str, FieldSource)> {
        vec![
            ("asn", FieldSource::value(self.asn)),
            ("description", FieldSource::value(self.description.clone())),
            ("status", FieldSource::Status(self.status.clone())),
            ("provider", FieldSource::Core(CoreKind::Provider, self.provider)),
            ("tags", FieldSource::CoreMany(CoreKind::Tag, self.tags.clone())),
        ]
    }

    fn apply(&mut self, input: &mut Input) {
        if let Some(asn) = input.take::<u32>("asn") {
            if asn == 0 {
                input.error("asn", "Ensure this value is greater than or equal to 1.");
            }
            self.asn = asn;
        }
        if let Some(description) = input.text("description") {
            self.description = description;
        }
        if let Some(status) = input.take("status") {
            self.status = status;
        }
        if let Some(provider) = input.relation("provider") {
            self.provider = provider;
        }
        if let Some(tags) = input.relations("tags") {
            self.tags = tags;
        }
    }

    async fn validate<S: Store + ?Sized>(&self, store: &S, _previous: Option<&Self>) -> Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if conflicts(store, self, |other: &Self| other.asn == self.asn).await? {
            errors.add("asn", "Autonomous system with this ASN already exists.");
        }
        Ok(errors)
    }
}
