use crate::error::{FieldErrors, Result};
use crate::model::{CoreKind, Id, PeerGroup, PeerGroupTemplate, RecordKind};
use crate::serializers::input::Input;
use crate::serializers::representation::{conflicts, Capabilities, FieldSource, Mapper};
use crate::store::Store;

fn require_name(input: &mut Input) -> Option<String> {
    let name = input.take::<String>("name")?;
    if name.trim().is_empty() {
        input.error("name", "This field may not be blank.");
    }
    Some(name)
}

#[async_trait::async_trait]
impl Mapper for PeerGroupTemplate {
    const FIELDS: &'static [&'static str] = &[
        "id",
        "url",
        "name",
        "role",
        "description",
        "enabled",
        "autonomous_system",
        "import_policy",
        "export_policy",
        "secret",
    ];
    const REQUIRED: &'static [&'static str] = &["name"];
    const CAPABILITIES: Capabilities = Capabilities {
        extra_attributes: true,
        ..Capabilities::NONE
    };

    fn blank() -> Self {
        PeerGroupTemplate::new("")
    }

    fn map(&self) -> Vec<(&'static str, FieldSource)> {
        vec![
            ("name", FieldSource::value(self.name.clone())),
            ("role", FieldSource::Record(RecordKind::PeeringRole, self.role)),
            ("description", FieldSource::value(self.description.clone())),
            ("enabled", FieldSource::value(self.enabled)),
            (
                "autonomous_system",
                FieldSource::Record(RecordKind::AutonomousSystem, self.autonomous_system),
            ),
            ("import_policy", FieldSource::value(self.import_policy.clone())),
            ("export_policy", FieldSource::value(self.export_policy.clone())),
            ("secret", FieldSource::Core(CoreKind::Secret, self.secret)),
        ]
    }

    fn apply(&mut self, input: &mut Input) {
        if let Some(name) = require_name(input) {
            self.name = name;
        }
        if let Some(role) = input.relation("role") {
            self.role = role;
        }
        if let Some(description) = input.text("description") {
            self.description = description;
        }
        if let Some(enabled) = input.take("enabled") {
            self.enabled = enabled;
        }
        if let Some(asn) = input.relation("autonomous_system") {
            self.autonomous_system = asn;
        }
        if let Some(policy) = input.text("import_policy") {
            self.import_policy = policy;
        }
        if let Some(policy) = input.text("export_policy") {
            self.export_policy = policy;
        }
        if let Some(secret) = input.relation("secret") {
            self.secret = secret;
        }
    }

    async fn validate<S: Store + ?Sized>(&self, store: &S, _previous: Option<&Self>) -> Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if conflicts(store, self, |other: &Self| other.name == self.name).await? {
            errors.add("name", "Peer group template with this name already exists.");
        }
        Ok(errors)
    }
}

#[async_trait::async_trait]
impl Mapper for PeerGroup {
    const FIELDS: &'static [&'static str] = &[
        "id",
        "url",
        "name",
        "source_ip",
        "source_interface",
        "description",
        "enabled",
        "autonomous_system",
        "routing_instance",
        "template",
        "secret",
        "extra_attributes",
        "role",
        "import_policy",
        "export_policy",
    ];
    const READ_ONLY: &'static [&'static str] = &["id", "url", "extra_attributes"];
    const REQUIRED: &'static [&'static str] = &["name", "routing_instance"];
    const CAPABILITIES: Capabilities = Capabilities {
        inheritance: true,
        extra_attributes: true,
        ..Capabilities::NONE
    };

    fn blank() -> Self {
        PeerGroup::new("", Id::nil())
    }

    fn map(&self) -> Vec<(&'static str, FieldSource)> {
        vec![
            ("name", FieldSource::value(self.name.clone())),
            ("source_ip", FieldSource::Core(CoreKind::IpAddress, self.source_ip)),
            ("source_interface", FieldSource::Core(CoreKind::Interface, self.source_interface)),
            ("description", FieldSource::value(self.description.clone())),
            ("enabled", FieldSource::value(self.enabled)),
            (
                "autonomous_system",
                FieldSource::Record(RecordKind::AutonomousSystem, self.autonomous_system),
            ),
            (
                "routing_instance",
                FieldSource::Record(RecordKind::RoutingInstance, Some(self.routing_instance)),
            ),
            ("template", FieldSource::Record(RecordKind::PeerGroupTemplate, self.template)),
            ("secret", FieldSource::Core(CoreKind::Secret, self.secret)),
            ("extra_attributes", FieldSource::ExtraAttributes),
            ("role", FieldSource::Record(RecordKind::PeeringRole, self.role)),
            ("import_policy", FieldSource::value(self.import_policy.clone())),
            ("export_policy", FieldSource::value(self.export_policy.clone())),
        ]
    }

    fn apply(&mut self, input: &mut Input) {
        if let Some(name) = require_name(input) {
            self.name = name;
        }
        if let Some(ip) = input.relation("source_ip") {
            self.source_ip = ip;
        }
        if let Some(interface) = input.relation("source_interface") {
            self.source_interface = interface;
        }
        if let Some(description) = input.text("description") {
            self.description = description;
        }
        if let Some(enabled) = input.take("enabled") {
            self.enabled = enabled;
        }
        if let Some(asn) = input.relation("autonomous_system") {
            self.autonomous_system = asn;
        }
        if let Some(instance) = input.required_relation("routing_instance") {
            self.routing_instance = instance;
        }
        if let Some(template) = input.relation("template") {
            self.template = template;
        }
        if let Some(secret) = input.relation("secret") {
            self.secret = secret;
        }
        if let Some(role) = input.relation("role") {
            self.role = role;
        }
        if let Some(policy) = input.text("import_policy") {
            self.import_policy = policy;
        }
        if let Some(policy) = input.text("export_policy") {
            self.export_policy = policy;
        }
        if self.source_ip.is_some() && self.source_interface.is_some() {
            input.error("source_ip", "Source IP and source interface cannot both be set.");
        }
    }

    async fn validate<S: Store + ?Sized>(&self, store: &S, _previous: Option<&Self>) -> Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        let clash = |other: &Self| other.routing_instance == self.routing_instance && other.name == self.name;
        if conflicts(store, self, clash).await? {
            errors.add("name", "Peer group with this name already exists in the routing instance.");
        }
        Ok(errors)
    }
}
