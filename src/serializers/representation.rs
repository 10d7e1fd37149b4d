use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::error::{Error, FieldErrors, Result};
use crate::logic::{own_extra_attributes, resolve_extra_attributes, with_inherited, Filterable, Lineage};
use crate::model::{CoreKind, CoreObject, Id, Record, RecordKind, Target};
use crate::serializers::input::{Input, WriteMode};
use crate::serializers::nested;
use crate::store::{CoreStore, RecordStore, RecordStoreExt, Store};

pub const PLUGIN_ROOT: &str = "/api/plugins/bgp";

/// Optional behaviours a mapper opts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub inheritance: bool,
    pub extra_attributes: bool,
    pub status: bool,
    pub tags: bool,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities {
        inheritance: false,
        extra_attributes: false,
        status: false,
        tags: false,
    };

    /// Representation stages in the order they run.
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages = Vec::with_capacity(3);
        if self.inheritance {
            stages.push(Stage::InheritanceOverride);
        }
        stages.push(Stage::BaseMapping);
        if self.extra_attributes {
            stages.push(Stage::ExtraAttributes);
        }
        stages
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Swap in a copy of the record with inherited values filled in.
    InheritanceOverride,
    /// Produce the declared field list.
    BaseMapping,
    /// Fill the `extra_attributes` placeholder.
    ExtraAttributes,
}

/// Where the value of one field comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    Value(Value),
    Record(RecordKind, Option<Id>),
    Core(CoreKind, Option<Id>),
    CoreMany(CoreKind, Vec<Id>),
    /// Status slug, rendered as `{value, label}`.
    Status(String),
    Choice { value: &'static str, label: &'static str },
    /// Records of `kind` whose `attribute` points back at this record.
    Reverse { kind: RecordKind, attribute: &'static str },
    /// Placeholder rendered as `null` by the base mapping and replaced by
    /// `Stage::ExtraAttributes`. Only mappers declaring the `extra_attributes`
    /// capability run that stage.
    ExtraAttributes,
}

impl FieldSource {
    pub fn value(value: impl Into<Value>) -> Self {
        FieldSource::Value(value.into())
    }
}

/// Per-request rendering switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub include_inherited: bool,
    pub brief: bool,
    /// `http://host` used to make links absolute.
    pub origin: Option<String>,
}

/// Caches shared by every record rendered for one request.
pub struct RenderContext<'a, S: ?Sized> {
    store: &'a S,
    options: RenderOptions,
    lineage: Lineage<'a, S>,
    core: HashMap<(CoreKind, Id), Option<CoreObject>>,
    statuses: HashMap<String, Option<CoreObject>>,
    reverse: HashMap<RecordKind, Vec<Value>>,
}

impl<'a, S: Store + ?Sized> RenderContext<'a, S> {
    pub fn new(store: &'a S, options: RenderOptions) -> Self {
        Self {
            store,
            options,
            lineage: Lineage::new(store),
            core: HashMap::new(),
            statuses: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn link(&self, path: &str) -> String {
        match &self.options.origin {
            Some(origin) => format!("{}{}", origin, path),
            None => path.to_string(),
        }
    }

    pub fn record_url(&self, kind: RecordKind, id: Id) -> String {
        self.link(&format!("{}/{}/{}/", PLUGIN_ROOT, kind.path(), id))
    }

    pub fn core_url(&self, kind: CoreKind, id: Id) -> String {
        self.link(&format!("{}/{}/", kind.path(), id))
    }

    pub async fn load_record(&mut self, kind: RecordKind, id: Id) -> anyhow::Result<Option<Value>> {
        self.lineage.load(kind, id).await
    }

    pub async fn core_object(&mut self, kind: CoreKind, id: Id) -> anyhow::Result<Option<CoreObject>> {
        if let Some(object) = self.core.get(&(kind, id)) {
            return Ok(object.clone());
        }
        let object = self.store.get_core_object(kind, &id).await?;
        self.core.insert((kind, id), object.clone());
        Ok(object)
    }

    pub async fn status(&mut self, slug: &str) -> anyhow::Result<Option<CoreObject>> {
        if let Some(status) = self.statuses.get(slug) {
            return Ok(status.clone());
        }
        let status = self.store.find_status(slug).await?;
        self.statuses.insert(slug.to_string(), status.clone());
        Ok(status)
    }

    /// Stored records of `kind` whose `attribute` equals `id`, oldest first.
    pub async fn referencing(&mut self, kind: RecordKind, attribute: &str, id: Id) -> anyhow::Result<Vec<Value>> {
        if !self.reverse.contains_key(&kind) {
            let all = self.store.fetch_all(kind).await?;
            self.reverse.insert(kind, all);
        }
        let wanted = Value::String(id.to_string());
        Ok(self
            .reverse
            .get(&kind)
            .into_iter()
            .flatten()
            .filter(|data| data.get(attribute) == Some(&wanted))
            .cloned()
            .collect())
    }

    async fn resolve(&mut self, source: FieldSource, owner: Id) -> Result<Value> {
        let value = match source {
            FieldSource::Value(value) => value,
            FieldSource::Record(_, None) | FieldSource::Core(_, None) => Value::Null,
            FieldSource::Record(kind, Some(id)) => nested::record_ref(self, kind, id).await?,
            FieldSource::Core(kind, Some(id)) => nested::core_ref(self, kind, id).await?,
            FieldSource::CoreMany(kind, ids) => {
                let mut refs = Vec::with_capacity(ids.len());
                for id in ids {
                    refs.push(nested::core_ref(self, kind, id).await?);
                }
                Value::Array(refs)
            }
            FieldSource::Status(slug) => {
                let label = self.status(&slug).await?.map(|s| s.name).unwrap_or_else(|| slug.clone());
                json!({ "value": slug, "label": label })
            }
            FieldSource::Choice { value, label } => json!({ "value": value, "label": label }),
            FieldSource::Reverse { kind, attribute } => {
                let mut refs = Vec::new();
                for data in self.referencing(kind, attribute, owner).await? {
                    refs.push(nested::brief(self, kind, &data).await?);
                }
                Value::Array(refs)
            }
            FieldSource::ExtraAttributes => Value::Null,
        };
        Ok(value)
    }
}

/// Maps one record type to and from its wire representation.
#[async_trait::async_trait]
pub trait Mapper: Filterable {
    /// Wire fields, in output order.
    const FIELDS: &'static [&'static str];
    /// Fields ignored on input.
    const READ_ONLY: &'static [&'static str] = &["id", "url"];
    /// Fields a create or full update must supply.
    const REQUIRED: &'static [&'static str] = &[];
    const CAPABILITIES: Capabilities = Capabilities::NONE;
    /// Writes validate against, and rewrite, other records. They run under
    /// the store's write gate from the first read to the commit.
    const GATED_WRITES: bool = false;

    /// Starting point for a create; `apply` fills in the required fields.
    fn blank() -> Self;

    /// Sources for every field except `id` and `url`.
    fn map(&self) -> Vec<(&'static str, FieldSource)>;

    /// Copy supplied input values onto the record.
    fn apply(&mut self, input: &mut Input);

    /// Checks that need the store, such as uniqueness.
    async fn validate<S: Store + ?Sized>(&self, _store: &S, _previous: Option<&Self>) -> Result<FieldErrors> {
        Ok(FieldErrors::new())
    }

    /// Write the validated record.
    async fn persist<S: Store + ?Sized>(store: &S, record: Self, _previous: Option<&Self>) -> Result<Self> {
        store.save(&record).await?;
        log::info!("Saved {} {}", Self::KIND, record.id());
        Ok(record)
    }
}

/// Full (or, with `brief`, by-reference) representation of a record.
pub async fn render<R, S>(ctx: &mut RenderContext<'_, S>, record: &R) -> Result<Value>
where
    R: Mapper,
    S: Store + ?Sized,
{
    if ctx.options.brief {
        let data = serde_json::to_value(record).map_err(anyhow::Error::from)?;
        return nested::brief(ctx, R::KIND, &data).await;
    }

    let include_inherited = ctx.options.include_inherited;
    let mut working: Option<R> = None;
    let mut fields = Map::new();

    for stage in R::CAPABILITIES.stages() {
        match stage {
            Stage::InheritanceOverride => {
                if include_inherited {
                    working = Some(with_inherited(&mut ctx.lineage, record).await?);
                }
            }
            Stage::BaseMapping => {
                fields = base_mapping(ctx, working.as_ref().unwrap_or(record)).await?;
            }
            Stage::ExtraAttributes => {
                if let Some(slot) = fields.get_mut("extra_attributes") {
                    *slot = if include_inherited {
                        resolve_extra_attributes(&mut ctx.lineage, record).await?
                    } else {
                        own_extra_attributes(record)
                    };
                }
            }
        }
    }

    Ok(Value::Object(fields))
}

async fn base_mapping<R, S>(ctx: &mut RenderContext<'_, S>, record: &R) -> Result<Map<String, Value>>
where
    R: Mapper,
    S: Store + ?Sized,
{
    let mut sources: HashMap<&'static str, FieldSource> = record.map().into_iter().collect();
    let mut fields = Map::new();

    for field in R::FIELDS {
        let value = match *field {
            "id" => json!(record.id()),
            "url" => json!(ctx.record_url(R::KIND, record.id())),
            name => {
                let source = sources
                    .remove(name)
                    .ok_or_else(|| anyhow::anyhow!("{} has no source for field `{}`", R::KIND, name))?;
                ctx.resolve(source, record.id()).await?
            }
        };
        fields.insert(field.to_string(), value);
    }

    Ok(fields)
}

/// Every relation and catalog object the record points at must exist.
pub async fn validate_references<R, S>(store: &S, record: &R) -> Result<FieldErrors>
where
    R: Record,
    S: Store + ?Sized,
{
    let mut errors = FieldErrors::new();
    for reference in record.references() {
        let exists = match &reference.target {
            Target::Record(kind, id) => store.fetch(*kind, id).await?.is_some(),
            Target::Core(kind, id) => store.get_core_object(*kind, id).await?.is_some(),
            Target::Status(slug) => store.find_status(slug).await?.is_some(),
        };
        if !exists {
            let message = match &reference.target {
                Target::Record(_, id) | Target::Core(_, id) => format!("Related object {} does not exist.", id),
                Target::Status(slug) => format!("Status \"{}\" does not exist.", slug),
            };
            errors.add(reference.field, message);
        }
    }
    Ok(errors)
}

async fn check<R, S>(store: &S, record: &R, previous: Option<&R>) -> Result<()>
where
    R: Mapper,
    S: Store + ?Sized,
{
    let mut errors = validate_references(store, record).await?;
    errors.merge(record.validate(store, previous).await?);
    errors.into_result()
}

async fn gate<R, S>(store: &S) -> Option<tokio::sync::MutexGuard<'_, ()>>
where
    R: Mapper,
    S: Store + ?Sized,
{
    if R::GATED_WRITES {
        Some(store.write_gate().enter().await)
    } else {
        None
    }
}

/// Validate `body` as a new record and persist it.
pub async fn create<R, S>(store: &S, body: Value) -> Result<R>
where
    R: Mapper,
    S: Store + ?Sized,
{
    let mut input = Input::parse(body, R::FIELDS, R::READ_ONLY, R::REQUIRED, WriteMode::Create)?;
    let mut record = R::blank();
    record.apply(&mut input);
    input.finish()?;

    let _gate = gate::<R, S>(store).await;
    check(store, &record, None).await?;
    R::persist(store, record, None).await
}

/// Apply `body` onto a stored record and persist the result.
pub async fn update<R, S>(store: &S, id: Id, body: Value, partial: bool) -> Result<R>
where
    R: Mapper,
    S: Store + ?Sized,
{
    let _gate = gate::<R, S>(store).await;
    let previous: R = store.get(&id).await?.ok_or_else(|| Error::not_found(R::KIND, id))?;
    let mode = if partial { WriteMode::Patch } else { WriteMode::Replace };
    let mut input = Input::parse(body, R::FIELDS, R::READ_ONLY, R::REQUIRED, mode)?;
    let mut record = previous.clone();
    record.apply(&mut input);
    input.finish()?;
    record.touch();

    check(store, &record, Some(&previous)).await?;
    R::persist(store, record, Some(&previous)).await
}

/// True when another stored record of the same type satisfies `clash`.
pub async fn conflicts<R, S, F>(store: &S, record: &R, clash: F) -> Result<bool>
where
    R: Record,
    S: RecordStore + ?Sized,
    F: Fn(&R) -> bool + Send,
{
    let existing: Vec<R> = store.list().await?;
    Ok(existing
        .iter()
        .any(|other| other.id() != record.id() && clash(other)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        generate_id, AddressFamily, AfiSafi, AutonomousSystem, CoreObject, PeerEndpoint, PeerGroup,
        PeerGroupTemplate, Peering, PeeringRole, RoutingInstance,
    };
    use crate::store::MemoryStore;

    struct World {
        store: MemoryStore,
        ip: CoreObject,
        instance: RoutingInstance,
        group: PeerGroup,
        peering: Peering,
    }

    async fn world() -> World {
        let store = MemoryStore::new();
        let device = CoreObject::new(CoreKind::Device, "edge-1");
        let ip = CoreObject::new(CoreKind::IpAddress, "10.0.0.1/32");
        for object in [device.clone(), ip.clone(), CoreObject::status("Active", "active")] {
            store.upsert_core_object(object).await.unwrap();
        }
        let mut instance = RoutingInstance::new(device.id);
        instance.extra_attributes = Some(json!({"ttl": 1}));
        let mut group = PeerGroup::new("upstreams", instance.id);
        group.source_ip = Some(ip.id);
        group.extra_attributes = Some(json!({"bfd": true}));
        let peering = Peering::new("active");
        store.save(&instance).await.unwrap();
        store.save(&group).await.unwrap();
        store.save(&peering).await.unwrap();
        World {
            store,
            ip,
            instance,
            group,
            peering,
        }
    }

    fn options(include_inherited: bool) -> RenderOptions {
        RenderOptions {
            include_inherited,
            ..RenderOptions::default()
        }
    }

    async fn render_one<R: Mapper>(store: &MemoryStore, record: &R, options: RenderOptions) -> Value {
        let mut ctx = RenderContext::new(store, options);
        render(&mut ctx, record).await.unwrap()
    }

    fn keys(value: &Value) -> Vec<String> {
        value.as_object().unwrap().keys().cloned().collect()
    }

    fn field_list<R: Mapper>() -> Vec<String> {
        R::FIELDS.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_stage_order() {
        let all = Capabilities {
            inheritance: true,
            extra_attributes: true,
            ..Capabilities::NONE
        };
        assert_eq!(
            all.stages(),
            vec![Stage::InheritanceOverride, Stage::BaseMapping, Stage::ExtraAttributes]
        );
        assert_eq!(Capabilities::NONE.stages(), vec![Stage::BaseMapping]);
    }

    #[test]
    fn test_capabilities_match_field_lists() {
        fn check<R: Mapper>() {
            assert_eq!(R::CAPABILITIES.status, R::FIELDS.contains(&"status"), "{}", R::KIND);
            assert_eq!(R::CAPABILITIES.tags, R::FIELDS.contains(&"tags"), "{}", R::KIND);
            if R::FIELDS.contains(&"extra_attributes") {
                assert!(R::CAPABILITIES.extra_attributes, "{} lists extra_attributes", R::KIND);
            }
        }
        check::<AutonomousSystem>();
        check::<PeeringRole>();
        check::<PeerGroupTemplate>();
        check::<PeerGroup>();
        check::<PeerEndpoint>();
        check::<Peering>();
        check::<RoutingInstance>();
        check::<AddressFamily>();
    }

    #[tokio::test]
    async fn test_every_type_renders_its_field_list_in_order() {
        let w = world().await;
        let endpoint = PeerEndpoint::new(w.peering.id);
        let opts = options(false);

        assert_eq!(
            keys(&render_one(&w.store, &AutonomousSystem::new(65000, "active"), opts.clone()).await),
            field_list::<AutonomousSystem>()
        );
        assert_eq!(
            keys(&render_one(&w.store, &PeeringRole::new("Transit", "transit", "ff0000"), opts.clone()).await),
            field_list::<PeeringRole>()
        );
        assert_eq!(
            keys(&render_one(&w.store, &PeerGroupTemplate::new("t"), opts.clone()).await),
            field_list::<PeerGroupTemplate>()
        );
        assert_eq!(keys(&render_one(&w.store, &w.group, opts.clone()).await), field_list::<PeerGroup>());
        assert_eq!(keys(&render_one(&w.store, &endpoint, opts.clone()).await), field_list::<PeerEndpoint>());
        assert_eq!(keys(&render_one(&w.store, &w.peering, opts.clone()).await), field_list::<Peering>());
        assert_eq!(
            keys(&render_one(&w.store, &w.instance, opts.clone()).await),
            field_list::<RoutingInstance>()
        );
        assert_eq!(
            keys(&render_one(&w.store, &AddressFamily::new(AfiSafi::Ipv4Unicast, w.instance.id), opts).await),
            field_list::<AddressFamily>()
        );
    }

    #[tokio::test]
    async fn test_relations_render_by_reference() {
        let w = world().await;
        let rendered = render_one(&w.store, &w.group, options(false)).await;

        let instance = &rendered["routing_instance"];
        assert_eq!(instance["id"], json!(w.instance.id));
        assert_eq!(instance["display"], "edge-1");
        assert!(instance.get("device").is_none());
        assert_eq!(rendered["source_ip"]["display"], "10.0.0.1/32");
    }

    #[tokio::test]
    async fn test_source_ip_null_until_inherited() {
        let w = world().await;
        let mut endpoint = PeerEndpoint::new(w.peering.id);
        endpoint.peer_group = Some(w.group.id);
        w.store.save(&endpoint).await.unwrap();

        let plain = render_one(&w.store, &endpoint, options(false)).await;
        assert_eq!(plain["source_ip"], Value::Null);

        let inherited = render_one(&w.store, &endpoint, options(true)).await;
        assert_eq!(inherited["source_ip"]["id"], json!(w.ip.id));
    }

    #[tokio::test]
    async fn test_extra_attributes_own_or_resolved() {
        let w = world().await;

        let plain = render_one(&w.store, &w.group, options(false)).await;
        assert_eq!(plain["extra_attributes"], json!({"bfd": true}));

        let resolved = render_one(&w.store, &w.group, options(true)).await;
        assert_eq!(resolved["extra_attributes"], json!({"ttl": 1, "bfd": true}));
    }

    #[tokio::test]
    async fn test_brief_uses_reference_shape() {
        let w = world().await;
        let mut ctx = RenderContext::new(
            &w.store,
            RenderOptions {
                brief: true,
                ..RenderOptions::default()
            },
        );

        let rendered = render(&mut ctx, &w.group).await.unwrap();

        assert_eq!(keys(&rendered), vec!["id", "url", "display", "name"]);
    }

    #[tokio::test]
    async fn test_peering_lists_its_endpoints() {
        let w = world().await;
        let endpoint = create::<PeerEndpoint, _>(&w.store, json!({ "peering": w.peering.id }))
            .await
            .unwrap();

        let rendered = render_one(&w.store, &w.peering, options(false)).await;

        assert_eq!(rendered["status"], json!({"value": "active", "label": "Active"}));
        assert_eq!(rendered["endpoints"][0]["id"], json!(endpoint.id));
    }

    #[tokio::test]
    async fn test_non_relational_fields_survive_round_trip() {
        let w = world().await;
        let mut role = PeeringRole::new("Transit", "transit", "00ff00");
        role.description = "Upstream transit".to_string();
        let rendered = render_one(&w.store, &role, options(false)).await;

        let other = MemoryStore::new();
        let created = create::<PeeringRole, _>(&other, rendered.clone()).await.unwrap();
        let again = render_one(&other, &created, options(false)).await;

        for field in ["name", "slug", "color", "description"] {
            assert_eq!(again[field], rendered[field], "{}", field);
        }
    }

    #[tokio::test]
    async fn test_missing_required_relation_writes_nothing() {
        let w = world().await;

        let err = create::<PeerGroup, _>(&w.store, json!({ "name": "orphans" })).await.unwrap_err();

        match err {
            Error::Validation(fields) => assert!(fields.contains("routing_instance")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(w.store.list::<PeerGroup>().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_peering_leaves_peers_untouched() {
        let w = world().await;
        let a = create::<PeerEndpoint, _>(&w.store, json!({ "peering": w.peering.id })).await.unwrap();
        let b = create::<PeerEndpoint, _>(&w.store, json!({ "peering": w.peering.id })).await.unwrap();

        let err = update::<PeerEndpoint, _>(&w.store, a.id, json!({ "peering": generate_id() }), true)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        let a: PeerEndpoint = w.store.get(&a.id).await.unwrap().unwrap();
        let b: PeerEndpoint = w.store.get(&b.id).await.unwrap().unwrap();
        assert_eq!(a.peer, Some(b.id));
        assert_eq!(b.peer, Some(a.id));
    }

    #[tokio::test]
    async fn test_duplicate_asn_rejected() {
        let w = world().await;
        create::<AutonomousSystem, _>(&w.store, json!({ "asn": 65000, "status": "active" }))
            .await
            .unwrap();

        let err = create::<AutonomousSystem, _>(&w.store, json!({ "asn": 65000, "status": "active" }))
            .await
            .unwrap_err();

        match err {
            Error::Validation(fields) => assert!(fields.contains("asn")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_status_rejected() {
        let w = world().await;

        let err = create::<Peering, _>(&w.store, json!({ "status": "retired" })).await.unwrap_err();

        match err {
            Error::Validation(fields) => assert!(fields.contains("status")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    /// Yields to the scheduler on every read, so concurrent writers interleave.
    #[derive(Default)]
    struct YieldingStore {
        inner: MemoryStore,
    }

    #[async_trait::async_trait]
    impl RecordStore for YieldingStore {
        async fn fetch(&self, kind: RecordKind, id: &Id) -> anyhow::Result<Option<Value>> {
            tokio::task::yield_now().await;
            self.inner.fetch(kind, id).await
        }

        async fn fetch_all(&self, kind: RecordKind) -> anyhow::Result<Vec<Value>> {
            tokio::task::yield_now().await;
            self.inner.fetch_all(kind).await
        }

        async fn commit(&self, ops: Vec<crate::store::WriteOp>) -> anyhow::Result<()> {
            self.inner.commit(ops).await
        }

        fn write_gate(&self) -> &crate::store::WriteGate {
            self.inner.write_gate()
        }
    }

    #[async_trait::async_trait]
    impl CoreStore for YieldingStore {
        async fn get_core_object(&self, kind: CoreKind, id: &Id) -> anyhow::Result<Option<CoreObject>> {
            self.inner.get_core_object(kind, id).await
        }

        async fn find_status(&self, slug: &str) -> anyhow::Result<Option<CoreObject>> {
            self.inner.find_status(slug).await
        }

        async fn upsert_core_object(&self, object: CoreObject) -> anyhow::Result<()> {
            self.inner.upsert_core_object(object).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_endpoint_creates_keep_two_per_peering() {
        let store = YieldingStore::default();
        store.upsert_core_object(CoreObject::status("Active", "active")).await.unwrap();
        let peering = Peering::new("active");
        store.save(&peering).await.unwrap();
        let a = create::<PeerEndpoint, _>(&store, json!({ "peering": peering.id })).await.unwrap();

        let (b, c) = tokio::join!(
            create::<PeerEndpoint, _>(&store, json!({ "peering": peering.id })),
            create::<PeerEndpoint, _>(&store, json!({ "peering": peering.id })),
        );

        let winner = match (b, c) {
            (Ok(winner), Err(Error::Validation(fields))) | (Err(Error::Validation(fields)), Ok(winner)) => {
                assert!(fields.contains("peering"));
                winner
            }
            (b, c) => panic!("expected exactly one create to succeed: {:?} / {:?}", b.is_ok(), c.is_ok()),
        };

        let endpoints: Vec<PeerEndpoint> = store.list().await.unwrap();
        assert_eq!(endpoints.len(), 2);
        let a: PeerEndpoint = store.get(&a.id).await.unwrap().unwrap();
        let winner: PeerEndpoint = store.get(&winner.id).await.unwrap().unwrap();
        assert_eq!(a.peer, Some(winner.id));
        assert_eq!(winner.peer, Some(a.id));
    }
}
