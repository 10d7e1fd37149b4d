use std::collections::{BTreeMap, HashMap};

use crate::error::Result;
use crate::model::{
    AddressFamily, AutonomousSystem, CoreKind, Id, PeerEndpoint, PeerGroup, PeerGroupTemplate, Peering,
    PeeringRole, Record, RoutingInstance,
};
use crate::store::{CoreStore, RecordStoreExt, Store};

/// Query parameters that steer the response rather than select records.
const RESERVED: &[&str] = &["limit", "offset", "brief", "include_inherited", "format"];

/// Parse the boolean spellings accepted on query strings.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Some(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// List filters: parameter name to the accepted values.
///
/// Values of one parameter are alternatives; different parameters must all
/// match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    params: BTreeMap<String, Vec<String>>,
}

impl FilterSet {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in pairs {
            if RESERVED.contains(&key.as_str()) {
                continue;
            }
            params.entry(key).or_default().push(value);
        }
        Self { params }
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn matches(&self, facets: &Facets) -> bool {
        self.params.iter().all(|(key, accepted)| {
            if key == "q" {
                return accepted.iter().all(|needle| facets.search_matches(needle));
            }
            match facets.values.get(key.as_str()) {
                Some(candidates) => accepted
                    .iter()
                    .any(|value| candidates.iter().any(|c| facet_eq(key, c, value))),
                None => true,
            }
        })
    }
}

fn facet_eq(key: &str, candidate: &str, value: &str) -> bool {
    if key == "enabled" {
        return parse_bool(value).map(|b| b.to_string()).as_deref() == Some(candidate);
    }
    candidate.eq_ignore_ascii_case(value.trim())
}

/// Values a record exposes to filtering.
#[derive(Debug, Default)]
pub struct Facets {
    values: HashMap<&'static str, Vec<String>>,
    search: Vec<String>,
}

impl Facets {
    pub fn new<R: Record>(record: &R) -> Self {
        let mut facets = Self::default();
        facets.add("id", record.id());
        facets
    }

    pub fn add(&mut self, key: &'static str, value: impl ToString) -> &mut Self {
        self.values.entry(key).or_default().push(value.to_string());
        self
    }

    pub fn add_opt<T: ToString>(&mut self, key: &'static str, value: Option<T>) -> &mut Self {
        let entry = self.values.entry(key).or_default();
        if let Some(value) = value {
            entry.push(value.to_string());
        }
        self
    }

    pub fn search(&mut self, text: impl Into<String>) -> &mut Self {
        self.search.push(text.into().to_lowercase());
        self
    }

    fn search_matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty() || self.search.iter().any(|text| text.contains(&needle))
    }
}

/// Cached lookups of related names used while computing facets.
pub struct Lookup<'a, S: ?Sized> {
    store: &'a S,
    asns: HashMap<Id, Option<u32>>,
    role_slugs: HashMap<Id, Option<String>>,
    core_names: HashMap<(CoreKind, Id), Option<String>>,
    instance_devices: HashMap<Id, Option<Id>>,
    endpoints: Option<Vec<PeerEndpoint>>,
}

impl<'a, S: Store + ?Sized> Lookup<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            asns: HashMap::new(),
            role_slugs: HashMap::new(),
            core_names: HashMap::new(),
            instance_devices: HashMap::new(),
            endpoints: None,
        }
    }

    pub async fn asn(&mut self, id: Option<Id>) -> anyhow::Result<Option<u32>> {
        let Some(id) = id else { return Ok(None) };
        if let Some(asn) = self.asns.get(&id) {
            return Ok(*asn);
        }
        let asn = self.store.get::<AutonomousSystem>(&id).await?.map(|a| a.asn);
        self.asns.insert(id, asn);
        Ok(asn)
    }

    pub async fn role_slug(&mut self, id: Option<Id>) -> anyhow::Result<Option<String>> {
        let Some(id) = id else { return Ok(None) };
        if let Some(slug) = self.role_slugs.get(&id) {
            return Ok(slug.clone());
        }
        let slug = self.store.get::<PeeringRole>(&id).await?.map(|r| r.slug);
        self.role_slugs.insert(id, slug.clone());
        Ok(slug)
    }

    pub async fn core_name(&mut self, kind: CoreKind, id: Option<Id>) -> anyhow::Result<Option<String>> {
        let Some(id) = id else { return Ok(None) };
        if let Some(name) = self.core_names.get(&(kind, id)) {
            return Ok(name.clone());
        }
        let name = self.store.get_core_object(kind, &id).await?.map(|o| o.name);
        self.core_names.insert((kind, id), name.clone());
        Ok(name)
    }

    /// Name of the device a routing instance belongs to.
    pub async fn device_name(&mut self, routing_instance: Option<Id>) -> anyhow::Result<Option<String>> {
        let Some(ri) = routing_instance else { return Ok(None) };
        let device = match self.instance_devices.get(&ri) {
            Some(device) => *device,
            None => {
                let device = self.store.get::<RoutingInstance>(&ri).await?.map(|i| i.device);
                self.instance_devices.insert(ri, device);
                device
            }
        };
        self.core_name(CoreKind::Device, device).await
    }

    pub async fn endpoints_of(&mut self, peering: Id) -> anyhow::Result<Vec<PeerEndpoint>> {
        if self.endpoints.is_none() {
            self.endpoints = Some(self.store.list().await?);
        }
        Ok(self
            .endpoints
            .iter()
            .flatten()
            .filter(|e| e.peering == peering)
            .cloned()
            .collect())
    }
}

/// A record type that list endpoints can filter.
#[async_trait::async_trait]
pub trait Filterable: Record {
    async fn facets<S: Store + ?Sized>(&self, lookup: &mut Lookup<'_, S>) -> anyhow::Result<Facets>;
}

/// Keep the records matching `filters`, preserving order.
pub async fn apply<R, S>(store: &S, records: Vec<R>, filters: &FilterSet) -> Result<Vec<R>>
where
    R: Filterable,
    S: Store + ?Sized,
{
    if filters.is_empty() {
        return Ok(records);
    }

    let mut lookup = Lookup::new(store);
    let mut kept = Vec::new();
    for record in records {
        let facets = record.facets(&mut lookup).await?;
        if filters.matches(&facets) {
            kept.push(record);
        }
    }
    log::debug!("{} filter kept {} record(s)", R::KIND, kept.len());
    Ok(kept)
}

#[async_trait::async_trait]
impl Filterable for AutonomousSystem {
    async fn facets<S: Store + ?Sized>(&self, _lookup: &mut Lookup<'_, S>) -> anyhow::Result<Facets> {
        let mut facets = Facets::new(self);
        facets
            .add("asn", self.asn)
            .add("status", &self.status)
            .search(&self.description);
        Ok(facets)
    }
}

#[async_trait::async_trait]
impl Filterable for PeeringRole {
    async fn facets<S: Store + ?Sized>(&self, _lookup: &mut Lookup<'_, S>) -> anyhow::Result<Facets> {
        let mut facets = Facets::new(self);
        facets
            .add("name", &self.name)
            .add("slug", &self.slug)
            .add("color", &self.color)
            .search(&self.name)
            .search(&self.slug)
            .search(&self.description);
        Ok(facets)
    }
}

#[async_trait::async_trait]
impl Filterable for PeerGroupTemplate {
    async fn facets<S: Store + ?Sized>(&self, lookup: &mut Lookup<'_, S>) -> anyhow::Result<Facets> {
        let mut facets = Facets::new(self);
        facets
            .add("name", &self.name)
            .add("enabled", self.enabled)
            .add_opt("role", lookup.role_slug(self.role).await?)
            .add_opt("autonomous_system", lookup.asn(self.autonomous_system).await?)
            .search(&self.name)
            .search(&self.description);
        Ok(facets)
    }
}

#[async_trait::async_trait]
impl Filterable for PeerGroup {
    async fn facets<S: Store + ?Sized>(&self, lookup: &mut Lookup<'_, S>) -> anyhow::Result<Facets> {
        let mut facets = Facets::new(self);
        facets
            .add("name", &self.name)
            .add("enabled", self.enabled)
            .add("routing_instance", self.routing_instance)
            .add_opt("role", lookup.role_slug(self.role).await?)
            .add_opt("autonomous_system", lookup.asn(self.autonomous_system).await?)
            .search(&self.name)
            .search(&self.description);
        Ok(facets)
    }
}

#[async_trait::async_trait]
impl Filterable for PeerEndpoint {
    async fn facets<S: Store + ?Sized>(&self, lookup: &mut Lookup<'_, S>) -> anyhow::Result<Facets> {
        let mut facets = Facets::new(self);
        facets
            .add("enabled", self.enabled)
            .add("peering", self.peering)
            .add_opt("peer_group", self.peer_group)
            .add_opt("routing_instance", self.routing_instance)
            .add_opt("autonomous_system", lookup.asn(self.autonomous_system).await?);
        if let Some(device) = lookup.device_name(self.routing_instance).await? {
            facets.search(device);
        }
        if let Some(ip) = lookup.core_name(CoreKind::IpAddress, self.source_ip).await? {
            facets.search(ip);
        }
        Ok(facets)
    }
}

#[async_trait::async_trait]
impl Filterable for Peering {
    async fn facets<S: Store + ?Sized>(&self, lookup: &mut Lookup<'_, S>) -> anyhow::Result<Facets> {
        let mut facets = Facets::new(self);
        facets.add("status", &self.status).add_opt::<String>("device", None);
        for endpoint in lookup.endpoints_of(self.id).await? {
            let device = lookup.device_name(endpoint.routing_instance).await?;
            facets.add_opt("device", device);
        }
        Ok(facets)
    }
}

#[async_trait::async_trait]
impl Filterable for RoutingInstance {
    async fn facets<S: Store + ?Sized>(&self, lookup: &mut Lookup<'_, S>) -> anyhow::Result<Facets> {
        let mut facets = Facets::new(self);
        facets
            .add_opt("device", lookup.core_name(CoreKind::Device, Some(self.device)).await?)
            .add_opt("autonomous_system", lookup.asn(self.autonomous_system).await?);
        Ok(facets)
    }
}

#[async_trait::async_trait]
impl Filterable for AddressFamily {
    async fn facets<S: Store + ?Sized>(&self, lookup: &mut Lookup<'_, S>) -> anyhow::Result<Facets> {
        let mut facets = Facets::new(self);
        facets
            .add("afi_safi", self.afi_safi.value())
            .add("routing_instance", self.routing_instance)
            .add_opt("device", lookup.device_name(Some(self.routing_instance)).await?);
        Ok(facets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{generate_id, AfiSafi, CoreObject};
    use crate::store::MemoryStore;

    fn filters(pairs: &[(&str, &str)]) -> FilterSet {
        FilterSet::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn test_parse_bool_spellings() {
        for truthy in ["y", "Yes", "T", "true", "ON", "1"] {
            assert_eq!(parse_bool(truthy), Some(true), "{}", truthy);
        }
        for falsy in ["n", "No", "f", "FALSE", "off", "0"] {
            assert_eq!(parse_bool(falsy), Some(false), "{}", falsy);
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_reserved_params_are_not_filters() {
        assert!(filters(&[("limit", "10"), ("brief", "true"), ("include_inherited", "1")]).is_empty());
    }

    #[tokio::test]
    async fn test_repeated_params_or_and_distinct_params_and() {
        let store = MemoryStore::new();
        let records = vec![
            AutonomousSystem::new(65001, "active"),
            AutonomousSystem::new(65002, "planned"),
            AutonomousSystem::new(65003, "active"),
        ];

        let any_of = apply(&store, records.clone(), &filters(&[("asn", "65001"), ("asn", "65002")]))
            .await
            .unwrap();
        assert_eq!(any_of.len(), 2);

        let both = apply(&store, records, &filters(&[("asn", "65001"), ("asn", "65002"), ("status", "active")]))
            .await
            .unwrap();
        assert_eq!(both.iter().map(|a| a.asn).collect::<Vec<_>>(), vec![65001]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let store = MemoryStore::new();
        let mut alpha = PeeringRole::new("Alpha", "alpha", "ff0000");
        alpha.description = "Actually omega".to_string();
        let beta = PeeringRole::new("Beta", "beta", "00ff00");

        for q in ["Alpha", "ALPHA", "actually"] {
            let found = apply(&store, vec![alpha.clone(), beta.clone()], &filters(&[("q", q)]))
                .await
                .unwrap();
            assert_eq!(found.len(), 1, "q={}", q);
        }
    }

    #[tokio::test]
    async fn test_enabled_accepts_bool_spellings() {
        let store = MemoryStore::new();
        let ri = generate_id();
        let on = PeerGroup::new("on", ri);
        let mut off = PeerGroup::new("off", ri);
        off.enabled = false;

        let found = apply(&store, vec![on, off], &filters(&[("enabled", "True")])).await.unwrap();
        assert_eq!(found.iter().map(|g| g.name.as_str()).collect::<Vec<_>>(), vec!["on"]);
    }

    #[tokio::test]
    async fn test_device_filter_follows_routing_instance() {
        let store = MemoryStore::new();
        let device = CoreObject::new(CoreKind::Device, "edge-1");
        store.upsert_core_object(device.clone()).await.unwrap();
        let instance = RoutingInstance::new(device.id);
        store.save(&instance).await.unwrap();

        let families = vec![
            AddressFamily::new(AfiSafi::Ipv4Unicast, instance.id),
            AddressFamily::new(AfiSafi::Ipv6Unicast, generate_id()),
        ];

        let found = apply(&store, families, &filters(&[("device", "edge-1")])).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].afi_safi, AfiSafi::Ipv4Unicast);
    }

    #[tokio::test]
    async fn test_unknown_params_are_ignored() {
        let store = MemoryStore::new();
        let found = apply(&store, vec![Peering::new("active")], &filters(&[("colour", "blue")]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
