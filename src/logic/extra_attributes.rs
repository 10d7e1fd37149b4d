use serde_json::{Map, Value};

use crate::error::ResolutionError;
use crate::logic::Lineage;
use crate::model::Record;
use crate::store::RecordStore;

/// Merge `overlay` into `base`. Objects merge key by key; anything else in
/// `overlay` replaces what `base` had.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// The record's own stored extra attributes, `null` when unset.
pub fn own_extra_attributes<R: Record>(record: &R) -> Value {
    serde_json::to_value(record)
        .ok()
        .and_then(|data| data.get("extra_attributes").cloned())
        .unwrap_or(Value::Null)
}

/// Extra attributes merged along the record's chain, ancestors first and
/// the record itself last.
pub async fn resolve_extra_attributes<R, S>(
    lineage: &mut Lineage<'_, S>,
    record: &R,
) -> Result<Value, ResolutionError>
where
    R: Record,
    S: RecordStore + ?Sized,
{
    let origin = serde_json::to_value(record).map_err(|source| ResolutionError::Malformed {
        kind: R::KIND,
        attribute: "extra_attributes",
        source,
    })?;

    let mut merged = Value::Object(Map::new());
    for path in R::EXTRA_ATTRIBUTE_CHAIN {
        if let Some(ancestor) = lineage.follow(R::KIND, &origin, path).await? {
            if let Some(attributes @ Value::Object(_)) = ancestor.get("extra_attributes") {
                deep_merge(&mut merged, attributes);
            }
        }
    }
    if let Some(attributes @ Value::Object(_)) = origin.get("extra_attributes") {
        deep_merge(&mut merged, attributes);
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{generate_id, Id, PeerEndpoint, PeerGroup, PeerGroupTemplate, Peering, RecordKind, RoutingInstance};
    use crate::logic::inheritance::with_inherited;
    use crate::store::{MemoryStore, RecordStoreExt, WriteGate, WriteOp};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_deep_merge_nested_objects() {
        let mut base = json!({"bfd": {"multiplier": 3, "interval": 300}, "ttl": 1});
        deep_merge(&mut base, &json!({"bfd": {"interval": 100}, "ttl": 255, "mp": true}));

        assert_eq!(base, json!({"bfd": {"multiplier": 3, "interval": 100}, "ttl": 255, "mp": true}));
    }

    #[test]
    fn test_deep_merge_scalar_replaces_object() {
        let mut base = json!({"bfd": {"multiplier": 3}});
        deep_merge(&mut base, &json!({"bfd": false}));
        assert_eq!(base, json!({"bfd": false}));
    }

    /// Counts `fetch` calls so tests can check ancestors are loaded once.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        fetches: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl RecordStore for CountingStore {
        async fn fetch(&self, kind: RecordKind, id: &Id) -> anyhow::Result<Option<Value>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(kind, id).await
        }

        async fn fetch_all(&self, kind: RecordKind) -> anyhow::Result<Vec<Value>> {
            self.inner.fetch_all(kind).await
        }

        async fn commit(&self, ops: Vec<WriteOp>) -> anyhow::Result<()> {
            self.inner.commit(ops).await
        }

        fn write_gate(&self) -> &WriteGate {
            self.inner.write_gate()
        }
    }

    async fn chain(store: &CountingStore) -> (PeerGroup, PeerEndpoint) {
        let mut instance = RoutingInstance::new(generate_id());
        instance.extra_attributes = Some(json!({"ttl": 1, "bfd": {"multiplier": 3}}));
        let mut template = PeerGroupTemplate::new("transit");
        template.extra_attributes = Some(json!({"bfd": {"interval": 300}}));
        let mut group = PeerGroup::new("upstreams", instance.id);
        group.template = Some(template.id);
        group.extra_attributes = Some(json!({"ttl": 2}));
        let peering = Peering::new("active");
        let mut endpoint = PeerEndpoint::new(peering.id);
        endpoint.routing_instance = Some(instance.id);
        endpoint.peer_group = Some(group.id);
        endpoint.extra_attributes = Some(json!({"bfd": {"interval": 50}}));

        store.inner.save(&instance).await.unwrap();
        store.inner.save(&template).await.unwrap();
        store.inner.save(&group).await.unwrap();
        store.inner.save(&peering).await.unwrap();
        store.inner.save(&endpoint).await.unwrap();
        (group, endpoint)
    }

    #[tokio::test]
    async fn test_peer_group_extra_attributes_merge_instance_then_template_then_self() {
        let store = CountingStore::default();
        let (group, _) = chain(&store).await;
        let mut lineage = Lineage::new(&store);

        let resolved = resolve_extra_attributes(&mut lineage, &group).await.unwrap();

        assert_eq!(resolved, json!({"ttl": 2, "bfd": {"multiplier": 3, "interval": 300}}));
        assert_eq!(own_extra_attributes(&group), json!({"ttl": 2}));
    }

    #[tokio::test]
    async fn test_endpoint_extra_attributes_apply_own_values_last() {
        let store = CountingStore::default();
        let (_, endpoint) = chain(&store).await;
        let mut lineage = Lineage::new(&store);

        let resolved = resolve_extra_attributes(&mut lineage, &endpoint).await.unwrap();

        assert_eq!(resolved, json!({"ttl": 2, "bfd": {"multiplier": 3, "interval": 50}}));
    }

    #[tokio::test]
    async fn test_shared_lineage_fetches_each_ancestor_once() {
        let store = CountingStore::default();
        let (_, endpoint) = chain(&store).await;
        let mut lineage = Lineage::new(&store);

        with_inherited(&mut lineage, &endpoint).await.unwrap();
        resolve_extra_attributes(&mut lineage, &endpoint).await.unwrap();

        // routing instance, peer group, template
        assert_eq!(store.fetches.load(Ordering::SeqCst), 3);
    }
}
