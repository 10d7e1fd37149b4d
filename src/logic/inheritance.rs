use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ResolutionError;
use crate::logic::Lineage;
use crate::model::{is_unset, Record};
use crate::store::RecordStore;

/// Value of one inheritable field and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InheritedField {
    pub value: Value,
    pub inherited: bool,
}

fn encode<R: Record>(record: &R) -> Result<Value, ResolutionError> {
    serde_json::to_value(record).map_err(|source| ResolutionError::Malformed {
        kind: R::KIND,
        attribute: "*",
        source,
    })
}

/// Every inheritable field of `record`.
///
/// The record's own value wins when set. Otherwise, and only when
/// `include_inherited` is true, the first ancestor along the rule's chain
/// that has the field set supplies it.
pub async fn resolve_fields<R, S>(
    lineage: &mut Lineage<'_, S>,
    record: &R,
    include_inherited: bool,
) -> Result<BTreeMap<&'static str, InheritedField>, ResolutionError>
where
    R: Record,
    S: RecordStore + ?Sized,
{
    let origin = encode(record)?;
    let mut fields = BTreeMap::new();

    for rule in R::INHERITANCE {
        let own = origin.get(rule.field).cloned().unwrap_or(Value::Null);
        let mut resolved = InheritedField {
            value: own,
            inherited: false,
        };

        if include_inherited && is_unset(&resolved.value) {
            for path in rule.chain {
                let Some(ancestor) = lineage.follow(R::KIND, &origin, path).await? else {
                    continue;
                };
                let value = ancestor.get(rule.field).cloned().unwrap_or(Value::Null);
                if !is_unset(&value) {
                    resolved = InheritedField {
                        value,
                        inherited: true,
                    };
                    break;
                }
            }
        }

        fields.insert(rule.field, resolved);
    }

    Ok(fields)
}

/// A copy of `record` with inherited values written into it.
///
/// Only the returned value changes; nothing is written back to the store.
pub async fn with_inherited<R, S>(lineage: &mut Lineage<'_, S>, record: &R) -> Result<R, ResolutionError>
where
    R: Record,
    S: RecordStore + ?Sized,
{
    if R::INHERITANCE.is_empty() {
        return Ok(record.clone());
    }

    let fields = resolve_fields(lineage, record, true).await?;
    let mut data = encode(record)?;
    if let Value::Object(map) = &mut data {
        for (field, resolved) in fields {
            if resolved.inherited {
                log::debug!("{} {}: `{}` inherited", R::KIND, record.id(), field);
                map.insert(field.to_string(), resolved.value);
            }
        }
    }

    serde_json::from_value(data).map_err(|source| ResolutionError::Malformed {
        kind: R::KIND,
        attribute: "*",
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{generate_id, PeerEndpoint, PeerGroup, PeerGroupTemplate, Peering, RoutingInstance};
    use crate::store::{MemoryStore, RecordStoreExt};

    struct Fixture {
        store: MemoryStore,
        instance: RoutingInstance,
        template: PeerGroupTemplate,
        group: PeerGroup,
        endpoint: PeerEndpoint,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let mut instance = RoutingInstance::new(generate_id());
        instance.autonomous_system = Some(generate_id());

        let mut template = PeerGroupTemplate::new("transit");
        template.import_policy = "TRANSIT-IN".to_string();
        template.secret = Some(generate_id());

        let mut group = PeerGroup::new("upstreams", instance.id);
        group.template = Some(template.id);
        group.source_ip = Some(generate_id());

        let peering = Peering::new("active");
        let mut endpoint = PeerEndpoint::new(peering.id);
        endpoint.peer_group = Some(group.id);
        endpoint.routing_instance = Some(instance.id);

        store.save(&instance).await.unwrap();
        store.save(&template).await.unwrap();
        store.save(&group).await.unwrap();
        store.save(&peering).await.unwrap();
        store.save(&endpoint).await.unwrap();

        Fixture {
            store,
            instance,
            template,
            group,
            endpoint,
        }
    }

    #[tokio::test]
    async fn test_source_ip_inherited_from_peer_group() {
        let f = fixture().await;
        let mut lineage = Lineage::new(&f.store);

        let plain = resolve_fields(&mut lineage, &f.endpoint, false).await.unwrap();
        assert_eq!(plain["source_ip"].value, Value::Null);
        assert!(!plain["source_ip"].inherited);

        let resolved = with_inherited(&mut lineage, &f.endpoint).await.unwrap();
        assert_eq!(resolved.source_ip, f.group.source_ip);
    }

    #[tokio::test]
    async fn test_endpoint_walks_group_then_template_then_instance() {
        let f = fixture().await;
        let mut lineage = Lineage::new(&f.store);

        let resolved = with_inherited(&mut lineage, &f.endpoint).await.unwrap();

        assert_eq!(resolved.import_policy, "TRANSIT-IN");
        assert_eq!(resolved.secret, f.template.secret);
        assert_eq!(resolved.autonomous_system, f.instance.autonomous_system);
    }

    #[tokio::test]
    async fn test_own_value_wins_over_ancestors() {
        let f = fixture().await;
        let mut endpoint = f.endpoint.clone();
        endpoint.import_policy = "LOCAL-IN".to_string();
        let mut lineage = Lineage::new(&f.store);

        let fields = resolve_fields(&mut lineage, &endpoint, true).await.unwrap();

        assert_eq!(fields["import_policy"].value, Value::String("LOCAL-IN".to_string()));
        assert!(!fields["import_policy"].inherited);
    }

    #[tokio::test]
    async fn test_resolution_does_not_touch_the_store() {
        let f = fixture().await;
        let mut lineage = Lineage::new(&f.store);

        with_inherited(&mut lineage, &f.endpoint).await.unwrap();

        let stored: PeerEndpoint = f.store.get(&f.endpoint.id).await.unwrap().unwrap();
        assert_eq!(stored, f.endpoint);
    }

    #[tokio::test]
    async fn test_missing_ancestor_is_a_broken_chain() {
        let f = fixture().await;
        let mut orphan = f.endpoint.clone();
        orphan.peer_group = Some(generate_id());
        let mut lineage = Lineage::new(&f.store);

        let err = with_inherited(&mut lineage, &orphan).await.unwrap_err();

        assert!(matches!(err, ResolutionError::BrokenChain { attribute: "peer_group", .. }));
    }

    #[tokio::test]
    async fn test_peer_group_inherits_from_template() {
        let f = fixture().await;
        let mut lineage = Lineage::new(&f.store);

        let resolved = with_inherited(&mut lineage, &f.group).await.unwrap();

        assert_eq!(resolved.import_policy, "TRANSIT-IN");
        assert_eq!(resolved.secret, f.template.secret);
        assert_eq!(resolved.source_ip, f.group.source_ip);
    }
}
