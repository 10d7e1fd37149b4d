use itertools::Itertools;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::logic::peering_sync::{remove_endpoint, EndpointBatch};
use crate::model::{Id, PeerEndpoint, PeerGroup, Record, RecordKind};
use crate::store::{decode, RecordStore, RecordStoreExt, WriteOp};

/// Records that block deletion of a kind while they point at it.
fn protected_by(kind: RecordKind) -> &'static [(RecordKind, &'static str)] {
    match kind {
        RecordKind::AutonomousSystem => &[
            (RecordKind::PeerGroupTemplate, "autonomous_system"),
            (RecordKind::PeerGroup, "autonomous_system"),
            (RecordKind::PeerEndpoint, "autonomous_system"),
            (RecordKind::RoutingInstance, "autonomous_system"),
        ],
        RecordKind::PeeringRole => &[
            (RecordKind::PeerGroupTemplate, "role"),
            (RecordKind::PeerGroup, "role"),
        ],
        _ => &[],
    }
}

fn points_at(data: &Value, attribute: &str, id: Id) -> bool {
    data.get(attribute)
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<Id>().ok())
        == Some(id)
}

async fn referrers<S>(store: &S, kind: RecordKind, attribute: &str, id: Id) -> anyhow::Result<Vec<Value>>
where
    S: RecordStore + ?Sized,
{
    Ok(store
        .fetch_all(kind)
        .await?
        .into_iter()
        .filter(|data| points_at(data, attribute, id))
        .collect())
}

async fn refuse_if_referenced<S>(store: &S, kind: RecordKind, id: Id) -> Result<()>
where
    S: RecordStore + ?Sized,
{
    let mut blockers = Vec::new();
    for (referrer, attribute) in protected_by(kind) {
        let count = referrers(store, *referrer, attribute, id).await?.len();
        if count > 0 {
            blockers.push((*referrer, count));
        }
    }

    if blockers.is_empty() {
        return Ok(());
    }
    Err(Error::Conflict(format!(
        "Cannot delete {} {}: it is referenced by {}",
        kind.label(),
        id,
        blockers
            .iter()
            .map(|(referrer, count)| format!("{} {}(s)", count, referrer.label()))
            .join(", ")
    )))
}

/// Typed records of `kind` whose `attribute` points at `id`.
async fn children<R, S>(store: &S, attribute: &str, id: Id) -> anyhow::Result<Vec<R>>
where
    R: Record,
    S: RecordStore + ?Sized,
{
    referrers(store, R::KIND, attribute, id)
        .await?
        .into_iter()
        .map(decode::<R>)
        .collect()
}

/// Delete a record together with everything its removal implies, as one
/// batch.
///
/// Peerings and routing instances take their dependents with them, peer
/// groups and templates are unlinked from their members, and autonomous
/// systems and roles are refused while anything still uses them.
pub async fn delete_record<S>(store: &S, kind: RecordKind, id: Id) -> Result<()>
where
    S: RecordStore + ?Sized,
{
    // Most branches rewrite endpoints or their peers.
    let _gate = store.write_gate().enter().await;
    if store.fetch(kind, &id).await?.is_none() {
        return Err(Error::not_found(kind, id));
    }

    let mut ops = Vec::new();
    match kind {
        RecordKind::AutonomousSystem | RecordKind::PeeringRole => {
            refuse_if_referenced(store, kind, id).await?;
            ops.push(WriteOp::delete(kind, id));
        }
        RecordKind::PeerGroupTemplate => {
            for mut group in children::<PeerGroup, _>(store, "template", id).await? {
                group.template = None;
                group.touch();
                ops.push(WriteOp::put(&group)?);
            }
            ops.push(WriteOp::delete(kind, id));
        }
        RecordKind::PeerGroup => {
            for mut endpoint in children::<PeerEndpoint, _>(store, "peer_group", id).await? {
                endpoint.peer_group = None;
                endpoint.touch();
                ops.push(WriteOp::put(&endpoint)?);
            }
            ops.push(WriteOp::delete(kind, id));
        }
        RecordKind::PeerEndpoint => {
            let endpoint: PeerEndpoint = store
                .get(&id)
                .await?
                .ok_or_else(|| Error::not_found(kind, id))?;
            let mut batch = EndpointBatch::new();
            remove_endpoint(store, &mut batch, &endpoint).await?;
            ops.extend(batch.into_ops()?);
        }
        RecordKind::Peering => {
            for endpoint in children::<PeerEndpoint, _>(store, "peering", id).await? {
                ops.push(WriteOp::delete(RecordKind::PeerEndpoint, endpoint.id));
            }
            ops.push(WriteOp::delete(kind, id));
        }
        RecordKind::RoutingInstance => {
            ops.extend(routing_instance_cascade(store, id).await?);
            ops.push(WriteOp::delete(kind, id));
        }
        RecordKind::AddressFamily => ops.push(WriteOp::delete(kind, id)),
    }

    log::info!("Deleting {} {} ({} write(s))", kind, id, ops.len());
    store.commit(ops).await?;
    Ok(())
}

async fn routing_instance_cascade<S>(store: &S, id: Id) -> Result<Vec<WriteOp>>
where
    S: RecordStore + ?Sized,
{
    let mut ops = Vec::new();

    let groups: Vec<PeerGroup> = children(store, "routing_instance", id).await?;
    let group_ids: Vec<Id> = groups.iter().map(|g| g.id).collect();
    for group in &groups {
        ops.push(WriteOp::delete(RecordKind::PeerGroup, group.id));
    }

    let mut batch = EndpointBatch::new();
    let endpoints: Vec<PeerEndpoint> = store.list().await?;
    let (doomed, survivors): (Vec<_>, Vec<_>) = endpoints
        .into_iter()
        .partition(|e| e.routing_instance == Some(id));

    // Endpoints elsewhere may still sit in one of the removed groups.
    for mut endpoint in survivors {
        if endpoint.peer_group.is_some_and(|g| group_ids.contains(&g)) {
            endpoint.peer_group = None;
            endpoint.touch();
            batch.write(endpoint);
        }
    }
    for endpoint in &doomed {
        batch.delete(endpoint.id);
    }
    for endpoint in &doomed {
        batch.synchronize(store, endpoint.peering).await?;
    }
    ops.extend(batch.into_ops()?);

    for family in referrers(store, RecordKind::AddressFamily, "routing_instance", id).await? {
        if let Some(family_id) = family.get("id").and_then(Value::as_str).and_then(|raw| raw.parse().ok()) {
            ops.push(WriteOp::delete(RecordKind::AddressFamily, family_id));
        }
    }

    Ok(ops)
}
