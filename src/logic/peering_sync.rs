use std::collections::{BTreeMap, BTreeSet};

use crate::error::{FieldErrors, Result};
use crate::model::{Id, PeerEndpoint, Peering, RecordKind};
use crate::store::{RecordStore, RecordStoreExt, WriteOp};

/// Endpoint writes and deletes not yet committed, layered over the store.
///
/// Synchronization always looks at the post-change view: stored endpoints,
/// overridden by pending writes, minus pending deletes.
#[derive(Debug, Default)]
pub struct EndpointBatch {
    written: BTreeMap<Id, PeerEndpoint>,
    deleted: BTreeSet<Id>,
    synchronized: Vec<Id>,
}

impl EndpointBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, endpoint: PeerEndpoint) {
        self.deleted.remove(&endpoint.id);
        self.written.insert(endpoint.id, endpoint);
    }

    pub fn delete(&mut self, id: Id) {
        self.written.remove(&id);
        self.deleted.insert(id);
    }

    pub fn get(&self, id: &Id) -> Option<&PeerEndpoint> {
        self.written.get(id)
    }

    /// Peerings synchronized so far, in the order they were processed.
    pub fn synchronized(&self) -> &[Id] {
        &self.synchronized
    }

    /// Every endpoint attached to `peering` once this batch is applied.
    pub async fn members<S>(&self, store: &S, peering: Id) -> anyhow::Result<Vec<PeerEndpoint>>
    where
        S: RecordStore + ?Sized,
    {
        let stored: Vec<PeerEndpoint> = store.list().await?;
        let mut members: Vec<PeerEndpoint> = stored
            .into_iter()
            .filter(|e| !self.deleted.contains(&e.id) && !self.written.contains_key(&e.id))
            .filter(|e| e.peering == peering)
            .collect();
        members.extend(self.written.values().filter(|e| e.peering == peering).cloned());
        members.sort_by_key(|e| e.timestamps.created);
        Ok(members)
    }

    /// Recompute `peer` for every endpoint of `peering` and queue the changes.
    pub async fn synchronize<S>(&mut self, store: &S, peering: Id) -> anyhow::Result<()>
    where
        S: RecordStore + ?Sized,
    {
        if self.synchronized.contains(&peering) {
            return Ok(());
        }

        let mut members = self.members(store, peering).await?;
        let changed = Peering::update_peers(&mut members);
        log::debug!(
            "peering {}: {} endpoint(s), {} peer reference(s) updated",
            peering,
            members.len(),
            changed.len()
        );

        for endpoint in members {
            if changed.contains(&endpoint.id) {
                self.written.insert(endpoint.id, endpoint);
            }
        }
        self.synchronized.push(peering);
        Ok(())
    }

    pub fn into_ops(self) -> anyhow::Result<Vec<WriteOp>> {
        let mut ops = Vec::with_capacity(self.written.len() + self.deleted.len());
        for endpoint in self.written.values() {
            ops.push(WriteOp::put(endpoint)?);
        }
        for id in self.deleted {
            ops.push(WriteOp::delete(RecordKind::PeerEndpoint, id));
        }
        Ok(ops)
    }
}

/// Result of an endpoint write.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// The endpoint as committed, including any `peer` set by the sync.
    pub endpoint: PeerEndpoint,
    /// Peerings whose endpoints were re-synchronized.
    pub synchronized: Vec<Id>,
}

async fn commit_endpoint<S>(store: &S, batch: EndpointBatch, id: Id) -> Result<SyncOutcome>
where
    S: RecordStore + ?Sized,
{
    let endpoint = batch
        .get(&id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("peer endpoint {} missing from its own batch", id))?;
    let synchronized = batch.synchronized().to_vec();
    store.commit(batch.into_ops()?).await?;
    Ok(SyncOutcome {
        endpoint,
        synchronized,
    })
}

/// Write a new endpoint and pair it within its peering.
pub async fn create_endpoint<S>(store: &S, endpoint: PeerEndpoint) -> Result<SyncOutcome>
where
    S: RecordStore + ?Sized,
{
    let id = endpoint.id;
    let peering = endpoint.peering;
    let mut batch = EndpointBatch::new();
    batch.write(endpoint);
    batch.synchronize(store, peering).await?;

    log::info!("Created peer endpoint {} on peering {}", id, peering);
    commit_endpoint(store, batch, id).await
}

/// Write an updated endpoint. Peers are only recomputed when the endpoint
/// moved to another peering; then both the old and the new one are synced.
pub async fn update_endpoint<S>(store: &S, previous: &PeerEndpoint, mut updated: PeerEndpoint) -> Result<SyncOutcome>
where
    S: RecordStore + ?Sized,
{
    let id = updated.id;
    let target = updated.peering;
    if previous.peering == target {
        // `peer` is owned by the sync; a cleared value is not applied.
        updated.peer = previous.peer;
    }
    let mut batch = EndpointBatch::new();
    batch.write(updated);

    if previous.peering != target {
        log::info!(
            "Peer endpoint {} moved from peering {} to {}",
            id,
            previous.peering,
            target
        );
        batch.synchronize(store, target).await?;
        batch.synchronize(store, previous.peering).await?;
    } else {
        log::debug!("peer endpoint {}: peering unchanged, skipping sync", id);
    }

    commit_endpoint(store, batch, id).await
}

/// Queue the removal of an endpoint and the re-sync of the peering it leaves.
pub async fn remove_endpoint<S>(store: &S, batch: &mut EndpointBatch, endpoint: &PeerEndpoint) -> anyhow::Result<()>
where
    S: RecordStore + ?Sized,
{
    batch.delete(endpoint.id);
    batch.synchronize(store, endpoint.peering).await
}

/// Checks an endpoint against the peering it is about to be attached to.
///
/// Runs before anything is queued, so a rejected write leaves every `peer`
/// untouched.
pub async fn validate_attachment<S>(
    store: &S,
    endpoint: &PeerEndpoint,
    previous: Option<&PeerEndpoint>,
) -> Result<FieldErrors>
where
    S: RecordStore + ?Sized,
{
    let mut errors = FieldErrors::new();
    let stored: Vec<PeerEndpoint> = store.list().await?;
    let others: Vec<&PeerEndpoint> = stored
        .iter()
        .filter(|e| e.peering == endpoint.peering && e.id != endpoint.id)
        .collect();

    if others.len() >= Peering::MAX_ENDPOINTS {
        errors.add(
            "peering",
            format!("Peering already has {} endpoints.", Peering::MAX_ENDPOINTS),
        );
    }

    // A supplied `null` is accepted and left to the sync.
    let peer_supplied = match previous {
        Some(previous) => endpoint.peer.is_some() && previous.peer != endpoint.peer,
        None => endpoint.peer.is_some(),
    };
    if peer_supplied {
        let expected = match others.as_slice() {
            [other] => Some(other.id),
            _ => None,
        };
        if endpoint.peer != expected {
            errors.add("peer", "Must be the other endpoint of the same peering.");
        }
    }

    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn peering(store: &MemoryStore) -> Peering {
        let peering = Peering::new("active");
        store.save(&peering).await.unwrap();
        peering
    }

    async fn attach(store: &MemoryStore, peering: &Peering) -> PeerEndpoint {
        create_endpoint(store, PeerEndpoint::new(peering.id))
            .await
            .unwrap()
            .endpoint
    }

    async fn load(store: &MemoryStore, id: Id) -> PeerEndpoint {
        store.get(&id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_second_endpoint_pairs_both_sides() {
        let store = MemoryStore::new();
        let p = peering(&store).await;

        let a = attach(&store, &p).await;
        let b = attach(&store, &p).await;

        assert_eq!(b.peer, Some(a.id));
        assert_eq!(load(&store, a.id).await.peer, Some(b.id));
    }

    #[tokio::test]
    async fn test_single_endpoint_is_unpaired() {
        let store = MemoryStore::new();
        let p = peering(&store).await;

        let a = attach(&store, &p).await;

        assert_eq!(a.peer, None);
        assert_eq!(load(&store, a.id).await.peer, None);
    }

    #[tokio::test]
    async fn test_moving_endpoint_repairs_both_peerings() {
        let store = MemoryStore::new();
        let p1 = peering(&store).await;
        let p2 = peering(&store).await;
        let a = attach(&store, &p1).await;
        let b = attach(&store, &p1).await;
        let c = attach(&store, &p2).await;

        let previous = load(&store, a.id).await;
        let mut moved = previous.clone();
        moved.peering = p2.id;
        let outcome = update_endpoint(&store, &previous, moved).await.unwrap();

        assert_eq!(outcome.endpoint.peer, Some(c.id));
        assert_eq!(outcome.synchronized, vec![p2.id, p1.id]);
        assert_eq!(load(&store, c.id).await.peer, Some(a.id));
        assert_eq!(load(&store, b.id).await.peer, None);
    }

    #[tokio::test]
    async fn test_update_without_move_skips_sync() {
        let store = MemoryStore::new();
        let p = peering(&store).await;
        let a = attach(&store, &p).await;
        attach(&store, &p).await;

        let previous = load(&store, a.id).await;
        let mut updated = previous.clone();
        updated.import_policy = "IMPORT".to_string();
        let outcome = update_endpoint(&store, &previous, updated).await.unwrap();

        assert!(outcome.synchronized.is_empty());
        assert_eq!(load(&store, a.id).await.import_policy, "IMPORT");
    }

    #[tokio::test]
    async fn test_removing_endpoint_clears_counterpart() {
        let store = MemoryStore::new();
        let p = peering(&store).await;
        let a = attach(&store, &p).await;
        let b = attach(&store, &p).await;

        let mut batch = EndpointBatch::new();
        remove_endpoint(&store, &mut batch, &load(&store, a.id).await)
            .await
            .unwrap();
        store.commit(batch.into_ops().unwrap()).await.unwrap();

        assert!(store.get::<PeerEndpoint>(&a.id).await.unwrap().is_none());
        assert_eq!(load(&store, b.id).await.peer, None);
    }

    #[tokio::test]
    async fn test_third_endpoint_is_rejected() {
        let store = MemoryStore::new();
        let p = peering(&store).await;
        attach(&store, &p).await;
        attach(&store, &p).await;

        let errors = validate_attachment(&store, &PeerEndpoint::new(p.id), None)
            .await
            .unwrap();

        assert!(errors.contains("peering"));
    }

    #[tokio::test]
    async fn test_supplied_peer_must_be_counterpart() {
        let store = MemoryStore::new();
        let p = peering(&store).await;
        let other = peering(&store).await;
        let a = attach(&store, &p).await;
        let stranger = attach(&store, &other).await;

        let mut candidate = PeerEndpoint::new(p.id);
        candidate.peer = Some(stranger.id);
        let errors = validate_attachment(&store, &candidate, None).await.unwrap();
        assert!(errors.contains("peer"));

        candidate.peer = Some(a.id);
        let errors = validate_attachment(&store, &candidate, None).await.unwrap();
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_cleared_peer_is_accepted_and_restored() {
        let store = MemoryStore::new();
        let p = peering(&store).await;
        let a = attach(&store, &p).await;
        let b = attach(&store, &p).await;
        let previous = load(&store, a.id).await;

        let mut cleared = previous.clone();
        cleared.peer = None;
        let errors = validate_attachment(&store, &cleared, Some(&previous)).await.unwrap();
        assert!(errors.is_empty());

        let outcome = update_endpoint(&store, &previous, cleared).await.unwrap();
        assert_eq!(outcome.endpoint.peer, Some(b.id));
        assert_eq!(load(&store, a.id).await.peer, Some(b.id));
        assert_eq!(load(&store, b.id).await.peer, Some(a.id));
    }

    #[tokio::test]
    async fn test_updated_peer_must_be_counterpart() {
        let store = MemoryStore::new();
        let p = peering(&store).await;
        let other = peering(&store).await;
        let a = attach(&store, &p).await;
        attach(&store, &p).await;
        let stranger = attach(&store, &other).await;
        let previous = load(&store, a.id).await;

        let mut changed = previous.clone();
        changed.peer = Some(stranger.id);
        let errors = validate_attachment(&store, &changed, Some(&previous)).await.unwrap();

        assert!(errors.contains("peer"));
    }
}
