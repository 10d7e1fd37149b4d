use serde_json::Value;
use std::collections::HashMap;

use crate::error::ResolutionError;
use crate::model::{Hop, Id, RecordKind};
use crate::store::RecordStore;

/// Per-request cache of ancestor records.
///
/// Inheritance resolution and extra-attribute merging walk overlapping
/// paths (`peer_group`, `peer_group.template`, ...); sharing one lineage
/// means each ancestor is fetched from the store at most once per request.
pub struct Lineage<'a, S: ?Sized> {
    store: &'a S,
    cache: HashMap<(RecordKind, Id), Option<Value>>,
}

impl<'a, S: RecordStore + ?Sized> Lineage<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    pub async fn load(&mut self, kind: RecordKind, id: Id) -> anyhow::Result<Option<Value>> {
        if let Some(cached) = self.cache.get(&(kind, id)) {
            return Ok(cached.clone());
        }
        let fetched = self.store.fetch(kind, &id).await?;
        self.cache.insert((kind, id), fetched.clone());
        Ok(fetched)
    }

    /// Walk `path` starting at `origin` (a record of kind `origin_kind`).
    ///
    /// Returns `None` as soon as a relation along the path is unset. A
    /// relation that is set but points at a missing record is a broken chain.
    pub async fn follow(
        &mut self,
        origin_kind: RecordKind,
        origin: &Value,
        path: &[Hop],
    ) -> Result<Option<Value>, ResolutionError> {
        let mut current_kind = origin_kind;
        let mut current = origin.clone();

        for hop in path {
            let link = current.get(hop.attribute).cloned().unwrap_or(Value::Null);
            if link.is_null() {
                return Ok(None);
            }
            let id: Id = serde_json::from_value(link).map_err(|source| ResolutionError::Malformed {
                kind: current_kind,
                attribute: hop.attribute,
                source,
            })?;

            current = self
                .load(hop.target, id)
                .await?
                .ok_or(ResolutionError::BrokenChain {
                    attribute: hop.attribute,
                    kind: hop.target,
                    id,
                })?;
            current_kind = hop.target;
        }

        Ok(Some(current))
    }
}
