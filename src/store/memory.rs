use anyhow::Result;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::model::{CoreKind, CoreObject, Id, RecordKind};
use crate::store::traits::{CoreStore, RecordStore, WriteGate, WriteOp};

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    data: Value,
}

#[derive(Debug, Default)]
struct Tables {
    records: HashMap<RecordKind, BTreeMap<Id, Entry>>,
    next_seq: u64,
}

/// In-process store. A batch is applied under one write lock, which makes
/// `commit` atomic with respect to every other caller.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    core: RwLock<HashMap<(CoreKind, Id), CoreObject>>,
    gate: WriteGate,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn fetch(&self, kind: RecordKind, id: &Id) -> Result<Option<Value>> {
        let tables = self.tables.read();
        Ok(tables
            .records
            .get(&kind)
            .and_then(|table| table.get(id))
            .map(|entry| entry.data.clone()))
    }

    async fn fetch_all(&self, kind: RecordKind) -> Result<Vec<Value>> {
        let tables = self.tables.read();
        let Some(table) = tables.records.get(&kind) else {
            return Ok(Vec::new());
        };
        let mut entries: Vec<&Entry> = table.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        Ok(entries.into_iter().map(|entry| entry.data.clone()).collect())
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<()> {
        let mut tables = self.tables.write();
        for op in ops {
            match op {
                WriteOp::Put { kind, id, data } => {
                    let seq = tables.next_seq;
                    let table = tables.records.entry(kind).or_default();
                    match table.get_mut(&id) {
                        Some(entry) => entry.data = data,
                        None => {
                            table.insert(id, Entry { seq, data });
                            tables.next_seq += 1;
                        }
                    }
                }
                WriteOp::Delete { kind, id } => {
                    if let Some(table) = tables.records.get_mut(&kind) {
                        table.remove(&id);
                    }
                }
            }
        }
        Ok(())
    }

    fn write_gate(&self) -> &WriteGate {
        &self.gate
    }
}

#[async_trait::async_trait]
impl CoreStore for MemoryStore {
    async fn get_core_object(&self, kind: CoreKind, id: &Id) -> Result<Option<CoreObject>> {
        Ok(self.core.read().get(&(kind, *id)).cloned())
    }

    async fn find_status(&self, slug: &str) -> Result<Option<CoreObject>> {
        Ok(self
            .core
            .read()
            .values()
            .find(|object| object.kind == CoreKind::Status && object.slug.as_deref() == Some(slug))
            .cloned())
    }

    async fn upsert_core_object(&self, object: CoreObject) -> Result<()> {
        self.core.write().insert((object.kind, object.id), object);
        Ok(())
    }
}
