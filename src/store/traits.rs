use anyhow::{Context, Result};
use serde_json::Value;

use crate::model::{CoreKind, CoreObject, Id, Record, RecordKind};

/// A single write inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Put { kind: RecordKind, id: Id, data: Value },
    Delete { kind: RecordKind, id: Id },
}

impl WriteOp {
    pub fn put<R: Record>(record: &R) -> Result<Self> {
        let data = serde_json::to_value(record)
            .with_context(|| format!("Failed to encode {} {}", R::KIND, record.id()))?;
        Ok(WriteOp::Put {
            kind: R::KIND,
            id: record.id(),
            data,
        })
    }

    pub fn delete(kind: RecordKind, id: Id) -> Self {
        WriteOp::Delete { kind, id }
    }

    pub fn target(&self) -> (RecordKind, Id) {
        match self {
            WriteOp::Put { kind, id, .. } | WriteOp::Delete { kind, id } => (*kind, *id),
        }
    }
}

/// Serializes read-validate-commit sequences that span several records.
///
/// `commit` only makes the write atomic. Writers whose decisions depend on
/// other records (peering membership, `peer` back references) hold the gate
/// from their first read until their batch is committed.
#[derive(Debug, Default)]
pub struct WriteGate(tokio::sync::Mutex<()>);

impl WriteGate {
    pub async fn enter(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

/// Storage for BGP records, kept in their serde JSON form.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch(&self, kind: RecordKind, id: &Id) -> Result<Option<Value>>;
    /// All records of a kind, oldest first.
    async fn fetch_all(&self, kind: RecordKind) -> Result<Vec<Value>>;
    /// Apply every operation or none of them.
    async fn commit(&self, ops: Vec<WriteOp>) -> Result<()>;
    /// Gate shared by every caller of this store.
    fn write_gate(&self) -> &WriteGate;
}

/// Read access to the host application's objects.
#[async_trait::async_trait]
pub trait CoreStore: Send + Sync {
    async fn get_core_object(&self, kind: CoreKind, id: &Id) -> Result<Option<CoreObject>>;
    async fn find_status(&self, slug: &str) -> Result<Option<CoreObject>>;
    async fn upsert_core_object(&self, object: CoreObject) -> Result<()>;
}

pub trait Store: RecordStore + CoreStore + Send + Sync {}
impl<T: RecordStore + CoreStore> Store for T {}

/// Typed access on top of [`RecordStore`].
#[async_trait::async_trait]
pub trait RecordStoreExt: RecordStore {
    async fn get<R: Record>(&self, id: &Id) -> Result<Option<R>> {
        match self.fetch(R::KIND, id).await? {
            Some(data) => Ok(Some(decode::<R>(data)?)),
            None => Ok(None),
        }
    }

    async fn list<R: Record>(&self) -> Result<Vec<R>> {
        self.fetch_all(R::KIND)
            .await?
            .into_iter()
            .map(decode::<R>)
            .collect()
    }

    async fn save<R: Record>(&self, record: &R) -> Result<()> {
        self.commit(vec![WriteOp::put(record)?]).await
    }
}

impl<T: RecordStore + ?Sized> RecordStoreExt for T {}

pub fn decode<R: Record>(data: Value) -> Result<R> {
    serde_json::from_value(data).with_context(|| format!("Stored {} is malformed", R::KIND))
}
