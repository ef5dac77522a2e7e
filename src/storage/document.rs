//! In-memory documents, elements and transactions

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

use super::{Element, MemoryHost, RawEntity, SchemaRegistry, StorageError, Transaction};
use crate::models::{ElementId, Schema};

#[derive(Debug, Clone, Default)]
struct ElementRecord {
    name: String,
    entities: BTreeMap<Uuid, RawEntity>,
}

#[derive(Debug, Default)]
struct DocumentState {
    next_id: i64,
    elements: BTreeMap<ElementId, ElementRecord>,
    open_transaction: Option<OpenTransaction>,
    log: Vec<String>,
}

#[derive(Debug)]
struct OpenTransaction {
    id: u64,
    name: String,
}

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<DocumentState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, DocumentState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A document holding elements, backed by a [`MemoryHost`]
///
/// Entity writes need an open transaction; one transaction may be open at a
/// time.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use extensible_storage::storage::{Element, MemoryDocument, MemoryHost};
///
/// let document = MemoryDocument::new(Arc::new(MemoryHost::new()));
/// let wall = document.create_element("Wall 1");
/// assert!(wall.schema_guids().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    host: Arc<MemoryHost>,
    state: SharedState,
}

impl MemoryDocument {
    pub fn new(host: Arc<MemoryHost>) -> Self {
        Self {
            host,
            state: Arc::new(Mutex::new(DocumentState::default())),
        }
    }

    pub fn host(&self) -> &Arc<MemoryHost> {
        &self.host
    }

    pub fn create_element(&self, name: impl Into<String>) -> MemoryElement {
        let mut state = lock(&self.state);
        let id = ElementId::new(state.next_id);
        state.next_id += 1;
        state.elements.insert(
            id,
            ElementRecord {
                name: name.into(),
                entities: BTreeMap::new(),
            },
        );
        self.handle(id)
    }

    pub fn element(&self, id: ElementId) -> Option<MemoryElement> {
        lock(&self.state)
            .elements
            .contains_key(&id)
            .then(|| self.handle(id))
    }

    /// Names of committed transactions, oldest first
    pub fn transaction_log(&self) -> Vec<String> {
        lock(&self.state).log.clone()
    }

    fn handle(&self, id: ElementId) -> MemoryElement {
        MemoryElement {
            id,
            host: self.host.clone(),
            state: self.state.clone(),
        }
    }
}

/// An element of a [`MemoryDocument`]
#[derive(Debug, Clone)]
pub struct MemoryElement {
    id: ElementId,
    host: Arc<MemoryHost>,
    state: SharedState,
}

impl MemoryElement {
    fn registered_schema(&self, guid: Uuid) -> Result<Arc<Schema>, StorageError> {
        self.host
            .lookup(guid)
            .ok_or(StorageError::SchemaNotFound(guid))
    }

    fn check_write(&self, schema: &Schema) -> Result<(), StorageError> {
        if self.host.write_access_granted(schema) {
            Ok(())
        } else {
            Err(StorageError::AccessDenied(format!(
                "write access to {} not granted",
                schema.name()
            )))
        }
    }

    fn with_record<T>(
        &self,
        transaction: &dyn Transaction,
        f: impl FnOnce(&mut ElementRecord) -> T,
    ) -> Result<T, StorageError> {
        let mut state = lock(&self.state);
        let open = state.open_transaction.as_ref().map(|open| open.id);
        if open != Some(transaction.id()) {
            return Err(StorageError::NoOpenTransaction(transaction.name().to_string()));
        }
        let record = state
            .elements
            .get_mut(&self.id)
            .ok_or(StorageError::ElementNotFound(self.id))?;
        Ok(f(record))
    }
}

impl Element for MemoryElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn name(&self) -> String {
        lock(&self.state)
            .elements
            .get(&self.id)
            .map(|record| record.name.clone())
            .unwrap_or_default()
    }

    fn get_entity(&self, schema: &Schema) -> Result<Option<RawEntity>, StorageError> {
        if !self.host.read_access_granted(schema) {
            return Err(StorageError::AccessDenied(format!(
                "read access to {} not granted",
                schema.name()
            )));
        }
        let state = lock(&self.state);
        let record = state
            .elements
            .get(&self.id)
            .ok_or(StorageError::ElementNotFound(self.id))?;
        Ok(record.entities.get(&schema.guid()).cloned())
    }

    fn set_entity(
        &self,
        transaction: &dyn Transaction,
        entity: &RawEntity,
    ) -> Result<(), StorageError> {
        let schema = self.registered_schema(entity.schema_guid())?;
        self.check_write(&schema)?;
        self.with_record(transaction, |record| {
            record.entities.insert(entity.schema_guid(), entity.clone());
        })?;
        debug!("Stored entity of {} on element {}", schema.name(), self.id);
        Ok(())
    }

    fn delete_entity(
        &self,
        transaction: &dyn Transaction,
        schema: &Schema,
    ) -> Result<(), StorageError> {
        self.check_write(schema)?;
        self.with_record(transaction, |record| {
            record.entities.remove(&schema.guid());
        })?;
        debug!("Deleted entity of {} from element {}", schema.name(), self.id);
        Ok(())
    }

    fn start_transaction(&self, name: &str) -> Result<Box<dyn Transaction + '_>, StorageError> {
        Ok(Box::new(MemoryTransaction::start(self.state.clone(), name)?))
    }

    fn schema_guids(&self) -> Vec<Uuid> {
        lock(&self.state)
            .elements
            .get(&self.id)
            .map(|record| record.entities.keys().copied().collect())
            .unwrap_or_default()
    }
}

/// A snapshot transaction over a whole document
///
/// Rolling back, or dropping without commit, restores every element to its
/// state when the transaction started.
#[derive(Debug)]
pub struct MemoryTransaction {
    id: u64,
    name: String,
    state: SharedState,
    snapshot: Option<BTreeMap<ElementId, ElementRecord>>,
}

impl MemoryTransaction {
    fn start(state: SharedState, name: &str) -> Result<Self, StorageError> {
        let id = NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed);
        let snapshot = {
            let mut guard = lock(&state);
            if let Some(open) = &guard.open_transaction {
                return Err(StorageError::TransactionInProgress(open.name.clone()));
            }
            guard.open_transaction = Some(OpenTransaction {
                id,
                name: name.to_string(),
            });
            guard.elements.clone()
        };
        debug!("Started transaction '{}' ({})", name, id);
        Ok(Self {
            id,
            name: name.to_string(),
            state,
            snapshot: Some(snapshot),
        })
    }

    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            let mut state = lock(&self.state);
            state.elements = snapshot;
            state.open_transaction = None;
            debug!("Rolled back transaction '{}'", self.name);
        }
    }
}

impl Transaction for MemoryTransaction {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn commit(mut self: Box<Self>) -> Result<(), StorageError> {
        if self.snapshot.take().is_none() {
            return Err(StorageError::NoOpenTransaction(self.name.clone()));
        }
        let mut state = lock(&self.state);
        state.open_transaction = None;
        state.log.push(self.name.clone());
        Ok(())
    }

    fn roll_back(mut self: Box<Self>) {
        self.restore();
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        self.restore();
    }
}
