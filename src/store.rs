//! Persistence seam for extracted records.
//!
//! The pipeline does not own storage. It hands records to an
//! [`InvoiceStore`] implementation supplied by the host application, which
//! is free to map them into whatever table shape it keeps. Only the two
//! insert operations are part of the contract; querying, filtering and
//! migrations belong to the collaborator.

use crate::record::InvoiceRecord;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Storage-side failures surfaced to the caller of the handoff.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the record (constraint violation, bad mapping).
    #[error("record rejected by store: {0}")]
    Rejected(String),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Acknowledgment for one persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredInvoice {
    /// Identifier assigned by the store.
    pub id: u64,
    pub record: InvoiceRecord,
}

/// Downstream persistence collaborator.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Persist one record, returning the stored acknowledgment.
    async fn insert(&self, record: InvoiceRecord) -> Result<StoredInvoice, StoreError>;

    /// Persist a batch in order. Default implementation inserts one by one
    /// and stops at the first failure.
    async fn insert_many(
        &self,
        records: Vec<InvoiceRecord>,
    ) -> Result<Vec<StoredInvoice>, StoreError> {
        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            stored.push(self.insert(record).await?);
        }
        Ok(stored)
    }
}

/// In-memory store with sequential ids. Reference implementation for tests
/// and for callers that defer real persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: AtomicU64,
    rows: Mutex<Vec<StoredInvoice>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything inserted so far.
    pub fn records(&self) -> Vec<StoredInvoice> {
        self.rows.lock().expect("store mutex poisoned").clone()
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn insert(&self, record: InvoiceRecord) -> Result<StoredInvoice, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = StoredInvoice { id, record };
        self.rows
            .lock()
            .expect("store mutex poisoned")
            .push(stored.clone());
        Ok(stored)
    }
}
