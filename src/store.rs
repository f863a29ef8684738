//! Sled-backed document repository
//!
//! One tree per document kind, keyed by the document's immutable id,
//! values CBOR-encoded. Display-number lookups are linear scans over
//! the kind's tree; dataset sizes here are small and the scan keeps the
//! number index derivable instead of stored.

use super::document::{ExitPermit, PaymentOrder};
use super::error::StoreError;
use super::intent::DocumentIndex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

pub struct DocumentStore {
    payments: sled::Tree,
    exits: sled::Tree,
}

impl DocumentStore {
    pub fn open(db: &Arc<sled::Db>) -> Result<Self, StoreError> {
        Ok(Self {
            payments: db.open_tree("payment_orders")?,
            exits: db.open_tree("exit_permits")?,
        })
    }

    fn encode<T: minicbor::Encode<()>>(value: &T) -> Result<Vec<u8>, StoreError> {
        minicbor::to_vec(value).map_err(|e| StoreError::Encode(e.to_string()))
    }

    // --- payment orders ---

    pub fn all_payments(&self) -> Result<Vec<PaymentOrder>, StoreError> {
        let mut docs = Vec::new();
        for entry in self.payments.iter() {
            let (_, value) = entry?;
            docs.push(minicbor::decode(&value)?);
        }
        Ok(docs)
    }

    pub fn find_payment(&self, number: u32) -> Result<Option<PaymentOrder>, StoreError> {
        Ok(self
            .all_payments()?
            .into_iter()
            .find(|p| p.tracking_number == number))
    }

    pub fn upsert_payment(&self, order: &PaymentOrder) -> Result<(), StoreError> {
        self.payments
            .insert(order.id.as_bytes(), Self::encode(order)?)?;
        Ok(())
    }

    /// Administrative removal. The freed tracking number becomes the
    /// lowest gap and is reused by the next allocation.
    pub fn delete_payment(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.payments.remove(id.as_bytes())?.is_some())
    }

    /// Snapshot of tracking numbers in use, for the allocator.
    pub fn payment_numbers(&self) -> Result<BTreeSet<u32>, StoreError> {
        Ok(self
            .all_payments()?
            .iter()
            .map(|p| p.tracking_number)
            .collect())
    }

    // --- exit permits ---

    pub fn all_exits(&self) -> Result<Vec<ExitPermit>, StoreError> {
        let mut docs = Vec::new();
        for entry in self.exits.iter() {
            let (_, value) = entry?;
            docs.push(minicbor::decode(&value)?);
        }
        Ok(docs)
    }

    pub fn find_exit(&self, number: u32) -> Result<Option<ExitPermit>, StoreError> {
        Ok(self
            .all_exits()?
            .into_iter()
            .find(|e| e.permit_number == number))
    }

    pub fn upsert_exit(&self, permit: &ExitPermit) -> Result<(), StoreError> {
        self.exits
            .insert(permit.id.as_bytes(), Self::encode(permit)?)?;
        Ok(())
    }

    pub fn delete_exit(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.exits.remove(id.as_bytes())?.is_some())
    }

    /// Snapshot of permit numbers in use within one company partition.
    pub fn exit_numbers(&self, company: &str) -> Result<BTreeSet<u32>, StoreError> {
        Ok(self
            .all_exits()?
            .iter()
            .filter(|e| e.company == company)
            .map(|e| e.permit_number)
            .collect())
    }
}

// The parser's ambiguity check only needs presence; a store failure here
// degrades to "not found" and is logged rather than aborting the parse.
impl DocumentIndex for DocumentStore {
    fn has_payment(&self, number: u32) -> bool {
        match self.find_payment(number) {
            Ok(found) => found.is_some(),
            Err(err) => {
                warn!(error = %err, number, "payment lookup failed during parse");
                false
            }
        }
    }

    fn has_exit(&self, number: u32) -> bool {
        match self.find_exit(number) {
            Ok(found) => found.is_some(),
            Err(err) => {
                warn!(error = %err, number, "exit permit lookup failed during parse");
                false
            }
        }
    }
}
