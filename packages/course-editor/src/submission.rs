//! # Submission
//!
//! Seam to the persistence collaborator that turns a drained [`ChangeSet`]
//! into backend calls.
//!
//! The collaborator owns transport, timeouts and retries. It receives the
//! whole batch and either accepts it, reporting the ids the backend issued
//! for locally created entities, or rejects it. Deletions flagged `cascade`
//! must remove the entity's descendants too.

use crate::errors::SubmitError;
use crate::ids::EntityId;
use crate::ledger::ChangeSet;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[async_trait]
pub trait ChangeSubmitter: Send + Sync {
    async fn submit(&self, changes: &ChangeSet) -> Result<SubmitReceipt, SubmitError>;
}

/// Backend acknowledgement of a submitted batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitReceipt {
    /// Local id → id issued by the backend
    pub issued_ids: HashMap<EntityId, EntityId>,
}

impl SubmitReceipt {
    pub fn with_issued_id(mut self, local: EntityId, remote: EntityId) -> Self {
        self.issued_ids.insert(local, remote);
        self
    }
}

/// Shared busy flag, raised while a submission is in flight
#[derive(Debug, Clone, Default)]
pub struct SavingFlag(Arc<AtomicBool>);

impl SavingFlag {
    pub fn is_saving(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise the flag until the returned guard is dropped
    pub(crate) fn raise(&self) -> SavingGuard {
        self.0.store(true, Ordering::SeqCst);
        SavingGuard(self.0.clone())
    }
}

pub(crate) struct SavingGuard(Arc<AtomicBool>);

impl Drop for SavingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
