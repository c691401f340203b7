//! Operation store - the shared ledger of submitted work.
//!
//! Every submitted task gets an [`OperationRecord`] here before its task is
//! enqueued, so a client that learns an id can always look it up. Records
//! start pending (`done = false`) and are completed exactly once by the
//! reconciler; after that the stored result never changes.
//!
//! A single mutex guards the whole map. Writers hold it for map surgery only,
//! readers copy the record out under the lock, so no caller ever observes a
//! half-written record.

use crate::response::ResponseStatus;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Terminal result data folded into a record when its response arrives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationResult {
    pub status: ResponseStatus,
    pub interpreter_lines: Vec<String>,
    pub graphic_artifacts: Vec<String>,
    pub message: Option<String>,
}

/// One operation's lifecycle state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationRecord {
    id: String,
    done: bool,
    created_at: DateTime<Utc>,
    result: Option<OperationResult>,
}

impl OperationRecord {
    fn pending(id: String) -> Self {
        Self {
            id,
            done: false,
            created_at: Utc::now(),
            result: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn result(&self) -> Option<&OperationResult> {
        self.result.as_ref()
    }

    /// Marks the record done with its final result.
    ///
    /// Completion is one-way: a record already done keeps its first result
    /// and reports the attempt by returning `false`.
    pub fn complete(&mut self, result: OperationResult) -> bool {
        if self.done {
            return false;
        }
        self.result = Some(result);
        self.done = true;
        true
    }
}

/// Mutex-guarded map of operation id to record.
///
/// Not `Clone`; shared between the coordinator and the reconciler behind an
/// `Arc`.
#[derive(Debug, Default)]
pub struct OperationStore {
    records: Mutex<HashMap<String, OperationRecord>>,
}

impl OperationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned mutex means a panicked writer; the map itself is still a
    // valid map, so recover the guard rather than propagate the poison.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, OperationRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Creates a pending record for `id` and returns a snapshot of it.
    ///
    /// An existing record under the same id is replaced. With 128-bit random
    /// ids that only happens when a caller reuses an id deliberately.
    pub fn create(&self, id: &str) -> OperationRecord {
        let record = OperationRecord::pending(id.to_string());
        self.lock().insert(id.to_string(), record.clone());
        record
    }

    /// Returns a point-in-time snapshot of the record, if present.
    ///
    /// The snapshot does not track later changes; poll again to observe
    /// completion.
    pub fn get(&self, id: &str) -> Option<OperationRecord> {
        self.lock().get(id).cloned()
    }

    /// Applies `mutate` to the record under the lock.
    ///
    /// Returns `false` without calling `mutate` when the id is unknown.
    pub fn update<F>(&self, id: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut OperationRecord),
    {
        match self.lock().get_mut(id) {
            Some(record) => {
                mutate(record);
                true
            }
            None => false,
        }
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
