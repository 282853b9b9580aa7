//! Append-only transaction log.
//!
//! Records are kept in an arena keyed by [`TxId`] with secondary indexes by
//! account and by transfer group. All reads and writes go through one
//! `RwLock`, so a multi-record append is observed either entirely or not at
//! all.

use crate::account::AccountId;
use crate::error::{LedgerError, Result};
use crate::transaction::{GroupId, NewRecord, TransactionRecord, TxId};
use log::debug;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// A compensating entry paired with the record it undoes.
#[derive(Debug, Clone)]
pub struct Compensation {
    pub original: TxId,
    pub entry: NewRecord,
}

#[derive(Default)]
struct LogState {
    records: BTreeMap<TxId, TransactionRecord>,
    by_account: HashMap<AccountId, Vec<TxId>>,
    by_group: HashMap<GroupId, Vec<TxId>>,

    /// Last issued id. Never decreases, including across purges.
    last_id: u64,
}

impl LogState {
    fn push(&mut self, draft: NewRecord) -> TxId {
        debug_assert!(draft.amount.is_positive());
        self.last_id += 1;
        let id = TxId(self.last_id);

        self.by_account
            .entry(draft.account_id.clone())
            .or_default()
            .push(id);
        if let Some(group) = draft.transfer_group_id {
            self.by_group.entry(group).or_default().push(id);
        }
        self.records.insert(id, draft.into_record(id));
        id
    }

    fn collect(&self, ids: Option<&Vec<TxId>>) -> Vec<TransactionRecord> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.records.get(id).cloned())
                .collect()
        })
        .unwrap_or_default()
    }
}

/// Append-only store of transaction records.
pub struct TransactionLog {
    state: RwLock<LogState>,

    /// Process-scoped transfer group allocator.
    last_group: AtomicU64,
}

impl TransactionLog {
    pub fn new() -> Self {
        TransactionLog {
            state: RwLock::new(LogState::default()),
            last_group: AtomicU64::new(0),
        }
    }

    /// Appends one record and returns its id.
    pub fn append(&self, draft: NewRecord) -> TxId {
        self.state.write().push(draft)
    }

    /// Appends several records as one unit. Ids are consecutive and follow
    /// the order of `drafts`.
    pub fn append_all(&self, drafts: Vec<NewRecord>) -> Vec<TxId> {
        let mut state = self.state.write();
        drafts.into_iter().map(|draft| state.push(draft)).collect()
    }

    /// Appends compensating entries and links each one to its original.
    ///
    /// Every original must exist and must not already be reversed; if any
    /// check fails nothing is written. On success each original is marked
    /// `is_reversed` with `reversed_by_id` pointing at its compensation.
    pub fn append_compensations(&self, compensations: Vec<Compensation>) -> Result<Vec<TxId>> {
        let mut state = self.state.write();

        for comp in &compensations {
            let original = state
                .records
                .get(&comp.original)
                .ok_or_else(|| LedgerError::transaction_not_found(comp.original))?;
            if original.is_reversed {
                return Err(LedgerError::AlreadyReversed(comp.original));
            }
        }

        let mut ids = Vec::with_capacity(compensations.len());
        for comp in compensations {
            let id = state.push(comp.entry.reversing(comp.original));
            if let Some(original) = state.records.get_mut(&comp.original) {
                original.is_reversed = true;
                original.reversed_by_id = Some(id);
            }
            ids.push(id);
        }
        Ok(ids)
    }

    pub fn find(&self, id: TxId) -> Result<TransactionRecord> {
        self.state
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::transaction_not_found(id))
    }

    /// Records of one account in insertion order.
    pub fn find_by_account(&self, account: &AccountId) -> Vec<TransactionRecord> {
        let state = self.state.read();
        state.collect(state.by_account.get(account))
    }

    /// Records sharing a transfer group, in insertion order.
    pub fn find_by_group(&self, group: GroupId) -> Vec<TransactionRecord> {
        let state = self.state.read();
        state.collect(state.by_group.get(&group))
    }

    /// Every record, in id order.
    pub fn all(&self) -> Vec<TransactionRecord> {
        self.state.read().records.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocates a fresh transfer group id. Never returns the same id twice.
    pub fn next_group_id(&self) -> GroupId {
        GroupId(self.last_group.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Deletes every record belonging to `account` and returns how many
    /// were removed. Counterpart legs on other accounts are left in place.
    pub fn purge_account(&self, account: &AccountId) -> usize {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let Some(ids) = state.by_account.remove(account) else {
            return 0;
        };

        for id in &ids {
            if let Some(record) = state.records.remove(id) {
                if let Some(group) = record.transfer_group_id {
                    if let Some(members) = state.by_group.get_mut(&group) {
                        members.retain(|member| member != id);
                        if members.is_empty() {
                            state.by_group.remove(&group);
                        }
                    }
                }
            }
        }

        debug!("Purged {} records of account {}", ids.len(), account);
        ids.len()
    }
}

impl Default for TransactionLog {
    fn default() -> Self {
        Self::new()
    }
}
