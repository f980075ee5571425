//! # Fixed-capacity process table.
//!
//! [`ProcessTable`] is the coordinator's bookkeeping arena: a fixed array
//! of slots, each either vacant or holding one live worker. It never
//! grows, mirroring a statically-sized kernel process table; when every
//! slot is taken, launches stall until a release frees one.
//!
//! The table is owned exclusively by the coordinator, so there is no
//! locking here. `Some(entry)` is the occupied flag: releasing a slot
//! moves the entry out, and nothing stale remains behind.
//!
//! ## Rules
//! - [`ProcessTable::find_free`] is first-fit (lowest vacant index).
//! - [`ProcessTable::occupy`] on a taken slot and
//!   [`ProcessTable::release`] on a vacant one are protocol violations,
//!   not recoverable conditions.
//! - [`ProcessTable::next_occupied_after`] scans cyclically and is the
//!   basis of round-robin dispatch.

use tokio::task::JoinHandle;

use crate::channel::Identity;
use crate::clock::SimTime;
use crate::error::{ProtocolError, WorkerError};

/// One live worker as the coordinator tracks it.
#[derive(Debug)]
pub(crate) struct ProcessEntry {
    /// Channel address of the worker.
    pub identity: Identity,
    /// Simulated time at which the worker was launched.
    pub started_at: SimTime,
    /// Completed polls answered by this worker.
    pub polls: u64,
    /// Join handle for the worker's task.
    pub join: JoinHandle<Result<(), WorkerError>>,
}

/// Fixed-size arena of worker slots.
#[derive(Debug)]
pub(crate) struct ProcessTable {
    slots: Vec<Option<ProcessEntry>>,
}

impl ProcessTable {
    /// Creates a table with `capacity` vacant slots (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Number of slots, fixed for the table's lifetime.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Lowest vacant index, or `None` when the table is full.
    pub fn find_free(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.is_none())
    }

    /// Installs `entry` into the vacant slot at `index`.
    pub fn occupy(&mut self, index: usize, entry: ProcessEntry) -> Result<(), ProtocolError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ProtocolError::SlotOutOfRange { index })?;
        if slot.is_some() {
            return Err(ProtocolError::SlotOccupied { index });
        }
        *slot = Some(entry);
        Ok(())
    }

    /// Takes the entry out of the occupied slot at `index`.
    pub fn release(&mut self, index: usize) -> Result<ProcessEntry, ProtocolError> {
        self.slots
            .get_mut(index)
            .ok_or(ProtocolError::SlotOutOfRange { index })?
            .take()
            .ok_or(ProtocolError::SlotVacant { index })
    }

    /// Takes whatever occupies `index`, if anything. Teardown sweeps use
    /// this; a vacant slot is not a violation there.
    pub fn take(&mut self, index: usize) -> Option<ProcessEntry> {
        self.slots.get_mut(index)?.take()
    }

    /// Borrows the entry at `index`, if occupied.
    pub fn entry(&self, index: usize) -> Option<&ProcessEntry> {
        self.slots.get(index).and_then(|slot| slot.as_ref())
    }

    /// Mutably borrows the entry at `index`, if occupied.
    pub fn entry_mut(&mut self, index: usize) -> Option<&mut ProcessEntry> {
        self.slots.get_mut(index).and_then(|slot| slot.as_mut())
    }

    /// First occupied index in cyclic order strictly after `index`,
    /// wrapping around and ending on `index` itself. `None` only when the
    /// whole table is vacant.
    pub fn next_occupied_after(&self, index: usize) -> Option<usize> {
        let cap = self.slots.len();
        (1..=cap)
            .map(|k| (index + k) % cap)
            .find(|&i| self.slots[i].is_some())
    }

    /// Immutable view of every slot for reporting.
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            slots: self
                .slots
                .iter()
                .map(|slot| {
                    slot.as_ref().map(|entry| SlotView {
                        identity: entry.identity,
                        started_at: entry.started_at,
                        polls: entry.polls,
                    })
                })
                .collect(),
        }
    }
}

/// Point-in-time copy of the table, carried by report events.
#[derive(Clone, Debug)]
pub struct TableSnapshot {
    /// One element per slot; `None` marks a vacant slot.
    pub slots: Vec<Option<SlotView>>,
}

impl TableSnapshot {
    /// Number of occupied slots in the snapshot.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

/// Reporting view of one occupied slot.
#[derive(Clone, Copy, Debug)]
pub struct SlotView {
    /// Channel address of the worker in the slot.
    pub identity: Identity,
    /// Simulated launch time.
    pub started_at: SimTime,
    /// Completed polls answered so far.
    pub polls: u64,
}
