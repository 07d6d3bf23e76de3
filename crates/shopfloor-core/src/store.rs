//! Shared machine-state store
//!
//! The single shared mutable resource of the gateway: an ordered table of
//! [`MachineRecord`] slots plus the change flags the consumer drains. One
//! coarse lock guards the whole table because cross-field consistency per
//! machine and across the roster flag must be atomic; the lock is taken for
//! the duration of each individual operation and never held across I/O.
//!
//! Writers (the message ingestors) mutate machine data; the consumer only
//! drains `has_update`/`roster_changed` and takes snapshots. Multiple updates
//! between two drains collapse into one pending flag plus the *last* updated
//! id.

use crate::model::{MachineRecord, Position, MACHINE_SLOTS};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Result of draining the update flag: the most recently mutated id.
///
/// The id is advisory only. A consumer reading it after a burst of updates
/// may miss intermediate ids; it is a hint for cheap single-slot refresh, not
/// a change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateTicket {
    /// Most recently mutated machine id
    pub last_updated_id: usize,
}

struct TableInner {
    slots: Vec<MachineRecord>,
    has_update: bool,
    last_updated_id: usize,
    roster_changed: bool,
}

/// The shared table of per-machine records plus change flags
///
/// Created once at process start and passed explicitly (behind an `Arc`) to
/// every component that needs it.
pub struct StateStore {
    inner: Mutex<TableInner>,
    notify: Notify,
}

impl StateStore {
    /// Create a store with the default number of slots ([`MACHINE_SLOTS`]),
    /// all zeroed and inactive
    pub fn new() -> Self {
        Self::with_slots(MACHINE_SLOTS)
    }

    /// Create a store with a specific slot count
    pub fn with_slots(slots: usize) -> Self {
        Self {
            inner: Mutex::new(TableInner {
                slots: (1..=slots).map(MachineRecord::empty).collect(),
                has_update: false,
                last_updated_id: 0,
                roster_changed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Number of machine slots
    pub fn slot_count(&self) -> usize {
        self.inner.lock().slots.len()
    }

    /// Apply a status report for machine `id`
    ///
    /// Sets the slot's state label, marks the machine active (raising the
    /// roster flag on first activation) and raises the update flag. A no-op
    /// for ids outside `1..=slot_count` — unknown-origin traffic is expected
    /// on a shared bus and must not mutate state.
    pub fn apply_status(&self, id: usize, label: &str) {
        let mut inner = self.inner.lock();
        let Some(slot) = Self::slot_mut(&mut inner.slots, id) else {
            return;
        };

        slot.state_label = label.to_string();
        if !slot.active {
            slot.active = true;
            inner.roster_changed = true;
            tracing::info!(machine = id, "machine joined the roster");
        }
        Self::mark_updated(&mut inner, id);
        drop(inner);
        self.notify.notify_one();
    }

    /// Apply a position report for machine `id`
    ///
    /// Overwrites the position fields only; does not touch `active`. Same
    /// bounds contract as [`apply_status`](Self::apply_status).
    pub fn apply_position(&self, id: usize, x: f64, y: f64, z: f64) {
        let mut inner = self.inner.lock();
        let Some(slot) = Self::slot_mut(&mut inner.slots, id) else {
            return;
        };

        slot.position = Position::new(x, y, z);
        Self::mark_updated(&mut inner, id);
        drop(inner);
        self.notify.notify_one();
    }

    /// Record the network address machine `id` announced for itself
    ///
    /// Same bounds contract as [`apply_status`](Self::apply_status).
    pub fn apply_address(&self, id: usize, address: &str) {
        let mut inner = self.inner.lock();
        let Some(slot) = Self::slot_mut(&mut inner.slots, id) else {
            return;
        };

        slot.network_address = Some(address.to_string());
        Self::mark_updated(&mut inner, id);
        drop(inner);
        self.notify.notify_one();
    }

    /// Atomically read and clear the update flag
    ///
    /// Returns the last updated id if at least one mutation happened since
    /// the previous drain. Does not touch the roster flag, which has its own
    /// consumer.
    pub fn consume_update(&self) -> Option<UpdateTicket> {
        let mut inner = self.inner.lock();
        if !inner.has_update {
            return None;
        }
        inner.has_update = false;
        Some(UpdateTicket {
            last_updated_id: inner.last_updated_id,
        })
    }

    /// Atomically read and clear the roster-changed flag
    pub fn consume_roster_change(&self) -> bool {
        let mut inner = self.inner.lock();
        std::mem::take(&mut inner.roster_changed)
    }

    /// Block until at least one update is pending, then drain it
    ///
    /// The replacement for fixed-interval polling: mutations wake exactly one
    /// waiter, and updates arriving between wakeups still collapse into one
    /// ticket carrying the last id.
    pub async fn wait_for_update(&self) -> UpdateTicket {
        loop {
            let notified = self.notify.notified();
            if let Some(ticket) = self.consume_update() {
                return ticket;
            }
            notified.await;
        }
    }

    /// Read-only copy of machine `id`'s record, or `None` for out-of-range ids
    pub fn snapshot(&self, id: usize) -> Option<MachineRecord> {
        let inner = self.inner.lock();
        Self::slot_index(inner.slots.len(), id).map(|idx| inner.slots[idx].clone())
    }

    /// Read-only copies of all records currently on the roster
    pub fn active_machines(&self) -> Vec<MachineRecord> {
        let inner = self.inner.lock();
        inner.slots.iter().filter(|s| s.active).cloned().collect()
    }

    fn slot_index(len: usize, id: usize) -> Option<usize> {
        (1..=len).contains(&id).then(|| id - 1)
    }

    fn slot_mut(slots: &mut [MachineRecord], id: usize) -> Option<&mut MachineRecord> {
        Self::slot_index(slots.len(), id).map(move |idx| &mut slots[idx])
    }

    fn mark_updated(inner: &mut TableInner, id: usize) {
        inner.has_update = true;
        inner.last_updated_id = id;
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("StateStore")
            .field("slots", &inner.slots.len())
            .field("has_update", &inner.has_update)
            .field("last_updated_id", &inner.last_updated_id)
            .field("roster_changed", &inner.roster_changed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_marks_active_and_updates() {
        let store = StateStore::new();
        store.apply_status(2, "WORKING");

        let rec = store.snapshot(2).unwrap();
        assert_eq!(rec.state_label, "WORKING");
        assert!(rec.active);

        let ticket = store.consume_update().unwrap();
        assert_eq!(ticket.last_updated_id, 2);
        assert!(store.consume_update().is_none());
    }

    #[test]
    fn test_out_of_range_ids_are_ignored() {
        let store = StateStore::new();
        store.apply_status(0, "WORKING");
        store.apply_status(MACHINE_SLOTS + 1, "WORKING");
        store.apply_position(0, 1.0, 2.0, 3.0);

        assert!(store.consume_update().is_none());
        assert!(store.snapshot(0).is_none());
        assert!(store.snapshot(MACHINE_SLOTS + 1).is_none());
    }

    #[test]
    fn test_position_does_not_touch_active() {
        let store = StateStore::new();
        store.apply_position(4, 1.5, -2.25, 3.0);

        let rec = store.snapshot(4).unwrap();
        assert_eq!(rec.position, Position::new(1.5, -2.25, 3.0));
        assert!(!rec.active);
    }

    #[test]
    fn test_roster_flag_fires_once_per_machine() {
        let store = StateStore::new();
        store.apply_status(1, "IDLE");
        assert!(store.consume_roster_change());

        store.apply_status(1, "WORKING");
        assert!(!store.consume_roster_change());

        store.apply_status(2, "IDLE");
        assert!(store.consume_roster_change());
    }

    #[test]
    fn test_updates_collapse_to_last_id() {
        let store = StateStore::new();
        store.apply_status(1, "IDLE");
        store.apply_status(3, "WORKING");
        store.apply_position(5, 0.0, 0.0, 0.0);

        let ticket = store.consume_update().unwrap();
        assert_eq!(ticket.last_updated_id, 5);
        assert!(store.consume_update().is_none());
    }

    #[test]
    fn test_consume_update_leaves_roster_flag() {
        let store = StateStore::new();
        store.apply_status(7, "IDLE");
        assert!(store.consume_update().is_some());
        assert!(store.consume_roster_change());
    }

    #[test]
    fn test_address_applied() {
        let store = StateStore::new();
        store.apply_address(6, "10.0.0.16:23");
        assert_eq!(
            store.snapshot(6).unwrap().network_address.as_deref(),
            Some("10.0.0.16:23")
        );
    }

    #[test]
    fn test_active_machines_filters_roster() {
        let store = StateStore::new();
        store.apply_status(1, "IDLE");
        store.apply_status(4, "ERROR");
        store.apply_position(9, 1.0, 1.0, 1.0);

        let roster: Vec<usize> = store.active_machines().iter().map(|m| m.id).collect();
        assert_eq!(roster, vec![1, 4]);
    }

    #[tokio::test]
    async fn test_wait_for_update_wakes_on_mutation() {
        use std::sync::Arc;

        let store = Arc::new(StateStore::new());
        let writer = store.clone();

        let waiter = tokio::spawn(async move { store.wait_for_update().await });

        tokio::task::yield_now().await;
        writer.apply_status(8, "WORKING");

        let ticket = waiter.await.unwrap();
        assert_eq!(ticket.last_updated_id, 8);
    }
}
