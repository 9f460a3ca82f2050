//! Slot table and the two-click assignment state machine.
//!
//! A slot is a numbered broadcast channel bound to at most one device serial.
//! Binding follows a two-click protocol: the operator first selects a slot
//! (the selection cursor now awaits a device), then picks a device from the
//! current list. Selecting the same slot twice in a row instead clears it.
//!
//! The cursor is a tagged variant, never a sentinel integer, so "no pending
//! selection" and "pending on slot 0" stay unambiguous.

use tracing::{debug, warn};

/// Fixed-size ordered mapping from slot index to an optional device serial.
///
/// Created all-empty at startup, mutated only through [`SlotController`]
/// transitions, never persisted.
#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: Vec<Option<String>>,
}

impl SlotTable {
    /// Create a table with `count` empty slots.
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the table has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The device serial assigned to `index`, if any.
    pub fn assigned(&self, index: usize) -> Option<&str> {
        self.slots.get(index).and_then(|s| s.as_deref())
    }

    /// Iterate `(index, assigned serial)` in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&str>)> {
        self.slots.iter().enumerate().map(|(i, s)| (i, s.as_deref()))
    }

    fn assign(&mut self, index: usize, id: String) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(id);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }
}

/// Selection cursor: at most one slot awaits a device pick at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// No slot is awaiting selection.
    Idle,
    /// The slot at this index awaits a device pick.
    AwaitingDevice(usize),
}

/// Owns the slot table and drives the two-click selection protocol.
#[derive(Debug)]
pub struct SlotController {
    table: SlotTable,
    selection: Selection,
}

impl SlotController {
    /// Create a controller with `slot_count` empty slots and an idle cursor.
    pub fn new(slot_count: usize) -> Self {
        Self {
            table: SlotTable::new(slot_count),
            selection: Selection::Idle,
        }
    }

    /// Current slot table, always in a consistent state.
    pub fn table(&self) -> &SlotTable {
        &self.table
    }

    /// Current selection cursor.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// A slot button was activated.
    ///
    /// - Idle: the slot starts awaiting a device pick.
    /// - Same slot already pending: the slot is cleared and the cursor drops
    ///   back to idle (double-activation toggles to empty).
    /// - Another slot pending: the cursor retargets to the new slot; the
    ///   abandoned slot keeps whatever assignment it had.
    pub fn request_assignment(&mut self, index: usize) {
        if index >= self.table.len() {
            warn!(slot = index, "selection requested for out-of-range slot; ignored");
            return;
        }
        match self.selection {
            Selection::AwaitingDevice(pending) if pending == index => {
                self.table.clear(index);
                self.selection = Selection::Idle;
                debug!(slot = index, "slot cleared by double activation");
            }
            _ => {
                self.selection = Selection::AwaitingDevice(index);
                debug!(slot = index, "slot awaiting device pick");
            }
        }
    }

    /// A device was picked from the device list.
    ///
    /// Binds the serial to the pending slot and returns the cursor to idle.
    /// No-op while idle. The serial is stored without validating it against
    /// any snapshot; resolution happens lazily at broadcast time.
    pub fn pick_device(&mut self, id: impl Into<String>) {
        match self.selection {
            Selection::AwaitingDevice(index) => {
                let id = id.into();
                debug!(slot = index, device_id = %id, "device assigned to slot");
                self.table.assign(index, id);
                self.selection = Selection::Idle;
            }
            Selection::Idle => {
                debug!("device picked with no slot awaiting; ignored");
            }
        }
    }

    /// Unconditionally empty a slot.
    ///
    /// Drops the cursor only if it was pending on this very slot.
    pub fn clear(&mut self, index: usize) {
        if !self.table.clear(index) {
            warn!(slot = index, "clear requested for out-of-range slot; ignored");
            return;
        }
        if self.selection == Selection::AwaitingDevice(index) {
            self.selection = Selection::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_via_two_clicks() {
        let mut slots = SlotController::new(6);
        slots.request_assignment(2);
        assert_eq!(slots.selection(), Selection::AwaitingDevice(2));

        slots.pick_device("SN-123");
        assert_eq!(slots.selection(), Selection::Idle);
        assert_eq!(slots.table().assigned(2), Some("SN-123"));
    }

    #[test]
    fn test_double_activation_clears_slot() {
        let mut slots = SlotController::new(6);
        slots.request_assignment(3);
        slots.pick_device("SN-123");

        // Double activation: first click arms, second clears.
        slots.request_assignment(3);
        slots.request_assignment(3);
        assert_eq!(slots.selection(), Selection::Idle);
        assert_eq!(slots.table().assigned(3), None);
    }

    #[test]
    fn test_double_activation_on_empty_slot_returns_to_idle() {
        let mut slots = SlotController::new(6);
        slots.request_assignment(0);
        slots.request_assignment(0);
        assert_eq!(slots.selection(), Selection::Idle);
        assert_eq!(slots.table().assigned(0), None);
    }

    #[test]
    fn test_cross_select_abandons_pending_without_clearing() {
        let mut slots = SlotController::new(6);
        slots.request_assignment(1);
        slots.pick_device("SN-A");

        // Arm slot 1 again, then retarget to slot 4 before picking.
        slots.request_assignment(1);
        slots.request_assignment(4);
        assert_eq!(slots.selection(), Selection::AwaitingDevice(4));
        // Slot 1 keeps its assignment; only the cursor moved.
        assert_eq!(slots.table().assigned(1), Some("SN-A"));

        slots.pick_device("SN-B");
        assert_eq!(slots.table().assigned(4), Some("SN-B"));
        assert_eq!(slots.table().assigned(1), Some("SN-A"));
    }

    #[test]
    fn test_pick_while_idle_is_noop() {
        let mut slots = SlotController::new(6);
        slots.pick_device("SN-123");
        assert_eq!(slots.selection(), Selection::Idle);
        assert!(slots.table().iter().all(|(_, id)| id.is_none()));
    }

    #[test]
    fn test_unknown_device_id_accepted() {
        // Resolution failure is deferred to broadcast time, so an id that
        // exists in no snapshot is still stored.
        let mut slots = SlotController::new(2);
        slots.request_assignment(0);
        slots.pick_device("never-seen");
        assert_eq!(slots.table().assigned(0), Some("never-seen"));
    }

    #[test]
    fn test_same_device_may_occupy_two_slots() {
        let mut slots = SlotController::new(3);
        slots.request_assignment(0);
        slots.pick_device("SN-X");
        slots.request_assignment(2);
        slots.pick_device("SN-X");
        assert_eq!(slots.table().assigned(0), Some("SN-X"));
        assert_eq!(slots.table().assigned(2), Some("SN-X"));
    }

    #[test]
    fn test_clear_drops_cursor_only_for_pending_slot() {
        let mut slots = SlotController::new(6);
        slots.request_assignment(2);
        slots.clear(5);
        assert_eq!(slots.selection(), Selection::AwaitingDevice(2));
        slots.clear(2);
        assert_eq!(slots.selection(), Selection::Idle);
    }

    #[test]
    fn test_out_of_range_requests_ignored() {
        let mut slots = SlotController::new(2);
        slots.request_assignment(9);
        assert_eq!(slots.selection(), Selection::Idle);
        slots.clear(9);
    }
}
