//! Compact slot numbering for concurrently tracked pointers.

use std::collections::BTreeMap;

use pointerkit_core::PointerId;

/// Assigns each tracked pointer the lowest slot not currently in use.
///
/// Slots are never renumbered while a pointer is tracked, so a released slot
/// leaves a hole that the next assignment fills before the table grows.
#[derive(Debug, Default, Clone)]
pub struct SlotTable {
    slots: BTreeMap<PointerId, usize>,
}

impl SlotTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowest slot not held by any pointer.
    pub fn next_free(&self) -> usize {
        let mut used: Vec<usize> = self.slots.values().copied().collect();
        used.sort_unstable();
        used.iter()
            .enumerate()
            .find(|(expected, slot)| *expected != **slot)
            .map_or(used.len(), |(expected, _)| expected)
    }

    /// Give `pointer` the lowest free slot, replacing any slot it held.
    pub fn assign(&mut self, pointer: PointerId) -> usize {
        self.slots.remove(&pointer);
        let slot = self.next_free();
        self.slots.insert(pointer, slot);
        slot
    }

    /// Free the slot held by `pointer`.
    pub fn release(&mut self, pointer: PointerId) -> Option<usize> {
        self.slots.remove(&pointer)
    }

    /// Slot held by `pointer`.
    pub fn slot_of(&self, pointer: PointerId) -> Option<usize> {
        self.slots.get(&pointer).copied()
    }

    /// Number of tracked pointers.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no pointer is tracked.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Tracked pointers, in id order.
    pub fn pointers(&self) -> impl Iterator<Item = PointerId> + '_ {
        self.slots.keys().copied()
    }

    /// Slots in use, in pointer id order.
    pub fn values(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.values().copied()
    }
}
