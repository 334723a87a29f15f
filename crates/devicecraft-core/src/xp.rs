use serde::{Deserialize, Serialize};

/// Bounded experience reserve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpStorage {
    stored: u32,
    capacity: u32,
}

impl XpStorage {
    pub fn new(capacity: u32) -> Self {
        Self {
            stored: 0,
            capacity,
        }
    }

    pub fn stored(&self) -> u32 {
        self.stored
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn space(&self) -> u32 {
        self.capacity.saturating_sub(self.stored)
    }

    /// Absorb up to `amount` experience. Returns how much was (or, with
    /// `simulate`, would be) absorbed.
    pub fn receive_xp(&mut self, amount: u32, simulate: bool) -> u32 {
        let absorbed = amount.min(self.space());
        if !simulate {
            self.stored += absorbed;
        }
        absorbed
    }

    /// Remove up to `amount` experience. Returns how much was removed.
    pub fn extract_xp(&mut self, amount: u32, simulate: bool) -> u32 {
        let taken = amount.min(self.stored);
        if !simulate {
            self.stored -= taken;
        }
        taken
    }

    /// Change the capacity. Stored experience above the new capacity is lost.
    pub fn set_capacity(&mut self, capacity: u32) {
        self.capacity = capacity;
        self.stored = self.stored.min(capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_within_capacity() {
        let mut xp = XpStorage::new(100);
        assert_eq!(xp.receive_xp(40, false), 40);
        assert_eq!(xp.stored(), 40);
    }

    #[test]
    fn receive_partially_when_near_full() {
        let mut xp = XpStorage::new(100);
        xp.receive_xp(90, false);
        assert_eq!(xp.receive_xp(25, false), 10);
        assert_eq!(xp.stored(), 100);
        assert_eq!(xp.receive_xp(1, false), 0);
    }

    #[test]
    fn simulate_leaves_state_untouched() {
        let mut xp = XpStorage::new(10);
        assert_eq!(xp.receive_xp(15, true), 10);
        assert_eq!(xp.stored(), 0);
    }

    #[test]
    fn extract_is_bounded_by_stored() {
        let mut xp = XpStorage::new(50);
        xp.receive_xp(20, false);
        assert_eq!(xp.extract_xp(30, false), 20);
        assert_eq!(xp.stored(), 0);
    }

    #[test]
    fn shrinking_capacity_clamps_stored() {
        let mut xp = XpStorage::new(100);
        xp.receive_xp(80, false);
        xp.set_capacity(50);
        assert_eq!(xp.stored(), 50);
        assert_eq!(xp.space(), 0);
    }
}
