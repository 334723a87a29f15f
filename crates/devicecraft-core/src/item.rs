use crate::filter::ItemFilter;
use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};

/// Default per-slot stack limit.
pub const DEFAULT_STACK_LIMIT: u32 = 64;

/// A stack of fungible items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_type: ItemTypeId,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(item_type: ItemTypeId, quantity: u32) -> Self {
        Self {
            item_type,
            quantity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quantity == 0
    }
}

/// Capability tag for a group of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageGroup {
    /// Open to both insertion and extraction by neighbors.
    Accessible,
    /// Only accepts insertion from outside.
    Input,
    /// Only allows extraction from outside; filled by the device itself.
    Output,
}

/// One storage slot holding at most one stack of a single item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    pub group: StorageGroup,
    pub stack: Option<ItemStack>,
    pub limit: u32,
}

impl InventorySlot {
    pub fn new(group: StorageGroup, limit: u32) -> Self {
        Self {
            group,
            stack: None,
            limit,
        }
    }

    /// Free room for `item_type` in this slot.
    pub fn room_for(&self, item_type: ItemTypeId) -> u32 {
        match &self.stack {
            None => self.limit,
            Some(s) if s.item_type == item_type => self.limit.saturating_sub(s.quantity),
            Some(_) => 0,
        }
    }

    pub fn quantity(&self) -> u32 {
        self.stack.map(|s| s.quantity).unwrap_or(0)
    }
}

/// A device inventory: an ordered list of slots tagged by storage group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<InventorySlot>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `count` slots of the given group.
    pub fn add_slots(&mut self, group: StorageGroup, count: usize, limit: u32) {
        self.slots
            .extend((0..count).map(|_| InventorySlot::new(group, limit)));
    }

    pub fn slots(&self) -> &[InventorySlot] {
        &self.slots
    }

    pub fn slots_in(&self, group: StorageGroup) -> impl Iterator<Item = &InventorySlot> {
        self.slots.iter().filter(move |s| s.group == group)
    }

    /// Insert a stack into the slots of `group`.
    ///
    /// Items the filter rejects are returned untouched. Otherwise the stack is
    /// merged into matching partial stacks first, then spread over empty
    /// slots. Returns the leftover that did not fit, or `None` if everything
    /// was inserted. With `simulate` set the inventory is not modified.
    #[must_use = "leftover items must be returned to their source"]
    pub fn insert(
        &mut self,
        group: StorageGroup,
        stack: ItemStack,
        filter: &ItemFilter,
        simulate: bool,
    ) -> Option<ItemStack> {
        if stack.is_empty() {
            return None;
        }
        if !filter.accepts(stack.item_type) {
            return Some(stack);
        }

        let mut remaining = stack.quantity;
        let item = stack.item_type;

        // Pass 1: top up matching stacks. Pass 2: fill empty slots.
        for want_existing in [true, false] {
            for slot in self.slots.iter_mut().filter(|s| s.group == group) {
                if remaining == 0 {
                    break;
                }
                if slot.stack.is_some() != want_existing {
                    continue;
                }
                let moved = slot.room_for(item).min(remaining);
                if moved == 0 {
                    continue;
                }
                remaining -= moved;
                if !simulate {
                    let existing = slot.quantity();
                    slot.stack = Some(ItemStack::new(item, existing + moved));
                }
            }
        }

        if remaining == 0 {
            None
        } else {
            Some(ItemStack::new(item, remaining))
        }
    }

    /// Remove up to `quantity` of `item_type` from the slots of `group`.
    /// Returns the amount actually removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn extract(&mut self, group: StorageGroup, item_type: ItemTypeId, quantity: u32) -> u32 {
        let mut removed = 0;
        for slot in self.slots.iter_mut().filter(|s| s.group == group) {
            if removed == quantity {
                break;
            }
            if let Some(stack) = &mut slot.stack
                && stack.item_type == item_type
            {
                let take = stack.quantity.min(quantity - removed);
                stack.quantity -= take;
                removed += take;
                if stack.quantity == 0 {
                    slot.stack = None;
                }
            }
        }
        removed
    }

    /// Total quantity of `item_type` across all slots.
    pub fn quantity(&self, item_type: ItemTypeId) -> u32 {
        self.slots
            .iter()
            .filter_map(|s| s.stack)
            .filter(|s| s.item_type == item_type)
            .map(|s| s.quantity)
            .sum()
    }

    /// Total items held in a group.
    pub fn group_total(&self, group: StorageGroup) -> u32 {
        self.slots_in(group).map(|s| s.quantity()).sum()
    }

    /// Total items across all slots.
    pub fn total(&self) -> u32 {
        self.slots.iter().map(|s| s.quantity()).sum()
    }
}
