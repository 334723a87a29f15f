//! Item filters: the acceptance predicate applied to device inventories and
//! to collection candidates.

use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which item types a device will take. Dispatches via enum match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemFilter {
    /// Every item is accepted.
    #[default]
    AcceptAll,
    /// Only the listed item types are accepted.
    Allow(BTreeSet<ItemTypeId>),
    /// Everything except the listed item types is accepted.
    Deny(BTreeSet<ItemTypeId>),
}

/// Shared accept-everything filter, used while no filter augment is installed.
pub static ACCEPT_ALL: ItemFilter = ItemFilter::AcceptAll;

impl ItemFilter {
    pub fn allow(items: impl IntoIterator<Item = ItemTypeId>) -> Self {
        ItemFilter::Allow(items.into_iter().collect())
    }

    pub fn deny(items: impl IntoIterator<Item = ItemTypeId>) -> Self {
        ItemFilter::Deny(items.into_iter().collect())
    }

    pub fn accepts(&self, item: ItemTypeId) -> bool {
        match self {
            ItemFilter::AcceptAll => true,
            ItemFilter::Allow(set) => set.contains(&item),
            ItemFilter::Deny(set) => !set.contains(&item),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_all_accepts_everything() {
        assert!(ACCEPT_ALL.accepts(ItemTypeId(0)));
        assert!(ItemFilter::default().accepts(ItemTypeId(999)));
    }

    #[test]
    fn allow_list() {
        let f = ItemFilter::allow([ItemTypeId(1), ItemTypeId(2)]);
        assert!(f.accepts(ItemTypeId(1)));
        assert!(!f.accepts(ItemTypeId(3)));
    }

    #[test]
    fn deny_list() {
        let f = ItemFilter::deny([ItemTypeId(1)]);
        assert!(!f.accepts(ItemTypeId(1)));
        assert!(f.accepts(ItemTypeId(2)));
    }

    #[test]
    fn empty_allow_list_rejects_everything() {
        let f = ItemFilter::allow([]);
        assert!(!f.accepts(ItemTypeId(0)));
    }
}
