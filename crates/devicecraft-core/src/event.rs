//! Buffered device events.
//!
//! Devices push events into an [`EventLog`] while they tick. The log is a
//! fixed-capacity ring buffer: when full, the oldest events are dropped.
//! Event kinds can be suppressed, in which case they are never recorded.
//! Passive listeners registered on the log see each event as it is pushed;
//! callers that prefer polling use [`EventLog::drain`] after a step.

use crate::fixed::Ticks;
use crate::id::{DeviceId, ItemTypeId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A device event. All events carry the device and the tick at which they
/// occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Activated {
        device: DeviceId,
        tick: Ticks,
    },
    Deactivated {
        device: DeviceId,
        tick: Ticks,
    },
    ValiditySampled {
        device: DeviceId,
        valid: bool,
        tick: Ticks,
    },
    ItemsCollected {
        device: DeviceId,
        item_type: ItemTypeId,
        quantity: u32,
        tick: Ticks,
    },
    XpAbsorbed {
        device: DeviceId,
        amount: u32,
        tick: Ticks,
    },
    LootProduced {
        device: DeviceId,
        item_type: ItemTypeId,
        quantity: u32,
        tick: Ticks,
    },
    /// The countdown expired but the validity precondition failed.
    CycleWasted {
        device: DeviceId,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Activated,
    Deactivated,
    ValiditySampled,
    ItemsCollected,
    XpAbsorbed,
    LootProduced,
    CycleWasted,
}

const EVENT_KIND_COUNT: usize = 7;

impl DeviceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DeviceEvent::Activated { .. } => EventKind::Activated,
            DeviceEvent::Deactivated { .. } => EventKind::Deactivated,
            DeviceEvent::ValiditySampled { .. } => EventKind::ValiditySampled,
            DeviceEvent::ItemsCollected { .. } => EventKind::ItemsCollected,
            DeviceEvent::XpAbsorbed { .. } => EventKind::XpAbsorbed,
            DeviceEvent::LootProduced { .. } => EventKind::LootProduced,
            DeviceEvent::CycleWasted { .. } => EventKind::CycleWasted,
        }
    }

    pub fn device(&self) -> DeviceId {
        match self {
            DeviceEvent::Activated { device, .. }
            | DeviceEvent::Deactivated { device, .. }
            | DeviceEvent::ValiditySampled { device, .. }
            | DeviceEvent::ItemsCollected { device, .. }
            | DeviceEvent::XpAbsorbed { device, .. }
            | DeviceEvent::LootProduced { device, .. }
            | DeviceEvent::CycleWasted { device, .. } => *device,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Passive listener: read-only, called once per recorded event.
pub type PassiveListener = Box<dyn FnMut(&DeviceEvent)>;

/// Default ring buffer capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 4096;

pub struct EventLog {
    /// Pre-allocated ring storage.
    events: Vec<Option<DeviceEvent>>,
    /// Next write position.
    head: usize,
    len: usize,
    /// Total events ever recorded, including dropped ones.
    total_written: u64,
    dropped: u64,
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: Vec<PassiveListener>,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("capacity", &self.capacity())
            .field("len", &self.len)
            .field("total_written", &self.total_written)
            .field("suppressed", &self.suppressed)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventLog {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
            dropped: 0,
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Events lost because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    pub fn on_passive(&mut self, listener: PassiveListener) {
        self.listeners.push(listener);
    }

    /// Record an event. No-op if its kind is suppressed.
    pub fn push(&mut self, event: DeviceEvent) {
        if self.suppressed[event.kind().index()] {
            return;
        }
        for listener in &mut self.listeners {
            listener(&event);
        }
        let capacity = self.capacity();
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        } else {
            self.dropped += 1;
        }
        self.total_written += 1;
    }

    /// Buffered events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceEvent> {
        let capacity = self.capacity();
        // When full, head is the oldest entry.
        let start = if self.len < capacity { 0 } else { self.head };
        (0..self.len).filter_map(move |i| self.events[(start + i) % capacity].as_ref())
    }

    /// Remove and return all buffered events, oldest first.
    pub fn drain(&mut self) -> Vec<DeviceEvent> {
        let drained: Vec<DeviceEvent> = self.iter().cloned().collect();
        self.clear();
        drained
    }

    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn device() -> DeviceId {
        let mut map: SlotMap<DeviceId, ()> = SlotMap::with_key();
        map.insert(())
    }

    #[test]
    fn drain_returns_oldest_first() {
        let d = device();
        let mut log = EventLog::new(8);
        log.push(DeviceEvent::Activated { device: d, tick: 1 });
        log.push(DeviceEvent::CycleWasted { device: d, tick: 2 });
        let events = log.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), EventKind::Activated);
        assert_eq!(events[1].kind(), EventKind::CycleWasted);
        assert!(log.is_empty());
    }

    #[test]
    fn full_buffer_drops_oldest() {
        let d = device();
        let mut log = EventLog::new(2);
        for tick in 0..5 {
            log.push(DeviceEvent::CycleWasted { device: d, tick });
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.total_written(), 5);
        assert_eq!(log.dropped_count(), 3);
        let ticks: Vec<Ticks> = log
            .iter()
            .map(|e| match e {
                DeviceEvent::CycleWasted { tick, .. } => *tick,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ticks, vec![3, 4]);
    }

    #[test]
    fn suppressed_kinds_are_not_recorded() {
        let d = device();
        let mut log = EventLog::new(4);
        log.suppress(EventKind::Activated);
        log.push(DeviceEvent::Activated { device: d, tick: 0 });
        assert!(log.is_empty());
        assert!(log.is_suppressed(EventKind::Activated));
    }

    #[test]
    fn listeners_see_every_recorded_event() {
        let d = device();
        let seen = Rc::new(RefCell::new(0));
        let counter = seen.clone();
        let mut log = EventLog::new(1);
        log.on_passive(Box::new(move |_| *counter.borrow_mut() += 1));
        log.push(DeviceEvent::Activated { device: d, tick: 0 });
        log.push(DeviceEvent::Deactivated { device: d, tick: 1 });
        assert_eq!(*seen.borrow(), 2);
        assert_eq!(log.len(), 1);
        assert_eq!(log.iter().next().map(|e| e.device()), Some(d));
    }
}
