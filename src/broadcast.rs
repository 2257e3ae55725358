//! Timezone-change notifications from the host

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{FixedOffset, Local, Offset};

use crate::core::zone::format_offset;

/// Gets told the new zone id when the system zone changes
pub trait TimeZoneReceiver {
    fn on_time_zone_changed(&self, zone_id: &str);
}

/// Handle for a registered receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Host service delivering timezone-change notifications
pub trait TimeZoneBroadcaster {
    fn register(&self, receiver: Rc<dyn TimeZoneReceiver>) -> SubscriptionId;

    /// Returns false if the id was not registered
    fn unregister(&self, id: SubscriptionId) -> bool;
}

pub type OffsetSource = Box<dyn Fn() -> FixedOffset>;

/// Broadcaster that watches the system local UTC offset.
///
/// The host calls [`LocalOffsetMonitor::poll`] from its event loop; a change in
/// offset is broadcast as an `+HH:MM` zone id.
pub struct LocalOffsetMonitor {
    receivers: RefCell<Vec<(SubscriptionId, Rc<dyn TimeZoneReceiver>)>>,
    next_id: Cell<u64>,
    last_offset: Cell<FixedOffset>,
    source: OffsetSource,
}

impl LocalOffsetMonitor {
    pub fn new() -> Self {
        Self::with_source(Box::new(|| Local::now().offset().fix()))
    }

    /// Monitor reading the offset from `source` instead of the system
    pub fn with_source(source: OffsetSource) -> Self {
        let initial = source();
        Self {
            receivers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            last_offset: Cell::new(initial),
            source,
        }
    }

    /// Check the offset, broadcasting if it moved. Returns the new zone id on change.
    pub fn poll(&self) -> Option<String> {
        let offset = (self.source)();
        if offset == self.last_offset.get() {
            return None;
        }

        self.last_offset.set(offset);
        let zone_id = format_offset(offset);
        log::info!("system time zone changed to {}", zone_id);
        self.broadcast(&zone_id);
        Some(zone_id)
    }

    /// Deliver `zone_id` to every receiver; returns how many were notified
    pub fn broadcast(&self, zone_id: &str) -> usize {
        // Snapshot so receivers may unregister while being notified
        let receivers: Vec<_> = self.receivers.borrow().iter().map(|(_, r)| r.clone()).collect();
        for receiver in &receivers {
            receiver.on_time_zone_changed(zone_id);
        }
        receivers.len()
    }

    pub fn receiver_count(&self) -> usize {
        self.receivers.borrow().len()
    }
}

impl Default for LocalOffsetMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeZoneBroadcaster for LocalOffsetMonitor {
    fn register(&self, receiver: Rc<dyn TimeZoneReceiver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.receivers.borrow_mut().push((id, receiver));
        id
    }

    fn unregister(&self, id: SubscriptionId) -> bool {
        let mut receivers = self.receivers.borrow_mut();
        let before = receivers.len();
        receivers.retain(|(rid, _)| *rid != id);
        receivers.len() != before
    }
}
