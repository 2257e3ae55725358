//! Single-threaded deferred message queue.
//!
//! Messages are posted against a target and delivered in deadline order when
//! the owner calls [`Looper::dispatch_due`]. Nothing here spawns threads; the
//! host decides when to wake up from [`Looper::next_deadline`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::clock::{ClockError, TimeSource};

/// Receiver of queued messages
pub trait HandleMessage {
    fn handle_message(&self, what: u32);
}

struct Message {
    /// Epoch milliseconds at which the message becomes due
    when: i64,
    seq: u64,
    what: u32,
    target: Rc<dyn HandleMessage>,
}

/// Deferred message queue driven by a wall-clock time source
pub struct Looper {
    clock: Rc<dyn TimeSource>,
    queue: RefCell<Vec<Message>>,
    next_seq: Cell<u64>,
    /// Latest time seen by a dispatch or a successful clock read
    last_now: Cell<i64>,
}

impl Looper {
    pub fn new(clock: Rc<dyn TimeSource>) -> Rc<Self> {
        Rc::new(Self {
            clock,
            queue: RefCell::new(Vec::new()),
            next_seq: Cell::new(0),
            last_now: Cell::new(i64::MIN),
        })
    }

    pub fn clock(&self) -> &Rc<dyn TimeSource> {
        &self.clock
    }

    /// Current time on the looper's clock
    pub fn now_millis(&self) -> Result<i64, ClockError> {
        let now = self.clock.epoch_millis()?;
        self.observe(now);
        Ok(now)
    }

    /// Latest time observed, for scheduling when the clock cannot be read
    pub fn last_known_millis(&self) -> i64 {
        self.last_now.get()
    }

    fn observe(&self, now: i64) {
        if now > self.last_now.get() {
            self.last_now.set(now);
        }
    }

    fn post_at(&self, target: Rc<dyn HandleMessage>, what: u32, when: i64) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.queue.borrow_mut().push(Message { when, seq, what, target });
    }

    fn remove(&self, target: &Rc<dyn HandleMessage>, what: u32) {
        self.queue
            .borrow_mut()
            .retain(|m| !(m.what == what && Rc::ptr_eq(&m.target, target)));
    }

    fn contains(&self, target: &Rc<dyn HandleMessage>, what: u32) -> bool {
        self.queue
            .borrow()
            .iter()
            .any(|m| m.what == what && Rc::ptr_eq(&m.target, target))
    }

    /// Number of pending messages
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Earliest pending deadline in epoch milliseconds
    pub fn next_deadline(&self) -> Option<i64> {
        self.queue.borrow().iter().map(|m| m.when).min()
    }

    /// Deliver every message due at or before `now`, in (deadline, post order).
    /// Messages posted by handlers are eligible in the same pass if already due.
    /// Returns the number delivered.
    pub fn dispatch_due(&self, now: i64) -> usize {
        self.observe(now);
        let mut delivered = 0;
        while let Some(message) = self.pop_due(now) {
            // Queue borrow is released before the handler runs
            message.target.handle_message(message.what);
            delivered += 1;
        }
        delivered
    }

    fn pop_due(&self, now: i64) -> Option<Message> {
        let mut queue = self.queue.borrow_mut();
        let idx = queue
            .iter()
            .enumerate()
            .filter(|(_, m)| m.when <= now)
            .min_by_key(|(_, m)| (m.when, m.seq))
            .map(|(i, _)| i)?;
        Some(queue.remove(idx))
    }
}

/// Posts messages for one target onto a looper
#[derive(Clone)]
pub struct Handler {
    looper: Rc<Looper>,
    target: Rc<dyn HandleMessage>,
}

impl Handler {
    pub fn new(looper: Rc<Looper>, target: Rc<dyn HandleMessage>) -> Self {
        Self { looper, target }
    }

    pub fn looper(&self) -> &Rc<Looper> {
        &self.looper
    }

    /// Post a message due now
    pub fn send_empty_message(&self, what: u32) {
        self.send_empty_message_delayed(what, 0);
    }

    /// Post a message due `delay_ms` from now. If the clock cannot be read the
    /// delay counts from the last time the looper saw.
    pub fn send_empty_message_delayed(&self, what: u32, delay_ms: i64) {
        let now = match self.looper.now_millis() {
            Ok(now) => now,
            Err(err) => {
                log::warn!("clock unavailable while scheduling message {}: {}", what, err);
                self.looper.last_known_millis()
            }
        };
        self.looper.post_at(self.target.clone(), what, now.saturating_add(delay_ms.max(0)));
    }

    /// Drop pending messages of kind `what` for this target
    pub fn remove_messages(&self, what: u32) {
        self.looper.remove(&self.target, what);
    }

    pub fn has_messages(&self, what: u32) -> bool {
        self.looper.contains(&self.target, what)
    }
}
