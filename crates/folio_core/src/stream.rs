//! Single-threaded multicast streams
//!
//! A [`Subject`] fans every value out to per-subscriber queues. Consumers pull
//! from their [`Subscription`] during the frame tick instead of being called
//! back, so producers never re-enter consumer code.
//!
//! Each queued value is stamped with the producer clock's time, which lets
//! time-based operators ([`Audited`]) run after the fact without timers.
//!
//! ```rust
//! use folio_core::stream::Subject;
//! use folio_core::time::{ManualClock, SharedClock};
//! use std::rc::Rc;
//!
//! let clock: SharedClock = Rc::new(ManualClock::new());
//! let size = Subject::behavior(clock, 10);
//! let late = size.subscribe();
//! assert_eq!(late.try_next(), Some(10)); // replays the current value
//! ```

use crate::time::{Audit, SharedClock};
use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;

new_key_type! {
    /// Handle to a registered subscriber queue
    pub struct SubscriberId;
}

type Queue<T> = VecDeque<(Duration, T)>;

struct SubjectInner<T> {
    clock: SharedClock,
    latest: Option<T>,
    replay: bool,
    completed: bool,
    queues: SlotMap<SubscriberId, Queue<T>>,
}

/// A multicast stream with one producer and any number of pull subscribers
pub struct Subject<T> {
    inner: Rc<RefCell<SubjectInner<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Subject<T> {
    /// A plain subject: subscribers only see values pushed after subscribing
    pub fn new(clock: SharedClock) -> Self {
        Self::with_state(clock, None, false)
    }

    /// A behaviour subject: holds a current value and replays it to new subscribers
    pub fn behavior(clock: SharedClock, initial: T) -> Self {
        Self::with_state(clock, Some(initial), true)
    }

    fn with_state(clock: SharedClock, latest: Option<T>, replay: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SubjectInner {
                clock,
                latest,
                replay,
                completed: false,
                queues: SlotMap::with_key(),
            })),
        }
    }

    /// Publish a value to every subscriber
    pub fn next(&self, value: T) {
        let mut inner = self.inner.borrow_mut();
        if inner.completed {
            return;
        }
        let now = inner.clock.now();
        for (_, queue) in inner.queues.iter_mut() {
            queue.push_back((now, value.clone()));
        }
        inner.latest = Some(value);
    }

    /// The most recently published value
    pub fn value(&self) -> Option<T> {
        self.inner.borrow().latest.clone()
    }

    /// Stop accepting values. Queued values stay readable.
    pub fn complete(&self) {
        self.inner.borrow_mut().completed = true;
    }

    pub fn is_completed(&self) -> bool {
        self.inner.borrow().completed
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().queues.len()
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let mut inner = self.inner.borrow_mut();
        let mut queue = VecDeque::new();
        if inner.replay {
            if let Some(latest) = inner.latest.clone() {
                queue.push_back((inner.clock.now(), latest));
            }
        }
        let id = inner.queues.insert(queue);
        Subscription {
            id,
            subject: Rc::downgrade(&self.inner),
            filter: None,
        }
    }
}

/// A subscriber's view of a [`Subject`]. Dropping it unsubscribes.
pub struct Subscription<T> {
    id: SubscriberId,
    subject: Weak<RefCell<SubjectInner<T>>>,
    filter: Option<Box<dyn Fn(&T) -> bool>>,
}

impl<T: Clone + 'static> Subscription<T> {
    /// Only yield values accepted by `predicate`
    pub fn filter(mut self, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(previous) => Box::new(move |value: &T| previous(value) && predicate(value)),
            None => Box::new(predicate),
        });
        self
    }

    /// Coalesce values through an audit window
    pub fn audit(self, window: Duration) -> Audited<T> {
        Audited {
            source: self,
            audit: Audit::new(window),
        }
    }

    fn accepts(&self, value: &T) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(value))
    }

    /// Pop the next queued value together with its publish time
    pub fn try_next_timed(&self) -> Option<(Duration, T)> {
        let subject = self.subject.upgrade()?;
        loop {
            let entry = subject.borrow_mut().queues.get_mut(self.id)?.pop_front()?;
            if self.accepts(&entry.1) {
                return Some(entry);
            }
        }
    }

    pub fn try_next(&self) -> Option<T> {
        self.try_next_timed().map(|(_, value)| value)
    }

    pub fn drain_timed(&self) -> Vec<(Duration, T)> {
        std::iter::from_fn(|| self.try_next_timed()).collect()
    }

    pub fn drain(&self) -> Vec<T> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Drain the queue, keeping only the newest value
    pub fn latest(&self) -> Option<T> {
        std::iter::from_fn(|| self.try_next()).last()
    }

    /// True once the subject has been dropped or completed and nothing is queued
    pub fn is_closed(&self) -> bool {
        match self.subject.upgrade() {
            None => true,
            Some(subject) => {
                let inner = subject.borrow();
                inner.completed && inner.queues.get(self.id).map_or(true, VecDeque::is_empty)
            }
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(subject) = self.subject.upgrade() {
            if let Ok(mut inner) = subject.try_borrow_mut() {
                inner.queues.remove(self.id);
            }
        }
    }
}

/// A subscription filtered through an audit window
pub struct Audited<T> {
    source: Subscription<T>,
    audit: Audit<T>,
}

impl<T: Clone + 'static> Audited<T> {
    /// Replay queued values through the window and return the newest value
    /// whose window has closed by `now`
    pub fn poll(&mut self, now: Duration) -> Option<T> {
        let mut released = None;
        for (at, value) in self.source.drain_timed() {
            if let Some(value) = self.audit.poll(at) {
                released = Some(value);
            }
            self.audit.push(value, at);
        }
        if let Some(value) = self.audit.poll(now) {
            released = Some(value);
        }
        released
    }

    pub fn is_pending(&self) -> bool {
        self.audit.is_pending()
    }
}

/// Suppresses consecutive duplicates
#[derive(Debug, Clone, Default)]
pub struct Distinct<T> {
    last: Option<T>,
}

impl<T: Clone + PartialEq> Distinct<T> {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Returns the value if it differs from the previously accepted one
    pub fn accept(&mut self, value: T) -> Option<T> {
        if self.last.as_ref() == Some(&value) {
            return None;
        }
        self.last = Some(value.clone());
        Some(value)
    }

    pub fn last(&self) -> Option<&T> {
        self.last.as_ref()
    }
}
