//! One-shot readiness signals
//!
//! A [`OneShot`] is resolved (or rejected) exactly once by its producer and can
//! be awaited by any number of consumers through [`Wait`] futures. Completing a
//! signal twice is a programmer error and is reported as
//! [`CoreError::AlreadyCompleted`].
//!
//! Signals that never resolve are silent hangs. To make them visible in tests,
//! every signal tracks how many polled futures are still parked on it:
//! [`OneShot::is_starved`] is true while somebody waits on an incomplete signal.
//!
//! ```rust
//! use folio_core::signal::OneShot;
//!
//! let ready = OneShot::<u32>::new("ready");
//! let wait = ready.wait();
//! ready.resolve(7).unwrap();
//! assert_eq!(pollster::block_on(wait), Ok(7));
//! assert!(ready.resolve(8).is_err());
//! ```

use crate::error::{CoreError, Result};
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

enum SignalState<T> {
    Pending,
    Resolved(T),
    Rejected(String),
}

struct SignalInner<T> {
    label: String,
    state: SignalState<T>,
    /// One waker per parked future, keyed by waiter id
    wakers: Vec<(u64, Waker)>,
    next_waiter: u64,
    parked: usize,
}

/// A single-resolution signal shared between one producer and many consumers
pub struct OneShot<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> Clone for OneShot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone> OneShot<T> {
    /// Create a pending signal. The label shows up in errors and logs.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                label: label.into(),
                state: SignalState::Pending,
                wakers: Vec::new(),
                next_waiter: 0,
                parked: 0,
            })),
        }
    }

    pub fn label(&self) -> String {
        self.inner.borrow().label.clone()
    }

    /// Resolve the signal, waking every parked consumer
    pub fn resolve(&self, value: T) -> Result<()> {
        self.complete(SignalState::Resolved(value))
    }

    /// Reject the signal, waking every parked consumer with an error
    pub fn reject(&self, reason: impl Into<String>) -> Result<()> {
        self.complete(SignalState::Rejected(reason.into()))
    }

    fn complete(&self, state: SignalState<T>) -> Result<()> {
        let wakers = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.state, SignalState::Pending) {
                tracing::warn!("signal '{}' completed twice", inner.label);
                return Err(CoreError::AlreadyCompleted(inner.label.clone()));
            }
            inner.state = state;
            std::mem::take(&mut inner.wakers)
        };

        for (_, waker) in wakers {
            waker.wake();
        }
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        !matches!(self.inner.borrow().state, SignalState::Pending)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.inner.borrow().state, SignalState::Resolved(_))
    }

    /// The resolved value, if any
    pub fn value(&self) -> Option<T> {
        match &self.inner.borrow().state {
            SignalState::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Number of futures that were polled and are still parked on this signal
    pub fn waiter_count(&self) -> usize {
        self.inner.borrow().parked
    }

    /// True while at least one consumer waits on a signal nobody has completed
    pub fn is_starved(&self) -> bool {
        !self.is_completed() && self.waiter_count() > 0
    }

    /// A future resolving with the signal's value
    pub fn wait(&self) -> Wait<T> {
        Wait {
            inner: Rc::clone(&self.inner),
            waiter: None,
        }
    }
}

/// Future returned by [`OneShot::wait`]
pub struct Wait<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
    /// Set while parked
    waiter: Option<u64>,
}

impl<T: Clone> Future for Wait<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut inner = this.inner.borrow_mut();

        let output = match &inner.state {
            SignalState::Resolved(value) => Some(Ok(value.clone())),
            SignalState::Rejected(reason) => Some(Err(CoreError::Rejected {
                label: inner.label.clone(),
                reason: reason.clone(),
            })),
            SignalState::Pending => None,
        };

        let Some(output) = output else {
            let waiter = match this.waiter {
                Some(waiter) => waiter,
                None => {
                    let waiter = inner.next_waiter;
                    inner.next_waiter += 1;
                    inner.parked += 1;
                    this.waiter = Some(waiter);
                    waiter
                }
            };
            match inner.wakers.iter().position(|(id, _)| *id == waiter) {
                Some(index) => {
                    let stored = &mut inner.wakers[index].1;
                    if !stored.will_wake(cx.waker()) {
                        *stored = cx.waker().clone();
                    }
                }
                None => inner.wakers.push((waiter, cx.waker().clone())),
            }
            return Poll::Pending;
        };

        if this.waiter.take().is_some() {
            inner.parked -= 1;
        }
        Poll::Ready(output)
    }
}

impl<T> Drop for Wait<T> {
    fn drop(&mut self) {
        if let Some(waiter) = self.waiter.take() {
            if let Ok(mut inner) = self.inner.try_borrow_mut() {
                inner.parked = inner.parked.saturating_sub(1);
                inner.wakers.retain(|(id, _)| *id != waiter);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::task::Wake;

    struct NoopWaker;

    impl Wake for NoopWaker {
        fn wake(self: Arc<Self>) {}
    }

    fn poll_once<F: Future + Unpin>(future: &mut F) -> Poll<F::Output> {
        let waker = Waker::from(Arc::new(NoopWaker));
        let mut cx = Context::from_waker(&waker);
        Pin::new(future).poll(&mut cx)
    }

    #[test]
    fn test_resolve_then_wait() {
        let signal = OneShot::new("ready");
        signal.resolve(3u8).unwrap();
        assert_eq!(pollster::block_on(signal.wait()), Ok(3));
        assert_eq!(signal.value(), Some(3));
    }

    #[test]
    fn test_double_resolve_fails() {
        let signal = OneShot::new("ready");
        signal.resolve(()).unwrap();
        assert_eq!(
            signal.resolve(()),
            Err(CoreError::AlreadyCompleted("ready".to_string()))
        );
        assert!(signal.reject("late").is_err());
    }

    #[test]
    fn test_starvation_is_detectable() {
        let signal = OneShot::<()>::new("extra");
        let mut wait = signal.wait();

        assert!(!signal.is_starved());
        assert!(poll_once(&mut wait).is_pending());
        assert!(signal.is_starved());
        assert_eq!(signal.waiter_count(), 1);

        // Re-polling doesn't double count
        assert!(poll_once(&mut wait).is_pending());
        assert_eq!(signal.waiter_count(), 1);

        signal.resolve(()).unwrap();
        assert_eq!(poll_once(&mut wait), Poll::Ready(Ok(())));
        assert_eq!(signal.waiter_count(), 0);
    }

    #[test]
    fn test_repolling_keeps_one_waker() {
        let signal = OneShot::<()>::new("extra");
        let mut first = signal.wait();
        let mut second = signal.wait();
        let waker = Waker::from(Arc::new(NoopWaker));
        let mut cx = Context::from_waker(&waker);

        for _ in 0..10 {
            assert!(Pin::new(&mut first).poll(&mut cx).is_pending());
        }
        assert!(poll_once(&mut second).is_pending());
        assert!(poll_once(&mut second).is_pending());
        assert_eq!(signal.inner.borrow().wakers.len(), 2);

        drop(second);
        assert_eq!(signal.inner.borrow().wakers.len(), 1);
        assert_eq!(signal.waiter_count(), 1);

        signal.resolve(()).unwrap();
        assert!(signal.inner.borrow().wakers.is_empty());
        assert_eq!(Pin::new(&mut first).poll(&mut cx), Poll::Ready(Ok(())));
    }

    #[test]
    fn test_dropped_waiter_is_unparked() {
        let signal = OneShot::<()>::new("extra");
        {
            let mut wait = signal.wait();
            let _ = poll_once(&mut wait);
            assert_eq!(signal.waiter_count(), 1);
        }
        assert_eq!(signal.waiter_count(), 0);
    }

    #[test]
    fn test_reject_propagates() {
        let signal = OneShot::<()>::new("video");
        signal.reject("decode failed").unwrap();
        let result = pollster::block_on(signal.wait());
        assert!(matches!(result, Err(CoreError::Rejected { .. })));
    }
}
