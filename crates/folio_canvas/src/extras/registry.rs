//! Per-container extra registry
//!
//! Extras are registered once per kind. Code that wants an extra before it is
//! registered either awaits [`ExtraRegistry::extra`] or queues a toggle with
//! [`ExtraRegistry::toggle`]; both are settled when the kind is registered.

use super::{Behavior, ExtraHandle, ExtraKind, ExtraType};
use crate::error::{CanvasError, Result};
use folio_core::signal::{OneShot, Wait};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

type QueuedToggle = Box<dyn FnOnce(&Behavior)>;

#[derive(Default)]
pub struct ExtraRegistry {
    extras: IndexMap<ExtraKind, Behavior>,
    waiters: FxHashMap<ExtraKind, OneShot<Behavior>>,
    queued: FxHashMap<ExtraKind, Vec<QueuedToggle>>,
}

impl ExtraRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extra, applying queued toggles and waking waiters
    ///
    /// Returns false (keeping the existing extra) if the kind is already registered.
    pub fn register(&mut self, behavior: Behavior) -> bool {
        let kind = behavior.kind();
        if self.extras.contains_key(&kind) {
            tracing::warn!("extra '{}' is already registered", kind);
            return false;
        }

        self.extras.insert(kind, behavior.clone());
        tracing::debug!("registered extra '{}'", kind);

        for toggle in self.queued.remove(&kind).unwrap_or_default() {
            toggle(&behavior);
        }
        if let Err(err) = self.signal(kind).resolve(behavior) {
            tracing::warn!("{}", err);
        }
        true
    }

    fn signal(&mut self, kind: ExtraKind) -> OneShot<Behavior> {
        self.waiters
            .entry(kind)
            .or_insert_with(|| OneShot::new(format!("extra '{}'", kind)))
            .clone()
    }

    /// Wait for the extra of type `E`
    pub fn extra<E: ExtraType>(&mut self) -> ExtraWait<E> {
        ExtraWait {
            wait: self.signal(E::KIND).wait(),
            _marker: PhantomData,
        }
    }

    /// The extra of type `E`, if registered
    pub fn get<E: ExtraType>(&self) -> Option<ExtraHandle<E>> {
        self.extras.get(&E::KIND).and_then(E::unwrap).cloned()
    }

    pub fn behavior(&self, kind: ExtraKind) -> Option<&Behavior> {
        self.extras.get(&kind)
    }

    /// Activate or deactivate `E` now, or as soon as it is registered
    pub fn toggle<E: ExtraType>(&mut self, enabled: bool, config: E::Config) {
        if let Some(handle) = self.get::<E>() {
            handle.toggle(enabled, &config);
            return;
        }

        tracing::trace!("queueing toggle of extra '{}'", E::KIND);
        self.queued
            .entry(E::KIND)
            .or_default()
            .push(Box::new(move |behavior: &Behavior| {
                if let Some(handle) = E::unwrap(behavior) {
                    handle.toggle(enabled, &config);
                }
            }));
    }

    pub fn contains(&self, kind: ExtraKind) -> bool {
        self.extras.contains_key(&kind)
    }

    /// Registered kinds in registration order
    pub fn kinds(&self) -> impl Iterator<Item = ExtraKind> + '_ {
        self.extras.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.extras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extras.is_empty()
    }

    /// Toggles waiting for `kind` to be registered
    pub fn queued_count(&self, kind: ExtraKind) -> usize {
        self.queued.get(&kind).map_or(0, Vec::len)
    }

    /// True if something is parked on an extra that was never registered
    pub fn is_starved(&self, kind: ExtraKind) -> bool {
        self.waiters.get(&kind).map_or(false, OneShot::is_starved)
    }

    /// Drop every extra and queued toggle, rejecting anyone still waiting
    pub fn clear(&mut self) {
        for (kind, signal) in self.waiters.drain() {
            if signal.is_completed() {
                continue;
            }
            if let Err(err) = signal.reject(format!("extra '{}' was never registered", kind)) {
                tracing::warn!("{}", err);
            }
        }
        self.queued.clear();
        self.extras.clear();
    }

    /// Drive every registered extra for one frame
    pub fn render_all(&self, delta: f32) {
        for behavior in self.extras.values() {
            behavior.render(delta);
        }
    }
}

impl std::fmt::Debug for ExtraRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtraRegistry")
            .field("extras", &self.extras.keys().collect::<Vec<_>>())
            .field("queued", &self.queued.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Future resolving to a typed extra once it is registered
pub struct ExtraWait<E> {
    wait: Wait<Behavior>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: ExtraType> Future for ExtraWait<E> {
    type Output = Result<ExtraHandle<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.wait).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(behavior)) => Poll::Ready(
                E::unwrap(&behavior)
                    .cloned()
                    .ok_or(CanvasError::ExtraMismatch(E::KIND)),
            ),
            Poll::Ready(Err(err)) => Poll::Ready(Err(err.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FolioContext;
    use crate::extras::{MouseMotion, MouseMotionConfig, Visibility, VisibilityConfig};
    use folio_core::geometry::Size;
    use folio_core::time::ManualClock;
    use folio_scene::Content;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::task::{Wake, Waker};
    use std::time::Duration;

    struct NoopWaker;

    impl Wake for NoopWaker {
        fn wake(self: Arc<Self>) {}
    }

    fn poll_once<F: Future + Unpin>(future: &mut F) -> Poll<F::Output> {
        let waker = Waker::from(Arc::new(NoopWaker));
        let mut cx = Context::from_waker(&waker);
        Pin::new(future).poll(&mut cx)
    }

    fn context() -> FolioContext {
        FolioContext::new(Rc::new(ManualClock::new()), Size::new(800.0, 600.0))
    }

    #[test]
    fn test_waiter_resolves_on_register() {
        let ctx = context();
        let node = ctx.scene.borrow_mut().create(Content::Container);
        let mut registry = ExtraRegistry::new();

        let mut wait = registry.extra::<Visibility>();
        assert!(poll_once(&mut wait).is_pending());
        assert!(registry.is_starved(ExtraKind::Visibility));

        registry.register(Behavior::build(ExtraKind::Visibility, node, &ctx));
        let handle = match poll_once(&mut wait) {
            Poll::Ready(Ok(handle)) => handle,
            other => panic!("expected a resolved extra, got {:?}", other.map(|r| r.is_ok())),
        };
        assert!(handle.ptr_eq(&registry.get::<Visibility>().unwrap()));
        assert!(!registry.is_starved(ExtraKind::Visibility));
    }

    #[test]
    fn test_duplicate_register_keeps_first() {
        let ctx = context();
        let node = ctx.scene.borrow_mut().create(Content::Container);
        let mut registry = ExtraRegistry::new();

        assert!(registry.register(Behavior::build(ExtraKind::Visibility, node, &ctx)));
        let first = registry.get::<Visibility>().unwrap();
        assert!(!registry.register(Behavior::build(ExtraKind::Visibility, node, &ctx)));
        assert!(first.ptr_eq(&registry.get::<Visibility>().unwrap()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_toggle_is_queued_until_register() {
        let ctx = context();
        let node = ctx.scene.borrow_mut().create(Content::Container);
        let mut registry = ExtraRegistry::new();

        registry.toggle::<Visibility>(
            false,
            VisibilityConfig {
                duration: Duration::ZERO,
            },
        );
        assert_eq!(registry.queued_count(ExtraKind::Visibility), 1);

        registry.register(Behavior::build(ExtraKind::Visibility, node, &ctx));
        assert_eq!(registry.queued_count(ExtraKind::Visibility), 0);
        assert!(!registry.get::<Visibility>().unwrap().is_active());
        assert_eq!(ctx.scene.borrow().node(node).unwrap().alpha, 0.0);
    }

    #[test]
    fn test_clear_rejects_waiters() {
        let ctx = context();
        let node = ctx.scene.borrow_mut().create(Content::Container);
        let mut registry = ExtraRegistry::new();
        registry.register(Behavior::build(ExtraKind::Visibility, node, &ctx));
        registry.toggle::<MouseMotion>(true, MouseMotionConfig::default());
        let mut wait = registry.extra::<MouseMotion>();
        assert!(poll_once(&mut wait).is_pending());

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.queued_count(ExtraKind::MouseMotion), 0);
        assert!(matches!(poll_once(&mut wait), Poll::Ready(Err(_))));
    }

    #[test]
    fn test_wait_after_register_is_ready() {
        let ctx = context();
        let node = ctx.scene.borrow_mut().create(Content::Container);
        let mut registry = ExtraRegistry::new();
        registry.register(Behavior::build(ExtraKind::Visibility, node, &ctx));

        let handle = pollster::block_on(registry.extra::<Visibility>()).unwrap();
        assert!(handle.is_active());
    }
}
