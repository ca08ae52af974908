//! Scroll-linked parallax

use super::{Behavior, ExtraHandle, ExtraKind, ExtraType};
use crate::context::FolioContext;
use folio_core::geometry::Axis;
use folio_core::stream::Subscription;
use folio_layout::{parallax, ScrollState, ScrollerService, ViewportProvider};
use folio_scene::{Content, NodeId, SceneGraph};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParallaxConfig {
    /// Pixels of travel relative to the page; negative moves against the scroll
    pub speed: f32,
    pub axis: Axis,
}

impl Default for ParallaxConfig {
    fn default() -> Self {
        Self {
            speed: 20.0,
            axis: Axis::Y,
        }
    }
}

/// Offsets its target's content while the target scrolls through the viewport
///
/// Activation moves the target's children into an inner wrapper node that the
/// parallax offset is applied to; deactivation moves them back.
pub struct Parallax {
    target: NodeId,
    scene: Rc<RefCell<SceneGraph>>,
    scroller: Rc<ScrollerService>,
    viewport: Rc<ViewportProvider>,
    config: ParallaxConfig,
    enabled: bool,
    wrapper: Option<NodeId>,
    scroll: Option<Subscription<ScrollState>>,
}

impl Parallax {
    pub fn wrapper(&self) -> Option<NodeId> {
        self.wrapper
    }

    fn apply(&self, wrapper: NodeId, state: &ScrollState) {
        let mut scene = self.scene.borrow_mut();
        let element_height = scene.bounds(wrapper).map_or(0.0, |bounds| bounds.height);
        // Client position plus scroll is the target's page position
        let element_y = scene.world_position(self.target).y + state.position.y;

        let translation = parallax(
            state.position.y,
            self.viewport.size().height,
            element_height,
            element_y,
            self.config.speed,
            self.config.axis,
        );
        if let Some(node) = scene.node_mut(wrapper) {
            node.transform.position = translation;
        }
    }
}

impl ExtraType for Parallax {
    const KIND: ExtraKind = ExtraKind::Parallax;

    type Config = ParallaxConfig;

    fn new(target: NodeId, ctx: &FolioContext) -> Self {
        Self {
            target,
            scene: Rc::clone(&ctx.scene),
            scroller: Rc::clone(&ctx.scroller),
            viewport: Rc::clone(&ctx.viewport),
            config: ParallaxConfig::default(),
            enabled: false,
            wrapper: None,
            scroll: None,
        }
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn activate(&mut self, config: &ParallaxConfig) {
        if self.enabled {
            return;
        }

        let mut scene = self.scene.borrow_mut();
        if !scene.contains(self.target) {
            tracing::warn!("parallax target {:?} is gone", self.target);
            return;
        }
        let wrapper = scene.create_named("parallax", Content::Container);
        let children = scene.take_children(self.target);
        let attached = scene.add_child(self.target, wrapper).and_then(|()| {
            children
                .into_iter()
                .try_for_each(|child| scene.add_child(wrapper, child))
        });
        if let Err(err) = attached {
            tracing::warn!("can't wrap parallax children: {}", err);
        }
        drop(scene);

        self.enabled = true;
        self.config = *config;
        self.wrapper = Some(wrapper);
        self.scroll = Some(self.scroller.scroll_animation());
    }

    fn deactivate(&mut self, _config: &ParallaxConfig) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.scroll = None;

        let Some(wrapper) = self.wrapper.take() else {
            return;
        };
        let mut scene = self.scene.borrow_mut();
        for child in scene.take_children(wrapper) {
            if let Err(err) = scene.add_child(self.target, child) {
                tracing::warn!("can't restore parallax child: {}", err);
            }
        }
        if let Err(err) = scene.destroy(wrapper) {
            tracing::warn!("can't remove parallax wrapper: {}", err);
        }
    }

    fn render(&mut self, _delta: f32) {
        let (Some(wrapper), true) = (self.wrapper, self.enabled) else {
            return;
        };
        let latest = self.scroll.as_ref().and_then(Subscription::latest);
        if let Some(state) = latest {
            self.apply(wrapper, &state);
        }
    }

    impl_behavior_variant!(Parallax);
}
