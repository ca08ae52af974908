//! Alpha fades

use super::{Behavior, ExtraHandle, ExtraKind, ExtraType};
use crate::context::FolioContext;
use folio_animation::{Easing, Tween, TweenId};
use folio_scene::{NodeId, NodeProperty, Property, SceneGraph, SceneTweenHandle};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityConfig {
    /// Zero writes the alpha immediately
    pub duration: Duration,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(1500),
        }
    }
}

/// Fades its target in on activate and out on deactivate. Starts visible.
pub struct Visibility {
    target: NodeId,
    scene: Rc<RefCell<SceneGraph>>,
    tweens: SceneTweenHandle,
    visible: bool,
    fade: Option<TweenId>,
}

impl Visibility {
    fn fade_to(&mut self, alpha: f32, duration: Duration) {
        self.tweens.stop_slot(&mut self.fade);

        if duration.is_zero() {
            if let Some(node) = self.scene.borrow_mut().node_mut(self.target) {
                node.alpha = alpha;
            }
            return;
        }

        let alpha_key = Property::node(self.target, NodeProperty::Alpha);
        self.fade = self
            .tweens
            .start(Tween::new(duration, Easing::QuadOut).to(alpha_key, alpha));
    }
}

impl ExtraType for Visibility {
    const KIND: ExtraKind = ExtraKind::Visibility;

    type Config = VisibilityConfig;

    fn new(target: NodeId, ctx: &FolioContext) -> Self {
        Self {
            target,
            scene: Rc::clone(&ctx.scene),
            tweens: ctx.tween_handle(),
            visible: true,
            fade: None,
        }
    }

    fn is_active(&self) -> bool {
        self.visible
    }

    fn activate(&mut self, config: &VisibilityConfig) {
        if !self.visible {
            self.visible = true;
            self.fade_to(1.0, config.duration);
        }
    }

    fn deactivate(&mut self, config: &VisibilityConfig) {
        if self.visible {
            self.visible = false;
            self.fade_to(0.0, config.duration);
        }
    }

    impl_behavior_variant!(Visibility);
}
