//! Displacement map distortion

use super::{Behavior, ExtraHandle, ExtraKind, ExtraType};
use crate::context::FolioContext;
use folio_animation::{Easing, Tween, TweenId};
use folio_core::geometry::{Point, Size};
use folio_scene::{
    Content, Filter, FilterId, FilterProperty, NodeId, Property, ResourceProvider, SceneGraph,
    SceneTweenHandle, Sprite, Texture, WrapMode,
};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::f32::consts::TAU;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct DisplacementConfig {
    pub scale_x: f32,
    pub scale_y: f32,
    /// Resource name of the displacement map
    pub sprite: String,
    pub scale_duration: Duration,
    /// Radians per frame
    pub rotation_speed: f32,
    pub move_speed_x: f32,
    pub move_speed_y: f32,
}

impl Default for DisplacementConfig {
    fn default() -> Self {
        Self {
            scale_x: 15.0,
            scale_y: 15.0,
            sprite: "displacement.clouds".to_string(),
            scale_duration: Duration::from_millis(500),
            rotation_speed: 0.0,
            move_speed_x: 0.0,
            move_speed_y: 0.0,
        }
    }
}

/// Distorts its target through a repeating map sprite
///
/// The map sprite and filter are created on first activation and kept; later
/// activations only tween the filter scale back up.
pub struct Displacement {
    target: NodeId,
    scene: Rc<RefCell<SceneGraph>>,
    resources: Rc<ResourceProvider>,
    tweens: SceneTweenHandle,
    config: DisplacementConfig,
    active: bool,
    renderable: bool,
    sprite: Option<NodeId>,
    filter: Option<FilterId>,
    animations: SmallVec<[TweenId; 2]>,
}

impl Displacement {
    fn kill_tweens(&mut self) {
        for id in self.animations.drain(..) {
            self.tweens.stop(id);
        }
    }

    fn tween_scale(&mut self, x: f32, y: f32, duration: Duration, easing: Easing) {
        let Some(filter) = self.filter else {
            return;
        };
        let tween = Tween::new(duration, easing)
            .to(Property::filter(filter, FilterProperty::X), x)
            .to(Property::filter(filter, FilterProperty::Y), y);
        self.animations.extend(self.tweens.start(tween));
    }

    fn map_texture(&self, name: &str) -> Texture {
        let texture = match self.resources.texture(name) {
            Ok(texture) => texture,
            Err(err) => {
                tracing::warn!("displacement map unavailable: {}", err);
                Texture::new(name, Size::ZERO)
            }
        };
        texture.with_wrap(WrapMode::Repeat)
    }

    fn ensure_filter(&mut self, scene: &mut SceneGraph) {
        let sprite = match self.sprite {
            Some(sprite) => sprite,
            None => {
                let texture = self.map_texture(&self.config.sprite);
                let sprite = Sprite::new(texture).with_anchor(Point::new(1.0, 1.0));
                let sprite = scene.create_named("displacement.map", Content::Sprite(sprite));
                self.sprite = Some(sprite);
                sprite
            }
        };

        if self.filter.is_none() {
            match scene.add_filter(self.target, Filter::displacement(sprite, Point::ZERO)) {
                Ok(filter) => self.filter = Some(filter),
                Err(err) => tracing::warn!("can't attach displacement filter: {}", err),
            }
        }

        if let Err(err) = scene.add_child(self.target, sprite) {
            tracing::warn!("can't attach displacement map: {}", err);
        }
    }

    /// Tween the filter scale, replacing any running scale tween
    pub fn scale_filter(&mut self, x: f32, y: f32, duration: Duration, easing: Easing) {
        if self.filter.is_some() {
            self.kill_tweens();
            self.tween_scale(x, y, duration, easing);
        }
    }

    pub fn sprite(&self) -> Option<NodeId> {
        self.sprite
    }

    pub fn filter(&self) -> Option<FilterId> {
        self.filter
    }
}

impl ExtraType for Displacement {
    const KIND: ExtraKind = ExtraKind::Displacement;

    type Config = DisplacementConfig;

    fn new(target: NodeId, ctx: &FolioContext) -> Self {
        Self {
            target,
            scene: Rc::clone(&ctx.scene),
            resources: Rc::clone(&ctx.resources),
            tweens: ctx.tween_handle(),
            config: DisplacementConfig::default(),
            active: false,
            renderable: false,
            sprite: None,
            filter: None,
            animations: SmallVec::new(),
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self, config: &DisplacementConfig) {
        if self.active {
            return;
        }
        self.kill_tweens();
        self.active = true;
        self.renderable = true;
        self.config = config.clone();

        let scene = Rc::clone(&self.scene);
        self.ensure_filter(&mut scene.borrow_mut());
        self.tween_scale(
            config.scale_x,
            config.scale_y,
            config.scale_duration,
            Easing::CubicOut,
        );
    }

    fn deactivate(&mut self, config: &DisplacementConfig) {
        if self.filter.is_none() || !self.active {
            return;
        }
        self.kill_tweens();
        self.active = false;
        self.tween_scale(0.0, 0.0, config.scale_duration, Easing::CubicOut);
    }

    fn render(&mut self, delta: f32) {
        let (Some(sprite), true) = (self.sprite, self.renderable) else {
            return;
        };
        let config = &self.config;
        let mut scene = self.scene.borrow_mut();
        let Some(node) = scene.node_mut(sprite) else {
            return;
        };
        let size = node.content.size().unwrap_or(Size::ZERO);
        let transform = &mut node.transform;

        if config.rotation_speed != 0.0 {
            transform.rotation = (transform.rotation + config.rotation_speed * delta) % TAU;
        }
        if config.move_speed_x != 0.0 && size.width > 0.0 {
            transform.position.x = (transform.position.x + config.move_speed_x * delta) % size.width;
        }
        if config.move_speed_y != 0.0 && size.height > 0.0 {
            transform.position.y = (transform.position.y + config.move_speed_y * delta) % size.height;
        }
    }

    impl_behavior_variant!(Displacement);
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_animation::PropertyTarget;
    use folio_core::time::ManualClock;
    use folio_scene::{FilterKind, Resource};

    fn setup() -> (ManualClock, FolioContext, NodeId) {
        let clock = ManualClock::new();
        let ctx = FolioContext::new(Rc::new(clock.clone()), Size::new(800.0, 600.0));
        ctx.resources.insert(Resource {
            name: "displacement.clouds".to_string(),
            path: "/images/clouds.png".to_string(),
            size: Size::new(512.0, 512.0),
            canvas: true,
        });
        let node = {
            let mut scene = ctx.scene.borrow_mut();
            let node = scene.create(Content::Container);
            let root = scene.root();
            scene.add_child(root, node).unwrap();
            node
        };
        (clock, ctx, node)
    }

    fn scale(ctx: &FolioContext, filter: FilterId) -> Point {
        let scene = ctx.scene.borrow();
        Point::new(
            scene.read(Property::filter(filter, FilterProperty::X)).unwrap(),
            scene.read(Property::filter(filter, FilterProperty::Y)).unwrap(),
        )
    }

    #[test]
    fn test_activation_is_idempotent() {
        let (_, ctx, node) = setup();
        let mut displacement = Displacement::new(node, &ctx);
        let config = DisplacementConfig::default();

        displacement.activate(&config);
        let sprite = displacement.sprite().unwrap();
        displacement.activate(&config);

        assert_eq!(displacement.sprite(), Some(sprite));
        assert_eq!(ctx.scene.borrow().filters_of(node).len(), 1);
        assert_eq!(ctx.scene.borrow().children(node), &[sprite]);
        assert_eq!(ctx.tweens.active_count(), 1);
    }

    #[test]
    fn test_scale_tweens_in_and_out() {
        let (clock, ctx, node) = setup();
        let mut displacement = Displacement::new(node, &ctx);
        let config = DisplacementConfig::default();

        displacement.activate(&config);
        let filter = displacement.filter().unwrap();
        clock.advance_ms(500);
        ctx.tweens.tick(&mut *ctx.scene.borrow_mut());
        assert_eq!(scale(&ctx, filter), Point::new(15.0, 15.0));

        displacement.deactivate(&config);
        clock.advance_ms(500);
        ctx.tweens.tick(&mut *ctx.scene.borrow_mut());
        assert_eq!(scale(&ctx, filter), Point::ZERO);
        assert!(!displacement.is_active());
    }

    #[test]
    fn test_map_sprite_repeats_and_anchors_bottom_right() {
        let (_, ctx, node) = setup();
        let mut displacement = Displacement::new(node, &ctx);
        displacement.activate(&DisplacementConfig::default());

        let scene = ctx.scene.borrow();
        let sprite = scene.node(displacement.sprite().unwrap()).unwrap();
        match &sprite.content {
            Content::Sprite(sprite) => {
                assert_eq!(sprite.texture.wrap, WrapMode::Repeat);
                assert_eq!(sprite.anchor, Point::new(1.0, 1.0));
            }
            other => panic!("unexpected content {:?}", other),
        }
        let filter = scene.filter(displacement.filter().unwrap()).unwrap();
        assert!(matches!(filter.kind, FilterKind::Displacement { .. }));
    }

    #[test]
    fn test_render_drifts_map() {
        let (_, ctx, node) = setup();
        let mut displacement = Displacement::new(node, &ctx);
        displacement.activate(&DisplacementConfig {
            move_speed_x: 100.0,
            rotation_speed: 0.5,
            ..Default::default()
        });

        for _ in 0..6 {
            displacement.render(1.0);
        }
        let scene = ctx.scene.borrow();
        let sprite = scene.node(displacement.sprite().unwrap()).unwrap();
        // 600 wraps at the map width
        assert_eq!(sprite.transform.position.x, 88.0);
        assert!((sprite.transform.rotation - (3.0 % TAU)).abs() < 1e-5);
    }

    #[test]
    fn test_scale_filter_replaces_running_tween() {
        let (clock, ctx, node) = setup();
        let mut displacement = Displacement::new(node, &ctx);
        displacement.activate(&DisplacementConfig::default());
        displacement.scale_filter(40.0, 10.0, Duration::from_millis(200), Easing::Linear);
        assert_eq!(ctx.tweens.active_count(), 1);

        clock.advance_ms(200);
        ctx.tweens.tick(&mut *ctx.scene.borrow_mut());
        assert_eq!(scale(&ctx, displacement.filter().unwrap()), Point::new(40.0, 10.0));
    }
}
