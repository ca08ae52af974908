//! An image laid over a host element

use super::{ContainerHooks, Stretch};
use crate::container::ContainerCore;
use crate::context::FolioContext;
use crate::error::Result;
use folio_animation::{Easing, Tween, TweenId};
use folio_core::geometry::{Point, Size};
use folio_scene::{Content, NodeId, NodeProperty, Property, SceneTweenHandle, Sprite};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Start fully transparent
    pub hidden: bool,
    /// Extra scale applied after stretching
    pub scale: f32,
    pub stretch: Stretch,
    pub center_horizontal: bool,
    pub center_vertical: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            hidden: false,
            scale: 1.0,
            stretch: Stretch::None,
            center_horizontal: false,
            center_vertical: false,
        }
    }
}

pub struct RelatedImage {
    ctx: FolioContext,
    tweens: SceneTweenHandle,
    resource: String,
    config: ImageConfig,
    sprite: Option<NodeId>,
    natural: Size,
    alpha_tween: Option<TweenId>,
    position_tween: Option<TweenId>,
}

impl RelatedImage {
    pub fn new(ctx: FolioContext, resource: impl Into<String>, config: ImageConfig) -> Self {
        Self {
            tweens: ctx.tween_handle(),
            ctx,
            resource: resource.into(),
            config,
            sprite: None,
            natural: Size::ZERO,
            alpha_tween: None,
            position_tween: None,
        }
    }

    pub fn sprite(&self) -> Option<NodeId> {
        self.sprite
    }

    /// Fade to transparent, instantly without a duration
    pub fn hide(&mut self, duration: Option<Duration>) {
        self.fade(0.0, duration);
    }

    pub fn show(&mut self, duration: Option<Duration>) {
        self.fade(1.0, duration);
    }

    /// Move the sprite inside the container
    pub fn set_position(&mut self, x: f32, y: f32, duration: Option<Duration>) {
        let Some(sprite) = self.sprite else {
            tracing::trace!("set_position before init ignored");
            return;
        };
        self.tweens.stop_slot(&mut self.position_tween);

        match duration.filter(|duration| !duration.is_zero()) {
            Some(duration) => {
                self.position_tween = self.tweens.start(
                    Tween::new(duration, Easing::QuadOut)
                        .to(Property::node(sprite, NodeProperty::X), x)
                        .to(Property::node(sprite, NodeProperty::Y), y),
                );
            }
            None => {
                if let Some(node) = self.ctx.scene.borrow_mut().node_mut(sprite) {
                    node.transform.position = Point::new(x, y);
                }
            }
        }
    }

    fn fade(&mut self, alpha: f32, duration: Option<Duration>) {
        let Some(sprite) = self.sprite else {
            return;
        };
        self.tweens.stop_slot(&mut self.alpha_tween);

        match duration.filter(|duration| !duration.is_zero()) {
            Some(duration) => {
                self.alpha_tween = self.tweens.start(
                    Tween::new(duration, Easing::QuadOut)
                        .to(Property::node(sprite, NodeProperty::Alpha), alpha),
                );
            }
            None => {
                if let Some(node) = self.ctx.scene.borrow_mut().node_mut(sprite) {
                    node.alpha = alpha;
                }
            }
        }
    }
}

impl ContainerHooks for RelatedImage {
    fn z_index(&self) -> i32 {
        2
    }

    fn init(&mut self, core: &mut ContainerCore) -> Result<()> {
        let node = core.require_node("init")?;
        let texture = self.ctx.resources.texture(&self.resource)?;
        self.natural = texture.size;

        let sprite = Sprite::new(texture).with_anchor(Point::new(0.5, 0.5));
        {
            let mut scene = self.ctx.scene.borrow_mut();
            let sprite = scene.create_named("image", Content::Sprite(sprite));
            scene.add_child(node, sprite)?;
            self.sprite = Some(sprite);
        }

        if self.config.hidden {
            self.hide(None);
        }
        Ok(())
    }

    fn sync(&mut self, core: &mut ContainerCore) -> Result<()> {
        let Some(sprite) = self.sprite else {
            return Ok(());
        };
        let bounds = core.size();
        let config = self.config;
        let ratio = config.stretch.ratio(bounds, self.natural) * config.scale;

        let mut scene = self.ctx.scene.borrow_mut();
        let node = scene.get_mut(sprite)?;
        node.content.set_size(
            Some(self.natural.width * ratio),
            Some(self.natural.height * ratio),
        );

        let (x, anchor_x) = if config.center_horizontal {
            (bounds.width * 0.5, 0.5)
        } else {
            (0.0, 0.0)
        };
        let (y, anchor_y) = if config.center_vertical {
            (bounds.height * 0.5, 0.5)
        } else {
            (0.0, 0.0)
        };
        node.transform.position = Point::new(x, y);
        node.content.set_anchor(Point::new(anchor_x, anchor_y));
        Ok(())
    }
}
