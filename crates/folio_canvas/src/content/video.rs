//! A muted looping video laid over a host element
//!
//! The video node exists from `init`, but it only joins the scene once the
//! source reports it can play ([`RelatedVideo::can_play`]). Setup then finishes
//! on the next `sync` or `render`: the frame size becomes known, the extras are
//! enabled and [`RelatedVideo::ready`] resolves.

use super::{ContainerHooks, Stretch};
use crate::container::ContainerCore;
use crate::context::FolioContext;
use crate::error::Result;
use crate::extras::{ExtraKind, Visibility, VisibilityConfig};
use folio_core::geometry::{Point, Size};
use folio_core::signal::{OneShot, Wait};
use folio_scene::{Content, NodeId, Video};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub hidden: bool,
    pub scale: f32,
    pub auto_play: bool,
    /// Z-index override
    pub index: Option<i32>,
    pub stretch: Stretch,
    pub center_horizontal: bool,
    pub center_vertical: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            hidden: false,
            scale: 1.0,
            auto_play: false,
            index: None,
            stretch: Stretch::None,
            center_horizontal: false,
            center_vertical: false,
        }
    }
}

pub struct RelatedVideo {
    ctx: FolioContext,
    source: String,
    config: VideoConfig,
    sprite: Option<NodeId>,
    natural: Option<Size>,
    set_up: bool,
    video_ready: OneShot<()>,
    pending_play: Option<bool>,
}

impl RelatedVideo {
    pub fn new(ctx: FolioContext, source: impl Into<String>, config: VideoConfig) -> Self {
        let source = source.into();
        Self {
            video_ready: OneShot::new(format!("video '{}'", source)),
            ctx,
            source,
            config,
            sprite: None,
            natural: None,
            set_up: false,
            pending_play: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn sprite(&self) -> Option<NodeId> {
        self.sprite
    }

    /// The source can play and reports its frame size
    pub fn can_play(&mut self, natural: Size) {
        if self.natural.is_none() {
            tracing::debug!("video '{}' can play at {}x{}", self.source, natural.width, natural.height);
            self.natural = Some(natural);
        }
    }

    /// Resolves once the video is in the scene with its extras enabled
    pub fn ready(&self) -> Wait<()> {
        self.video_ready.wait()
    }

    pub fn is_set_up(&self) -> bool {
        self.set_up
    }

    pub fn play(&mut self) {
        self.set_playing(true);
    }

    pub fn pause(&mut self) {
        self.set_playing(false);
    }

    pub fn is_playing(&self) -> bool {
        let Some(sprite) = self.sprite else {
            return false;
        };
        matches!(
            self.ctx.scene.borrow().node(sprite).map(|node| &node.content),
            Some(Content::Video(video)) if video.playing
        )
    }

    fn set_playing(&mut self, playing: bool) {
        if !self.set_up {
            self.pending_play = Some(playing);
            return;
        }
        let Some(sprite) = self.sprite else {
            return;
        };
        if let Some(Content::Video(video)) = self
            .ctx
            .scene
            .borrow_mut()
            .node_mut(sprite)
            .map(|node| &mut node.content)
        {
            video.playing = playing;
        }
    }

    fn finish_setup(&mut self, core: &mut ContainerCore) -> Result<()> {
        let (Some(sprite), Some(natural), false) = (self.sprite, self.natural, self.set_up) else {
            return Ok(());
        };
        let node = core.require_node("video setup")?;

        if self.config.hidden {
            core.toggle::<Visibility>(
                false,
                VisibilityConfig {
                    duration: Duration::ZERO,
                },
            );
        }

        {
            let mut scene = self.ctx.scene.borrow_mut();
            if let Content::Video(video) = &mut scene.get_mut(sprite)?.content {
                video.natural = natural;
            }
            scene.add_child(node, sprite)?;
        }
        self.set_up = true;
        self.layout(core)?;

        core.enable_extras(
            sprite,
            &[
                ExtraKind::Displacement,
                ExtraKind::Visibility,
                ExtraKind::MouseTwist,
                ExtraKind::MouseMotion,
            ],
        );
        core.enable_extras(node, &[ExtraKind::Parallax]);

        if let Err(err) = self.video_ready.resolve(()) {
            tracing::warn!("{}", err);
        }
        let play = self.pending_play.take().unwrap_or(self.config.auto_play);
        self.set_playing(play);
        tracing::debug!("video '{}' set up", self.source);
        Ok(())
    }

    fn layout(&mut self, core: &ContainerCore) -> Result<()> {
        let (Some(sprite), Some(natural), true) = (self.sprite, self.natural, self.set_up) else {
            return Ok(());
        };
        let bounds = core.size();
        let config = self.config;
        let ratio = config.stretch.ratio(bounds, natural) * config.scale;
        let size = Size::new(natural.width * ratio, natural.height * ratio);

        // Centered axes overflow evenly on both sides of the element
        let mut position = Point::ZERO;
        if config.center_horizontal {
            position.x = bounds.width * 0.5 - size.width * 0.5;
        }
        if config.center_vertical {
            position.y = bounds.height * 0.5 - size.height * 0.5;
        }

        let mut scene = self.ctx.scene.borrow_mut();
        let node = scene.get_mut(sprite)?;
        node.content.set_size(Some(size.width), Some(size.height));
        node.content.set_anchor(Point::ZERO);
        node.transform.position = position;
        Ok(())
    }
}

impl ContainerHooks for RelatedVideo {
    fn z_index(&self) -> i32 {
        self.config.index.unwrap_or(1)
    }

    fn init(&mut self, core: &mut ContainerCore) -> Result<()> {
        core.require_node("init")?;
        let sprite = self
            .ctx
            .scene
            .borrow_mut()
            .create_named("video", Content::Video(Video::new(self.source.clone())));
        self.sprite = Some(sprite);
        Ok(())
    }

    fn sync(&mut self, core: &mut ContainerCore) -> Result<()> {
        self.finish_setup(core)?;
        self.layout(core)
    }

    fn render(&mut self, core: &mut ContainerCore, _delta: f32) -> Result<()> {
        self.finish_setup(core)
    }

    fn destroy(&mut self, _core: &mut ContainerCore) {
        if !self.video_ready.is_completed() {
            if let Err(err) = self.video_ready.reject("destroyed before it could play") {
                tracing::warn!("{}", err);
            }
        }
        // Not yet in the container's subtree, so nothing else removes it
        if let (Some(sprite), false) = (self.sprite, self.set_up) {
            if let Err(err) = self.ctx.scene.borrow_mut().destroy(sprite) {
                tracing::warn!("{}", err);
            }
        }
    }
}
