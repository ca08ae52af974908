//! Full-viewport tiled background

use super::ContainerHooks;
use crate::container::ContainerCore;
use crate::context::FolioContext;
use crate::error::Result;
use folio_scene::{Content, Filter, FilterId, FilterKind, NodeId, TilingSprite};

/// Resource name of the default background texture
pub const BACKGROUND_TEXTURE: &str = "main.background";

#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundConfig {
    pub texture: String,
    /// Grain strength, 0 disables the noise filter
    pub noise: f32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            texture: BACKGROUND_TEXTURE.to_string(),
            noise: 0.06,
        }
    }
}

/// Tiles a texture over the viewport under animated grain
pub struct MainBackground {
    ctx: FolioContext,
    config: BackgroundConfig,
    sprite: Option<NodeId>,
    noise: Option<FilterId>,
}

impl MainBackground {
    pub fn new(ctx: FolioContext, config: BackgroundConfig) -> Self {
        Self {
            ctx,
            config,
            sprite: None,
            noise: None,
        }
    }

    pub fn sprite(&self) -> Option<NodeId> {
        self.sprite
    }

    pub fn noise_filter(&self) -> Option<FilterId> {
        self.noise
    }
}

impl ContainerHooks for MainBackground {
    fn z_index(&self) -> i32 {
        0
    }

    fn init(&mut self, core: &mut ContainerCore) -> Result<()> {
        let node = core.require_node("init")?;
        let texture = self.ctx.resources.texture(&self.config.texture)?;
        let viewport = core.viewport_size();

        let mut scene = self.ctx.scene.borrow_mut();
        let sprite = scene.create_named(
            "background.tiles",
            Content::TilingSprite(TilingSprite::new(texture, viewport.width, viewport.height)),
        );
        scene.add_child(node, sprite)?;
        self.sprite = Some(sprite);

        if self.config.noise > 0.0 && self.ctx.surface_available() {
            let filter = Filter::noise(self.config.noise, rand::random::<f32>());
            self.noise = Some(scene.add_filter(node, filter)?);
        }
        Ok(())
    }

    fn sync(&mut self, core: &mut ContainerCore) -> Result<()> {
        let Some(sprite) = self.sprite else {
            return Ok(());
        };
        let viewport = core.viewport_size();
        let mut scene = self.ctx.scene.borrow_mut();
        scene
            .get_mut(sprite)?
            .content
            .set_size(Some(viewport.width), Some(viewport.height));
        Ok(())
    }

    fn render(&mut self, _core: &mut ContainerCore, _delta: f32) -> Result<()> {
        let Some(noise) = self.noise else {
            return Ok(());
        };
        let mut scene = self.ctx.scene.borrow_mut();
        if let Some(FilterKind::Noise { seed, .. }) = scene.filter_mut(noise).map(|filter| &mut filter.kind) {
            *seed = rand::random::<f32>();
        }
        Ok(())
    }
}
