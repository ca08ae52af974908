//! Canvas text laid over a host element

use super::{ContainerHooks, Stretch};
use crate::container::ContainerCore;
use crate::context::FolioContext;
use crate::error::Result;
use crate::extras::ExtraKind;
use folio_core::geometry::{Point, Size};
use folio_scene::{Content, NodeId, Text, TextStyle};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub style: TextStyle,
    pub stretch: Stretch,
    pub center_horizontal: bool,
    pub center_vertical: bool,
    /// Anchor used on axes that aren't centered
    pub anchor: Point,
    /// Degrees
    pub rotation: f32,
    /// Z-index override
    pub index: Option<i32>,
}

/// Text with visibility, displacement and mouse-motion extras
pub struct RelatedText {
    ctx: FolioContext,
    content: String,
    config: TextConfig,
    text: Option<NodeId>,
    natural: Size,
}

impl RelatedText {
    pub fn new(ctx: FolioContext, content: impl Into<String>, config: TextConfig) -> Self {
        Self {
            ctx,
            content: content.into(),
            config,
            text: None,
            natural: Size::ZERO,
        }
    }

    pub fn text(&self) -> Option<NodeId> {
        self.text
    }

    /// Measured size at the configured font size
    pub fn natural_size(&self) -> Size {
        self.natural
    }
}

impl ContainerHooks for RelatedText {
    fn z_index(&self) -> i32 {
        self.config.index.unwrap_or(5)
    }

    fn init(&mut self, core: &mut ContainerCore) -> Result<()> {
        let node = core.require_node("init")?;
        let config = &self.config;
        self.natural = self.ctx.measurer.measure(&self.content, &config.style).size();

        let mut text = Text::new(self.content.clone(), config.style.clone(), self.natural);
        text.anchor = config.anchor;

        let text = {
            let mut scene = self.ctx.scene.borrow_mut();
            let text = scene.create_named("text", Content::Text(text));
            if config.rotation != 0.0 {
                scene.get_mut(text)?.transform.rotation = config.rotation.to_radians();
            }
            scene.add_child(node, text)?;
            text
        };
        self.text = Some(text);

        core.enable_extras(
            text,
            &[ExtraKind::Visibility, ExtraKind::Displacement, ExtraKind::MouseMotion],
        );
        Ok(())
    }

    fn sync(&mut self, core: &mut ContainerCore) -> Result<()> {
        let Some(text) = self.text else {
            return Ok(());
        };
        let bounds = core.size();
        let config = &self.config;
        let ratio = config.stretch.ratio(bounds, self.natural);

        let mut scene = self.ctx.scene.borrow_mut();
        let node = scene.get_mut(text)?;
        // Always from the natural size so repeated syncs don't compound
        node.content.set_size(
            Some(self.natural.width * ratio),
            Some(self.natural.height * ratio),
        );

        let mut anchor = config.anchor;
        let mut position = Point::ZERO;
        if config.center_horizontal {
            position.x = bounds.width * 0.5;
            anchor.x = 0.5;
        }
        if config.center_vertical {
            position.y = bounds.height * 0.5;
            anchor.y = 0.5;
        }
        node.transform.position = position;
        node.content.set_anchor(anchor);
        Ok(())
    }
}
