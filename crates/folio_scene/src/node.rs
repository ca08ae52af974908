//! Scene nodes and their content

use folio_core::geometry::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use smallvec::SmallVec;

new_key_type! {
    /// Handle to a node in a [`SceneGraph`](crate::graph::SceneGraph)
    pub struct NodeId;
    /// Handle to a filter in a [`SceneGraph`](crate::graph::SceneGraph)
    pub struct FilterId;
}

/// How a texture is sampled outside its bounds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    #[default]
    Clamp,
    Repeat,
}

/// A named, loaded image
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Texture {
    pub name: String,
    pub size: Size,
    pub wrap: WrapMode,
}

impl Texture {
    pub fn new(name: impl Into<String>, size: Size) -> Self {
        Self {
            name: name.into(),
            size,
            wrap: WrapMode::Clamp,
        }
    }

    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }
}

/// Local transform of a node
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Transform {
    pub position: Point,
    pub scale: Point,
    /// Radians
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            scale: Point::new(1.0, 1.0),
            rotation: 0.0,
        }
    }
}

/// A textured quad
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sprite {
    pub texture: Texture,
    /// Display width (texture width by default)
    pub width: f32,
    pub height: f32,
    /// Normalized anchor point, `(0.5, 0.5)` centers the sprite on its position
    pub anchor: Point,
}

impl Sprite {
    pub fn new(texture: Texture) -> Self {
        Self {
            width: texture.size.width,
            height: texture.size.height,
            texture,
            anchor: Point::ZERO,
        }
    }

    pub fn with_anchor(mut self, anchor: Point) -> Self {
        self.anchor = anchor;
        self
    }
}

/// A texture repeated over an area
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TilingSprite {
    pub texture: Texture,
    pub width: f32,
    pub height: f32,
    pub tile_position: Point,
    pub tile_scale: Point,
}

impl TilingSprite {
    pub fn new(texture: Texture, width: f32, height: f32) -> Self {
        Self {
            texture,
            width,
            height,
            tile_position: Point::ZERO,
            tile_scale: Point::new(1.0, 1.0),
        }
    }
}

/// Text style options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f32,
    /// Line height multiplier
    pub line_height: f32,
    pub letter_spacing: f32,
    pub fill: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 26.0,
            line_height: 1.2,
            letter_spacing: 0.0,
            fill: "#000000".to_string(),
        }
    }
}

/// A run of styled text
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Text {
    pub content: String,
    pub style: TextStyle,
    /// Measured size at the style's font size
    pub natural: Size,
    pub width: f32,
    pub height: f32,
    pub anchor: Point,
}

impl Text {
    pub fn new(content: impl Into<String>, style: TextStyle, natural: Size) -> Self {
        Self {
            content: content.into(),
            style,
            natural,
            width: natural.width,
            height: natural.height,
            anchor: Point::ZERO,
        }
    }
}

/// A video frame source
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Video {
    pub source: String,
    /// Intrinsic frame size, known once the video can play
    pub natural: Size,
    pub width: f32,
    pub height: f32,
    pub anchor: Point,
    pub muted: bool,
    pub playing: bool,
}

impl Video {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            natural: Size::ZERO,
            width: 0.0,
            height: 0.0,
            anchor: Point::ZERO,
            muted: true,
            playing: false,
        }
    }
}

/// What a node draws
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Content {
    /// Groups children, draws nothing itself
    #[default]
    Container,
    Sprite(Sprite),
    TilingSprite(TilingSprite),
    Text(Text),
    Video(Video),
}

impl Content {
    /// Display size of drawable content
    pub fn size(&self) -> Option<Size> {
        match self {
            Content::Container => None,
            Content::Sprite(sprite) => Some(Size::new(sprite.width, sprite.height)),
            Content::TilingSprite(tiling) => Some(Size::new(tiling.width, tiling.height)),
            Content::Text(text) => Some(Size::new(text.width, text.height)),
            Content::Video(video) => Some(Size::new(video.width, video.height)),
        }
    }

    pub fn anchor(&self) -> Point {
        match self {
            Content::Sprite(sprite) => sprite.anchor,
            Content::Text(text) => text.anchor,
            Content::Video(video) => video.anchor,
            Content::Container | Content::TilingSprite(_) => Point::ZERO,
        }
    }

    /// Set the display size. Returns false for containers.
    pub fn set_size(&mut self, width: Option<f32>, height: Option<f32>) -> bool {
        let (w, h) = match self {
            Content::Container => return false,
            Content::Sprite(sprite) => (&mut sprite.width, &mut sprite.height),
            Content::TilingSprite(tiling) => (&mut tiling.width, &mut tiling.height),
            Content::Text(text) => (&mut text.width, &mut text.height),
            Content::Video(video) => (&mut video.width, &mut video.height),
        };
        if let Some(width) = width {
            *w = width;
        }
        if let Some(height) = height {
            *h = height;
        }
        true
    }

    pub fn set_anchor(&mut self, anchor: Point) {
        match self {
            Content::Sprite(sprite) => sprite.anchor = anchor,
            Content::Text(text) => text.anchor = anchor,
            Content::Video(video) => video.anchor = anchor,
            Content::Container | Content::TilingSprite(_) => {}
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Content::Container => "container",
            Content::Sprite(_) => "sprite",
            Content::TilingSprite(_) => "tiling_sprite",
            Content::Text(_) => "text",
            Content::Video(_) => "video",
        }
    }
}

/// A node in the scene graph
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    pub transform: Transform,
    pub alpha: f32,
    pub visible: bool,
    pub z_index: i32,
    pub content: Content,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) filters: SmallVec<[FilterId; 4]>,
}

impl Node {
    pub fn new(content: Content) -> Self {
        Self {
            name: None,
            transform: Transform::default(),
            alpha: 1.0,
            visible: true,
            z_index: 0,
            content,
            parent: None,
            children: Vec::new(),
            filters: SmallVec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Filters applied to this node, outermost first
    pub fn filters(&self) -> &[FilterId] {
        &self.filters
    }

    pub fn position(&self) -> Point {
        self.transform.position
    }

    /// Axis-aligned box of this node's own content in parent space
    ///
    /// Rotation is ignored.
    pub fn content_rect(&self) -> Option<Rect> {
        let size = self.content.size()?;
        let anchor = self.content.anchor();
        let scale = self.transform.scale;
        let width = size.width * scale.x;
        let height = size.height * scale.y;
        Some(Rect::new(
            self.transform.position.x - anchor.x * width,
            self.transform.position.y - anchor.y * height,
            width,
            height,
        ))
    }
}
