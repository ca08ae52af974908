//! Containers: one scene node, its content and its extras
//!
//! A container moves through **Unbound → Initializing → Ready → Destroyed**.
//! [`Container::bind`] assigns the scene node and resolves
//! [`Container::initialized`]; [`Container::init`] builds the content once and
//! resolves [`Container::ready`]. `sync` and `render` are only valid on a ready
//! container and turn into silent no-ops after [`Container::destroy`].
//!
//! Containers tied to a host element track its bounds through an
//! [`ElementState`]: every `sync` and `render` moves the container node to the
//! element's client rect before the content runs.

use crate::content::{
    BackgroundConfig, ContainerHooks, CursorConfig, ImageConfig, MainBackground, MainCursor,
    RelatedImage, RelatedText, RelatedVideo, TextConfig, VideoConfig,
};
use crate::context::FolioContext;
use crate::error::{CanvasError, Result};
use crate::extras::{Behavior, ExtraKind, ExtraRegistry, ExtraType, ExtraWait};
use folio_core::geometry::{Point, Size};
use folio_core::signal::{OneShot, Wait};
use folio_layout::{ElementRef, ElementState};
use folio_scene::NodeId;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// No scene node yet
    Unbound,
    /// Node bound, `init()` not finished
    Initializing,
    Ready,
    Destroyed,
}

/// Lifecycle state shared by every content type
pub struct ContainerCore {
    ctx: FolioContext,
    node: Option<NodeId>,
    z_index: i32,
    viewport_size: Size,
    binding: Option<Rc<ElementState>>,
    position: Point,
    size: Size,
    extras: ExtraRegistry,
    lifecycle: Lifecycle,
    initialized: OneShot<NodeId>,
    ready: OneShot<()>,
}

impl ContainerCore {
    fn new(ctx: FolioContext, element: Option<ElementRef>, z_index: i32) -> Self {
        let binding = element.map(|element| ctx.states.create(element));
        Self {
            viewport_size: ctx.viewport.size(),
            ctx,
            node: None,
            z_index,
            binding,
            position: Point::ZERO,
            size: Size::ZERO,
            extras: ExtraRegistry::new(),
            lifecycle: Lifecycle::Unbound,
            initialized: OneShot::new("container initialized"),
            ready: OneShot::new("container ready"),
        }
    }

    /// The bound node, or `NotReady(hook)` before `bind()`
    pub fn require_node(&self, hook: &'static str) -> Result<NodeId> {
        self.node.ok_or(CanvasError::NotReady(hook))
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Size of the bound element's client rect
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    pub fn element_state(&self) -> Option<&Rc<ElementState>> {
        self.binding.as_ref()
    }

    /// Build and register one extra per kind, all bound to `target`
    pub fn enable_extras(&mut self, target: NodeId, kinds: &[ExtraKind]) {
        for &kind in kinds {
            self.extras.register(Behavior::build(kind, target, &self.ctx));
        }
    }

    pub fn extras(&self) -> &ExtraRegistry {
        &self.extras
    }

    pub fn extras_mut(&mut self) -> &mut ExtraRegistry {
        &mut self.extras
    }

    pub fn toggle<E: ExtraType>(&mut self, enabled: bool, config: E::Config) {
        self.extras.toggle::<E>(enabled, config);
    }

    pub fn extra<E: ExtraType>(&mut self) -> ExtraWait<E> {
        self.extras.extra::<E>()
    }

    /// Move the node to the bound element's client rect
    fn update_bounds(&mut self) -> Result<()> {
        let (Some(state), Some(node)) = (&self.binding, self.node) else {
            return Ok(());
        };
        let bounds = state.bounds();
        self.position = bounds.origin();
        self.size = bounds.size();

        let mut scene = self.ctx.scene.borrow_mut();
        scene.get_mut(node)?.transform.position = self.position;
        Ok(())
    }
}

impl std::fmt::Debug for ContainerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerCore")
            .field("node", &self.node)
            .field("lifecycle", &self.lifecycle)
            .field("z_index", &self.z_index)
            .field("position", &self.position)
            .field("size", &self.size)
            .field("extras", &self.extras)
            .finish()
    }
}

/// What a container draws
pub enum ContainerContent {
    Background(MainBackground),
    Cursor(MainCursor),
    Image(RelatedImage),
    Text(RelatedText),
    Video(RelatedVideo),
}

impl ContainerContent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ContainerContent::Background(_) => "background",
            ContainerContent::Cursor(_) => "cursor",
            ContainerContent::Image(_) => "image",
            ContainerContent::Text(_) => "text",
            ContainerContent::Video(_) => "video",
        }
    }

    fn hooks(&mut self) -> &mut dyn ContainerHooks {
        match self {
            ContainerContent::Background(content) => content,
            ContainerContent::Cursor(content) => content,
            ContainerContent::Image(content) => content,
            ContainerContent::Text(content) => content,
            ContainerContent::Video(content) => content,
        }
    }
}

pub struct Container {
    core: ContainerCore,
    content: ContainerContent,
}

impl Container {
    fn new(ctx: FolioContext, element: Option<ElementRef>, mut content: ContainerContent) -> Self {
        let z_index = content.hooks().z_index();
        Self {
            core: ContainerCore::new(ctx, element, z_index),
            content,
        }
    }

    /// Full-viewport background
    pub fn new_background(ctx: FolioContext, config: BackgroundConfig) -> Self {
        let content = ContainerContent::Background(MainBackground::new(ctx.clone(), config));
        Self::new(ctx, None, content)
    }

    /// The page cursor
    pub fn new_cursor(ctx: FolioContext, config: CursorConfig) -> Self {
        let content = ContainerContent::Cursor(MainCursor::new(ctx.clone(), config));
        Self::new(ctx, None, content)
    }

    /// An image resource over `element`
    pub fn new_image(
        ctx: FolioContext,
        element: ElementRef,
        resource: impl Into<String>,
        config: ImageConfig,
    ) -> Self {
        let content = ContainerContent::Image(RelatedImage::new(ctx.clone(), resource, config));
        Self::new(ctx, Some(element), content)
    }

    /// Text over `element`
    pub fn new_text(
        ctx: FolioContext,
        element: ElementRef,
        text: impl Into<String>,
        config: TextConfig,
    ) -> Self {
        let content = ContainerContent::Text(RelatedText::new(ctx.clone(), text, config));
        Self::new(ctx, Some(element), content)
    }

    /// A video source over `element`
    pub fn new_video(
        ctx: FolioContext,
        element: ElementRef,
        source: impl Into<String>,
        config: VideoConfig,
    ) -> Self {
        let content = ContainerContent::Video(RelatedVideo::new(ctx.clone(), source, config));
        Self::new(ctx, Some(element), content)
    }

    /// Assign the scene node
    pub fn bind(&mut self, node: NodeId) -> Result<()> {
        if self.core.node.is_some() {
            return Err(CanvasError::AlreadyBound);
        }
        self.core.ctx.scene.borrow_mut().get_mut(node)?.z_index = self.core.z_index;
        self.core.node = Some(node);
        self.core.lifecycle = Lifecycle::Initializing;
        tracing::debug!("{} container bound to {:?}", self.kind_name(), node);

        if let Err(err) = self.core.initialized.resolve(node) {
            tracing::warn!("{}", err);
        }
        Ok(())
    }

    /// One-time scene construction
    ///
    /// A failure leaves the container initializing and `ready` pending.
    pub fn init(&mut self) -> Result<()> {
        match self.core.lifecycle {
            Lifecycle::Unbound => return Err(CanvasError::NotReady("init")),
            Lifecycle::Ready => {
                tracing::warn!("{} container is already initialized", self.kind_name());
                return Ok(());
            }
            Lifecycle::Destroyed => return Ok(()),
            Lifecycle::Initializing => {}
        }

        if let Some(state) = &self.core.binding {
            state.update();
        }
        self.core.update_bounds()?;
        self.content.hooks().init(&mut self.core)?;

        self.core.lifecycle = Lifecycle::Ready;
        if let Err(err) = self.core.ready.resolve(()) {
            tracing::warn!("{}", err);
        }
        tracing::debug!("{} container ready", self.kind_name());
        Ok(())
    }

    /// Recompute layout from the current element bounds and viewport
    pub fn sync(&mut self) -> Result<()> {
        if !self.check_ready("sync")? {
            return Ok(());
        }
        self.core.update_bounds()?;
        self.content.hooks().sync(&mut self.core)
    }

    /// Per-frame work; `delta` is 1.0 at 60 fps
    pub fn render(&mut self, delta: f32) -> Result<()> {
        if !self.check_ready("render")? {
            return Ok(());
        }
        self.core.update_bounds()?;
        self.content.hooks().render(&mut self.core, delta)?;
        self.core.extras.render_all(delta);
        Ok(())
    }

    /// Tear down the content, the extras and the scene node
    pub fn destroy(&mut self) {
        if self.core.lifecycle == Lifecycle::Destroyed {
            return;
        }
        self.content.hooks().destroy(&mut self.core);
        self.core.extras.clear();

        if let Some(state) = self.core.binding.take() {
            self.core.ctx.states.release(state);
        }
        if let Some(node) = self.core.node {
            let mut scene = self.core.ctx.scene.borrow_mut();
            if scene.contains(node) {
                if let Err(err) = scene.destroy(node) {
                    tracing::warn!("{}", err);
                }
            }
        }
        reject_pending(&self.core.initialized);
        reject_pending(&self.core.ready);

        self.core.lifecycle = Lifecycle::Destroyed;
        tracing::debug!("{} container destroyed", self.kind_name());
    }

    /// Ok(false) after destroy, `NotReady` before init
    fn check_ready(&self, hook: &'static str) -> Result<bool> {
        match self.core.lifecycle {
            Lifecycle::Ready => Ok(true),
            Lifecycle::Destroyed => Ok(false),
            Lifecycle::Unbound | Lifecycle::Initializing => Err(CanvasError::NotReady(hook)),
        }
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.core.viewport_size = size;
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.core.lifecycle
    }

    pub fn is_ready(&self) -> bool {
        self.core.lifecycle == Lifecycle::Ready
    }

    /// Resolves with the node on `bind()`
    pub fn initialized(&self) -> Wait<NodeId> {
        self.core.initialized.wait()
    }

    /// Resolves when `init()` succeeds
    pub fn ready(&self) -> Wait<()> {
        self.core.ready.wait()
    }

    pub fn node(&self) -> Option<NodeId> {
        self.core.node
    }

    pub fn z_index(&self) -> i32 {
        self.core.z_index
    }

    pub fn size(&self) -> Size {
        self.core.size
    }

    pub fn position(&self) -> Point {
        self.core.position
    }

    pub fn element_state(&self) -> Option<&Rc<ElementState>> {
        self.core.element_state()
    }

    pub fn kind_name(&self) -> &'static str {
        self.content.kind_name()
    }

    pub fn content(&self) -> &ContainerContent {
        &self.content
    }

    pub fn extras(&self) -> &ExtraRegistry {
        &self.core.extras
    }

    pub fn extras_mut(&mut self) -> &mut ExtraRegistry {
        &mut self.core.extras
    }

    /// Toggle `E` now, or as soon as the content registers it
    pub fn toggle<E: ExtraType>(&mut self, enabled: bool, config: E::Config) {
        self.core.toggle::<E>(enabled, config);
    }

    pub fn extra<E: ExtraType>(&mut self) -> ExtraWait<E> {
        self.core.extra::<E>()
    }

    pub fn background(&self) -> Option<&MainBackground> {
        match &self.content {
            ContainerContent::Background(background) => Some(background),
            _ => None,
        }
    }

    pub fn cursor(&self) -> Option<&MainCursor> {
        match &self.content {
            ContainerContent::Cursor(cursor) => Some(cursor),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&RelatedImage> {
        match &self.content {
            ContainerContent::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn image_mut(&mut self) -> Option<&mut RelatedImage> {
        match &mut self.content {
            ContainerContent::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&RelatedText> {
        match &self.content {
            ContainerContent::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn video(&self) -> Option<&RelatedVideo> {
        match &self.content {
            ContainerContent::Video(video) => Some(video),
            _ => None,
        }
    }

    pub fn video_mut(&mut self) -> Option<&mut RelatedVideo> {
        match &mut self.content {
            ContainerContent::Video(video) => Some(video),
            _ => None,
        }
    }
}

/// Waiters on a signal that can no longer resolve get an error instead of hanging
fn reject_pending<T: Clone>(signal: &OneShot<T>) {
    if signal.is_completed() {
        return;
    }
    if let Err(err) = signal.reject("container destroyed") {
        tracing::warn!("{}", err);
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("kind", &self.kind_name())
            .field("core", &self.core)
            .finish()
    }
}
