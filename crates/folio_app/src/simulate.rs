//! Headless page simulation
//!
//! Builds a small portfolio page (background, cursor, titles, a cover image
//! and a reel video over a 4000px scrolling `main`), replays scripted input on
//! a manual clock and reports the resulting scene graph.

use crate::config::FolioConfig;
use crate::navigation::{NavigationService, SectionScroller};
use crate::preloader::PreloaderService;
use anyhow::{Context, Result};
use folio_canvas::prelude::*;
use folio_canvas::FRAME_TIME;
use folio_core::geometry::{Point, Rect, Size};
use folio_core::time::{ManualClock, SharedClock};
use folio_layout::{Document, ElementId, ElementState, InputDevice};
use folio_scene::{FsResourceLoader, Manifest, MemoryResourceLoader, NodeSnapshot, ResourceEntry};
use serde::Serialize;
use std::rc::Rc;
use std::time::Duration;

const PAGE_HEIGHT: f32 = 4000.0;
const SECTION_SCROLL: Duration = Duration::from_millis(1200);

/// Natural size reported once the reel's metadata is "loaded"
const REEL_SIZE: Size = Size::new(1280.0, 720.0);

/// One scripted input
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Frames(u32),
    /// Wheel delta in pixels
    Scroll(f32),
    Pointer(Point),
    Press,
    Release,
    /// Ask navigation to scroll to a named section
    Section(String),
    Resize(Size),
}

#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub frames: u64,
    pub scroll: Point,
    pub loaded: bool,
    pub active_sections: Vec<String>,
    pub ready_containers: usize,
    pub last_frame: Option<FrameStats>,
    pub scene: NodeSnapshot,
}

struct Section {
    name: &'static str,
    state: Rc<ElementState>,
}

pub struct Simulation {
    clock: ManualClock,
    ctx: FolioContext,
    compositor: Compositor,
    navigation: NavigationService,
    preloader: PreloaderService,
    section_scroller: SectionScroller,
    sections: Vec<Section>,
    reel: ContainerRef,
    last_frame: Option<FrameStats>,
    // Keeps the host page alive for element handles
    _doc: Document,
}

impl Simulation {
    pub fn new(config: &FolioConfig) -> Result<Self> {
        let clock = ManualClock::new();
        let shared: SharedClock = Rc::new(clock.clone());
        let viewport = config.viewport_size();
        let ctx = FolioContext::new(shared.clone(), viewport)
            .with_scroller_config(config.scroller_config())
            .with_surface_available(config.surface.available);

        load_resources(&ctx, config)?;
        let preloader = PreloaderService::new();
        preloader.poll_resources(&ctx.resources);

        let doc = Document::new(viewport);
        let main = doc
            .create(doc.body().id(), "main", Rect::new(0.0, 0.0, viewport.width, PAGE_HEIGHT))
            .context("Failed to create the page")?
            .id();
        ctx.scroller.set_root_element(doc.body().into_ref());

        let mut compositor = Compositor::new(ctx.clone(), config.compositor_config());
        compositor.add_surface("main")?;

        let navigation = NavigationService::new(shared);
        let mut section_scroller = SectionScroller::new(&navigation, Rc::clone(&ctx.scroller), SECTION_SCROLL);
        let mut sections = Vec::new();
        for (name, y, height) in [("intro", 0.0, 800.0), ("work", 1000.0, 1600.0), ("contact", 3000.0, 1000.0)] {
            let element = doc.create(main, "section", Rect::new(0.0, y, viewport.width, height))?;
            let state = ctx.states.create(element.into_ref());
            state.update();
            section_scroller.add_section(name, Rc::clone(&state), true);
            sections.push(Section { name, state });
        }

        let element = |parent: ElementId, frame: Rect| -> Result<_> {
            let element = doc.create(parent, "div", frame)?;
            Ok(element.into_ref())
        };
        let add = |compositor: &mut Compositor, container: Container| compositor.add_container("main", container);

        add(&mut compositor, Container::new_background(ctx.clone(), BackgroundConfig::default()))?;
        add(&mut compositor, Container::new_cursor(ctx.clone(), config.cursor_config()))?;
        add(
            &mut compositor,
            Container::new_text(
                ctx.clone(),
                element(main, Rect::new(120.0, 280.0, 800.0, 160.0))?,
                "Folio",
                TextConfig::default(),
            ),
        )?;
        add(
            &mut compositor,
            Container::new_image(
                ctx.clone(),
                element(main, Rect::new(120.0, 1100.0, 1040.0, 585.0))?,
                "work.cover",
                ImageConfig::default(),
            ),
        )?;
        let reel = add(
            &mut compositor,
            Container::new_video(
                ctx.clone(),
                element(main, Rect::new(120.0, 1800.0, 1040.0, 585.0))?,
                "/videos/reel.mp4",
                VideoConfig {
                    auto_play: true,
                    ..Default::default()
                },
            ),
        )?;
        add(
            &mut compositor,
            Container::new_text(
                ctx.clone(),
                element(main, Rect::new(120.0, 3200.0, 800.0, 120.0))?,
                "Contact",
                TextConfig {
                    center_horizontal: true,
                    ..Default::default()
                },
            ),
        )?;

        Ok(Self {
            clock,
            ctx,
            compositor,
            navigation,
            preloader,
            section_scroller,
            sections,
            reel,
            last_frame: None,
            _doc: doc,
        })
    }

    pub fn ctx(&self) -> &FolioContext {
        &self.ctx
    }

    pub fn navigation(&self) -> &NavigationService {
        &self.navigation
    }

    pub fn preloader(&self) -> &PreloaderService {
        &self.preloader
    }

    /// Advance the clock by one frame and run it
    pub fn frame(&mut self) -> FrameStats {
        self.clock.advance(FRAME_TIME);
        self.section_scroller.poll();
        let stats = self.compositor.frame();

        if !self.reel_ready() {
            if let Some(video) = self.reel.borrow_mut().video_mut() {
                video.can_play(REEL_SIZE);
            }
        }
        self.update_sections();
        self.last_frame = Some(stats);
        stats
    }

    fn reel_ready(&self) -> bool {
        self.reel
            .borrow()
            .video()
            .map_or(true, |video| video.is_set_up())
    }

    fn update_sections(&self) {
        let scroll = self.ctx.scroller.position();
        let viewport = self.ctx.viewport.size();
        for section in &self.sections {
            let visible = section.state.in_viewport(scroll, viewport, Point::ZERO);
            self.navigation.enable_section(section.name, visible);
        }
    }

    pub fn apply(&mut self, step: &Step) {
        match step {
            Step::Frames(count) => {
                for _ in 0..*count {
                    self.frame();
                }
            }
            Step::Scroll(delta) => self.ctx.scroller.input(InputDevice::Wheel, Point::new(0.0, *delta)),
            Step::Pointer(position) => self.ctx.pointer.move_to(*position),
            Step::Press => self.ctx.pointer.press(),
            Step::Release => self.ctx.pointer.release(),
            Step::Section(name) => self.navigation.request_section_scroll(name),
            Step::Resize(size) => self.ctx.viewport.resize(*size),
        }
    }

    pub fn run(&mut self, script: &[Step]) -> SimulationReport {
        for step in script {
            tracing::debug!(?step, "simulate");
            self.apply(step);
        }
        self.report()
    }

    pub fn report(&self) -> SimulationReport {
        let surface = self
            .compositor
            .delegators()
            .containers("main")
            .unwrap_or_default();
        SimulationReport {
            frames: self.compositor.frame_count(),
            scroll: self.ctx.scroller.position(),
            loaded: self.preloader.is_loaded(),
            active_sections: self.navigation.active_sections(),
            ready_containers: surface.iter().filter(|c| c.borrow().is_ready()).count(),
            last_frame: self.last_frame,
            scene: self.ctx.scene.borrow().snapshot(),
        }
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("compositor", &self.compositor)
            .field("preloader", &self.preloader)
            .finish()
    }
}

/// Images every demo container asks for
pub fn demo_manifest() -> Manifest {
    Manifest::new(vec![
        ResourceEntry::image("main.background", "/images/background.png"),
        ResourceEntry::image("cursor.outer", "/images/cursor-outer.png"),
        ResourceEntry::image("cursor.inner", "/images/cursor-inner.png"),
        ResourceEntry::image("work.cover", "/images/work-cover.jpg"),
    ])
}

fn load_resources(ctx: &FolioContext, config: &FolioConfig) -> Result<()> {
    match &config.resources.manifest {
        Some(path) => {
            let manifest = Manifest::from_path(path)
                .with_context(|| format!("Failed to read manifest {}", path.display()))?;
            let root = path.parent().map(|dir| dir.to_path_buf()).unwrap_or_default();
            ctx.resources
                .load(&manifest, &FsResourceLoader::new(root))
                .context("Failed to load resources")?;
        }
        None => {
            let loader = MemoryResourceLoader::new()
                .with("main.background", Size::new(256.0, 256.0))
                .with("cursor.outer", Size::new(140.0, 140.0))
                .with("cursor.inner", Size::new(16.0, 16.0))
                .with("work.cover", Size::new(1600.0, 900.0));
            ctx.resources
                .load(&demo_manifest(), &loader)
                .context("Failed to load demo resources")?;
        }
    }
    tracing::info!("loaded {} resources", ctx.resources.len());
    Ok(())
}
