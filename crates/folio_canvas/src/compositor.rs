//! Per-frame driver
//!
//! One [`Compositor::frame`] call is one animation frame:
//!
//! 1. coalesced viewport changes re-measure the scroller
//! 2. the scroll engine advances and translates its container element
//! 3. every element state is refreshed in one batch
//! 4. surfaces re-sync after a resize, then render their containers
//! 5. tweens write the frame's property values into the scene

use crate::container::Container;
use crate::context::FolioContext;
use crate::delegator::{CanvasDelegatorService, ContainerRef};
use crate::error::Result;
use crate::surface::Surface;
use folio_core::geometry::Size;
use folio_core::stream::Audited;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Duration of one frame at 60 fps, the unit of `delta`
pub const FRAME_TIME: Duration = Duration::from_micros(16_667);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositorConfig {
    /// Audit window for viewport resizes
    pub viewport_audit: Duration,
    /// Upper bound for `delta` after a stall
    pub max_delta: f32,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            viewport_audit: Duration::from_millis(100),
            max_delta: 4.0,
        }
    }
}

/// What one frame did
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FrameStats {
    pub frame: u64,
    pub delta: f32,
    pub resized: bool,
    pub scrolling: bool,
    pub containers: usize,
    pub tweens: usize,
    pub nodes: usize,
}

pub struct Compositor {
    ctx: FolioContext,
    config: CompositorConfig,
    delegators: CanvasDelegatorService,
    viewport_changes: Audited<Size>,
    last_frame: Option<Duration>,
    frame: u64,
}

impl Compositor {
    pub fn new(ctx: FolioContext, config: CompositorConfig) -> Self {
        Self {
            viewport_changes: ctx.viewport.changed(config.viewport_audit),
            ctx,
            config,
            delegators: CanvasDelegatorService::new(),
            last_frame: None,
            frame: 0,
        }
    }

    pub fn ctx(&self) -> &FolioContext {
        &self.ctx
    }

    pub fn delegators(&self) -> &CanvasDelegatorService {
        &self.delegators
    }

    pub fn delegators_mut(&mut self) -> &mut CanvasDelegatorService {
        &mut self.delegators
    }

    /// Create and register a [`Surface`] named `name`
    pub fn add_surface(&mut self, name: &str) -> Result<Rc<RefCell<Surface>>> {
        let surface = Rc::new(RefCell::new(Surface::new(self.ctx.clone(), name)?));
        self.delegators.register(surface.clone())?;
        Ok(surface)
    }

    /// Route `container` to the delegator `name`, returning the shared handle
    pub fn add_container(&mut self, name: &str, container: Container) -> Result<ContainerRef> {
        let container = Rc::new(RefCell::new(container));
        self.delegators.add_container(name, [Rc::clone(&container)])?;
        Ok(container)
    }

    pub fn remove_container(&mut self, name: &str, container: &ContainerRef) -> Result<bool> {
        self.delegators.remove_container(name, container)
    }

    /// Refresh element bounds and re-layout every container
    pub fn sync(&self, update_viewport: bool) {
        self.ctx.states.update();
        self.delegators.sync_all(update_viewport);
    }

    /// Frame-time multiplier for a frame at `now`, 1.0 for the first frame
    fn delta(&self, now: Duration) -> f32 {
        match self.last_frame {
            Some(last) => {
                let elapsed = now.saturating_sub(last).as_secs_f32();
                (elapsed / FRAME_TIME.as_secs_f32()).clamp(0.0, self.config.max_delta)
            }
            None => 1.0,
        }
    }

    /// Run one animation frame
    pub fn frame(&mut self) -> FrameStats {
        let now = self.ctx.now();
        let delta = self.delta(now);
        self.last_frame = Some(now);
        self.frame += 1;

        let resized = self.viewport_changes.poll(now).is_some();
        if resized {
            self.ctx.scroller.update();
        }
        let scrolling = self.ctx.scroller.tick();
        self.ctx.states.update();

        if resized {
            self.delegators.sync_all(true);
        }
        self.delegators.render_all(delta);
        self.ctx.tweens.tick(&mut *self.ctx.scene.borrow_mut());

        let stats = FrameStats {
            frame: self.frame,
            delta,
            resized,
            scrolling,
            containers: self.delegators.container_count(),
            tweens: self.ctx.tweens.active_count(),
            nodes: self.ctx.scene.borrow().node_count(),
        };
        tracing::trace!(?stats, "frame");
        stats
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("frame", &self.frame)
            .field("delegators", &self.delegators)
            .field("ctx", &self.ctx)
            .finish()
    }
}
