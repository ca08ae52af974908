//! Page-level scenarios across containers, extras, surfaces and the compositor

use crate::prelude::*;
use folio_core::geometry::{Point, Rect, Size};
use folio_core::time::ManualClock;
use folio_layout::{Document, ElementId, HostElement, InputDevice, ScrollerConfig};
use folio_scene::{NodeId, Resource};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::time::Duration;

struct NoopWaker;

impl Wake for NoopWaker {
    fn wake(self: Arc<Self>) {}
}

fn poll_once<F: Future + Unpin>(future: &mut F) -> Poll<F::Output> {
    let waker = Waker::from(Arc::new(NoopWaker));
    let mut cx = Context::from_waker(&waker);
    Pin::new(future).poll(&mut cx)
}

/// A 1280x800 page with a 5000px scrolling `main`
struct Page {
    clock: ManualClock,
    ctx: FolioContext,
    doc: Document,
    main: ElementId,
    compositor: Compositor,
}

impl Page {
    fn new() -> Self {
        let clock = ManualClock::new();
        let ctx = FolioContext::new(Rc::new(clock.clone()), Size::new(1280.0, 800.0))
            .with_scroller_config(ScrollerConfig {
                output_duration: Duration::ZERO,
                ..Default::default()
            });
        for (name, size) in [
            ("main.background", Size::new(256.0, 256.0)),
            ("cursor.outer", Size::new(64.0, 64.0)),
            ("cursor.inner", Size::new(64.0, 64.0)),
            ("work.cover", Size::new(1600.0, 900.0)),
        ] {
            ctx.resources.insert(Resource {
                name: name.to_string(),
                path: format!("/images/{}.png", name),
                size,
                canvas: true,
            });
        }

        let doc = Document::new(Size::new(1280.0, 800.0));
        let main = doc
            .create(doc.body().id(), "main", Rect::new(0.0, 0.0, 1280.0, 5000.0))
            .unwrap()
            .id();
        ctx.scroller.set_root_element(doc.body().into_ref());

        let mut compositor = Compositor::new(ctx.clone(), CompositorConfig::default());
        compositor.add_surface("main").unwrap();
        Self {
            clock,
            ctx,
            doc,
            main,
            compositor,
        }
    }

    fn element(&self, frame: Rect) -> folio_layout::ElementRef {
        self.doc.create(self.main, "div", frame).unwrap().into_ref()
    }

    fn add(&mut self, container: Container) -> ContainerRef {
        self.compositor.add_container("main", container).unwrap()
    }

    fn frame(&mut self) -> FrameStats {
        self.clock.advance_ms(16);
        self.compositor.frame()
    }

    fn scroll_by(&mut self, y: f32) {
        self.ctx.scroller.input(InputDevice::Drag, Point::new(0.0, y));
        self.frame();
    }

    fn position(&self, node: NodeId) -> Point {
        self.ctx.scene.borrow().node(node).unwrap().position()
    }
}

#[test]
fn test_full_page_composes_in_z_order() {
    let mut page = Page::new();
    let cover = page.element(Rect::new(100.0, 900.0, 800.0, 450.0));
    let title = page.element(Rect::new(100.0, 200.0, 600.0, 120.0));

    let ctx = page.ctx.clone();
    let cursor = page.add(Container::new_cursor(ctx.clone(), CursorConfig::default()));
    let text = page.add(Container::new_text(ctx.clone(), title, "Selected work", TextConfig::default()));
    let image = page.add(Container::new_image(ctx.clone(), cover, "work.cover", ImageConfig::default()));
    let background = page.add(Container::new_background(ctx.clone(), BackgroundConfig::default()));
    page.frame();

    for container in [&cursor, &text, &image, &background] {
        assert!(container.borrow().is_ready(), "{:?}", container.borrow());
    }
    assert!(ctx.cursor.is_ready());

    let order: Vec<i32> = {
        let scene = ctx.scene.borrow();
        let root = scene.children(scene.root())[0];
        scene
            .children(root)
            .iter()
            .map(|child| scene.node(*child).unwrap().z_index)
            .collect()
    };
    assert_eq!(order, [0, 2, 5, 100]);
}

#[test]
fn test_scrolling_moves_related_containers_only() {
    let mut page = Page::new();
    let ctx = page.ctx.clone();
    let title = page.element(Rect::new(100.0, 1000.0, 600.0, 120.0));
    let text = page.add(Container::new_text(ctx.clone(), title, "About", TextConfig::default()));
    let background = page.add(Container::new_background(ctx.clone(), BackgroundConfig::default()));
    page.frame();

    page.scroll_by(300.0);
    let text_node = text.borrow().node().unwrap();
    let background_node = background.borrow().node().unwrap();
    assert_eq!(page.position(text_node), Point::new(100.0, 700.0));
    assert_eq!(page.position(background_node), Point::ZERO);

    page.scroll_by(10_000.0);
    assert_eq!(ctx.scroller.position().y, 4200.0);
    assert_eq!(page.position(text_node), Point::new(100.0, -3200.0));
}

#[test]
fn test_video_parallax_follows_scroll() {
    let mut page = Page::new();
    let ctx = page.ctx.clone();
    let element = page.element(Rect::new(0.0, 1200.0, 640.0, 360.0));
    let video = page.add(Container::new_video(ctx.clone(), element, "/videos/reel.mp4", VideoConfig::default()));
    page.frame();

    video.borrow_mut().video_mut().unwrap().can_play(Size::new(640.0, 360.0));
    page.frame();
    video.borrow_mut().toggle::<Parallax>(true, ParallaxConfig::default());
    let wrapper = {
        let video = video.borrow();
        let parallax = video.extras().get::<Parallax>().unwrap();
        let wrapper = parallax.borrow().wrapper().unwrap();
        let sprite = video.video().unwrap().sprite().unwrap();
        assert_eq!(ctx.scene.borrow().parent(sprite), Some(wrapper));
        wrapper
    };

    page.scroll_by(500.0);
    let entering = page.position(wrapper).y;
    assert!(entering > -20.0 && entering < 0.0, "{}", entering);

    page.scroll_by(1500.0);
    assert_eq!(page.position(wrapper).y, 20.0);

    video.borrow_mut().toggle::<Parallax>(false, ParallaxConfig::default());
    assert!(!ctx.scene.borrow().contains(wrapper));
}

#[test]
fn test_cursor_tracks_pointer() {
    let mut page = Page::new();
    let ctx = page.ctx.clone();
    let cursor = page.add(Container::new_cursor(ctx.clone(), CursorConfig::default()));
    page.frame();

    ctx.pointer.move_to(Point::new(640.0, 400.0));
    page.frame();
    let inner = cursor.borrow().cursor().unwrap().inner().unwrap();
    assert_eq!(page.position(inner), Point::new(640.0, 400.0));

    for _ in 0..20 {
        page.frame();
    }
    let outer = cursor.borrow().cursor().unwrap().outer().unwrap();
    assert_eq!(page.position(outer), Point::new(640.0, 400.0));
}

#[test]
fn test_unregistered_extra_is_starved() {
    let mut page = Page::new();
    let ctx = page.ctx.clone();
    let cover = page.element(Rect::new(0.0, 0.0, 400.0, 300.0));
    let image = page.add(Container::new_image(ctx, cover, "work.cover", ImageConfig::default()));
    page.frame();

    let mut wait = image.borrow_mut().extra::<Parallax>();
    assert!(poll_once(&mut wait).is_pending());
    assert!(image.borrow().extras().is_starved(ExtraKind::Parallax));

    page.compositor.remove_container("main", &image).unwrap();
    assert!(matches!(poll_once(&mut wait), Poll::Ready(Err(_))));
}

#[test]
fn test_missing_resource_leaves_container_pending() {
    let mut page = Page::new();
    let ctx = page.ctx.clone();
    let cover = page.element(Rect::new(0.0, 0.0, 400.0, 300.0));
    let image = page.add(Container::new_image(ctx, cover, "missing.cover", ImageConfig::default()));
    let mut ready = image.borrow().ready();

    page.frame();
    assert_eq!(image.borrow().lifecycle(), Lifecycle::Initializing);
    assert!(poll_once(&mut ready).is_pending());
}

#[test]
fn test_shared_element_survives_sibling_removal() {
    let mut page = Page::new();
    let ctx = page.ctx.clone();
    let title = page.element(Rect::new(100.0, 200.0, 600.0, 120.0));
    let heading = page.add(Container::new_text(ctx.clone(), Rc::clone(&title), "Work", TextConfig::default()));
    let caption = page.add(Container::new_text(ctx.clone(), Rc::clone(&title), "2024", TextConfig::default()));
    page.frame();
    assert_eq!(ctx.states.len(), 1);

    page.compositor.remove_container("main", &heading).unwrap();
    assert_eq!(ctx.states.len(), 1);

    page.doc.set_frame(title.id(), Rect::new(100.0, 500.0, 600.0, 120.0)).unwrap();
    page.frame();
    let node = caption.borrow().node().unwrap();
    assert_eq!(page.position(node), Point::new(100.0, 500.0));

    page.compositor.remove_container("main", &caption).unwrap();
    assert!(ctx.states.is_empty());
}

#[test]
fn test_text_fades_out_on_toggle() {
    let mut page = Page::new();
    let ctx = page.ctx.clone();
    let title = page.element(Rect::new(0.0, 100.0, 400.0, 80.0));
    let text = page.add(Container::new_text(ctx.clone(), title, "Contact", TextConfig::default()));
    page.frame();

    text.borrow_mut().toggle::<Visibility>(
        false,
        VisibilityConfig {
            duration: Duration::from_millis(300),
        },
    );
    let node = text.borrow().text().unwrap().text().unwrap();
    for _ in 0..20 {
        page.frame();
    }
    assert_eq!(ctx.scene.borrow().node(node).unwrap().alpha, 0.0);
    assert_eq!(ctx.tweens.active_count(), 0);
}
