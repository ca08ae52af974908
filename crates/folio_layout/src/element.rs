//! Host elements
//!
//! The compositor never owns page layout. It reads element boxes through the
//! [`HostElement`] trait and writes back only a scroll translation, CSS classes
//! and explicit sizes.
//!
//! [`Document`] is an in-memory implementation used headless: each element
//! has a frame relative to its parent (the `offsetLeft`/`offsetTop` model),
//! an optional translation that moves its rendered box, and a class list.

use crate::error::{LayoutError, Result};
use folio_core::geometry::{Point, Rect, Size};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

new_key_type! {
    /// Identity of a host element
    pub struct ElementId;
}

/// Shared handle to a host element
pub type ElementRef = Rc<dyn HostElement>;

/// The host page element seam
pub trait HostElement {
    fn id(&self) -> ElementId;

    /// Rendered box relative to the viewport, including translations
    fn bounding_client_rect(&self) -> Rect;

    /// Layout position relative to the document origin, ignoring translations
    fn page_offset(&self) -> Point;

    /// True if this element is `root` or one of its attached descendants
    fn is_attached_under(&self, root: ElementId) -> bool;

    fn first_child(&self) -> Option<ElementRef>;

    fn set_translation(&self, translation: Point);

    fn toggle_class(&self, class: &str, enabled: bool);

    fn has_class(&self, class: &str) -> bool;

    /// Force an explicit width and/or height
    fn set_size(&self, width: Option<f32>, height: Option<f32>);
}

impl fmt::Debug for dyn HostElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostElement").field("id", &self.id()).finish()
    }
}

// ============================================================================
// In-memory document
// ============================================================================

#[derive(Debug)]
struct ElementData {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    frame: Rect,
    translation: Point,
    width: Option<f32>,
    height: Option<f32>,
    classes: SmallVec<[String; 2]>,
}

impl ElementData {
    fn new(tag: &str, frame: Rect) -> Self {
        Self {
            tag: tag.to_string(),
            parent: None,
            children: Vec::new(),
            frame,
            translation: Point::ZERO,
            width: None,
            height: None,
            classes: SmallVec::new(),
        }
    }

    fn size(&self) -> Size {
        Size::new(
            self.width.unwrap_or(self.frame.width),
            self.height.unwrap_or(self.frame.height),
        )
    }
}

#[derive(Debug)]
struct DocumentInner {
    elements: SlotMap<ElementId, ElementData>,
    body: ElementId,
    scroll: Point,
}

impl DocumentInner {
    fn ancestors(&self, id: ElementId) -> impl Iterator<Item = (ElementId, &ElementData)> + '_ {
        let mut current = Some(id);
        std::iter::from_fn(move || {
            let id = current?;
            let data = self.elements.get(id)?;
            current = data.parent;
            Some((id, data))
        })
    }

    fn page_offset(&self, id: ElementId) -> Point {
        self.ancestors(id)
            .fold(Point::ZERO, |acc, (_, data)| acc + data.frame.origin())
    }

    fn translation(&self, id: ElementId) -> Point {
        self.ancestors(id)
            .fold(Point::ZERO, |acc, (_, data)| acc + data.translation)
    }
}

/// In-memory host page
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl Document {
    /// Create a document whose body fills the viewport
    pub fn new(viewport: Size) -> Self {
        let mut elements = SlotMap::with_key();
        let body = elements.insert(ElementData::new(
            "body",
            Rect::from_origin_size(Point::ZERO, viewport),
        ));
        Self {
            inner: Rc::new(RefCell::new(DocumentInner {
                elements,
                body,
                scroll: Point::ZERO,
            })),
        }
    }

    pub fn body(&self) -> DomElement {
        let body = self.inner.borrow().body;
        self.handle(body)
    }

    fn handle(&self, id: ElementId) -> DomElement {
        DomElement {
            doc: Rc::clone(&self.inner),
            id,
        }
    }

    pub fn element(&self, id: ElementId) -> Option<DomElement> {
        self.contains(id).then(|| self.handle(id))
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.inner.borrow().elements.contains_key(id)
    }

    /// Create an element with `frame` relative to `parent`
    pub fn create(&self, parent: ElementId, tag: &str, frame: Rect) -> Result<DomElement> {
        let id = {
            let mut inner = self.inner.borrow_mut();
            if !inner.elements.contains_key(parent) {
                return Err(LayoutError::ElementNotFound(parent));
            }
            let mut data = ElementData::new(tag, frame);
            data.parent = Some(parent);
            let id = inner.elements.insert(data);
            inner.elements[parent].children.push(id);
            id
        };
        Ok(self.handle(id))
    }

    /// Move an existing element under a new parent
    pub fn append(&self, parent: ElementId, child: ElementId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        for id in [parent, child] {
            if !inner.elements.contains_key(id) {
                return Err(LayoutError::ElementNotFound(id));
            }
        }
        if inner.ancestors(parent).any(|(id, _)| id == child) {
            return Err(LayoutError::Cycle { parent, child });
        }

        if let Some(old) = inner.elements[child].parent {
            if let Some(old) = inner.elements.get_mut(old) {
                old.children.retain(|id| *id != child);
            }
        }
        inner.elements[parent].children.push(child);
        inner.elements[child].parent = Some(parent);
        Ok(())
    }

    /// Detach an element from the tree. Handles stay valid but unattached.
    pub fn detach(&self, id: ElementId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(parent) = inner.elements.get(id).and_then(|data| data.parent) else {
            return false;
        };
        if let Some(parent) = inner.elements.get_mut(parent) {
            parent.children.retain(|child| *child != id);
        }
        inner.elements[id].parent = None;
        true
    }

    pub fn set_frame(&self, id: ElementId, frame: Rect) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let data = inner
            .elements
            .get_mut(id)
            .ok_or(LayoutError::ElementNotFound(id))?;
        data.frame = frame;
        Ok(())
    }

    /// Native window scroll, subtracted from every client rect
    pub fn set_scroll(&self, scroll: Point) {
        self.inner.borrow_mut().scroll = scroll;
    }

    pub fn tag(&self, id: ElementId) -> Option<String> {
        self.inner.borrow().elements.get(id).map(|data| data.tag.clone())
    }

    pub fn translation(&self, id: ElementId) -> Option<Point> {
        self.inner.borrow().elements.get(id).map(|data| data.translation)
    }
}

/// Handle to an element of a [`Document`]
#[derive(Clone)]
pub struct DomElement {
    doc: Rc<RefCell<DocumentInner>>,
    id: ElementId,
}

impl DomElement {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn into_ref(self) -> ElementRef {
        Rc::new(self)
    }
}

impl fmt::Debug for DomElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.doc.borrow().elements.get(self.id).map(|d| d.tag.clone());
        f.debug_struct("DomElement")
            .field("id", &self.id)
            .field("tag", &tag)
            .finish()
    }
}

impl HostElement for DomElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn bounding_client_rect(&self) -> Rect {
        let doc = self.doc.borrow();
        let Some(data) = doc.elements.get(self.id) else {
            return Rect::default();
        };
        let origin = doc.page_offset(self.id) + doc.translation(self.id) - doc.scroll;
        Rect::from_origin_size(origin, data.size())
    }

    fn page_offset(&self) -> Point {
        self.doc.borrow().page_offset(self.id)
    }

    fn is_attached_under(&self, root: ElementId) -> bool {
        self.doc.borrow().ancestors(self.id).any(|(id, _)| id == root)
    }

    fn first_child(&self) -> Option<ElementRef> {
        let child = {
            let doc = self.doc.borrow();
            *doc.elements.get(self.id)?.children.first()?
        };
        Some(Rc::new(DomElement {
            doc: Rc::clone(&self.doc),
            id: child,
        }))
    }

    fn set_translation(&self, translation: Point) {
        if let Some(data) = self.doc.borrow_mut().elements.get_mut(self.id) {
            data.translation = translation;
        }
    }

    fn toggle_class(&self, class: &str, enabled: bool) {
        let mut doc = self.doc.borrow_mut();
        let Some(data) = doc.elements.get_mut(self.id) else {
            return;
        };
        let present = data.classes.iter().any(|c| c == class);
        if enabled && !present {
            data.classes.push(class.to_string());
        } else if !enabled && present {
            data.classes.retain(|c| c != class);
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.doc
            .borrow()
            .elements
            .get(self.id)
            .map_or(false, |data| data.classes.iter().any(|c| c == class))
    }

    fn set_size(&self, width: Option<f32>, height: Option<f32>) {
        if let Some(data) = self.doc.borrow_mut().elements.get_mut(self.id) {
            if width.is_some() {
                data.width = width;
            }
            if height.is_some() {
                data.height = height;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> (Document, DomElement, DomElement) {
        let doc = Document::new(Size::new(1280.0, 800.0));
        let body = doc.body();
        let section = doc
            .create(body.id(), "section", Rect::new(0.0, 900.0, 1280.0, 600.0))
            .unwrap();
        let image = doc
            .create(section.id(), "img", Rect::new(100.0, 50.0, 400.0, 300.0))
            .unwrap();
        (doc, section, image)
    }

    #[test]
    fn test_page_offset_accumulates_frames() {
        let (_, _, image) = page();
        assert_eq!(image.page_offset(), Point::new(100.0, 950.0));
    }

    #[test]
    fn test_client_rect_follows_translation_and_scroll() {
        let (doc, section, image) = page();
        section.set_translation(Point::new(0.0, -500.0));
        assert_eq!(image.bounding_client_rect(), Rect::new(100.0, 450.0, 400.0, 300.0));
        // Translation doesn't affect layout offset
        assert_eq!(image.page_offset(), Point::new(100.0, 950.0));

        doc.set_scroll(Point::new(0.0, 50.0));
        assert_eq!(image.bounding_client_rect().y, 400.0);
    }

    #[test]
    fn test_attachment() {
        let (doc, section, image) = page();
        let body = doc.body().id();
        assert!(image.is_attached_under(body));
        assert!(image.is_attached_under(section.id()));
        assert!(!section.is_attached_under(image.id()));

        doc.detach(section.id());
        assert!(!image.is_attached_under(body));
        doc.append(body, section.id()).unwrap();
        assert!(image.is_attached_under(body));
        assert!(matches!(
            doc.append(image.id(), section.id()),
            Err(LayoutError::Cycle { .. })
        ));
    }

    #[test]
    fn test_first_child_and_classes() {
        let (_, section, image) = page();
        assert_eq!(section.first_child().map(|c| c.id()), Some(image.id()));
        assert!(image.first_child().is_none());

        image.toggle_class("visible", true);
        image.toggle_class("visible", true);
        assert!(image.has_class("visible"));
        image.toggle_class("visible", false);
        assert!(!image.has_class("visible"));
    }

    #[test]
    fn test_set_size_overrides_frame() {
        let (_, section, _) = page();
        section.set_size(Some(10.0), None);
        let rect = section.bounding_client_rect();
        assert_eq!((rect.width, rect.height), (10.0, 600.0));
    }
}
