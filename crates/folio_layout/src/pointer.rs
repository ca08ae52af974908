//! Pointer and window input provider
//!
//! Raw host input is pushed here once and fanned out to every consumer.

use folio_core::geometry::Point;
use folio_core::stream::{Subject, Subscription};
use folio_core::time::SharedClock;
use std::cell::Cell;

/// Single producer of pointer input
pub struct PointerProvider {
    position: Cell<Point>,
    pressed: Cell<bool>,
    moves: Subject<Point>,
    presses: Subject<bool>,
    blurs: Subject<()>,
}

impl PointerProvider {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            position: Cell::new(Point::ZERO),
            pressed: Cell::new(false),
            moves: Subject::new(clock.clone()),
            presses: Subject::new(clock.clone()),
            blurs: Subject::new(clock),
        }
    }

    /// Pointer moved to `position` in client coordinates
    pub fn move_to(&self, position: Point) {
        self.position.set(position);
        self.moves.next(position);
    }

    pub fn press(&self) {
        self.set_pressed(true);
    }

    pub fn release(&self) {
        self.set_pressed(false);
    }

    fn set_pressed(&self, pressed: bool) {
        if self.pressed.replace(pressed) != pressed {
            self.presses.next(pressed);
        }
    }

    /// The window lost focus; any press is abandoned
    pub fn blur(&self) {
        self.pressed.set(false);
        self.blurs.next(());
    }

    pub fn position(&self) -> Point {
        self.position.get()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.get()
    }

    pub fn moves(&self) -> Subscription<Point> {
        self.moves.subscribe()
    }

    /// `true` on press, `false` on release
    pub fn presses(&self) -> Subscription<bool> {
        self.presses.subscribe()
    }

    pub fn blurs(&self) -> Subscription<()> {
        self.blurs.subscribe()
    }
}
