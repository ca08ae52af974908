//! Page-facing cursor control
//!
//! The page is the only producer of cursor positions, visibility and states;
//! the cursor container is the only consumer.

use folio_core::signal::{OneShot, Wait};
use folio_core::stream::{Subject, Subscription};
use folio_core::time::SharedClock;
use serde::{Deserialize, Serialize};

/// A position pushed by the page, optionally locking the cursor in place
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CursorPosition {
    pub x: f32,
    pub y: f32,
    /// While locked, pointer moves don't move the cursor
    pub locked: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorState {
    #[default]
    Default,
    Small,
}

pub struct CursorService {
    ready: OneShot<()>,
    positions: Subject<CursorPosition>,
    visibility: Subject<bool>,
    state: Subject<CursorState>,
}

impl CursorService {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            ready: OneShot::new("cursor ready"),
            positions: Subject::new(clock.clone()),
            visibility: Subject::new(clock.clone()),
            state: Subject::behavior(clock, CursorState::Default),
        }
    }

    pub fn set_position(&self, x: f32, y: f32, locked: bool) {
        self.positions.next(CursorPosition { x, y, locked });
    }

    pub fn update_state(&self, state: CursorState) {
        self.state.next(state);
    }

    /// The last requested state
    pub fn state(&self) -> CursorState {
        self.state.value().unwrap_or_default()
    }

    pub fn hide(&self) {
        self.visibility.next(false);
    }

    pub fn show(&self) {
        self.visibility.next(true);
    }

    /// Called by the cursor container once its sprites exist
    pub fn resolve_ready(&self) -> folio_core::Result<()> {
        self.ready.resolve(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_resolved()
    }

    pub fn ready(&self) -> Wait<()> {
        self.ready.wait()
    }

    pub fn positions(&self) -> Subscription<CursorPosition> {
        self.positions.subscribe()
    }

    pub fn visibility(&self) -> Subscription<bool> {
        self.visibility.subscribe()
    }

    /// State changes, starting with the current state
    pub fn states(&self) -> Subscription<CursorState> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::time::ManualClock;
    use folio_core::CoreError;
    use std::rc::Rc;

    fn service() -> CursorService {
        CursorService::new(Rc::new(ManualClock::new()))
    }

    #[test]
    fn test_state_replays_current() {
        let cursor = service();
        cursor.update_state(CursorState::Small);
        let states = cursor.states();
        assert_eq!(states.drain(), vec![CursorState::Small]);
        assert_eq!(cursor.state(), CursorState::Small);
    }

    #[test]
    fn test_positions_are_not_replayed() {
        let cursor = service();
        cursor.set_position(10.0, 20.0, true);
        let positions = cursor.positions();
        assert_eq!(positions.try_next(), None);

        cursor.set_position(30.0, 40.0, false);
        assert_eq!(
            positions.try_next(),
            Some(CursorPosition {
                x: 30.0,
                y: 40.0,
                locked: false
            })
        );
    }

    #[test]
    fn test_ready_resolves_once() {
        let cursor = service();
        assert!(!cursor.is_ready());
        cursor.resolve_ready().unwrap();
        assert!(cursor.is_ready());
        assert_eq!(pollster::block_on(cursor.ready()), Ok(()));
        assert!(matches!(
            cursor.resolve_ready(),
            Err(CoreError::AlreadyCompleted(_))
        ));
    }
}
