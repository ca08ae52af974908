//! Container extras
//!
//! An extra is a visual behaviour layered onto one scene node: a parallax
//! wrapper, a displacement map, a mouse-driven drift or twist, a motion blur, a
//! fade. Each kind exists at most once per container and is reached through the
//! container's [`ExtraRegistry`].
//!
//! `activate`/`deactivate` are idempotent. Configs are plain structs with
//! defaults, so callers only spell out what they change:
//!
//! ```rust,ignore
//! container.toggle::<Displacement>(true, DisplacementConfig {
//!     scale_x: 30.0,
//!     ..Default::default()
//! });
//! ```

/// Implements the [`Behavior`] conversions of an extra
macro_rules! impl_behavior_variant {
    ($extra:ident) => {
        fn wrap(handle: ExtraHandle<Self>) -> Behavior {
            Behavior::$extra(handle)
        }

        fn unwrap(behavior: &Behavior) -> Option<&ExtraHandle<Self>> {
            match behavior {
                Behavior::$extra(handle) => Some(handle),
                _ => None,
            }
        }
    };
}

mod displacement;
mod motion_blur;
mod mouse_motion;
mod mouse_twist;
mod parallax;
mod registry;
mod visibility;

pub use displacement::{Displacement, DisplacementConfig};
pub use motion_blur::{MotionBlur, MotionBlurConfig};
pub use mouse_motion::{MouseMotion, MouseMotionConfig};
pub use mouse_twist::{MouseTwist, MouseTwistConfig};
pub use parallax::{Parallax, ParallaxConfig};
pub use registry::{ExtraRegistry, ExtraWait};
pub use visibility::{Visibility, VisibilityConfig};

use crate::context::FolioContext;
use folio_scene::NodeId;
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtraKind {
    Parallax,
    Displacement,
    MouseMotion,
    MouseTwist,
    MotionBlur,
    Visibility,
}

impl ExtraKind {
    pub const ALL: [ExtraKind; 6] = [
        ExtraKind::Parallax,
        ExtraKind::Displacement,
        ExtraKind::MouseMotion,
        ExtraKind::MouseTwist,
        ExtraKind::MotionBlur,
        ExtraKind::Visibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtraKind::Parallax => "parallax",
            ExtraKind::Displacement => "displacement",
            ExtraKind::MouseMotion => "mouse-motion",
            ExtraKind::MouseTwist => "mouse-twist",
            ExtraKind::MotionBlur => "motion-blur",
            ExtraKind::Visibility => "visibility",
        }
    }
}

impl fmt::Display for ExtraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete extra
pub trait ExtraType: Sized + 'static {
    const KIND: ExtraKind;

    type Config: Default + Clone + 'static;

    fn new(target: NodeId, ctx: &FolioContext) -> Self;

    fn is_active(&self) -> bool;

    fn activate(&mut self, config: &Self::Config);

    fn deactivate(&mut self, config: &Self::Config);

    /// Per-frame work. `delta` is 1.0 at 60 fps.
    fn render(&mut self, _delta: f32) {}

    fn wrap(handle: ExtraHandle<Self>) -> Behavior;

    fn unwrap(behavior: &Behavior) -> Option<&ExtraHandle<Self>>;
}

/// Shared handle to a registered extra
pub struct ExtraHandle<E>(Rc<RefCell<E>>);

impl<E> Clone for ExtraHandle<E> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<E: ExtraType> ExtraHandle<E> {
    pub fn new(extra: E) -> Self {
        Self(Rc::new(RefCell::new(extra)))
    }

    pub fn borrow(&self) -> Ref<'_, E> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, E> {
        self.0.borrow_mut()
    }

    pub fn is_active(&self) -> bool {
        self.0.borrow().is_active()
    }

    pub fn activate(&self, config: &E::Config) {
        self.0.borrow_mut().activate(config);
    }

    pub fn deactivate(&self, config: &E::Config) {
        self.0.borrow_mut().deactivate(config);
    }

    pub fn toggle(&self, enabled: bool, config: &E::Config) {
        if enabled {
            self.activate(config);
        } else {
            self.deactivate(config);
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<E> fmt::Debug for ExtraHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExtraHandle")
            .field(&std::any::type_name::<E>())
            .finish()
    }
}

/// Type-erased extra, one variant per kind
#[derive(Clone, Debug)]
pub enum Behavior {
    Parallax(ExtraHandle<Parallax>),
    Displacement(ExtraHandle<Displacement>),
    MouseMotion(ExtraHandle<MouseMotion>),
    MouseTwist(ExtraHandle<MouseTwist>),
    MotionBlur(ExtraHandle<MotionBlur>),
    Visibility(ExtraHandle<Visibility>),
}

macro_rules! each_behavior {
    ($behavior:expr, $handle:ident => $body:expr) => {
        match $behavior {
            Behavior::Parallax($handle) => $body,
            Behavior::Displacement($handle) => $body,
            Behavior::MouseMotion($handle) => $body,
            Behavior::MouseTwist($handle) => $body,
            Behavior::MotionBlur($handle) => $body,
            Behavior::Visibility($handle) => $body,
        }
    };
}

impl Behavior {
    /// Construct the extra of `kind` bound to `target`
    pub fn build(kind: ExtraKind, target: NodeId, ctx: &FolioContext) -> Self {
        fn make<E: ExtraType>(target: NodeId, ctx: &FolioContext) -> Behavior {
            E::wrap(ExtraHandle::new(E::new(target, ctx)))
        }

        match kind {
            ExtraKind::Parallax => make::<Parallax>(target, ctx),
            ExtraKind::Displacement => make::<Displacement>(target, ctx),
            ExtraKind::MouseMotion => make::<MouseMotion>(target, ctx),
            ExtraKind::MouseTwist => make::<MouseTwist>(target, ctx),
            ExtraKind::MotionBlur => make::<MotionBlur>(target, ctx),
            ExtraKind::Visibility => make::<Visibility>(target, ctx),
        }
    }

    pub fn kind(&self) -> ExtraKind {
        match self {
            Behavior::Parallax(_) => ExtraKind::Parallax,
            Behavior::Displacement(_) => ExtraKind::Displacement,
            Behavior::MouseMotion(_) => ExtraKind::MouseMotion,
            Behavior::MouseTwist(_) => ExtraKind::MouseTwist,
            Behavior::MotionBlur(_) => ExtraKind::MotionBlur,
            Behavior::Visibility(_) => ExtraKind::Visibility,
        }
    }

    pub fn is_active(&self) -> bool {
        each_behavior!(self, handle => handle.is_active())
    }

    pub fn render(&self, delta: f32) {
        each_behavior!(self, handle => handle.borrow_mut().render(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::geometry::Size;
    use folio_core::time::ManualClock;
    use folio_scene::Content;

    #[test]
    fn test_kind_names() {
        let names: Vec<_> = ExtraKind::ALL.iter().map(ExtraKind::as_str).collect();
        assert_eq!(
            names,
            [
                "parallax",
                "displacement",
                "mouse-motion",
                "mouse-twist",
                "motion-blur",
                "visibility"
            ]
        );
        assert_eq!(ExtraKind::MotionBlur.to_string(), "motion-blur");
    }

    #[test]
    fn test_kind_serde_matches_display() {
        for kind in ExtraKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
            let back: ExtraKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn test_behavior_unwraps_only_its_own_kind() {
        let ctx = FolioContext::new(Rc::new(ManualClock::new()), Size::new(800.0, 600.0));
        let target = ctx.scene.borrow_mut().create(Content::Container);

        for kind in ExtraKind::ALL {
            let behavior = Behavior::build(kind, target, &ctx);
            assert_eq!(behavior.kind(), kind);
            assert_eq!(behavior.is_active(), kind == ExtraKind::Visibility);
            assert_eq!(Parallax::unwrap(&behavior).is_some(), kind == ExtraKind::Parallax);
            assert_eq!(Visibility::unwrap(&behavior).is_some(), kind == ExtraKind::Visibility);
            assert_eq!(MouseMotion::unwrap(&behavior).is_some(), kind == ExtraKind::MouseMotion);
        }
    }
}
