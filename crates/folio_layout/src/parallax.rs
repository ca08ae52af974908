//! Parallax offset calculation

use folio_core::geometry::{Axis, Point};
use folio_core::math::scroll_tween;

/// Translation of an element scrolling at `speed` pixels relative to the page
///
/// Negative speeds move against the scroll direction. While the element passes
/// through the viewport the offset sweeps from one speed bound to the other;
/// outside that range it stays clamped. For [`Axis::X`] the entry and exit
/// points aren't widened, since the element keeps its vertical position.
pub fn parallax(
    scroll_position: f32,
    viewport_size: f32,
    element_size: f32,
    element_position: f32,
    speed: f32,
    axis: Axis,
) -> Point {
    let abs_speed = speed.abs();
    let (min_speed, max_speed) = if speed <= 0.0 {
        (abs_speed, -abs_speed)
    } else {
        (-abs_speed, abs_speed)
    };
    let (min_offset, max_offset) = match axis {
        Axis::X => (0.0, 0.0),
        Axis::Y => (min_speed, max_speed),
    };

    let translation = scroll_tween(
        scroll_position,
        viewport_size,
        element_size,
        element_position,
        min_speed,
        max_speed,
        min_offset,
        max_offset,
    );

    match axis {
        Axis::X => Point::new(translation, 0.0),
        Axis::Y => Point::new(0.0, translation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_below_fold_starts_at_min_speed() {
        let offset = parallax(0.0, 800.0, 200.0, 1000.0, 50.0, Axis::Y);
        assert_eq!(offset, Point::new(0.0, -50.0));
    }

    #[test]
    fn test_element_above_fold_starts_at_zero() {
        let offset = parallax(0.0, 800.0, 200.0, 300.0, 50.0, Axis::Y);
        assert_eq!(offset.y, 0.0);
        let offset = parallax(0.0, 800.0, 200.0, 300.0, -50.0, Axis::Y);
        assert_eq!(offset.y, 0.0);
    }

    #[test]
    fn test_monotonic_and_clamped() {
        for speed in [-80.0, -10.0, 10.0, 80.0] {
            let mut previous: Option<f32> = None;
            for step in 0..=60 {
                let scroll = step as f32 * 50.0;
                let y = parallax(scroll, 800.0, 200.0, 1000.0, speed, Axis::Y).y;
                assert!(y.abs() <= f32::abs(speed) + 1e-4);
                if let Some(previous) = previous {
                    if speed > 0.0 {
                        assert!(y >= previous - 1e-4);
                    } else {
                        assert!(y <= previous + 1e-4);
                    }
                }
                previous = Some(y);
            }
        }
    }

    #[test]
    fn test_horizontal_axis() {
        let offset = parallax(5000.0, 800.0, 200.0, 1000.0, 30.0, Axis::X);
        assert_eq!(offset, Point::new(30.0, 0.0));
    }
}
