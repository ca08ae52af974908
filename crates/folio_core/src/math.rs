//! Scalar helpers used by layout and animation code

/// Clamp `value` into `[min, max]`
///
/// Unlike `f32::clamp` this never panics: with `min > max` the upper bound wins.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Linearly map `value` from `[in_start, in_end]` to `[out_min, out_max]`
///
/// The result is not clamped. A zero-width input range maps to `out_min`
/// before the range and `out_max` from its start onwards.
pub fn map_range(value: f32, in_start: f32, in_end: f32, out_min: f32, out_max: f32) -> f32 {
    let span = in_end - in_start;
    if span.abs() <= f32::EPSILON {
        return if value < in_start { out_min } else { out_max };
    }
    out_min + (out_max - out_min) / span * (value - in_start)
}

/// Map a scroll position onto `[min_value, max_value]` while the element passes
/// through the viewport.
///
/// The active input range starts when the element's leading edge (shifted by
/// `min_offset`) enters the viewport and ends once its trailing edge (shifted by
/// `max_offset`) has left it. Elements already visible at scroll 0 start from 0
/// instead of `min_value` so they don't jump on first paint.
#[allow(clippy::too_many_arguments)]
pub fn scroll_tween(
    scroll_position: f32,
    viewport_size: f32,
    element_size: f32,
    element_position: f32,
    min_value: f32,
    max_value: f32,
    min_offset: f32,
    max_offset: f32,
) -> f32 {
    let in_start = (element_position - viewport_size + min_offset).max(0.0);
    let in_end = element_position + element_size + max_offset;
    let out_min = if in_start == 0.0 { 0.0 } else { min_value };

    clamp(
        map_range(scroll_position, in_start, in_end, out_min, max_value),
        min_value.min(max_value),
        min_value.max(max_value),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_range_basic() {
        assert_eq!(map_range(5.0, 0.0, 10.0, 0.0, 100.0), 50.0);
        assert_eq!(map_range(0.0, 0.0, 10.0, -20.0, 20.0), -20.0);
        assert_eq!(map_range(15.0, 0.0, 10.0, 0.0, 100.0), 150.0);
    }

    #[test]
    fn test_map_range_zero_width() {
        assert_eq!(map_range(4.0, 5.0, 5.0, -1.0, 1.0), -1.0);
        assert_eq!(map_range(5.0, 5.0, 5.0, -1.0, 1.0), 1.0);
    }

    #[test]
    fn test_clamp_inverted_bounds_does_not_panic() {
        assert_eq!(clamp(3.0, 5.0, 1.0), 1.0);
        assert_eq!(clamp(3.0, 1.0, 5.0), 3.0);
    }

    #[test]
    fn test_scroll_tween_before_range_clamps_to_min() {
        let v = scroll_tween(0.0, 800.0, 200.0, 1000.0, -50.0, 50.0, -50.0, 50.0);
        assert_eq!(v, -50.0);
    }

    #[test]
    fn test_scroll_tween_visible_on_first_paint_starts_at_zero() {
        let v = scroll_tween(0.0, 800.0, 200.0, 300.0, 40.0, -40.0, 40.0, -40.0);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_scroll_tween_after_range_clamps_to_max() {
        let v = scroll_tween(5000.0, 800.0, 200.0, 1000.0, -50.0, 50.0, -50.0, 50.0);
        assert_eq!(v, 50.0);
    }
}
