//! Presentation-path arithmetic shared by the swap chain backends: the
//! UV-bounds-to-pixel-region mapping of the VR eye-compositing path and
//! the recreate check that absorbs per-eye rounding differences.

/// Pixel tolerance when comparing a requested swap chain size against the
/// current one. Per-eye UV bounds round independently, so the combined
/// target can differ from the cached size by a pixel or two without
/// requiring a rebuild.
pub const RESIZE_TOLERANCE: u32 = 2;

/// Maps UV-space eye bounds onto an integer pixel region of a
/// `width` x `height` source texture.
///
/// Rounds outward (floor for minimums, ceiling for maximums) so the
/// region never clips source content. `None` bounds select the whole
/// texture. The coordinate pairs may come in either order.
pub fn eye_region(width: u32, height: u32, bounds: Option<[f32; 4]>) -> api::SubresourceBox {
    let (left, top, right, bottom) = match bounds {
        Some([u0, v0, u1, v1]) => {
            let left = (width as f32 * u0.min(u1)).floor().max(0.0) as u32;
            let top = (height as f32 * v0.min(v1)).floor().max(0.0) as u32;
            let right = (width as f32 * u0.max(u1)).ceil().min(width as f32) as u32;
            let bottom = (height as f32 * v0.max(v1)).ceil().min(height as f32) as u32;
            (left, top, right, bottom)
        }
        None => (0, 0, width, height),
    };

    api::SubresourceBox {
        left,
        top,
        front: 0,
        right,
        bottom,
        back: 1,
    }
}

/// Whether the swap chain must be torn down and recreated to present a
/// `target` sized image, given its current back buffer parameters.
pub fn needs_recreate(
    current: (u32, u32, api::Format),
    target: (u32, u32, api::Format),
    tolerance: u32,
) -> bool {
    let (cur_w, cur_h, cur_format) = current;
    let (new_w, new_h, new_format) = target;

    cur_w.abs_diff(new_w) > tolerance
        || cur_h.abs_diff(new_h) > tolerance
        || cur_format != new_format
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_bounds_cover_the_texture() {
        let region = eye_region(1024, 512, None);
        assert_eq!((region.left, region.top), (0, 0));
        assert_eq!((region.right, region.bottom), (1024, 512));
        assert_eq!(region.width(), 1024);
    }

    #[test]
    fn bounds_round_outward() {
        // 0.25 * 100 = 25.0 exactly; 0.701 * 100 = 70.1 rounds up to 71.
        let region = eye_region(100, 100, Some([0.25, 0.25, 0.701, 0.701]));
        assert_eq!(region.left, 25);
        assert_eq!(region.top, 25);
        assert_eq!(region.right, 71);
        assert_eq!(region.bottom, 71);
    }

    #[test]
    fn swapped_bounds_normalize() {
        let region = eye_region(100, 100, Some([0.8, 0.9, 0.1, 0.2]));
        assert_eq!(region.left, 10);
        assert_eq!(region.top, 20);
        assert_eq!(region.right, 80);
        assert_eq!(region.bottom, 90);
    }

    #[test]
    fn bounds_clamp_to_texture() {
        let region = eye_region(100, 100, Some([-0.1, 0.0, 1.2, 1.0]));
        assert_eq!(region.left, 0);
        assert_eq!(region.right, 100);
    }

    #[test]
    fn recreate_respects_tolerance() {
        let format = api::Format::R8G8B8A8Unorm;
        assert!(!needs_recreate(
            (800, 600, format),
            (801, 599, format),
            RESIZE_TOLERANCE
        ));
        assert!(needs_recreate(
            (800, 600, format),
            (803, 600, format),
            RESIZE_TOLERANCE
        ));
        assert!(needs_recreate(
            (800, 600, format),
            (800, 600, api::Format::B8G8R8A8Unorm),
            RESIZE_TOLERANCE
        ));
    }
}
