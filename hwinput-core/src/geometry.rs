//! Virtual-desktop geometry and absolute pointer normalisation.
//!
//! Absolute mouse input is expressed in a normalised space where the whole
//! virtual desktop spans `0..65536` on each axis.  Pixels occupy a block of
//! that space (on a 1024-wide desktop each pixel is 64 units wide), so a
//! target pixel is addressed by the middle of its block rather than its
//! leading edge: truncating `(p - origin) * 65536 / extent` alone can land in
//! the previous pixel's block.

use serde::{Deserialize, Serialize};

use crate::errors::InjectionError;

/// Size of the normalised absolute coordinate space on each axis.
pub const ABSOLUTE_EXTENT: i64 = 65_536;

/// Largest value accepted in a normalised coordinate.
pub const ABSOLUTE_MAX: i64 = ABSOLUTE_EXTENT - 1;

/// A pixel position relative to the virtual-desktop origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Bounding rectangle of all attached displays.
///
/// `left`/`top` can be negative when a monitor sits left of or above the
/// primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDesktop {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl VirtualDesktop {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Whether `point` lies on the desktop.
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.left
            && point.y >= self.top
            && (point.x as i64) < self.left as i64 + self.width as i64
            && (point.y as i64) < self.top as i64 + self.height as i64
    }

    /// Convert desktop pixels to the normalised absolute space.
    ///
    /// Results are clamped to `[0, 65535]`, so points off the desktop pin
    /// to its nearest edge.
    pub fn normalize(&self, x: i32, y: i32) -> Result<(i32, i32), InjectionError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(InjectionError::MetricsError(format!(
                "virtual desktop has no area ({}x{})",
                self.width, self.height
            )));
        }
        Ok((
            normalize_axis(x, self.left, self.width),
            normalize_axis(y, self.top, self.height),
        ))
    }
}

/// `((p - origin) * 65536) / extent + 65536 / (extent * 2)`, in 64-bit.
fn normalize_axis(pixel: i32, origin: i32, extent: i32) -> i32 {
    let offset = pixel as i64 - origin as i64;
    let extent = extent as i64;
    let start = (offset * ABSOLUTE_EXTENT).div_euclid(extent);
    let half_pixel = ABSOLUTE_EXTENT / (extent * 2);
    (start + half_pixel).clamp(0, ABSOLUTE_MAX) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pixel the OS resolves a normalised coordinate to.
    fn pixel_of(n: i32, origin: i32, extent: i32) -> i32 {
        origin + ((n as i64 * extent as i64) / ABSOLUTE_EXTENT) as i32
    }

    #[test]
    fn test_pixel_one_of_768_lands_mid_block() {
        let desk = VirtualDesktop::new(0, 0, 1024, 768);
        // 85.33 truncates to 85 (pixel 0's block); + 42 pushes it into pixel 1.
        let (_, ny) = desk.normalize(0, 1).unwrap();
        assert_eq!(ny, 85 + 42);
        assert_eq!(pixel_of(ny, 0, 768), 1);
    }

    #[test]
    fn test_every_pixel_maps_back_to_itself() {
        for &(left, width) in &[(0, 1024), (0, 1366), (-1280, 3200), (0, 7)] {
            let desk = VirtualDesktop::new(left, 0, width, 1);
            for x in left..left + width {
                let (nx, _) = desk.normalize(x, 0).unwrap();
                assert_eq!(pixel_of(nx, left, width), x, "width {width}, pixel {x}");
            }
        }
    }

    #[test]
    fn test_negative_origin_is_respected() {
        let desk = VirtualDesktop::new(-1920, 0, 3840, 1080);
        let (nx, _) = desk.normalize(-1920, 0).unwrap();
        assert_eq!(nx, 65536 / (3840 * 2));
        let (nx, _) = desk.normalize(0, 0).unwrap();
        assert_eq!(nx, 32768 + 65536 / (3840 * 2));
    }

    #[test]
    fn test_off_desktop_points_clamp() {
        let desk = VirtualDesktop::new(0, 0, 800, 600);
        assert_eq!(desk.normalize(-50, 10_000).unwrap(), (0, 65535));
    }

    #[test]
    fn test_zero_extent_is_metrics_error() {
        let desk = VirtualDesktop::new(0, 0, 0, 1080);
        assert!(matches!(
            desk.normalize(1, 1),
            Err(InjectionError::MetricsError(_))
        ));
    }

    #[test]
    fn test_contains() {
        let desk = VirtualDesktop::new(-100, -50, 200, 100);
        assert!(desk.contains(ScreenPoint::new(-100, -50)));
        assert!(!desk.contains(ScreenPoint::new(100, 0)));
    }
}
