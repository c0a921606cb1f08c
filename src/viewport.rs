//! Window dimensions and the render-target sizing policy derived from them.

use winit::dpi::{PhysicalPosition, PhysicalSize};

use crate::animator::PointerTarget;

/// Current window size (physical pixels) plus the pixel-ratio cap.
///
/// The surface always matches [`Viewport::size`]. Intermediate render targets use
/// [`Viewport::render_target_size`], which only differs when the display's scale
/// factor exceeds the configured maximum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    size: PhysicalSize<u32>,
    scale_factor: f64,
    max_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(size: PhysicalSize<u32>, scale_factor: f64, max_pixel_ratio: f64) -> Self {
        Self {
            size,
            scale_factor: sanitize_scale(scale_factor),
            max_pixel_ratio: sanitize_scale(max_pixel_ratio),
        }
    }

    /// Records a new window size. Returns `false` (and keeps the old size) for
    /// degenerate sizes such as a minimized window.
    pub fn resize(&mut self, size: PhysicalSize<u32>) -> bool {
        if size.width == 0 || size.height == 0 {
            return false;
        }
        self.size = size;
        true
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = sanitize_scale(scale_factor);
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn aspect(&self) -> f32 {
        self.size.width.max(1) as f32 / self.size.height.max(1) as f32
    }

    /// Device pixel ratio used for rendering, capped at the configured maximum.
    pub fn pixel_ratio(&self) -> f64 {
        self.scale_factor.min(self.max_pixel_ratio)
    }

    /// Size of the offscreen targets: logical size times the capped pixel ratio.
    pub fn render_target_size(&self) -> [u32; 2] {
        if self.pixel_ratio() >= self.scale_factor {
            return [self.size.width.max(1), self.size.height.max(1)];
        }
        let logical = self.size.to_logical::<f64>(self.scale_factor);
        let ratio = self.pixel_ratio();
        [
            ((logical.width * ratio).round() as u32).max(1),
            ((logical.height * ratio).round() as u32).max(1),
        ]
    }

    pub fn normalize(&self, position: PhysicalPosition<f64>) -> PointerTarget {
        PointerTarget::from_cursor(position, self.size)
    }
}

fn sanitize_scale(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_updates_aspect_and_targets() {
        let mut viewport = Viewport::new(PhysicalSize::new(800, 600), 1.0, 2.0);
        assert!(viewport.resize(PhysicalSize::new(1920, 1080)));
        assert_eq!(viewport.aspect(), 1920.0 / 1080.0);
        assert_eq!(viewport.render_target_size(), [1920, 1080]);
    }

    #[test]
    fn zero_size_is_ignored() {
        let mut viewport = Viewport::new(PhysicalSize::new(800, 600), 1.0, 2.0);
        assert!(!viewport.resize(PhysicalSize::new(0, 600)));
        assert_eq!(viewport.size(), PhysicalSize::new(800, 600));
    }

    #[test]
    fn pixel_ratio_is_capped() {
        // 3x display: 1000x500 logical
        let viewport = Viewport::new(PhysicalSize::new(3000, 1500), 3.0, 2.0);
        assert_eq!(viewport.pixel_ratio(), 2.0);
        assert_eq!(viewport.render_target_size(), [2000, 1000]);
        assert_eq!(viewport.aspect(), 2.0);
    }

    #[test]
    fn ratio_below_cap_uses_physical_size() {
        let viewport = Viewport::new(PhysicalSize::new(1500, 900), 1.5, 2.0);
        assert_eq!(viewport.render_target_size(), [1500, 900]);
    }

    #[test]
    fn bogus_scale_factor_falls_back_to_one() {
        let viewport = Viewport::new(PhysicalSize::new(640, 480), f64::NAN, 2.0);
        assert_eq!(viewport.scale_factor(), 1.0);
    }
}
