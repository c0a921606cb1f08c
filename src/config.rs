//! Viewer configuration.
//!
//! [`ViewerConfig::default()`] reproduces the stock demo: a Damaged Helmet lit by a
//! night-time cobblestone street HDRI, tilting up to 30° toward the pointer.
//! Everything the viewer would otherwise hard-code lives here so that embedders
//! can swap assets or tune the feel without touching the engine code.

use cgmath::{Deg, Rad};

use crate::animator::Easing;

/// Camera placement and projection parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Distance from the origin along +Z. The camera always looks at the origin.
    pub distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy: Deg(65.0),
            znear: 0.1,
            zfar: 1000.0,
            distance: 5.0,
        }
    }
}

/// Pointer tilt tuning.
#[derive(Clone, Debug, PartialEq)]
pub struct TiltConfig {
    pub max_angle: Rad<f32>,
    /// Seconds a transition takes to reach its target.
    pub duration: f32,
    pub easing: Easing,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            max_angle: Deg(30.0).into(),
            duration: 0.9,
            easing: Easing::CubicOut,
        }
    }
}

/// Screen-space colour channel offset applied after the scene pass.
#[derive(Clone, Debug, PartialEq)]
pub struct RgbShiftConfig {
    /// Offset in UV units (fraction of the screen).
    pub amount: f32,
    /// Direction of the red channel offset; blue is shifted the opposite way.
    pub angle: Rad<f32>,
}

impl Default for RgbShiftConfig {
    fn default() -> Self {
        Self {
            amount: 0.0025,
            angle: Rad(0.0),
        }
    }
}

/// Where the two assets come from.
///
/// Names that parse as absolute `http(s)` URLs are fetched remotely, everything
/// else is resolved against `root` (`./<root>` natively, `<origin>/<root>` on the web).
#[derive(Clone, Debug, PartialEq)]
pub struct AssetConfig {
    pub root: String,
    pub environment: String,
    pub model: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: "assets".to_string(),
            environment:
                "https://dl.polyhaven.org/file/ph-assets/HDRIs/hdr/1k/cobblestone_street_night_1k.hdr"
                    .to_string(),
            model: "DamagedHelmet.gltf".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    /// Element id of the canvas to render into (web only).
    pub canvas_id: String,
    pub camera: CameraConfig,
    pub tilt: TiltConfig,
    pub rgb_shift: RgbShiftConfig,
    pub assets: AssetConfig,
    /// Upper bound for the device pixel ratio used to size render targets.
    pub max_pixel_ratio: f64,
    /// Uniform scale applied to the model root once it is attached.
    pub model_scale: f32,
    pub exposure: f32,
    pub clear_colour: wgpu::Color,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            canvas_id: "canvas".to_string(),
            camera: CameraConfig::default(),
            tilt: TiltConfig::default(),
            rgb_shift: RgbShiftConfig::default(),
            assets: AssetConfig::default(),
            max_pixel_ratio: 2.0,
            model_scale: 2.0,
            exposure: 1.0,
            clear_colour: wgpu::Color::TRANSPARENT,
        }
    }
}

impl ViewerConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.assets.model = model.into();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.assets.environment = environment.into();
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<String>) -> Self {
        self.assets.root = root.into();
        self
    }

    pub fn with_tilt(mut self, tilt: TiltConfig) -> Self {
        self.tilt = tilt;
        self
    }

    pub fn with_rgb_shift(mut self, rgb_shift: RgbShiftConfig) -> Self {
        self.rgb_shift = rgb_shift;
        self
    }

    pub fn with_clear_colour(mut self, clear_colour: wgpu::Color) -> Self {
        self.clear_colour = clear_colour;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_demo_constants() {
        let config = ViewerConfig::default();
        assert_eq!(config.camera.fovy, Deg(65.0));
        assert_eq!(config.camera.znear, 0.1);
        assert_eq!(config.camera.zfar, 1000.0);
        assert_eq!(config.camera.distance, 5.0);
        assert_eq!(config.max_pixel_ratio, 2.0);
        assert_eq!(config.model_scale, 2.0);
        assert_eq!(config.rgb_shift.amount, 0.0025);
        assert_eq!(config.tilt.duration, 0.9);
        assert_eq!(config.tilt.easing, Easing::CubicOut);
        assert!((config.tilt.max_angle.0 - 30f32.to_radians()).abs() < 1e-6);
        assert_eq!(config.assets.model, "DamagedHelmet.gltf");
        assert!(config.assets.environment.starts_with("https://"));
    }

    #[test]
    fn builders_only_touch_their_field() {
        let config = ViewerConfig::default()
            .with_model("Box.gltf")
            .with_asset_root("fixtures");
        assert_eq!(config.assets.model, "Box.gltf");
        assert_eq!(config.assets.root, "fixtures");
        assert_eq!(config.assets.environment, AssetConfig::default().environment);
    }
}
