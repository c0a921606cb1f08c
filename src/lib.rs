//! helmet-viewer
//!
//! Displays a glTF model lit by an equirectangular HDR environment and tilts it
//! toward the pointer with an eased yaw/pitch animation. Every frame is rendered
//! into an offscreen target first and then composited onto the window through an
//! RGB shift pass. Runs natively and in the browser (WebGL2 via wgpu).
//!
//! High-level modules
//! - `animator`: eased tweens and the pointer driven tilt
//! - `camera`: fixed look-at camera, projection and its uniform
//! - `config`: every tunable of the viewer in [`ViewerConfig`]
//! - `context`: GPU device, surface, pipelines and viewport state
//! - `data_structures`: meshes, materials, textures, instances and the scene graph
//! - `flow`: the winit event loop and frame loop
//! - `loader`: background asset loads reporting back as events
//! - `pipelines`: model shading, environment binding and the RGB shift pass
//! - `render`: the two-pass frame
//! - `resources`: glTF and HDR decoding, asset source resolution
//! - `scene`: the attached environment and model
//! - `viewport`: window size and render target sizing
//!

pub mod animator;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod loader;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod viewport;

pub use config::ViewerConfig;
pub use flow::{ShutdownHandle, Viewer, run};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Browser entry point: runs the stock viewer in the `#canvas` element.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    run(ViewerConfig::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
