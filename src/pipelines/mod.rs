//! Render pipelines and the bind group layouts they are built against.
//!
//! - `basic` is the shared pipeline builder
//! - `model` shades glTF meshes into the offscreen scene target
//! - `environment` owns the HDRI bind group the model pipeline samples
//! - `rgb_shift` composites the scene target onto the surface

pub mod basic;
pub mod environment;
pub mod model;
pub mod rgb_shift;

use crate::config::RgbShiftConfig;

/// Pipelines and layouts created once per device.
#[derive(Debug)]
pub struct Pipelines {
    pub model: wgpu::RenderPipeline,
    pub rgb_shift: rgb_shift::RgbShiftPass,
    pub material_layout: wgpu::BindGroupLayout,
    pub environment_layout: wgpu::BindGroupLayout,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        scene_format: wgpu::TextureFormat,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        rgb_shift: &RgbShiftConfig,
    ) -> Self {
        let material_layout = model::material_layout(device);
        let environment_layout = environment::mk_bind_group_layout(device);
        let model = model::mk_model_pipeline(
            device,
            scene_format,
            &material_layout,
            camera_layout,
            &environment_layout,
        );
        let rgb_shift = rgb_shift::RgbShiftPass::new(device, surface_format, rgb_shift);

        Self {
            model,
            rgb_shift,
            material_layout,
            environment_layout,
        }
    }
}
