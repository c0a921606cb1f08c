//! Post-process pass that splits the colour channels of the scene image.

use wgpu::util::DeviceExt;

use crate::{config::RgbShiftConfig, data_structures::texture::Texture, pipelines::basic::mk_render_pipeline};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RgbShiftUniform {
    pub amount: f32,
    /// radians
    pub angle: f32,
    _padding: [f32; 2],
}

impl RgbShiftUniform {
    pub fn new(amount: f32, angle: f32) -> Self {
        Self {
            amount,
            angle,
            _padding: [0.0; 2],
        }
    }

    /// UV offset of the red channel. Blue uses the negation.
    pub fn offset(&self) -> [f32; 2] {
        [
            self.amount * self.angle.cos(),
            self.amount * self.angle.sin(),
        ]
    }
}

impl From<&RgbShiftConfig> for RgbShiftUniform {
    fn from(config: &RgbShiftConfig) -> Self {
        Self::new(config.amount, config.angle.0)
    }
}

#[derive(Debug)]
pub struct RgbShiftPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params: RgbShiftUniform,
    params_buffer: wgpu::Buffer,
}

impl RgbShiftPass {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        config: &RgbShiftConfig,
    ) -> Self {
        let params = RgbShiftUniform::from(config);
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("RGB Shift Params"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
            label: Some("rgb_shift_bind_group_layout"),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("RGB Shift Pipeline Layout"),
            bind_group_layouts: &[Some(&bind_group_layout)],
            immediate_size: 0,
        });
        let shader = wgpu::ShaderModuleDescriptor {
            label: Some("RGB Shift Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("rgb_shift.wgsl").into()),
        };
        let pipeline = mk_render_pipeline(
            device,
            "RGB Shift Pipeline",
            &layout,
            output_format,
            Some(wgpu::BlendState::REPLACE),
            None,
            // the fullscreen triangle is wound clockwise
            None,
            &[],
            shader,
        );

        Self {
            pipeline,
            bind_group_layout,
            params,
            params_buffer,
        }
    }

    pub fn params(&self) -> RgbShiftUniform {
        self.params
    }

    pub fn set_params(&mut self, queue: &wgpu::Queue, params: RgbShiftUniform) {
        self.params = params;
        queue.write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[params]));
    }

    /// Binds `input` as the image to shift. Must be rebuilt whenever the input is recreated.
    pub fn bind_group(&self, device: &wgpu::Device, input: &Texture) -> wgpu::BindGroup {
        let sampler = input
            .sampler
            .clone()
            .unwrap_or_else(|| crate::data_structures::texture::create_default_sampler(device));
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&input.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.params_buffer.as_entire_binding(),
                },
            ],
            label: Some("rgb_shift_bind_group"),
        })
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, bind_group: &wgpu::BindGroup) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}
