//! Image based lighting source: an equirectangular HDR panorama bound at group 2.

use wgpu::util::DeviceExt;

use crate::data_structures::texture::Texture;

/// Radiance used when no HDRI is attached: a flat grey sky.
const NEUTRAL_RADIANCE: [f32; 4] = [0.6, 0.6, 0.6, 1.0];

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EnvironmentUniform {
    pub exposure: f32,
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: [f32; 3],
}

impl EnvironmentUniform {
    pub fn new(exposure: f32) -> Self {
        Self {
            exposure,
            _padding: [0.0; 3],
        }
    }
}

#[derive(Debug)]
pub struct Environment {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
    pub size: [u32; 2],
}

impl Environment {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        texture: Texture,
        size: [u32; 2],
        exposure: f32,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Environment Buffer"),
            contents: bytemuck::cast_slice(&[EnvironmentUniform::new(exposure)]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let sampler = texture.sampler.clone().unwrap_or_else(|| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("environment sampler"),
                ..Default::default()
            })
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
            ],
            label: Some("environment_bind_group"),
        });

        Self {
            texture,
            bind_group,
            size,
        }
    }

    /// Stand-in bound while the HDRI is missing, so the model is still default-lit.
    pub fn neutral(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        exposure: f32,
    ) -> Self {
        let texture =
            Texture::from_hdr_texels(device, queue, &NEUTRAL_RADIANCE, [1, 1], "neutral environment");
        Self::new(device, layout, texture, [1, 1], exposure)
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
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
        label: Some("environment_bind_group_layout"),
    })
}
