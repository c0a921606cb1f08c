#![allow(dead_code)]

use helmet_viewer::animator::{Orientation, TiltAnimator};

pub(crate) const EPS: f32 = 1e-4;

pub(crate) fn approx(actual: f32, expected: f32) -> bool {
    (actual - expected).abs() < EPS
}

/// Advances `animator` in fixed steps and returns every sampled orientation.
pub(crate) fn sample(animator: &mut TiltAnimator, step: f32, steps: usize) -> Vec<Orientation> {
    (0..steps).map(|_| animator.update(step)).collect()
}

/// Counts the frames of a 60 fps loop until the animator settles.
#[derive(Default)]
pub(crate) struct FrameCounter(pub(crate) u32);

impl FrameCounter {
    pub(crate) const DT: f32 = 1.0 / 60.0;

    pub(crate) fn frame(&self) -> u32 {
        self.0
    }

    pub(crate) fn run_until_settled(&mut self, animator: &mut TiltAnimator, max_frames: u32) {
        while !animator.is_settled() && self.0 < max_frames {
            animator.update(Self::DT);
            self.0 += 1;
        }
    }

    pub(crate) fn elapsed(&self) -> f32 {
        self.0 as f32 * Self::DT
    }
}

/// A device without a surface, or `None` on machines without any adapter.
#[cfg(feature = "integration-tests")]
pub(crate) fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    futures::executor::block_on(async {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("test device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .ok()
    })
}

/// Copies an `Rgba8` texture back to the CPU. `width * 4` must be a multiple of 256.
#[cfg(feature = "integration-tests")]
pub(crate) fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> image::RgbaImage {
    let u32_size = std::mem::size_of::<u32>() as u32;
    let (width, height) = (texture.width(), texture.height());
    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        size: (u32_size * width * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        label: Some("readback"),
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(u32_size * width),
                rows_per_image: Some(height),
            },
        },
        texture.size(),
    );
    queue.submit(std::iter::once(encoder.finish()));

    futures::executor::block_on(async {
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).unwrap();
        });
        device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(std::time::Duration::from_secs(3)),
            })
            .unwrap();
        rx.receive().await.unwrap().unwrap();
        let data = buffer_slice.get_mapped_range().to_vec();
        image::RgbaImage::from_raw(width, height, data).unwrap()
    })
}
