//! Frame composition: the scene is rasterized into an offscreen target, then
//! the RGB shift pass samples it onto the surface.

use crate::{
    context::Context,
    data_structures::{scene_graph::SceneNode, texture::Texture},
    pipelines::rgb_shift::RgbShiftPass,
    scene::Scene,
};

/// Colour format of the offscreen scene image.
pub const SCENE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Offscreen colour and depth targets of the scene pass.
#[derive(Debug)]
pub struct RenderTargets {
    pub colour: Texture,
    pub depth: Texture,
    /// Samples `colour`; rebuilt together with it.
    pub shift_bind_group: wgpu::BindGroup,
    size: [u32; 2],
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, size: [u32; 2], rgb_shift: &RgbShiftPass) -> Self {
        Self::with_format(device, size, SCENE_FORMAT, rgb_shift)
    }

    pub fn with_format(
        device: &wgpu::Device,
        size: [u32; 2],
        format: wgpu::TextureFormat,
        rgb_shift: &RgbShiftPass,
    ) -> Self {
        let colour = Texture::create_render_target(device, size, format, "scene_colour");
        let depth = Texture::create_depth_texture(device, size, "scene_depth");
        let shift_bind_group = rgb_shift.bind_group(device, &colour);
        Self {
            colour,
            depth,
            shift_bind_group,
            size: [size[0].max(1), size[1].max(1)],
        }
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    /// Recreates the targets when `size` differs from the current one.
    pub fn resize(&mut self, device: &wgpu::Device, size: [u32; 2], rgb_shift: &RgbShiftPass) {
        let size = [size[0].max(1), size[1].max(1)];
        if size == self.size {
            return;
        }
        let format = self.colour.texture.format();
        *self = Self::with_format(device, size, format, rgb_shift);
    }
}

/// Records the scene pass. Without a model only the clear colour is written.
pub fn encode_scene_pass(
    encoder: &mut wgpu::CommandEncoder,
    targets: &RenderTargets,
    clear_colour: wgpu::Color,
    pipeline: &wgpu::RenderPipeline,
    camera_bind_group: &wgpu::BindGroup,
    environment_bind_group: &wgpu::BindGroup,
    root: Option<&SceneNode>,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Scene Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &targets.colour.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_colour),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &targets.depth.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
        multiview_mask: None,
    });

    if let Some(root) = root {
        render_pass.set_pipeline(pipeline);
        root.draw(camera_bind_group, environment_bind_group, &mut render_pass);
    }
}

/// Records the RGB shift pass from the scene image into `output`.
pub fn encode_rgb_shift_pass(
    encoder: &mut wgpu::CommandEncoder,
    rgb_shift: &RgbShiftPass,
    targets: &RenderTargets,
    output: &wgpu::TextureView,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("RGB Shift Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: output,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
        multiview_mask: None,
    });
    rgb_shift.draw(&mut render_pass, &targets.shift_bind_group);
}

/// Renders and presents one frame.
pub fn render(ctx: &Context, scene: &Scene) -> Result<(), wgpu::CurrentSurfaceTexture> {
    let output = match ctx.surface.get_current_texture() {
        wgpu::CurrentSurfaceTexture::Success(output)
        | wgpu::CurrentSurfaceTexture::Suboptimal(output) => output,
        other => return Err(other),
    };
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

    let environment = scene
        .environment()
        .unwrap_or(&ctx.neutral_environment);
    encode_scene_pass(
        &mut encoder,
        &ctx.targets,
        ctx.clear_colour,
        &ctx.pipelines.model,
        &ctx.camera.bind_group,
        &environment.bind_group,
        scene.model().map(|model| model.root()),
    );
    encode_rgb_shift_pass(&mut encoder, &ctx.pipelines.rgb_shift, &ctx.targets, &view);

    ctx.queue.submit(std::iter::once(encoder.finish()));
    output.present();
    Ok(())
}
