#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
const WIDTH: u32 = 64;
#[cfg(feature = "integration-tests")]
const HEIGHT: u32 = 4;

/// Left half white, right half black.
#[cfg(feature = "integration-tests")]
fn write_hard_edge(queue: &wgpu::Queue, targets: &helmet_viewer::render::RenderTargets) {
    let input = image::RgbaImage::from_fn(WIDTH, HEIGHT, |x, _| {
        if x < WIDTH / 2 {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([0, 0, 0, 255])
        }
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &targets.colour.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        &input,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * WIDTH),
            rows_per_image: Some(HEIGHT),
        },
        targets.colour.texture.size(),
    );
}

#[test]
#[cfg(feature = "integration-tests")]
fn channels_split_across_a_hard_edge() {
    use cgmath::Rad;
    use common::test_utils::{headless_device, read_texture};
    use helmet_viewer::{
        config::RgbShiftConfig,
        data_structures::texture::Texture,
        pipelines::rgb_shift::RgbShiftPass,
        render::{RenderTargets, encode_rgb_shift_pass},
    };

    let Some((device, queue)) = headless_device() else {
        eprintln!("no adapter available, skipping");
        return;
    };
    let format = wgpu::TextureFormat::Rgba8Unorm;
    // two texels of shift at this width
    let config = RgbShiftConfig {
        amount: 2.0 / WIDTH as f32,
        angle: Rad(0.0),
    };
    let rgb_shift = RgbShiftPass::new(&device, format, &config);
    let targets = RenderTargets::with_format(&device, [WIDTH, HEIGHT], format, &rgb_shift);

    write_hard_edge(&queue, &targets);

    let output = Texture::create_render_target(&device, [WIDTH, HEIGHT], format, "shift output");
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Test Encoder"),
    });
    encode_rgb_shift_pass(&mut encoder, &rgb_shift, &targets, &output.view);
    queue.submit(std::iter::once(encoder.finish()));

    let pixels = read_texture(&device, &queue, &output.texture);
    for y in 0..HEIGHT {
        // untouched far from the edge
        assert_eq!(*pixels.get_pixel(10, y), image::Rgba([255, 255, 255, 255]));
        assert_eq!(*pixels.get_pixel(50, y), image::Rgba([0, 0, 0, 255]));
        // red reads two texels to the right and leaves the edge first
        assert_eq!(*pixels.get_pixel(30, y), image::Rgba([0, 255, 255, 255]));
        // blue reads two texels to the left and trails behind
        assert_eq!(*pixels.get_pixel(33, y), image::Rgba([0, 0, 255, 255]));
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn empty_scene_composites_the_clear_colour() {
    use common::test_utils::{headless_device, read_texture};
    use helmet_viewer::{
        camera::{Camera, CameraResources, Projection},
        config::ViewerConfig,
        data_structures::texture::Texture,
        pipelines::{Pipelines, environment::Environment},
        render::{RenderTargets, encode_rgb_shift_pass, encode_scene_pass},
    };

    let Some((device, queue)) = headless_device() else {
        eprintln!("no adapter available, skipping");
        return;
    };
    let format = wgpu::TextureFormat::Rgba8Unorm;
    let config = ViewerConfig::default();
    let projection = Projection::from_config(WIDTH, HEIGHT, &config.camera);
    let camera = CameraResources::new(&device, Camera::new(&config.camera), &projection);
    let pipelines = Pipelines::new(
        &device,
        format,
        format,
        &camera.bind_group_layout,
        &config.rgb_shift,
    );
    let environment =
        Environment::neutral(&device, &queue, &pipelines.environment_layout, config.exposure);
    let targets = RenderTargets::with_format(&device, [WIDTH, HEIGHT], format, &pipelines.rgb_shift);
    let output = Texture::create_render_target(&device, [WIDTH, HEIGHT], format, "frame");

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Test Encoder"),
    });
    encode_scene_pass(
        &mut encoder,
        &targets,
        wgpu::Color::RED,
        &pipelines.model,
        &camera.bind_group,
        &environment.bind_group,
        None,
    );
    encode_rgb_shift_pass(&mut encoder, &pipelines.rgb_shift, &targets, &output.view);
    queue.submit(std::iter::once(encoder.finish()));

    // a uniform image is unaffected by the shift
    let pixels = read_texture(&device, &queue, &output.texture);
    for pixel in pixels.pixels() {
        assert_eq!(*pixel, image::Rgba([255, 0, 0, 255]));
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn shift_amount_can_change_at_runtime() {
    use common::test_utils::{headless_device, read_texture};
    use helmet_viewer::{
        config::RgbShiftConfig,
        data_structures::texture::Texture,
        pipelines::rgb_shift::{RgbShiftPass, RgbShiftUniform},
        render::{RenderTargets, encode_rgb_shift_pass},
    };

    let Some((device, queue)) = headless_device() else {
        eprintln!("no adapter available, skipping");
        return;
    };
    let format = wgpu::TextureFormat::Rgba8Unorm;
    let mut rgb_shift = RgbShiftPass::new(&device, format, &RgbShiftConfig::default());
    assert_eq!(rgb_shift.params(), RgbShiftUniform::from(&RgbShiftConfig::default()));

    // a zero amount turns the pass into a plain copy
    rgb_shift.set_params(&queue, RgbShiftUniform::new(0.0, 0.0));
    assert_eq!(rgb_shift.params().amount, 0.0);

    let targets = RenderTargets::with_format(&device, [WIDTH, HEIGHT], format, &rgb_shift);
    write_hard_edge(&queue, &targets);
    let output = Texture::create_render_target(&device, [WIDTH, HEIGHT], format, "shift output");
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Test Encoder"),
    });
    encode_rgb_shift_pass(&mut encoder, &rgb_shift, &targets, &output.view);
    queue.submit(std::iter::once(encoder.finish()));

    let pixels = read_texture(&device, &queue, &output.texture);
    for y in 0..HEIGHT {
        assert_eq!(*pixels.get_pixel(WIDTH / 2 - 1, y), image::Rgba([255, 255, 255, 255]));
        assert_eq!(*pixels.get_pixel(WIDTH / 2, y), image::Rgba([0, 0, 0, 255]));
    }
}
