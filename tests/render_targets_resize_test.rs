#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
fn extent(texture: &wgpu::Texture) -> [u32; 2] {
    [texture.width(), texture.height()]
}

#[test]
#[cfg(feature = "integration-tests")]
fn targets_follow_the_viewport_immediately() {
    use common::test_utils::headless_device;
    use helmet_viewer::{
        config::RgbShiftConfig, pipelines::rgb_shift::RgbShiftPass, render::RenderTargets,
        viewport::Viewport,
    };
    use winit::dpi::PhysicalSize;

    let Some((device, _queue)) = headless_device() else {
        eprintln!("no adapter available, skipping");
        return;
    };
    let format = wgpu::TextureFormat::Rgba8Unorm;
    let rgb_shift = RgbShiftPass::new(&device, format, &RgbShiftConfig::default());
    let mut targets = RenderTargets::with_format(&device, [64, 4], format, &rgb_shift);
    assert_eq!(targets.size(), [64, 4]);
    assert_eq!(extent(&targets.colour.texture), [64, 4]);
    assert_eq!(extent(&targets.depth.texture), [64, 4]);

    targets.resize(&device, [32, 8], &rgb_shift);
    assert_eq!(targets.size(), [32, 8]);
    assert_eq!(extent(&targets.colour.texture), [32, 8]);
    assert_eq!(extent(&targets.depth.texture), [32, 8]);
    assert_eq!(targets.colour.texture.format(), format);

    // same size again keeps the existing textures
    let colour = targets.colour.texture.clone();
    let depth = targets.depth.texture.clone();
    targets.resize(&device, [32, 8], &rgb_shift);
    assert!(targets.colour.texture == colour);
    assert!(targets.depth.texture == depth);

    // driven by the viewport, including a capped high-density display
    let mut viewport = Viewport::new(PhysicalSize::new(300, 200), 3.0, 2.0);
    targets.resize(&device, viewport.render_target_size(), &rgb_shift);
    assert_eq!(extent(&targets.colour.texture), [200, 133]);

    assert!(viewport.resize(PhysicalSize::new(600, 300)));
    targets.resize(&device, viewport.render_target_size(), &rgb_shift);
    assert_eq!(targets.size(), viewport.render_target_size());
    assert_eq!(extent(&targets.colour.texture), [400, 200]);
    assert_eq!(extent(&targets.depth.texture), [400, 200]);
}

#[test]
#[cfg(feature = "integration-tests")]
fn degenerate_sizes_are_clamped() {
    use common::test_utils::headless_device;
    use helmet_viewer::{
        config::RgbShiftConfig, pipelines::rgb_shift::RgbShiftPass, render::RenderTargets,
    };

    let Some((device, _queue)) = headless_device() else {
        eprintln!("no adapter available, skipping");
        return;
    };
    let format = wgpu::TextureFormat::Rgba8Unorm;
    let rgb_shift = RgbShiftPass::new(&device, format, &RgbShiftConfig::default());
    let mut targets = RenderTargets::with_format(&device, [16, 16], format, &rgb_shift);

    targets.resize(&device, [0, 5], &rgb_shift);
    assert_eq!(targets.size(), [1, 5]);
    assert_eq!(extent(&targets.colour.texture), [1, 5]);
}
