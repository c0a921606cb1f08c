use std::sync::Arc;

use anyhow::Context as _;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    camera::{Camera, CameraResources, Projection},
    config::ViewerConfig,
    pipelines::{Pipelines, environment::Environment},
    render::{RenderTargets, SCENE_FORMAT},
    viewport::Viewport,
};

/// GPU state plus everything derived from the window size.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub viewport: Viewport,
    pub pipelines: Pipelines,
    pub targets: RenderTargets,
    /// Bound in place of the HDRI until (or unless) it arrives.
    pub neutral_environment: Environment,
    pub clear_colour: wgpu::Color,
    pub(crate) exposure: f32,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: &ViewerConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let viewport = Viewport::new(size, window.scale_factor(), settings.max_pixel_ratio);

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("cannot open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders write linear colour and rely on an sRGB surface for the encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface supports no formats")?;
        // prefer a compositor that keeps the transparent clear colour
        let alpha_mode = [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
        .into_iter()
        .find(|mode| surface_caps.alpha_modes.contains(mode))
        .or_else(|| surface_caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let projection = Projection::from_config(config.width, config.height, &settings.camera);
        let camera = CameraResources::new(&device, Camera::new(&settings.camera), &projection);

        let pipelines = Pipelines::new(
            &device,
            SCENE_FORMAT,
            surface_format,
            &camera.bind_group_layout,
            &settings.rgb_shift,
        );
        let targets = RenderTargets::new(&device, viewport.render_target_size(), &pipelines.rgb_shift);
        let neutral_environment =
            Environment::neutral(&device, &queue, &pipelines.environment_layout, settings.exposure);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            viewport,
            pipelines,
            targets,
            neutral_environment,
            clear_colour: settings.clear_colour,
            exposure: settings.exposure,
        })
    }

    /// Applies a new window size to the surface, the camera and the render targets.
    /// Returns false (and changes nothing) for a zero-sized window.
    pub fn on_resize(&mut self, size: PhysicalSize<u32>) -> bool {
        if !self.viewport.resize(size) {
            return false;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        self.projection.resize(size.width, size.height);
        self.camera.write(&self.queue, &self.projection);
        self.targets.resize(
            &self.device,
            self.viewport.render_target_size(),
            &self.pipelines.rgb_shift,
        );
        log::debug!(
            "resized to {}x{}, render targets {:?}",
            size.width,
            size.height,
            self.targets.size()
        );
        true
    }

    pub fn on_scale_factor_changed(&mut self, scale_factor: f64) {
        self.viewport.set_scale_factor(scale_factor);
        self.targets.resize(
            &self.device,
            self.viewport.render_target_size(),
            &self.pipelines.rgb_shift,
        );
    }
}

/// The slice of [`Context`] that asset loads need, cheap to clone into a task.
#[derive(Clone, Debug)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub material_layout: wgpu::BindGroupLayout,
    pub environment_layout: wgpu::BindGroupLayout,
    pub exposure: f32,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            material_layout: ctx.pipelines.material_layout.clone(),
            environment_layout: ctx.pipelines.environment_layout.clone(),
            exposure: ctx.exposure,
        }
    }
}
