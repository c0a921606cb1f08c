//! Application event loop.
//!
//! [`Viewer`] owns the winit event loop and the [`App`] handler driving it. The
//! handler creates the window and GPU context on `resumed`, starts both asset
//! loads, and then renders continuously: every `RedrawRequested` advances the
//! scene by the time since the previous frame, draws, and requests the next one.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window (the `#canvas` element on the web) and the [`Context`]
//! 2. asset loads run in the background and report back as [`ViewerEvent::Asset`]
//! 3. pointer moves retarget the model tilt, resizes reconfigure surface and targets
//! 4. the loop exits on window close or on a [`ShutdownHandle::shutdown`] request

use std::{fmt::Debug, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{
    config::ViewerConfig,
    context::{Context, InitContext},
    loader::{self, AssetEvent, AssetSink},
    render,
    scene::Scene,
};

/// Wall clock for the frame loop. Yields the time elapsed since the previous tick.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    last: Instant,
    frames: u64,
    running: bool,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self {
            last: now,
            frames: 0,
            running: true,
        }
    }

    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Duration {
        let dt = if now > self.last {
            now - self.last
        } else {
            Duration::ZERO
        };
        self.last = now;
        self.frames += 1;
        dt
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

pub enum ViewerEvent {
    /// GPU initialisation finished on the web, where it cannot block the loop.
    #[cfg(target_arch = "wasm32")]
    Initialized(Box<AppState>),
    Asset(AssetEvent),
    Exit,
}

impl Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(target_arch = "wasm32")]
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Asset(event) => f.debug_tuple("Asset").field(event).finish(),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

impl AssetSink for EventLoopProxy<ViewerEvent> {
    fn deliver(&self, event: AssetEvent) {
        if let Err(closed) = self.send_event(ViewerEvent::Asset(event)) {
            log::info!("event loop closed, dropping {:?}", closed.0);
        }
    }
}

/// Asks a running [`Viewer`] to stop. Cloneable and usable from any thread.
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    proxy: EventLoopProxy<ViewerEvent>,
}

impl ShutdownHandle {
    /// Returns false if the loop has already exited.
    pub fn shutdown(&self) -> bool {
        self.proxy.send_event(ViewerEvent::Exit).is_ok()
    }
}

/// GPU context, scene and frame timing, available once the window exists.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    pub scene: Scene,
    is_surface_configured: bool,
    clock: FrameClock,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &ViewerConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config).await?;
        Ok(Self {
            ctx,
            scene: Scene::new(config),
            is_surface_configured: false,
            clock: FrameClock::new(),
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if self.ctx.on_resize(size) {
            self.is_surface_configured = true;
        }
    }

    fn frame(&mut self) -> Result<(), wgpu::CurrentSurfaceTexture> {
        let dt = self.clock.tick();
        self.scene.update(dt);

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }
        self.scene.write_to_buffers(&self.ctx.queue);
        render::render(&self.ctx, &self.scene)
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    state: Option<AppState>,
    config: ViewerConfig,
    initializing: bool,
    /// Startup failure, handed back to the caller of [`Viewer::run`].
    init_error: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            config,
            initializing: false,
            init_error: None,
        })
    }

    fn start(&mut self, mut state: AppState) {
        let size = state.ctx.window.inner_size();
        state.resize(size);

        let init = InitContext::from(&state.ctx);
        loader::spawn_loads(
            &init,
            &self.config.assets,
            self.proxy.clone(),
            #[cfg(not(target_arch = "wasm32"))]
            &self.async_runtime,
        );

        state.ctx.window.request_redraw();
        self.state = Some(state);
        self.initializing = false;
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("Viewer initialization failed: {error:#}");
        self.init_error = Some(error);
        self.initializing = false;
        event_loop.exit();
    }

    fn window_attributes(&self) -> anyhow::Result<winit::window::WindowAttributes> {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Damaged Helmet");

        #[cfg(target_arch = "wasm32")]
        {
            use anyhow::Context as _;
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let window = web_sys::window().context("no browser window")?;
            let document = window.document().context("no document")?;
            let canvas = document
                .get_element_by_id(&self.config.canvas_id)
                .with_context(|| format!("no element with id `{}`", self.config.canvas_id))?;
            let html_canvas_element = canvas
                .dyn_into::<web_sys::HtmlCanvasElement>()
                .map_err(|_| anyhow::anyhow!("`{}` is not a canvas", self.config.canvas_id))?;
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        Ok(window_attributes)
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.initializing {
            return;
        }
        self.initializing = true;

        let window = match self
            .window_attributes()
            .and_then(|attributes| Ok(event_loop.create_window(attributes)?))
        {
            Ok(window) => Arc::new(window),
            Err(error) => return self.fail(event_loop, error),
        };

        let config = self.config.clone();
        let init_future = async move { AppState::new(window, &config).await };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(state) => self.start(state),
                Err(error) => self.fail(event_loop, error),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok(state) => ViewerEvent::Initialized(Box::new(state)),
                    Err(error) => {
                        log::error!("Viewer initialization failed: {error:#}");
                        ViewerEvent::Exit
                    }
                };
                if proxy.send_event(event).is_err() {
                    log::warn!("event loop closed before initialization finished");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            #[cfg(target_arch = "wasm32")]
            ViewerEvent::Initialized(state) => self.start(*state),
            ViewerEvent::Asset(event) => match &mut self.state {
                Some(state) => state.scene.on_asset_event(event),
                None => log::warn!("asset event without a scene: {event:?}"),
            },
            ViewerEvent::Exit => {
                if let Some(state) = &mut self.state {
                    state.clock.stop();
                }
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                state.clock.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                state.ctx.on_scale_factor_changed(scale_factor);
                let size = state.ctx.window.inner_size();
                state.resize(size);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let pointer = state.ctx.viewport.normalize(position);
                if let Some(target) = state.scene.on_pointer_moved(pointer) {
                    log::trace!("tilting toward {target:?}");
                }
            }
            WindowEvent::RedrawRequested => {
                if !state.clock.is_running() {
                    return;
                }
                // keep the loop going
                state.ctx.window.request_redraw();

                match state.frame() {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size);
                    }
                    Err(e) => {
                        log::error!("Unable to render {:?}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// The viewer window and its event loop.
pub struct Viewer {
    event_loop: EventLoop<ViewerEvent>,
    app: App,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::with_user_event().build()?;
        let app = App::new(&event_loop, config)?;
        Ok(Self { event_loop, app })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            proxy: self.event_loop.create_proxy(),
        }
    }

    /// Blocks until the window is closed or a shutdown is requested.
    pub fn run(self) -> anyhow::Result<()> {
        let Viewer {
            event_loop,
            mut app,
        } = self;
        event_loop.run_app(&mut app)?;
        match app.init_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

pub fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let env = env_logger::Env::default().default_filter_or("info");
        if let Err(e) = env_logger::Builder::from_env(env).try_init() {
            eprintln!("Warning: Could not initialize logger: {}", e);
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        // fails only when a logger is already installed
        let _ = console_log::init_with_level(log::Level::Info);
    }
}

/// Opens the viewer with `config` and runs it to completion.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    init_logger();
    Viewer::new(config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_reports_time_between_ticks() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        assert_eq!(clock.tick_at(start + Duration::from_millis(16)), Duration::from_millis(16));
        assert_eq!(clock.tick_at(start + Duration::from_millis(50)), Duration::from_millis(34));
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start + Duration::from_secs(1));
        assert_eq!(clock.tick_at(start), Duration::ZERO);
    }

    #[test]
    fn stopped_clock_reports_it() {
        let mut clock = FrameClock::new();
        assert!(clock.is_running());
        clock.stop();
        assert!(!clock.is_running());
    }
}
