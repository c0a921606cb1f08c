//! Background loading of the environment and the model.
//!
//! Both loads are started together and run independently. Their outcomes travel
//! back to the event loop as [`AssetEvent`]s, so the scene is only ever mutated
//! on the thread that owns it.

use std::fmt;

use crate::{
    config::AssetConfig,
    context::InitContext,
    data_structures::scene_graph::SceneNode,
    pipelines::environment::Environment,
    resources::{self, source::AssetSource},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Environment,
    Model,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Environment => write!(f, "environment"),
            AssetKind::Model => write!(f, "model"),
        }
    }
}

pub enum AssetEvent {
    Progress { asset: AssetKind, fraction: f32 },
    EnvironmentLoaded(Environment),
    ModelLoaded(SceneNode),
    Failed { asset: AssetKind, error: anyhow::Error },
}

impl fmt::Debug for AssetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetEvent::Progress { asset, fraction } => f
                .debug_struct("Progress")
                .field("asset", asset)
                .field("fraction", fraction)
                .finish(),
            AssetEvent::EnvironmentLoaded(env) => {
                f.debug_tuple("EnvironmentLoaded").field(&env.size).finish()
            }
            AssetEvent::ModelLoaded(root) => f.debug_tuple("ModelLoaded").field(&root.name()).finish(),
            AssetEvent::Failed { asset, error } => f
                .debug_struct("Failed")
                .field("asset", asset)
                .field("error", &format_args!("{error:#}"))
                .finish(),
        }
    }
}

impl AssetEvent {
    pub fn asset(&self) -> AssetKind {
        match self {
            AssetEvent::Progress { asset, .. } | AssetEvent::Failed { asset, .. } => *asset,
            AssetEvent::EnvironmentLoaded(_) => AssetKind::Environment,
            AssetEvent::ModelLoaded(_) => AssetKind::Model,
        }
    }
}

/// Receiving end of the loaders. Implemented by the event loop proxy; delivery
/// after the loop has gone away only logs.
#[cfg(not(target_arch = "wasm32"))]
pub trait AssetSink: Clone + Send + 'static {
    fn deliver(&self, event: AssetEvent);
}

#[cfg(target_arch = "wasm32")]
pub trait AssetSink: Clone + 'static {
    fn deliver(&self, event: AssetEvent);
}

/// Loads the environment, reporting progress and exactly one final outcome.
pub async fn load_environment<S: AssetSink>(ctx: InitContext, name: String, root: String, sink: S) {
    let asset = AssetKind::Environment;
    let progress = sink.clone();
    let result = async move {
        let source = AssetSource::resolve(&name, &root)?;
        log::info!("loading {asset} from {source}");
        resources::load_environment_hdr(&source, &ctx, move |fraction| {
            progress.deliver(AssetEvent::Progress { asset, fraction })
        })
        .await
    }
    .await;
    match result {
        Ok(environment) => sink.deliver(AssetEvent::EnvironmentLoaded(environment)),
        Err(error) => sink.deliver(AssetEvent::Failed { asset, error }),
    }
}

/// Loads the model, reporting progress and exactly one final outcome.
pub async fn load_model<S: AssetSink>(ctx: InitContext, name: String, root: String, sink: S) {
    let asset = AssetKind::Model;
    let progress = sink.clone();
    let result = async move {
        let source = AssetSource::resolve(&name, &root)?;
        log::info!("loading {asset} from {source}");
        resources::load_model_gltf(&source, &ctx, move |fraction| {
            progress.deliver(AssetEvent::Progress { asset, fraction })
        })
        .await
    }
    .await;
    match result {
        Ok(root) => sink.deliver(AssetEvent::ModelLoaded(root)),
        Err(error) => sink.deliver(AssetEvent::Failed { asset, error }),
    }
}

/// Starts both loads. Neither waits for the other.
pub fn spawn_loads<S: AssetSink>(
    ctx: &InitContext,
    assets: &AssetConfig,
    sink: S,
    #[cfg(not(target_arch = "wasm32"))] runtime: &tokio::runtime::Runtime,
) {
    let environment = load_environment(
        ctx.clone(),
        assets.environment.clone(),
        assets.root.clone(),
        sink.clone(),
    );
    let model = load_model(ctx.clone(), assets.model.clone(), assets.root.clone(), sink);

    #[cfg(not(target_arch = "wasm32"))]
    {
        spawn(runtime, environment);
        spawn(runtime, model);
    }
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(environment);
        wasm_bindgen_futures::spawn_local(model);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn<F>(runtime: &tokio::runtime::Runtime, task: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    // detached; the outcome is reported through the sink
    drop(runtime.spawn(task));
}
