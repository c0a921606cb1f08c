//! What is shown: at most one environment and at most one tilting model.

use std::time::Duration;

use cgmath::Vector3;

use crate::{
    animator::{Orientation, PointerTarget, TiltAnimator},
    config::{TiltConfig, ViewerConfig},
    data_structures::{instance::Instance, scene_graph::SceneNode},
    loader::AssetEvent,
    pipelines::environment::Environment,
};

/// The loaded model together with the animator driving its root rotation.
#[derive(Debug)]
pub struct SceneModel {
    root: SceneNode,
    tilt: TiltAnimator,
}

impl SceneModel {
    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    pub fn tilt(&self) -> &TiltAnimator {
        &self.tilt
    }
}

#[derive(Debug)]
pub struct Scene {
    environment: Option<Environment>,
    model: Option<SceneModel>,
    tilt: TiltConfig,
    model_scale: f32,
}

impl Scene {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            environment: None,
            model: None,
            tilt: config.tilt.clone(),
            model_scale: config.model_scale,
        }
    }

    /// Attaches the environment map. A second environment is refused.
    pub fn attach_environment(&mut self, environment: Environment) -> bool {
        if self.environment.is_some() {
            log::warn!("an environment is already attached, ignoring the new one");
            return false;
        }
        self.environment = Some(environment);
        true
    }

    /// Attaches the model root at the origin with the configured uniform scale.
    /// A second model is refused.
    pub fn attach_model(&mut self, mut root: SceneNode) -> bool {
        if self.model.is_some() {
            log::warn!("a model is already attached, ignoring {}", root.name());
            return false;
        }
        let tilt = TiltAnimator::new(&self.tilt);
        root.set_local_transform(Instance {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: tilt.orientation().to_quaternion(),
            scale: Vector3::new(self.model_scale, self.model_scale, self.model_scale),
        });
        root.update_world_transforms(&Instance::default());
        self.model = Some(SceneModel { root, tilt });
        true
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn model(&self) -> Option<&SceneModel> {
        self.model.as_ref()
    }

    /// Retargets the tilt toward the pointer. Returns the new target, or `None`
    /// when there is no model to tilt.
    pub fn on_pointer_moved(&mut self, pointer: PointerTarget) -> Option<Orientation> {
        self.model
            .as_mut()
            .map(|model| model.tilt.point_at(pointer))
    }

    /// Advances the tilt and pushes the resulting rotation into the node hierarchy.
    pub fn update(&mut self, dt: Duration) {
        let Some(model) = self.model.as_mut() else {
            return;
        };
        let orientation = model.tilt.update(dt.as_secs_f32());
        model.root.local_transform_mut().rotation = orientation.to_quaternion();
        model.root.update_world_transforms(&Instance::default());
    }

    /// Applies the outcome of a background load. Failures leave the slot empty.
    pub fn on_asset_event(&mut self, event: AssetEvent) {
        match event {
            AssetEvent::Progress { asset, fraction } => {
                log::info!("{asset}: {:.0}% loaded", fraction * 100.0)
            }
            AssetEvent::EnvironmentLoaded(environment) => {
                let [width, height] = environment.size;
                if self.attach_environment(environment) {
                    log::info!("environment attached ({width}x{height})");
                }
            }
            AssetEvent::ModelLoaded(root) => {
                let name = root.name().to_string();
                if self.attach_model(root) {
                    log::info!("model {name} attached");
                }
            }
            AssetEvent::Failed { asset, error } => {
                log::error!("An error happened while loading the {asset}: {error:#}")
            }
        }
    }

    pub fn write_to_buffers(&self, queue: &wgpu::Queue) {
        if let Some(model) = &self.model {
            model.root.write_to_buffers(queue);
        }
    }
}
