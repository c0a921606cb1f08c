//! Scene data: models, textures, scene graphs and instances.
//!
//! - `model` holds meshes and PBR materials together with their GPU resources
//! - `texture` wraps GPU textures and the helpers that create them
//! - `instance` holds per-node transforms and their shader layout
//! - `scene_graph` organizes nodes hierarchically and converts glTF nodes

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
