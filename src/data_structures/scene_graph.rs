//! Scene graph of a loaded model.
//!
//! A [`SceneNode`] is either a plain container (a glTF node without a mesh, or
//! the synthetic root that wraps a whole glTF scene) or a mesh node that owns
//! its geometry and a single-instance buffer holding its world transform.
//! Local transforms are edited on the CPU, [`SceneNode::update_world_transforms`]
//! propagates them down the tree and [`SceneNode::write_to_buffers`] uploads them.

use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::{Instance, InstanceRaw},
    model::{self, DrawModel},
};

struct MeshBinding {
    model: model::Model,
    instance_buffer: wgpu::Buffer,
}

pub struct SceneNode {
    name: String,
    local: Instance,
    world: Instance,
    mesh: Option<MeshBinding>,
    children: Vec<SceneNode>,
}

impl SceneNode {
    /// A node without geometry. Needs no GPU resources.
    pub fn container(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: Instance::default(),
            world: Instance::default(),
            mesh: None,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(name: impl Into<String>, device: &wgpu::Device, model: model::Model) -> Self {
        let name = name.into();
        let world = Instance::default();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Instance Buffer")),
            contents: bytemuck::cast_slice(&[world.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            name,
            local: Instance::default(),
            world,
            mesh: Some(MeshBinding {
                model,
                instance_buffer,
            }),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    pub fn local_transform(&self) -> &Instance {
        &self.local
    }

    pub fn local_transform_mut(&mut self) -> &mut Instance {
        &mut self.local
    }

    pub fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    pub fn world_transform(&self) -> &Instance {
        &self.world
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    /// Number of nodes in this subtree that carry geometry.
    pub fn mesh_count(&self) -> usize {
        usize::from(self.has_mesh())
            + self
                .children
                .iter()
                .map(SceneNode::mesh_count)
                .sum::<usize>()
    }

    /// Recomputes world transforms of this subtree below `parent`.
    pub fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        let world = self.world.clone();
        for child in &mut self.children {
            child.update_world_transforms(&world);
        }
    }

    pub fn write_to_buffers(&self, queue: &wgpu::Queue) {
        if let Some(mesh) = &self.mesh {
            let raw: [InstanceRaw; 1] = [self.world.to_raw()];
            queue.write_buffer(&mesh.instance_buffer, 0, bytemuck::cast_slice(&raw));
        }
        for child in &self.children {
            child.write_to_buffers(queue);
        }
    }

    pub fn draw<'a>(
        &'a self,
        camera_bind_group: &'a wgpu::BindGroup,
        environment_bind_group: &'a wgpu::BindGroup,
        render_pass: &mut wgpu::RenderPass<'a>,
    ) {
        if let Some(mesh) = &self.mesh {
            render_pass.set_vertex_buffer(1, mesh.instance_buffer.slice(..));
            render_pass.draw_model_instanced(
                &mesh.model,
                0..1,
                camera_bind_group,
                environment_bind_group,
            );
        }
        for child in &self.children {
            child.draw(camera_bind_group, environment_bind_group, render_pass);
        }
    }
}

impl std::fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneNode")
            .field("name", &self.name)
            .field("local", &self.local)
            .field("has_mesh", &self.has_mesh())
            .field("children", &self.children)
            .finish()
    }
}

/// Converts a glTF node (and its children) into a [`SceneNode`].
///
/// `materials` are indexed by glTF material index; primitives without a
/// material use the trailing default material.
pub fn to_scene_node(
    node: gltf::scene::Node,
    buffers: &[Vec<u8>],
    device: &wgpu::Device,
    materials: &[model::Material],
) -> SceneNode {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));

    let mut scene_node = match node.mesh() {
        Some(mesh) => {
            let meshes = mesh
                .primitives()
                .enumerate()
                .filter_map(|(idx, primitive)| {
                    let mesh_name = mesh.name().unwrap_or("unknown_mesh");
                    let material = primitive
                        .material()
                        .index()
                        .unwrap_or(materials.len().saturating_sub(1));
                    let built = to_mesh(&primitive, buffers, device, mesh_name, material);
                    if built.is_none() {
                        log::warn!(
                            "primitive {} of mesh {} has no positions or is not a triangle list, skipping",
                            idx,
                            mesh_name
                        );
                    }
                    built
                })
                .collect();
            let model = model::Model {
                meshes,
                materials: materials.to_vec(),
            };
            SceneNode::with_mesh(name, device, model)
        }
        None => SceneNode::container(name),
    };

    let (position, rotation, scale) = node.transform().decomposed();
    scene_node.set_local_transform(Instance {
        position: position.into(),
        // glTF stores quaternions as [x, y, z, w]
        rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: scale.into(),
    });
    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buffers, device, materials));
    }

    scene_node
}

fn to_mesh(
    primitive: &gltf::mesh::Primitive,
    buffers: &[Vec<u8>],
    device: &wgpu::Device,
    mesh_name: &str,
    material: usize,
) -> Option<model::Mesh> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        return None;
    }
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let mut vertices: Vec<model::ModelVertex> = reader
        .read_positions()?
        .map(|position| model::ModelVertex {
            position,
            tex_coords: Default::default(),
            normal: Default::default(),
            tangent: Default::default(),
            bitangent: Default::default(),
        })
        .collect();

    if let Some(normals) = reader.read_normals() {
        vertices
            .iter_mut()
            .zip(normals)
            .for_each(|(vertex, normal)| vertex.normal = normal);
    }
    if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
        vertices
            .iter_mut()
            .zip(tex_coords)
            .for_each(|(vertex, tex_coord)| vertex.tex_coords = tex_coord);
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };

    match reader.read_tangents() {
        Some(tangents) => vertices.iter_mut().zip(tangents).for_each(|(vertex, tangent)| {
            // GLTF represents tangents as vec4 where the 4th elem can be used to calculate the bitangent
            let tangent: cgmath::Vector4<f32> = tangent.into();
            let normal: cgmath::Vector3<f32> = vertex.normal.into();
            vertex.tangent = tangent.truncate().into();
            vertex.bitangent = (normal.cross(tangent.truncate()) * tangent.w).into();
        }),
        None => compute_tangents(&mut vertices, &indices),
    }

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Vertex Buffer", mesh_name)),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Index Buffer", mesh_name)),
        contents: bytemuck::cast_slice(&indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    Some(model::Mesh {
        name: mesh_name.to_string(),
        vertex_buffer,
        index_buffer,
        num_elements: indices.len() as u32,
        material,
    })
}

/// Per-vertex tangents and bitangents averaged over the adjacent triangles, for
/// primitives that ship a normal map but no `TANGENT` attribute.
pub(crate) fn compute_tangents(vertices: &mut [model::ModelVertex], indices: &[u32]) {
    let mut triangles_included = vec![0u32; vertices.len()];

    for c in indices.chunks_exact(3) {
        let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
        if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
            continue;
        }
        let (v0, v1, v2) = (vertices[i0], vertices[i1], vertices[i2]);

        let pos0: cgmath::Vector3<_> = v0.position.into();
        let pos1: cgmath::Vector3<_> = v1.position.into();
        let pos2: cgmath::Vector3<_> = v2.position.into();

        let uv0: cgmath::Vector2<_> = v0.tex_coords.into();
        let uv1: cgmath::Vector2<_> = v1.tex_coords.into();
        let uv2: cgmath::Vector2<_> = v2.tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        //     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            // degenerate UVs
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // flipped for right-handed normal maps in wgpu's texture coordinate system
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for i in [i0, i1, i2] {
            vertices[i].tangent = (tangent + cgmath::Vector3::from(vertices[i].tangent)).into();
            vertices[i].bitangent =
                (bitangent + cgmath::Vector3::from(vertices[i].bitangent)).into();
            triangles_included[i] += 1;
        }
    }

    for (v, n) in vertices.iter_mut().zip(triangles_included) {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        v.tangent = (cgmath::Vector3::from(v.tangent) * denom).into();
        v.bitangent = (cgmath::Vector3::from(v.bitangent) * denom).into();
    }
}
