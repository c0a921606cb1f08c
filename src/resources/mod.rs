//! Loading of the viewer's external assets: the glTF model and the HDR environment.

use std::collections::HashMap;

use anyhow::{Context, anyhow};

use crate::{
    context::InitContext,
    data_structures::{
        scene_graph::{SceneNode, to_scene_node},
        texture::Texture,
    },
    pipelines::environment::Environment,
    resources::{
        source::{AssetSource, StagedProgress, load_binary},
        texture::{TextureCache, load_materials},
    },
};

pub mod source;
pub mod texture;

/// Loads a `.gltf`/`.glb` file and everything it references.
///
/// The returned root is always a container wrapping the scene's top level
/// nodes, so transforms applied to it never clobber the file's own node transforms.
pub async fn load_model_gltf<P>(
    source: &AssetSource,
    ctx: &InitContext,
    mut on_progress: P,
) -> anyhow::Result<SceneNode>
where
    P: FnMut(f32),
{
    let gltf_bytes = load_binary(source, |_| {}).await?;
    let gltf = gltf::Gltf::from_slice(&gltf_bytes)
        .with_context(|| format!("{source} is not a valid glTF file"))?;

    let external_images: Vec<(usize, &str)> = gltf
        .images()
        .filter_map(|image| match image.source() {
            gltf::image::Source::Uri { uri, .. } => Some((image.index(), uri)),
            gltf::image::Source::View { .. } => None,
        })
        .collect();
    let external_buffers = gltf
        .buffers()
        .filter(|buffer| matches!(buffer.source(), gltf::buffer::Source::Uri(_)))
        .count();
    let mut progress = StagedProgress::new(1 + external_buffers + external_images.len());
    on_progress(progress.complete_stage());

    let mut buffers = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| anyhow!("{source} references a binary chunk it does not have"))?,
            gltf::buffer::Source::Uri(uri) => {
                let sidecar = source.sibling(uri)?;
                let data = load_binary(&sidecar, |f| on_progress(progress.within(f)))
                    .await
                    .with_context(|| format!("cannot load buffer {sidecar}"))?;
                on_progress(progress.complete_stage());
                data
            }
        };
        buffers.push(data);
    }

    let mut images = HashMap::new();
    for (index, uri) in external_images {
        let sidecar = source.sibling(uri)?;
        let data = load_binary(&sidecar, |f| on_progress(progress.within(f)))
            .await
            .with_context(|| format!("cannot load image {sidecar}"))?;
        on_progress(progress.complete_stage());
        images.insert(index, data);
    }

    let mut textures = TextureCache::new(&ctx.device, &ctx.queue, &buffers, &images);
    let materials = load_materials(&gltf.document, &mut textures, &ctx.material_layout)?;

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| anyhow!("{source} contains no scene"))?;
    let mut root = SceneNode::container(source.file_name());
    for node in scene.nodes() {
        root.add_child(to_scene_node(node, &buffers, &ctx.device, &materials));
    }
    if root.mesh_count() == 0 {
        log::warn!("{source} loaded but contains no drawable meshes");
    }

    Ok(root)
}

/// Loads an equirectangular Radiance `.hdr` panorama as the scene environment.
pub async fn load_environment_hdr<P>(
    source: &AssetSource,
    ctx: &InitContext,
    on_progress: P,
) -> anyhow::Result<Environment>
where
    P: FnMut(f32),
{
    let bytes = load_binary(source, on_progress).await?;
    let texture = Texture::from_hdr_bytes(&ctx.device, &ctx.queue, &bytes, source.file_name())?;
    let size = texture.texture.size();
    Ok(Environment::new(
        &ctx.device,
        &ctx.environment_layout,
        texture,
        [size.width, size.height],
        ctx.exposure,
    ))
}
