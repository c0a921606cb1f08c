use std::collections::HashMap;

use anyhow::{Context, anyhow};

use crate::data_structures::{
    model::{self, MaterialMaps, MaterialUniform},
    texture::Texture,
};

/// Decodes glTF textures on demand. Each image is uploaded at most once per colour space.
pub struct TextureCache<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    buffers: &'a [Vec<u8>],
    /// Bytes of images referenced by URI, keyed by image index.
    external: &'a HashMap<usize, Vec<u8>>,
    uploaded: HashMap<(usize, bool), Texture>,
}

impl<'a> TextureCache<'a> {
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        buffers: &'a [Vec<u8>],
        external: &'a HashMap<usize, Vec<u8>>,
    ) -> Self {
        Self {
            device,
            queue,
            buffers,
            external,
            uploaded: HashMap::new(),
        }
    }

    pub fn get(&mut self, texture: gltf::Texture, linear: bool) -> anyhow::Result<Texture> {
        let image = texture.source();
        let key = (image.index(), linear);
        if let Some(texture) = self.uploaded.get(&key) {
            return Ok(texture.clone());
        }

        let (bytes, format) = self.encoded(&image)?;
        let label = image
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("image_{}", image.index()));
        let uploaded = Texture::from_bytes(
            self.device,
            self.queue,
            bytes,
            &label,
            format.as_deref(),
            linear,
        )
        .with_context(|| format!("cannot decode texture {label}"))?;
        self.uploaded.insert(key, uploaded.clone());
        Ok(uploaded)
    }

    fn encoded(&self, image: &gltf::Image) -> anyhow::Result<(&'a [u8], Option<String>)> {
        match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let start = view.offset();
                let end = start + view.length();
                let bytes = self
                    .buffers
                    .get(view.buffer().index())
                    .and_then(|buffer| buffer.get(start..end))
                    .ok_or_else(|| anyhow!("image {} points outside its buffer", image.index()))?;
                Ok((bytes, format_hint(Some(mime_type), None)))
            }
            gltf::image::Source::Uri { uri, mime_type } => {
                let bytes = self
                    .external
                    .get(&image.index())
                    .ok_or_else(|| anyhow!("image {uri} was not fetched"))?;
                Ok((bytes.as_slice(), format_hint(mime_type, Some(uri))))
            }
        }
    }
}

/// Extension understood by `image::ImageFormat::from_extension`.
fn format_hint(mime_type: Option<&str>, uri: Option<&str>) -> Option<String> {
    mime_type
        .and_then(|mime| mime.rsplit('/').next())
        .map(str::to_string)
        .or_else(|| {
            uri.and_then(|uri| uri.rsplit_once('.'))
                .map(|(_, ext)| ext.to_ascii_lowercase())
        })
}

/// Builds one material per glTF material plus a trailing default material
/// for primitives that reference none.
pub fn load_materials(
    document: &gltf::Document,
    textures: &mut TextureCache,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<Vec<model::Material>> {
    let device = textures.device;
    let queue = textures.queue;
    let mut materials = Vec::new();

    for material in document.materials() {
        let name = material
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("material_{}", materials.len()));
        let pbr = material.pbr_metallic_roughness();

        let base_colour = match pbr.base_color_texture() {
            Some(info) => textures.get(info.texture(), false)?,
            None => Texture::create_solid([255; 4], false, "default base colour", device, queue),
        };
        let normal = match material.normal_texture() {
            Some(normal) => textures.get(normal.texture(), true)?,
            None => Texture::create_default_normal_map(device, queue),
        };
        let metallic_roughness = match pbr.metallic_roughness_texture() {
            Some(info) => textures.get(info.texture(), true)?,
            None => Texture::create_solid([255; 4], true, "default metallic roughness", device, queue),
        };
        let occlusion = match material.occlusion_texture() {
            Some(occlusion) => textures.get(occlusion.texture(), true)?,
            None => Texture::create_solid([255; 4], true, "default occlusion", device, queue),
        };
        let emissive = match material.emissive_texture() {
            Some(info) => textures.get(info.texture(), false)?,
            None => Texture::create_solid([255; 4], false, "default emissive", device, queue),
        };

        let [er, eg, eb] = material.emissive_factor();
        let uniform = MaterialUniform {
            base_colour: pbr.base_color_factor(),
            emissive: [er, eg, eb, 0.0],
            metallic: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
            occlusion_strength: material.occlusion_texture().map_or(1.0, |o| o.strength()),
            normal_scale: material.normal_texture().map_or(1.0, |n| n.scale()),
        };

        materials.push(model::Material::new(
            device,
            &name,
            MaterialMaps {
                base_colour,
                normal,
                metallic_roughness,
                occlusion,
                emissive,
            },
            uniform,
            layout,
        ));
    }

    materials.push(default_material(device, queue, layout));
    Ok(materials)
}

pub fn default_material(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> model::Material {
    let maps = MaterialMaps {
        base_colour: Texture::create_solid([255; 4], false, "default base colour", device, queue),
        normal: Texture::create_default_normal_map(device, queue),
        metallic_roughness: Texture::create_solid([255; 4], true, "default metallic roughness", device, queue),
        occlusion: Texture::create_solid([255; 4], true, "default occlusion", device, queue),
        emissive: Texture::create_solid([255; 4], false, "default emissive", device, queue),
    };
    model::Material::new(device, "default", maps, MaterialUniform::default(), layout)
}
