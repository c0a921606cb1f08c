#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
mod support {
    use std::{
        path::PathBuf,
        sync::mpsc::{Receiver, Sender, channel},
    };

    use helmet_viewer::{
        context::InitContext,
        loader::{AssetEvent, AssetSink},
        pipelines::{environment, model},
    };

    #[derive(Clone)]
    pub struct ChannelSink(Sender<AssetEvent>);

    impl AssetSink for ChannelSink {
        fn deliver(&self, event: AssetEvent) {
            let _ = self.0.send(event);
        }
    }

    pub fn sink() -> (ChannelSink, Receiver<AssetEvent>) {
        let (tx, rx) = channel();
        (ChannelSink(tx), rx)
    }

    pub fn init_context(device: wgpu::Device, queue: wgpu::Queue) -> InitContext {
        InitContext {
            material_layout: model::material_layout(&device),
            environment_layout: environment::mk_bind_group_layout(&device),
            device,
            queue,
            exposure: 1.0,
        }
    }

    /// A fresh directory under the system temp dir.
    pub fn asset_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("helmet-viewer-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// One red triangle, rotated a quarter turn about X, with its geometry in a sidecar buffer.
    pub fn write_triangle(dir: &std::path::Path, buffer_uri: &str) {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]];
        let indices: [u16; 4] = [0, 1, 2, 0];
        let mut bin = bytemuck::cast_slice::<[f32; 3], u8>(positions.as_slice()).to_vec();
        bin.extend_from_slice(bytemuck::cast_slice(indices.as_slice()));
        std::fs::write(dir.join("triangle.bin"), &bin).unwrap();

        let gltf = format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "mesh": 0, "name": "triangle", "rotation": [0.7071068, 0.0, 0.0, 0.7071068] }}],
  "meshes": [{{ "name": "triangle", "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1, "material": 0 }}] }}],
  "materials": [{{ "name": "red", "pbrMetallicRoughness": {{ "baseColorFactor": [1.0, 0.0, 0.0, 1.0], "metallicFactor": 0.0 }} }}],
  "buffers": [{{ "uri": "{buffer_uri}", "byteLength": {len} }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]
}}"#,
            len = bin.len(),
        );
        std::fs::write(dir.join("triangle.gltf"), gltf).unwrap();
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn gltf_with_sidecar_buffer_loads_under_a_container_root() {
    use cgmath::InnerSpace;
    use common::test_utils::headless_device;
    use helmet_viewer::loader::{AssetEvent, AssetKind, load_model};

    let Some((device, queue)) = headless_device() else {
        eprintln!("no adapter available, skipping");
        return;
    };
    let dir = support::asset_dir("triangle");
    support::write_triangle(&dir, "triangle.bin");
    let (sink, events) = support::sink();

    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(load_model(
        support::init_context(device, queue),
        "triangle.gltf".to_string(),
        dir.to_string_lossy().into_owned(),
        sink,
    ));

    let events: Vec<AssetEvent> = events.try_iter().collect();
    let (last, progress) = events.split_last().unwrap();
    let fractions: Vec<f32> = progress
        .iter()
        .map(|event| match event {
            AssetEvent::Progress { asset, fraction } => {
                assert_eq!(*asset, AssetKind::Model);
                *fraction
            }
            other => panic!("unexpected event before the outcome: {other:?}"),
        })
        .collect();
    assert!(!fractions.is_empty());
    assert!(fractions.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(fractions.last().copied(), Some(1.0));

    let AssetEvent::ModelLoaded(root) = last else {
        panic!("expected the model, got {last:?}");
    };
    assert_eq!(root.name(), "triangle.gltf");
    assert!(!root.has_mesh());
    assert_eq!(root.mesh_count(), 1);
    let node = &root.children()[0];
    assert_eq!(node.name(), "triangle");
    // the file's own node rotation survives under the container
    let rotation = node.local_transform().rotation;
    assert!((rotation.s - 0.7071068).abs() < 1e-5);
    assert!((rotation.v - cgmath::Vector3::new(0.7071068, 0.0, 0.0)).magnitude() < 1e-5);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
#[cfg(feature = "integration-tests")]
fn missing_files_and_embedded_buffers_fail_once() {
    use common::test_utils::headless_device;
    use helmet_viewer::loader::{AssetEvent, AssetKind, load_environment, load_model};

    let Some((device, queue)) = headless_device() else {
        eprintln!("no adapter available, skipping");
        return;
    };
    let ctx = support::init_context(device, queue);
    let dir = support::asset_dir("broken");
    support::write_triangle(&dir, "data:application/octet-stream;base64,AAAA");
    let root = dir.to_string_lossy().into_owned();
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let failures = [
        (AssetKind::Environment, "nowhere.hdr"),
        (AssetKind::Model, "nowhere.gltf"),
        (AssetKind::Model, "triangle.gltf"),
    ];
    for (kind, name) in failures {
        let (sink, events) = support::sink();
        match kind {
            AssetKind::Environment => runtime.block_on(load_environment(
                ctx.clone(),
                name.to_string(),
                root.clone(),
                sink,
            )),
            AssetKind::Model => {
                runtime.block_on(load_model(ctx.clone(), name.to_string(), root.clone(), sink))
            }
        }
        let outcomes: Vec<AssetEvent> = events
            .try_iter()
            .filter(|event| !matches!(event, AssetEvent::Progress { .. }))
            .collect();
        assert_eq!(outcomes.len(), 1, "{name}: {outcomes:?}");
        match &outcomes[0] {
            AssetEvent::Failed { asset, .. } => assert_eq!(*asset, kind),
            other => panic!("{name} should fail, got {other:?}"),
        }
    }

    let _ = std::fs::remove_dir_all(dir);
}
