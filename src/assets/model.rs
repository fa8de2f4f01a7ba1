//! Loaded glTF models
//!
//! A model keeps the parsed document plus its buffer and image payloads.
//! After a load the pipeline walks the node hierarchy and indexes every
//! named node so scenes can place sub-objects by name without knowing which
//! file they came from.

use macroquad::color::WHITE;
use macroquad::math::{vec3, Mat4};
use macroquad::models::{Mesh, Vertex};

use super::AssetError;

/// A named sub-node extracted from a loaded model
#[derive(Debug, Clone, PartialEq)]
pub struct NamedNode {
    /// Key of the model the node came from
    pub model: String,
    /// Node index within that model's document
    pub node: usize,
}

/// A parsed glTF asset
#[derive(Debug)]
pub struct Model3d {
    pub document: gltf::Document,
    pub buffers: Vec<gltf::buffer::Data>,
    pub images: Vec<gltf::image::Data>,
    /// Names of the animation clips the document carries
    pub animations: Vec<String>,
}

impl Model3d {
    /// Parse a model from raw bytes (binary .glb or JSON .gltf)
    pub fn from_bytes(bytes: &[u8]) -> Result<Model3d, AssetError> {
        let (document, buffers, images) =
            gltf::import_slice(bytes).map_err(|e| AssetError::Decode(e.to_string()))?;

        let animations = document
            .animations()
            .filter_map(|a| a.name().map(str::to_string))
            .collect();

        Ok(Model3d {
            document,
            buffers,
            images,
            animations,
        })
    }

    /// Every named node in the document, in document order.
    ///
    /// Root "Scene" containers are skipped; exporters name them after the
    /// file, not after content.
    pub fn named_nodes(&self) -> impl Iterator<Item = (&str, usize)> {
        self.document
            .nodes()
            .filter_map(|n| n.name().map(|name| (name, n.index())))
            .filter(|(name, _)| !name.is_empty() && *name != "Scene")
    }

    /// Build drawable meshes for a node and its descendants.
    ///
    /// Transforms are accumulated down the subtree and baked into the
    /// vertices, so the caller only applies the instance transform.
    pub fn node_meshes(&self, index: usize) -> Vec<Mesh> {
        let mut meshes = Vec::new();
        if let Some(node) = self.document.nodes().nth(index) {
            let local = Mat4::from_cols_array_2d(&node.transform().matrix());
            self.collect_meshes(&node, local, &mut meshes);
        }
        meshes
    }

    fn collect_meshes(&self, node: &gltf::Node, transform: Mat4, out: &mut Vec<Mesh>) {
        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if let Some(built) = self.primitive_mesh(&primitive, transform) {
                    out.push(built);
                }
            }
        }
        for child in node.children() {
            let local = Mat4::from_cols_array_2d(&child.transform().matrix());
            self.collect_meshes(&child, transform * local, out);
        }
    }

    fn primitive_mesh(&self, primitive: &gltf::Primitive, transform: Mat4) -> Option<Mesh> {
        let reader = primitive.reader(|buffer| {
            self.buffers.get(buffer.index()).map(|data| data.0.as_slice())
        });

        let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
        let uvs: Option<Vec<[f32; 2]>> =
            reader.read_tex_coords(0).map(|t| t.into_f32().collect());
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        // The 2D-index format of the drawing context caps a single mesh
        if positions.len() > u16::MAX as usize {
            eprintln!(
                "Skipping primitive with {} vertices (too large for one mesh)",
                positions.len()
            );
            return None;
        }

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let world = transform.transform_point3(vec3(p[0], p[1], p[2]));
                let uv = uvs
                    .as_ref()
                    .and_then(|u| u.get(i))
                    .copied()
                    .unwrap_or([0.0, 0.0]);
                Vertex::new(world.x, world.y, world.z, uv[0], uv[1], WHITE)
            })
            .collect();

        Some(Mesh {
            vertices,
            indices: indices.into_iter().map(|i| i as u16).collect(),
            texture: None,
        })
    }
}
