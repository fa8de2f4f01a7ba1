use std::collections::HashMap;

use macroquad::math::{Mat4, Quat, Vec3};
use macroquad::models::{draw_mesh, Mesh};
use macroquad::prelude::get_internal_gl;

use crate::assets::AssetPipeline;

/// One placed object in the 3D scene: a reference to a named model node plus
/// a world transform.
#[derive(Debug, Clone)]
pub struct Instance {
    pub id: String,
    pub node: String,
    pub position: Vec3,
    pub rotation_y: f32,
    pub scale: f32,
    pub visible: bool,
}

impl Instance {
    pub fn new(id: &str, node: &str, position: Vec3) -> Instance {
        Instance {
            id: id.to_string(),
            node: node.to_string(),
            position,
            rotation_y: 0.0,
            scale: 1.0,
            visible: true,
        }
    }

    pub fn rotated(mut self, radians: f32) -> Instance {
        self.rotation_y = radians;
        self
    }

    pub fn scaled(mut self, factor: f32) -> Instance {
        self.scale = factor;
        self
    }
}

/// Retained 3D surface. Meshes are extracted from loaded models once per
/// node name and shared by every instance that references that node.
#[derive(Default)]
pub struct Scene3d {
    instances: Vec<Instance>,
    meshes: HashMap<String, Vec<Mesh>>,
}

impl Scene3d {
    pub fn new() -> Scene3d {
        Scene3d::default()
    }

    /// Place an instance, extracting its meshes on first use of the node.
    /// A node with no geometry still gets an entry so bookkeeping works;
    /// it just draws nothing.
    pub fn place(&mut self, instance: Instance, assets: &AssetPipeline) {
        if !self.meshes.contains_key(&instance.node) {
            let meshes = assets.meshes_for(&instance.node);
            if meshes.is_empty() {
                eprintln!("No geometry for node '{}'", instance.node);
            }
            self.meshes.insert(instance.node.clone(), meshes);
        }
        if let Some(existing) = self.instances.iter_mut().find(|i| i.id == instance.id) {
            *existing = instance;
        } else {
            self.instances.push(instance);
        }
    }

    pub fn instance(&self, id: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn instance_mut(&mut self, id: &str) -> Option<&mut Instance> {
        self.instances.iter_mut().find(|i| i.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Instance> {
        let index = self.instances.iter().position(|i| i.id == id)?;
        Some(self.instances.remove(index))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.meshes.clear();
    }

    /// Draw every visible instance under the current camera.
    pub fn draw(&self) {
        for instance in &self.instances {
            if !instance.visible {
                continue;
            }
            let Some(meshes) = self.meshes.get(&instance.node) else {
                continue;
            };
            if meshes.is_empty() {
                continue;
            }
            let transform = Mat4::from_scale_rotation_translation(
                Vec3::splat(instance.scale),
                Quat::from_rotation_y(instance.rotation_y),
                instance.position,
            );
            unsafe {
                let gl = get_internal_gl();
                gl.quad_gl.push_model_matrix(transform);
                for mesh in meshes {
                    draw_mesh(mesh);
                }
                gl.quad_gl.pop_model_matrix();
            }
        }
    }
}
