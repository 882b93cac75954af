//! Scene collaborator interface
//!
//! The engine never renders. It reads and writes one camera pose and asks the
//! host for the world transforms of the objects viewpoints are attached to.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::viewpoint::CameraPose;

/// Everything the engine needs from the rendering side.
pub trait Scene {
    /// Current camera position and look-at target.
    fn camera_pose(&self) -> CameraPose;

    /// Overwrite the camera pose. Called at most once per tick by transitions.
    fn set_camera_pose(&mut self, pose: CameraPose);

    /// World transform of the object registered under `key`, if it exists.
    fn world_transform(&self, key: &str) -> Option<Mat4>;

    /// Inverse world transform; override when the host caches it.
    fn inverse_world_transform(&self, key: &str) -> Option<Mat4> {
        self.world_transform(key).map(|m| m.inverse())
    }
}

/// Translation, rotation and scale of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectTransform {
    #[serde(default)]
    pub translation: Vec3,
    #[serde(default = "ObjectTransform::identity_rotation")]
    pub rotation: Quat,
    #[serde(default = "ObjectTransform::unit_scale")]
    pub scale: Vec3,
}

impl ObjectTransform {
    fn identity_rotation() -> Quat {
        Quat::IDENTITY
    }

    fn unit_scale() -> Vec3 {
        Vec3::ONE
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Flat in-memory scene: one camera and a set of named object transforms.
///
/// Used by the headless runner and by tests; real hosts implement [`Scene`]
/// on top of their own scene graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneGraph {
    pub camera: CameraPose,
    #[serde(default)]
    pub objects: HashMap<String, ObjectTransform>,
}

impl SceneGraph {
    pub fn new(camera: CameraPose) -> Self {
        Self {
            camera,
            objects: HashMap::new(),
        }
    }

    /// Insert or replace an object.
    pub fn insert_object(&mut self, key: impl Into<String>, transform: ObjectTransform) {
        self.objects.insert(key.into(), transform);
    }

    pub fn remove_object(&mut self, key: &str) -> Option<ObjectTransform> {
        self.objects.remove(key)
    }

    pub fn object(&self, key: &str) -> Option<&ObjectTransform> {
        self.objects.get(key)
    }

    pub fn object_mut(&mut self, key: &str) -> Option<&mut ObjectTransform> {
        self.objects.get_mut(key)
    }

    /// Move an object by a world-space offset. Returns false if it does not exist.
    pub fn translate_object(&mut self, key: &str, offset: Vec3) -> bool {
        match self.objects.get_mut(key) {
            Some(transform) => {
                transform.translation += offset;
                true
            }
            None => false,
        }
    }
}

impl Scene for SceneGraph {
    fn camera_pose(&self) -> CameraPose {
        self.camera
    }

    fn set_camera_pose(&mut self, pose: CameraPose) {
        self.camera = pose;
    }

    fn world_transform(&self, key: &str) -> Option<Mat4> {
        self.objects.get(key).map(ObjectTransform::matrix)
    }
}
