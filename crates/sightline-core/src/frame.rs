//! Coordinate frame conversion between world space and a viewpoint's storage frame.
//!
//! A viewpoint stored in the local frame of its target object follows that
//! object around. When the object cannot be resolved (deleted, renamed, or the
//! key is `Main`) the stored numbers are treated as world space, so a
//! viewpoint never becomes unusable because its anchor went away.

use glam::Vec3;

use crate::scene::Scene;
use crate::viewpoint::{CameraPose, TargetKey};

/// Converts points for one scene. Borrowing the scene keeps every conversion
/// in a call consistent with a single transform snapshot.
pub struct FrameConverter<'a, S: Scene + ?Sized> {
    scene: &'a S,
}

impl<'a, S: Scene + ?Sized> FrameConverter<'a, S> {
    pub fn new(scene: &'a S) -> Self {
        Self { scene }
    }

    /// Whether `target_key` names an object that currently exists.
    pub fn resolves(&self, target_key: &TargetKey) -> bool {
        target_key
            .as_object()
            .is_some_and(|key| self.scene.world_transform(key).is_some())
    }

    /// World space to storage frame.
    pub fn to_storage(&self, world_point: Vec3, target_key: &TargetKey, is_local: bool) -> Vec3 {
        if !is_local {
            return world_point;
        }
        match target_key
            .as_object()
            .and_then(|key| self.scene.inverse_world_transform(key))
        {
            Some(inverse) => inverse.transform_point3(world_point),
            None => {
                log::debug!("Target {} not resolvable, storing in world space", target_key);
                world_point
            }
        }
    }

    /// Storage frame to world space.
    pub fn to_world(&self, point: Vec3, target_key: &TargetKey, is_local: bool) -> Vec3 {
        if !is_local {
            return point;
        }
        match target_key
            .as_object()
            .and_then(|key| self.scene.world_transform(key))
        {
            Some(transform) => transform.transform_point3(point),
            None => {
                log::debug!("Target {} not resolvable, reading as world space", target_key);
                point
            }
        }
    }

    pub fn pose_to_storage(&self, pose: CameraPose, target_key: &TargetKey, is_local: bool) -> CameraPose {
        CameraPose::new(
            self.to_storage(pose.position, target_key, is_local),
            self.to_storage(pose.look_at, target_key, is_local),
        )
    }

    pub fn pose_to_world(&self, pose: CameraPose, target_key: &TargetKey, is_local: bool) -> CameraPose {
        CameraPose::new(
            self.to_world(pose.position, target_key, is_local),
            self.to_world(pose.look_at, target_key, is_local),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ObjectTransform, SceneGraph};
    use glam::Quat;

    fn scene_with_rotated_object() -> SceneGraph {
        let mut scene = SceneGraph::default();
        scene.insert_object(
            "turntable",
            ObjectTransform {
                translation: Vec3::new(5.0, 0.0, 0.0),
                rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
                scale: Vec3::splat(2.0),
            },
        );
        scene
    }

    #[test]
    fn test_round_trip_through_local_frame() {
        let scene = scene_with_rotated_object();
        let converter = FrameConverter::new(&scene);
        let key = TargetKey::object("turntable");

        let world = Vec3::new(1.0, 2.0, -3.0);
        let local = converter.to_storage(world, &key, true);
        assert!(!local.abs_diff_eq(world, 1e-3));
        assert!(converter.to_world(local, &key, true).abs_diff_eq(world, 1e-4));
    }

    #[test]
    fn test_world_frame_is_identity() {
        let scene = scene_with_rotated_object();
        let converter = FrameConverter::new(&scene);
        let key = TargetKey::object("turntable");
        let p = Vec3::new(1.0, 2.0, 3.0);

        assert_eq!(converter.to_storage(p, &key, false), p);
        assert_eq!(converter.to_world(p, &key, false), p);
    }

    #[test]
    fn test_unresolvable_target_falls_back_to_world() {
        let scene = scene_with_rotated_object();
        let converter = FrameConverter::new(&scene);
        let p = Vec3::new(1.0, 2.0, 3.0);

        for key in [TargetKey::Main, TargetKey::object("gone")] {
            assert!(!converter.resolves(&key));
            assert_eq!(converter.to_storage(p, &key, true), p);
            assert_eq!(converter.to_world(p, &key, true), p);
        }
        assert!(converter.resolves(&TargetKey::object("turntable")));
    }
}
