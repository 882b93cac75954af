//! Plain-data snapshot of every stored viewpoint, for external save/load.
//!
//! Viewpoints are kept in their storage frame, so a restored local viewpoint
//! follows its anchor exactly as before. Cursors and playing flags are not
//! part of a snapshot.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewpointError};
use crate::registry::ViewpointRegistry;
use crate::viewpoint::Viewpoint;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewpointSnapshot {
    /// Bucket by bucket, in creation order
    pub viewpoints: Vec<Viewpoint>,
}

impl ViewpointSnapshot {
    pub fn capture(registry: &ViewpointRegistry) -> Self {
        let viewpoints = registry
            .target_keys()
            .iter()
            .filter_map(|key| registry.bucket(key))
            .flat_map(|bucket| bucket.viewpoints().iter().cloned())
            .collect();
        Self { viewpoints }
    }

    /// Insert every viewpoint into `registry`, stopping at the first duplicate id.
    pub fn apply(&self, registry: &mut ViewpointRegistry) -> Result<()> {
        for viewpoint in &self.viewpoints {
            registry.insert_view_point(viewpoint.clone())?;
        }
        log::info!("Restored {} viewpoints", self.viewpoints.len());
        Ok(())
    }

    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ViewpointError::Snapshot(e.to_string()))
    }

    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| ViewpointError::Snapshot(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.viewpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ObjectTransform, SceneGraph};
    use crate::viewpoint::{CameraPose, TargetKey};
    use glam::Vec3;

    fn populated() -> (SceneGraph, ViewpointRegistry) {
        let mut scene = SceneGraph::new(CameraPose::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO));
        scene.insert_object("tower", ObjectTransform::from_translation(Vec3::new(0.0, 10.0, 0.0)));
        let mut registry = ViewpointRegistry::new();
        registry.add_view_point(&scene, Some("overview"), TargetKey::Main, false);
        registry.add_view_point(&scene, None, TargetKey::object("tower"), true);
        (scene, registry)
    }

    #[test]
    fn test_capture_and_apply() {
        let (scene, registry) = populated();
        let snapshot = ViewpointSnapshot::capture(&registry);
        assert_eq!(snapshot.len(), 2);

        let mut restored = ViewpointRegistry::new();
        snapshot.apply(&mut restored).unwrap();
        assert_eq!(
            restored.get_view_points(&scene, &TargetKey::object("tower")),
            registry.get_view_points(&scene, &TargetKey::object("tower"))
        );

        // Fresh ids continue above the restored ones
        let next = restored.add_view_point(&scene, None, TargetKey::Main, false);
        assert!(snapshot.viewpoints.iter().all(|v| v.id < next.id));
    }

    #[test]
    fn test_ron_text_survives() {
        let (_scene, registry) = populated();
        let snapshot = ViewpointSnapshot::capture(&registry);
        let text = snapshot.to_ron().unwrap();
        assert!(text.contains("overview"));
        assert_eq!(ViewpointSnapshot::from_ron(&text).unwrap(), snapshot);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let (_scene, registry) = populated();
        let snapshot = ViewpointSnapshot::capture(&registry);
        let mut target = registry.clone();
        assert!(matches!(snapshot.apply(&mut target), Err(ViewpointError::Snapshot(_))));
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(ViewpointSnapshot::from_ron("not a snapshot").is_err());
    }
}
