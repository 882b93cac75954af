//! Synchronized paths: index-wise averages of several targets' viewpoints

use glam::Vec3;

use crate::easing::DEFAULT_EASING;
use crate::registry::ViewpointRegistry;
use crate::scene::Scene;
use crate::viewpoint::{Frame, TargetKey};

/// Frame duration when no participant carries one.
pub const DEFAULT_FRAME_DURATION_MS: u32 = 800;

/// Overrides applied to every generated frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOptions {
    pub duration_ms: Option<u32>,
    pub easing_name: Option<String>,
}

/// Options for [`crate::Director::play_synchronized_path`].
#[derive(Debug, Clone, PartialEq)]
pub struct SyncPlayOptions {
    pub loop_playback: bool,
    pub interval_ms: u64,
    pub path: SyncOptions,
}

impl Default for SyncPlayOptions {
    fn default() -> Self {
        Self {
            loop_playback: false,
            interval_ms: 500,
            path: SyncOptions::default(),
        }
    }
}

/// Build the averaged path for `target_keys`.
///
/// Frame `i` averages each target's viewpoint `i` in world space. A target
/// whose list is shorter keeps contributing its last viewpoint; a target with
/// no viewpoints never contributes. Without overrides a frame takes the
/// longest participant duration and the easing of the last participant (in
/// key order) that names one.
pub fn create_synchronized_path<S: Scene + ?Sized>(
    registry: &ViewpointRegistry,
    scene: &S,
    target_keys: &[TargetKey],
    options: &SyncOptions,
) -> Vec<Frame> {
    let lists: Vec<_> = target_keys
        .iter()
        .map(|key| registry.get_view_points(scene, key))
        .collect();
    let longest = lists.iter().map(Vec::len).max().unwrap_or(0);

    (0..longest)
        .filter_map(|i| {
            let participants: Vec<_> = lists
                .iter()
                .filter_map(|list| list.get(i).or_else(|| list.last()))
                .collect();
            if participants.is_empty() {
                return None;
            }

            let n = participants.len() as f32;
            let position = participants.iter().map(|v| v.position).sum::<Vec3>() / n;
            let look_at = participants.iter().map(|v| v.look_at).sum::<Vec3>() / n;

            let duration_ms = options.duration_ms.unwrap_or_else(|| {
                participants
                    .iter()
                    .map(|v| v.duration_ms)
                    .filter(|d| *d > 0)
                    .max()
                    .unwrap_or(DEFAULT_FRAME_DURATION_MS)
            });
            let easing_name = options.easing_name.clone().unwrap_or_else(|| {
                participants
                    .iter()
                    .rev()
                    .map(|v| v.easing_name.as_str())
                    .find(|name| !name.is_empty())
                    .unwrap_or(DEFAULT_EASING)
                    .to_string()
            });

            Some(Frame {
                position,
                look_at,
                duration_ms,
                easing_name,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;
    use crate::viewpoint::{CameraPose, ViewpointUpdate};

    fn add(
        registry: &mut ViewpointRegistry,
        scene: &mut SceneGraph,
        key: &str,
        x: f32,
        duration_ms: u32,
        easing: &str,
    ) {
        scene.camera = CameraPose::new(Vec3::new(x, 0.0, 0.0), Vec3::new(0.0, x, 0.0));
        let id = registry.add_view_point(&*scene, None, key.into(), false).id;
        registry
            .update_view_point(
                &*scene,
                id,
                ViewpointUpdate {
                    duration_ms: Some(duration_ms),
                    easing_name: Some(easing.to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    #[test]
    fn test_average_of_two_targets() {
        let mut scene = SceneGraph::default();
        let mut registry = ViewpointRegistry::new();
        add(&mut registry, &mut scene, "t1", 0.0, 1000, "Linear.None");
        add(&mut registry, &mut scene, "t2", 2.0, 1000, "Linear.None");

        let path = create_synchronized_path(&registry, &scene, &["t1".into(), "t2".into()], &SyncOptions::default());
        assert_eq!(path.len(), 1);
        assert!(path[0].position.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
        assert!(path[0].look_at.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn test_shorter_list_holds_last_value() {
        let mut scene = SceneGraph::default();
        let mut registry = ViewpointRegistry::new();
        add(&mut registry, &mut scene, "t1", 0.0, 1000, "Linear.None");
        add(&mut registry, &mut scene, "t2", 2.0, 1000, "Linear.None");
        add(&mut registry, &mut scene, "t2", 6.0, 1000, "Linear.None");

        let path = create_synchronized_path(&registry, &scene, &["t1".into(), "t2".into()], &SyncOptions::default());
        assert_eq!(path.len(), 2);
        assert!(path[1].position.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn test_empty_targets_do_not_participate() {
        let mut scene = SceneGraph::default();
        let mut registry = ViewpointRegistry::new();
        add(&mut registry, &mut scene, "t1", 4.0, 1000, "Linear.None");

        let path = create_synchronized_path(&registry, &scene, &["empty".into(), "t1".into()], &SyncOptions::default());
        assert_eq!(path.len(), 1);
        assert!(path[0].position.abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1e-6));

        assert!(create_synchronized_path(&registry, &scene, &["empty".into()], &SyncOptions::default()).is_empty());
    }

    #[test]
    fn test_duration_and_easing_selection() {
        let mut scene = SceneGraph::default();
        let mut registry = ViewpointRegistry::new();
        add(&mut registry, &mut scene, "t1", 0.0, 300, "Cubic.In");
        add(&mut registry, &mut scene, "t2", 2.0, 1200, "Quadratic.Out");

        let keys = ["t1".into(), "t2".into()];
        let path = create_synchronized_path(&registry, &scene, &keys, &SyncOptions::default());
        assert_eq!(path[0].duration_ms, 1200);
        // Later key wins
        assert_eq!(path[0].easing_name, "Quadratic.Out");

        let reversed = [TargetKey::object("t2"), TargetKey::object("t1")];
        let path = create_synchronized_path(&registry, &scene, &reversed, &SyncOptions::default());
        assert_eq!(path[0].easing_name, "Cubic.In");

        let overridden = create_synchronized_path(
            &registry,
            &scene,
            &keys,
            &SyncOptions {
                duration_ms: Some(50),
                easing_name: Some("Sinusoidal.InOut".to_string()),
            },
        );
        assert_eq!(overridden[0].duration_ms, 50);
        assert_eq!(overridden[0].easing_name, "Sinusoidal.InOut");
    }

    #[test]
    fn test_fallback_duration_and_easing() {
        let mut scene = SceneGraph::default();
        let mut registry = ViewpointRegistry::new();
        add(&mut registry, &mut scene, "t1", 0.0, 0, "");

        let path = create_synchronized_path(&registry, &scene, &["t1".into()], &SyncOptions::default());
        assert_eq!(path[0].duration_ms, DEFAULT_FRAME_DURATION_MS);
        assert_eq!(path[0].easing_name, DEFAULT_EASING);
    }
}
