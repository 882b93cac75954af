//! Viewpoint data types

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::easing::DEFAULT_EASING;

/// Default transition length for new viewpoints.
pub const DEFAULT_DURATION_MS: u32 = 1000;

/// Registry-wide unique viewpoint identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewpointId(pub u64);

impl fmt::Display for ViewpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view_{}", self.0)
    }
}

/// Scene object a viewpoint is attached to.
///
/// `Main` is the bucket for global viewpoints that follow no object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum TargetKey {
    #[default]
    Main,
    Object(String),
}

impl TargetKey {
    pub fn object(key: impl Into<String>) -> Self {
        TargetKey::Object(key.into())
    }

    /// Object key, or `None` for the main bucket.
    pub fn as_object(&self) -> Option<&str> {
        match self {
            TargetKey::Main => None,
            TargetKey::Object(key) => Some(key),
        }
    }

    /// Display form of a key list, for logs and report labels.
    pub fn join(keys: &[TargetKey]) -> String {
        keys.iter()
            .map(|key| key.to_string())
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKey::Main => f.write_str("main"),
            TargetKey::Object(key) => f.write_str(key),
        }
    }
}

impl From<&str> for TargetKey {
    fn from(key: &str) -> Self {
        TargetKey::Object(key.to_string())
    }
}

impl From<String> for TargetKey {
    fn from(key: String) -> Self {
        TargetKey::Object(key)
    }
}

impl From<Option<&str>> for TargetKey {
    fn from(key: Option<&str>) -> Self {
        key.map_or(TargetKey::Main, TargetKey::from)
    }
}

/// Camera position plus the point it looks at.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl CameraPose {
    pub fn new(position: Vec3, look_at: Vec3) -> Self {
        Self { position, look_at }
    }

    /// Interpolate both points; `t` of 0.0 returns `self`, 1.0 returns `end`.
    pub fn lerp(&self, end: &CameraPose, t: f32) -> CameraPose {
        CameraPose {
            position: self.position.lerp(end.position, t),
            look_at: self.look_at.lerp(end.look_at, t),
        }
    }

    pub fn abs_diff_eq(&self, other: &CameraPose, max_abs_diff: f32) -> bool {
        self.position.abs_diff_eq(other.position, max_abs_diff)
            && self.look_at.abs_diff_eq(other.look_at, max_abs_diff)
    }
}

/// A named camera pose with transition timing.
///
/// Inside the registry `position` and `look_at` are in the storage frame
/// (local to the target object when `is_local_frame`). Copies handed out by
/// the registry are always converted to world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    pub id: ViewpointId,
    pub name: String,
    pub position: Vec3,
    pub look_at: Vec3,
    pub duration_ms: u32,
    pub easing_name: String,
    pub target_key: TargetKey,
    pub is_local_frame: bool,
}

impl Viewpoint {
    pub fn pose(&self) -> CameraPose {
        CameraPose::new(self.position, self.look_at)
    }
}

/// Partial update for a viewpoint. Positions are world space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewpointUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<Vec3>,
    #[serde(default)]
    pub look_at: Option<Vec3>,
    #[serde(default)]
    pub duration_ms: Option<u32>,
    #[serde(default)]
    pub easing_name: Option<String>,
}

/// One element of a synchronized path. Never stored in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub position: Vec3,
    pub look_at: Vec3,
    pub duration_ms: u32,
    pub easing_name: String,
}

impl Frame {
    pub fn pose(&self) -> CameraPose {
        CameraPose::new(self.position, self.look_at)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            look_at: Vec3::ZERO,
            duration_ms: DEFAULT_DURATION_MS,
            easing_name: DEFAULT_EASING.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_key_display_and_join() {
        let keys = vec![TargetKey::Main, TargetKey::object("engine"), "wheel".into()];
        assert_eq!(TargetKey::join(&keys), "main|engine|wheel");
        assert_eq!(TargetKey::from(None::<&str>), TargetKey::Main);
        assert_eq!(TargetKey::from(Some("a")).as_object(), Some("a"));
    }

    #[test]
    fn test_pose_lerp() {
        let a = CameraPose::new(Vec3::ZERO, Vec3::ZERO);
        let b = CameraPose::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 0.0));
        let mid = a.lerp(&b, 0.5);
        assert!(mid.abs_diff_eq(
            &CameraPose::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)),
            1e-6
        ));
    }

    #[test]
    fn test_viewpoint_id_display() {
        assert_eq!(ViewpointId(7).to_string(), "view_7");
    }
}
