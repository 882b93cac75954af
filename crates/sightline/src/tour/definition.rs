//! Tour definition and RON file loading

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use sightline_core::{CameraPose, CombineMode, ObjectTransform, SceneGraph, TargetKey, ViewpointUpdate, try_resolve_easing};

/// Top-level tour loaded from RON files: a scene plus a camera script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourDefinition {
    /// Tour name
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Scene objects viewpoints can be attached to
    #[serde(default)]
    pub objects: BTreeMap<String, ObjectTransform>,

    /// Initial camera pose
    #[serde(default)]
    pub camera: CameraPose,

    /// Initial setup actions (typically viewpoint capture)
    #[serde(default)]
    pub setup: Vec<TourAction>,

    /// Main tour actions
    pub actions: Vec<TourAction>,
}

/// One scripted step. Viewpoints are referred to by the `name` given when
/// they were added; a missing `target` means the main bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TourAction {
    /// Place the camera directly
    SetCamera { position: Vec3, look_at: Vec3 },

    /// Move a scene object (absolute translation)
    MoveObject { key: String, translation: Vec3 },

    /// Capture the current camera pose as a viewpoint
    AddViewPoint {
        name: String,
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        local: bool,
        #[serde(default)]
        duration_ms: Option<u32>,
        #[serde(default)]
        easing: Option<String>,
    },

    UpdateViewPoint { name: String, update: ViewpointUpdate },

    RemoveViewPoint { name: String },

    PlayViewPoint {
        name: String,
        #[serde(default = "default_true")]
        animate: bool,
    },

    /// Play a bucket, or the named viewpoints in order
    PlaySequence {
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        names: Option<Vec<String>>,
        #[serde(default)]
        loop_playback: bool,
        #[serde(default)]
        interval_ms: Option<u64>,
    },

    PlayCombined {
        targets: Vec<String>,
        #[serde(default = "default_mode")]
        mode: String,
        #[serde(default)]
        loop_playback: bool,
        #[serde(default)]
        interval_ms: Option<u64>,
    },

    PlaySynchronized {
        targets: Vec<String>,
        #[serde(default)]
        loop_playback: bool,
        #[serde(default)]
        interval_ms: Option<u64>,
        #[serde(default)]
        duration_ms: Option<u32>,
        #[serde(default)]
        easing: Option<String>,
    },

    Next {
        #[serde(default)]
        target: Option<String>,
    },

    Prev {
        #[serde(default)]
        target: Option<String>,
    },

    /// Stop the sequence on one bucket
    Stop {
        #[serde(default)]
        target: Option<String>,
    },

    StopAll,

    StopSynchronized { targets: Vec<String> },

    /// Run a fixed number of frames
    WaitFrames { frames: usize },

    /// Run frames until the camera is still and every started playback has ended
    WaitIdle {
        #[serde(default = "default_idle_timeout")]
        timeout_frames: usize,
    },

    /// Fail the tour unless the camera is within `tolerance` of `position`
    ExpectCamera {
        position: Vec3,
        #[serde(default = "default_tolerance")]
        tolerance: f32,
    },

    /// Log a message
    Log { message: String },
}

fn default_true() -> bool {
    true
}

fn default_mode() -> String {
    CombineMode::Sequential.to_string()
}

fn default_idle_timeout() -> usize {
    600
}

fn default_tolerance() -> f32 {
    0.01
}

/// Target key for an optional object name; `"main"` also names the main bucket.
pub fn target_key(target: Option<&str>) -> TargetKey {
    match target {
        None | Some("main") => TargetKey::Main,
        Some(key) => TargetKey::object(key),
    }
}

pub fn target_keys(targets: &[String]) -> Vec<TargetKey> {
    targets.iter().map(|t| target_key(Some(t.as_str()))).collect()
}

impl TourDefinition {
    /// Load tour from RON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tour file: {}", path.display()))?;

        let tour: Self = ron::from_str(&content)
            .with_context(|| format!("Failed to parse RON tour: {}", path.display()))?;
        tour.validate()
            .with_context(|| format!("Invalid tour: {}", path.display()))?;

        Ok(tour)
    }

    /// Save tour to RON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let ron = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize tour to RON")?;

        std::fs::write(path.as_ref(), ron)
            .with_context(|| format!("Failed to write tour file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Catch script mistakes before anything runs: bad easing or mode names,
    /// and objects moved that the scene does not have.
    pub fn validate(&self) -> Result<()> {
        for action in self.setup.iter().chain(&self.actions) {
            match action {
                TourAction::AddViewPoint { easing: Some(name), .. }
                | TourAction::PlaySynchronized { easing: Some(name), .. } => {
                    try_resolve_easing(name)?;
                }
                TourAction::UpdateViewPoint { update, .. } => {
                    if let Some(name) = &update.easing_name {
                        try_resolve_easing(name)?;
                    }
                }
                TourAction::PlayCombined { mode, .. } => {
                    mode.parse::<CombineMode>().map_err(anyhow::Error::msg)?;
                }
                TourAction::MoveObject { key, .. } if !self.objects.contains_key(key) => {
                    bail!("MoveObject refers to unknown object {:?}", key);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Scene graph described by `objects` and `camera`.
    pub fn build_scene(&self) -> SceneGraph {
        let mut scene = SceneGraph::new(self.camera);
        for (key, transform) in &self.objects {
            scene.insert_object(key.clone(), *transform);
        }
        scene
    }
}
