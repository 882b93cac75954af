//! Viewpoint registry: per-target buckets, cursors, playing flags and a global id index

use std::collections::HashMap;

use crate::easing::DEFAULT_EASING;
use crate::error::{Result, ViewpointError};
use crate::frame::FrameConverter;
use crate::playback::PlaybackFlag;
use crate::scene::Scene;
use crate::viewpoint::{
    CameraPose, DEFAULT_DURATION_MS, TargetKey, Viewpoint, ViewpointId, ViewpointUpdate,
};

/// Values given to freshly captured viewpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryDefaults {
    pub duration_ms: u32,
    pub easing_name: String,
}

impl Default for RegistryDefaults {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            easing_name: DEFAULT_EASING.to_string(),
        }
    }
}

/// Viewpoints attached to one target, in display/playback order.
#[derive(Debug, Clone, Default)]
pub struct TargetBucket {
    viewpoints: Vec<Viewpoint>,
    current_index: Option<usize>,
}

impl TargetBucket {
    /// Stored viewpoints (storage-frame coordinates).
    pub fn viewpoints(&self) -> &[Viewpoint] {
        &self.viewpoints
    }

    pub fn len(&self) -> usize {
        self.viewpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewpoints.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }
}

/// Cursor movement for [`ViewpointRegistry::step_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Prev,
}

/// Owns every viewpoint.
///
/// Reads hand out world-space copies; writes accept world-space input. The
/// storage frame chosen at creation is an internal detail.
#[derive(Debug, Clone, Default)]
pub struct ViewpointRegistry {
    buckets: HashMap<TargetKey, TargetBucket>,
    /// Bucket creation order
    order: Vec<TargetKey>,
    /// id -> (bucket, position in bucket)
    index: HashMap<ViewpointId, (TargetKey, usize)>,
    /// Sequence flags per target. Kept apart from the buckets: starting a
    /// sequence creates no bucket, and `clear` leaves generations counting.
    playback: HashMap<TargetKey, PlaybackFlag>,
    next_id: u64,
    defaults: RegistryDefaults,
}

impl ViewpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: RegistryDefaults) -> Self {
        Self {
            defaults,
            ..Default::default()
        }
    }

    pub fn defaults(&self) -> &RegistryDefaults {
        &self.defaults
    }

    fn allocate_id(&mut self) -> ViewpointId {
        self.next_id += 1;
        ViewpointId(self.next_id)
    }

    fn bucket_entry(&mut self, target_key: &TargetKey) -> &mut TargetBucket {
        if !self.buckets.contains_key(target_key) {
            self.order.push(target_key.clone());
        }
        self.buckets.entry(target_key.clone()).or_default()
    }

    /// Capture the scene's current camera pose as a new viewpoint.
    ///
    /// The local frame is used only if requested and the target resolves now;
    /// that choice is final for the viewpoint's lifetime. Returns the stored
    /// (storage-frame) viewpoint.
    pub fn add_view_point<S: Scene + ?Sized>(
        &mut self,
        scene: &S,
        name: Option<&str>,
        target_key: TargetKey,
        is_local: bool,
    ) -> Viewpoint {
        let converter = FrameConverter::new(scene);
        let is_local_frame = is_local && converter.resolves(&target_key);
        let pose = converter.pose_to_storage(scene.camera_pose(), &target_key, is_local_frame);

        let id = self.allocate_id();
        let viewpoint = Viewpoint {
            id,
            name: name.map_or_else(|| format!("View {}", id.0), str::to_string),
            position: pose.position,
            look_at: pose.look_at,
            duration_ms: self.defaults.duration_ms,
            easing_name: self.defaults.easing_name.clone(),
            target_key,
            is_local_frame,
        };

        self.push(viewpoint.clone());
        log::debug!(
            "Added viewpoint {} ({:?}) to {} [local: {}]",
            viewpoint.id,
            viewpoint.name,
            viewpoint.target_key,
            viewpoint.is_local_frame
        );
        viewpoint
    }

    fn push(&mut self, viewpoint: Viewpoint) {
        let id = viewpoint.id;
        let key = viewpoint.target_key.clone();
        let bucket = self.bucket_entry(&key);
        bucket.viewpoints.push(viewpoint);
        let position = bucket.viewpoints.len() - 1;
        self.index.insert(id, (key, position));
    }

    /// Insert an already-built viewpoint (snapshot restore). Keeps its id and
    /// storage frame; later allocations continue above the highest id seen.
    pub fn insert_view_point(&mut self, viewpoint: Viewpoint) -> Result<()> {
        if self.index.contains_key(&viewpoint.id) {
            return Err(ViewpointError::Snapshot(format!(
                "duplicate viewpoint id {}",
                viewpoint.id
            )));
        }
        self.next_id = self.next_id.max(viewpoint.id.0);
        self.push(viewpoint);
        Ok(())
    }

    /// Remove a viewpoint from whichever bucket holds it.
    ///
    /// If it sat at or before the bucket's cursor, the cursor is clamped to
    /// the new last index (`None` once the bucket is empty).
    pub fn remove_view_point(&mut self, id: ViewpointId) -> Result<Viewpoint> {
        let (key, position) = self.index.remove(&id).ok_or(ViewpointError::NotFound(id))?;
        let bucket = self
            .buckets
            .get_mut(&key)
            .ok_or(ViewpointError::NotFound(id))?;

        let removed = bucket.viewpoints.remove(position);
        if let Some(current) = bucket.current_index {
            if position <= current {
                bucket.current_index = bucket.viewpoints.len().checked_sub(1).map(|last| current.min(last));
            }
        }

        for (offset, viewpoint) in bucket.viewpoints[position..].iter().enumerate() {
            if let Some(entry) = self.index.get_mut(&viewpoint.id) {
                entry.1 = position + offset;
            }
        }

        log::debug!("Removed viewpoint {} from {}", id, key);
        Ok(removed)
    }

    /// Apply a partial update. Positions in `updates` are world space and are
    /// converted into the viewpoint's own storage frame. Returns the updated
    /// viewpoint in world space.
    pub fn update_view_point<S: Scene + ?Sized>(
        &mut self,
        scene: &S,
        id: ViewpointId,
        updates: ViewpointUpdate,
    ) -> Result<Viewpoint> {
        let converter = FrameConverter::new(scene);
        let viewpoint = self.stored_mut(id).ok_or(ViewpointError::NotFound(id))?;

        if let Some(position) = updates.position {
            viewpoint.position =
                converter.to_storage(position, &viewpoint.target_key, viewpoint.is_local_frame);
        }
        if let Some(look_at) = updates.look_at {
            viewpoint.look_at =
                converter.to_storage(look_at, &viewpoint.target_key, viewpoint.is_local_frame);
        }
        if let Some(name) = updates.name {
            viewpoint.name = name;
        }
        if let Some(duration_ms) = updates.duration_ms {
            viewpoint.duration_ms = duration_ms;
        }
        if let Some(easing_name) = updates.easing_name {
            viewpoint.easing_name = easing_name;
        }

        let viewpoint = viewpoint.clone();
        Ok(world_copy(&converter, &viewpoint))
    }

    /// World-space copies of a bucket, in order. Unknown targets yield an empty list.
    pub fn get_view_points<S: Scene + ?Sized>(&self, scene: &S, target_key: &TargetKey) -> Vec<Viewpoint> {
        let converter = FrameConverter::new(scene);
        self.buckets
            .get(target_key)
            .map(|bucket| {
                bucket
                    .viewpoints
                    .iter()
                    .map(|viewpoint| world_copy(&converter, viewpoint))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// World-space copy of a single viewpoint.
    pub fn get_view_point<S: Scene + ?Sized>(&self, scene: &S, id: ViewpointId) -> Result<Viewpoint> {
        let viewpoint = self.stored(id).ok_or(ViewpointError::NotFound(id))?;
        Ok(world_copy(&FrameConverter::new(scene), viewpoint))
    }

    /// World-space pose a transition to `id` should end at.
    pub fn world_pose<S: Scene + ?Sized>(&self, scene: &S, id: ViewpointId) -> Result<CameraPose> {
        let viewpoint = self.stored(id).ok_or(ViewpointError::NotFound(id))?;
        Ok(FrameConverter::new(scene).pose_to_world(
            viewpoint.pose(),
            &viewpoint.target_key,
            viewpoint.is_local_frame,
        ))
    }

    /// Stored viewpoint (storage-frame coordinates).
    pub fn stored(&self, id: ViewpointId) -> Option<&Viewpoint> {
        let (key, position) = self.index.get(&id)?;
        self.buckets.get(key)?.viewpoints.get(*position)
    }

    fn stored_mut(&mut self, id: ViewpointId) -> Option<&mut Viewpoint> {
        let (key, position) = self.index.get(&id)?;
        self.buckets.get_mut(key)?.viewpoints.get_mut(*position)
    }

    /// Bucket and position of a viewpoint.
    pub fn locate(&self, id: ViewpointId) -> Option<(&TargetKey, usize)> {
        self.index.get(&id).map(|(key, position)| (key, *position))
    }

    pub fn contains(&self, id: ViewpointId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn bucket(&self, target_key: &TargetKey) -> Option<&TargetBucket> {
        self.buckets.get(target_key)
    }

    /// Ids of a bucket in order.
    pub fn ids(&self, target_key: &TargetKey) -> Vec<ViewpointId> {
        self.buckets
            .get(target_key)
            .map(|bucket| bucket.viewpoints.iter().map(|v| v.id).collect())
            .unwrap_or_default()
    }

    /// Keys of every bucket ever created, in creation order.
    pub fn target_keys(&self) -> &[TargetKey] {
        &self.order
    }

    /// Total number of viewpoints across all buckets.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn current_index(&self, target_key: &TargetKey) -> Option<usize> {
        self.buckets.get(target_key).and_then(|bucket| bucket.current_index)
    }

    /// Point the bucket cursor at the viewpoint `id`.
    pub fn mark_current(&mut self, id: ViewpointId) {
        if let Some((key, position)) = self.index.get(&id) {
            if let Some(bucket) = self.buckets.get_mut(key) {
                bucket.current_index = Some(*position);
            }
        }
    }

    /// Move the cursor cyclically and return the viewpoint it lands on.
    /// A cursor of `None` counts as -1. Empty or unknown buckets yield `None`.
    pub fn step_index(&mut self, target_key: &TargetKey, step: Step) -> Option<ViewpointId> {
        let bucket = self.buckets.get_mut(target_key)?;
        let len = bucket.viewpoints.len() as i64;
        if len == 0 {
            return None;
        }

        let current = bucket.current_index.map_or(-1, |i| i as i64);
        let next = match step {
            Step::Next => (current + 1).rem_euclid(len),
            Step::Prev => (current - 1 + len).rem_euclid(len),
        } as usize;

        bucket.current_index = Some(next);
        Some(bucket.viewpoints[next].id)
    }

    /// Set the playing flag of a target and return the new run's generation.
    pub fn start_playback(&mut self, target_key: &TargetKey) -> u64 {
        self.playback.entry(target_key.clone()).or_default().start()
    }

    pub fn finish_playback(&mut self, target_key: &TargetKey, generation: u64) {
        if let Some(flag) = self.playback.get_mut(target_key) {
            flag.finish(generation);
        }
    }

    pub fn stop_playback(&mut self, target_key: &TargetKey) {
        if let Some(flag) = self.playback.get_mut(target_key) {
            flag.stop();
        }
    }

    pub fn stop_all_playback(&mut self) {
        for flag in self.playback.values_mut() {
            flag.stop();
        }
    }

    pub fn is_playing(&self, target_key: &TargetKey) -> bool {
        self.playback.get(target_key).is_some_and(PlaybackFlag::is_playing)
    }

    pub fn is_current_playback(&self, target_key: &TargetKey, generation: u64) -> bool {
        self.playback
            .get(target_key)
            .is_some_and(|flag| flag.is_current(generation))
    }

    /// Drop every bucket and stop all playback. Ids and playback generations
    /// keep counting up, so neither an old id nor a stopped run comes back.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.order.clear();
        self.index.clear();
        self.stop_all_playback();
    }
}

fn world_copy<S: Scene + ?Sized>(converter: &FrameConverter<'_, S>, viewpoint: &Viewpoint) -> Viewpoint {
    let pose = converter.pose_to_world(viewpoint.pose(), &viewpoint.target_key, viewpoint.is_local_frame);
    Viewpoint {
        position: pose.position,
        look_at: pose.look_at,
        ..viewpoint.clone()
    }
}
