//! Viewpoints and camera choreography for 3D scene editors
//!
//! This crate provides:
//! - Saved camera viewpoints, in world space or local to a scene object
//! - Eased camera transitions driven by the host's render loop
//! - Sequenced, combined and synchronized multi-viewpoint playback
//! - A named easing catalog and RON snapshots of stored viewpoints
//!
//! Everything runs on one thread. The host owns a [`Director`] and calls
//! [`Director::tick`] once per frame.

mod combiner;
mod director;
mod easing;
mod error;
mod frame;
mod playback;
mod registry;
mod scene;
mod sequencer;
mod snapshot;
mod synchronizer;
mod timer;
mod transition;
mod viewpoint;

pub use combiner::{CombineMode, create_combined_sequence};
pub use director::Director;
pub use easing::{DEFAULT_EASING, EaseFamily, EaseVariant, Easing, resolve_easing, try_resolve_easing};
pub use error::{Result, ViewpointError};
pub use frame::FrameConverter;
pub use playback::{PlaybackFlag, PlaybackHandle, PlaybackOutcome};
pub use registry::{RegistryDefaults, Step, TargetBucket, ViewpointRegistry};
pub use scene::{ObjectTransform, Scene, SceneGraph};
pub use sequencer::SequenceOptions;
pub use snapshot::ViewpointSnapshot;
pub use synchronizer::{DEFAULT_FRAME_DURATION_MS, SyncOptions, SyncPlayOptions, create_synchronized_path};
pub use timer::{Clock, ManualClock, SharedTimers, Sleep, SystemClock, TimerQueue, sleep};
pub use transition::{
    TransitionEngine, TransitionHandle, TransitionOutcome, TransitionStatus, Tween, Tweenable,
};
pub use viewpoint::{
    CameraPose, DEFAULT_DURATION_MS, Frame, TargetKey, Viewpoint, ViewpointId, ViewpointUpdate,
};

/// Common imports for hosts driving a [`Director`].
pub mod prelude {
    pub use crate::{
        CameraPose, CombineMode, Director, PlaybackOutcome, Scene, SceneGraph, SequenceOptions,
        SyncPlayOptions, TargetKey, TransitionOutcome, ViewpointId, ViewpointUpdate,
    };
}
