//! Step-by-step playback shared by sequences and synchronized paths.
//!
//! A playback task animates to one waypoint, awaits the transition (frame
//! driven), sleeps the interval (timer driven), and moves on. Its playing
//! flag is re-checked before every step.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::director::Core;
use crate::playback::PlaybackOutcome;
use crate::scene::Scene;
use crate::timer::{SharedTimers, sleep};
use crate::transition::TransitionOutcome;
use crate::viewpoint::{Frame, TargetKey, ViewpointId};

/// Options for [`crate::Director::play_view_sequence`].
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceOptions {
    /// Restart from the first viewpoint after the last one
    pub loop_playback: bool,
    /// Pause between viewpoints (milliseconds)
    pub interval_ms: u64,
    /// Bucket played (without explicit ids) and whose flag tracks playback
    pub target_key: TargetKey,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            loop_playback: false,
            interval_ms: 500,
            target_key: TargetKey::Main,
        }
    }
}

/// One stop along a playback.
#[derive(Debug, Clone)]
pub(crate) enum Waypoint {
    /// Resolved when reached, so edits and target motion are picked up
    Viewpoint(ViewpointId),
    Frame(Frame),
}

/// Which playing flag a task answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FlagKey {
    Bucket(TargetKey),
    Sync(Vec<TargetKey>),
}

pub(crate) struct Playback {
    pub waypoints: Vec<Waypoint>,
    pub flag: FlagKey,
    pub generation: u64,
    pub loop_playback: bool,
    pub interval: Duration,
}

pub(crate) async fn run_playback<S: Scene>(
    core: Rc<RefCell<Core<S>>>,
    timers: SharedTimers,
    playback: Playback,
) -> PlaybackOutcome {
    let Playback {
        waypoints,
        flag,
        generation,
        loop_playback,
        interval,
    } = playback;

    let mut index = 0;
    let mut played_this_pass = false;

    loop {
        if !core.borrow().is_flag_current(&flag, generation) {
            log::info!("Playback {:?} stopped", flag);
            return PlaybackOutcome::Stopped;
        }

        if index >= waypoints.len() {
            if loop_playback && played_this_pass {
                index = 0;
                played_this_pass = false;
                continue;
            }
            core.borrow_mut().finish_flag(&flag, generation);
            log::info!("Playback {:?} finished", flag);
            return PlaybackOutcome::Finished;
        }

        let handle = core.borrow_mut().animate_to(&waypoints[index]);
        match handle {
            Some(handle) => {
                played_this_pass = true;
                log::debug!("Playback {:?} step {}/{}", flag, index + 1, waypoints.len());

                if handle.await == TransitionOutcome::Canceled {
                    let mut core = core.borrow_mut();
                    if core.is_flag_current(&flag, generation) {
                        core.finish_flag(&flag, generation);
                        log::info!("Playback {:?} interrupted by another transition", flag);
                        return PlaybackOutcome::Interrupted;
                    }
                    log::info!("Playback {:?} stopped", flag);
                    return PlaybackOutcome::Stopped;
                }

                sleep(&timers, interval).await;
            }
            None => log::warn!("Playback {:?} skipping removed waypoint {}", flag, index),
        }

        index += 1;
    }
}
