//! Scripted camera tours for headless runs
//!
//! A tour is a RON file describing a small scene and a list of viewpoint
//! actions. The executor plays it frame by frame and reports where the
//! camera went.

mod definition;
mod executor;
mod report;

pub use definition::{TourAction, TourDefinition, target_key, target_keys};
pub use executor::{TourExecutor, TourExecutorConfig};
pub use report::{PlaybackRecord, TourReport};
