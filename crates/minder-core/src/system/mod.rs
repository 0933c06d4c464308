//! Process resource tracking.

mod resources;

pub use resources::{ProcessSample, ResourceTracker};
