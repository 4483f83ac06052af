pub mod filter;
pub mod lifecycle;
pub mod tracker;

pub use filter::UpdateFilter;
pub use lifecycle::LifecycleSignal;
pub use tracker::{LocationTracker, TrackerState};
