//! Cropwatch Session - stateful client components
//!
//! Each component owns its timers through [`TaskGuard`] handles, so replacing
//! or dropping a component cancels whatever it had scheduled.

pub mod map;
pub mod orchestrator;
pub mod poller;
pub mod search;
pub mod task;

pub use map::HeadlessMap;
pub use orchestrator::{AnalysisOrchestrator, AnalysisView};
pub use poller::JobPoller;
pub use search::{LocationSearch, SearchState, SearchView};
pub use task::TaskGuard;
