pub mod estimation;
pub mod format;
pub mod gateway;
pub mod metrics_manager;
pub mod models;
pub mod pacing;
pub mod session_manager;
pub mod stats;
pub mod wizard;
