//! # Runtime Module
//!
//! Runtime components for the AlertRule Controller: initialization, the
//! cluster watch loop, the standalone resync loop and error handling.

pub mod context;
pub mod error_policy;
pub mod initialization;
pub mod resync;
pub mod watch_loop;

pub use context::ControllerContext;
pub use initialization::{init_tracing, initialize, InitializationResult, RuntimeOptions};
pub use resync::{resync_once, run_resync_loop};
pub use watch_loop::{reconcile_alert_rule, run_watch_loop};
