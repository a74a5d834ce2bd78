//! CLI command implementations

mod config_gen;
mod link_management;
mod maintenance;
mod stats;

pub use config_gen::*;
pub use link_management::*;
pub use maintenance::*;
pub use stats::*;
