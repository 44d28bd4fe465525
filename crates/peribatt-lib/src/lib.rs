//! Peribatt — peripheral battery indicator core: report parsing, icon and
//! visibility decisions, and the refresh cycle.

pub mod error;
pub mod icon;
pub mod orchestrator;
pub mod render;
pub mod report;
pub mod runner;
pub mod settings;
pub mod visibility;

pub use error::PeribattError;
