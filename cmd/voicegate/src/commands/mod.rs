//! CLI commands module.

mod config;
mod enroll;
mod list;
mod remove;
mod serve;
mod util;
mod verify;

pub use config::ConfigCommand;
pub use enroll::EnrollCommand;
pub use list::ListCommand;
pub use remove::RemoveCommand;
pub use serve::ServeCommand;
pub use verify::VerifyCommand;

// Re-export utils for use in commands
pub(crate) use util::*;
