//! CLI command handling

pub mod logs;
pub mod send;
pub mod watch;

pub use logs::*;
pub use send::*;
pub use watch::*;
