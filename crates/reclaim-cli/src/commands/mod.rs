//! Command implementations.

pub mod classify;
pub mod config;
pub mod run;
pub mod targets;
pub mod watch;

pub use self::classify::execute_classify;
pub use self::config::execute_config;
pub use self::run::execute_run;
pub use self::targets::execute_targets;
pub use self::watch::execute_watch;
