pub mod context;
pub mod main;
pub mod runtime;
pub mod stats_reporter;
pub mod sweeper;
pub mod timer;
