pub mod config;
pub mod error;
pub mod logging;
pub mod math;
pub mod memo;
pub mod opportunities;
pub mod state;
