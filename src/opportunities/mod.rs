pub mod aggregate;
pub mod catalog;
pub mod earn;
pub mod ids;
pub mod selectors;
pub mod types;
