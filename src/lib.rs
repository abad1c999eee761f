pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod render;
pub mod report;
pub mod source;
