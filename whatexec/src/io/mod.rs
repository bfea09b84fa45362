//! Side-effecting parts of resolution: environment, filesystem and volumes.

pub mod cache;
pub mod cached_resolver;
pub mod config;
pub mod detector;
pub mod environment;
pub mod locator;
pub mod path_resolver;
pub mod volumes;
