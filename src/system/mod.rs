pub mod accelerator;
pub mod collector;
pub mod host;
pub mod platform;
pub mod snapshot;
