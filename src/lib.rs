pub mod action;
pub mod app;
pub mod config;
pub mod event;
pub mod format;
pub mod headless;
pub mod logging;
pub mod scheduler;
pub mod system;
pub mod ui;
