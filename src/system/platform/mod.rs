use tokio::process::Command;

pub trait PlatformExtensions {
    /// Keeps a console window from flashing up when the child starts.
    fn suppress_console_window(command: &mut Command);
}

#[cfg(target_os = "windows")]
mod windows;
#[cfg(not(target_os = "windows"))]
mod unix;

#[cfg(not(target_os = "windows"))]
use unix as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn suppress_console_window(command: &mut Command) {
    platform_impl::Platform::suppress_console_window(command)
}
