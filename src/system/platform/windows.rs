use tokio::process::Command;
use windows_sys::Win32::System::Threading::CREATE_NO_WINDOW;

use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn suppress_console_window(command: &mut Command) {
        command.creation_flags(CREATE_NO_WINDOW);
    }
}
