use tokio::process::Command;

use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    // Children never get a console window of their own here.
    fn suppress_console_window(_command: &mut Command) {}
}
