use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::action::Action;
use crate::config::Config;
use crate::system::snapshot::Snapshot;
use crate::ui::theme::{ColorSupport, Theme, resolve_color_support};

const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Dashboard state. Only the latest snapshot is kept.
pub struct App {
    pub running: bool,
    pub snapshot: Option<Snapshot>,
    pub theme: Theme,
    pub color_support: ColorSupport,
    pub tick_interval: Duration,
    pub accelerator_enabled: bool,
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let color_support = resolve_color_support(&config.general.color_support);
        let theme = Theme::from_config(&config.general.theme, color_support);

        App {
            running: true,
            snapshot: None,
            theme,
            color_support,
            tick_interval: config.general.tick_interval(),
            accelerator_enabled: config.accelerator.enabled,
            status_message: None,
        }
    }

    pub fn on_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = Some(snapshot);
    }

    pub fn map_key(&self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('t') => Action::CycleTheme,
            _ => Action::None,
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::CycleTheme => {
                self.theme = self.theme.next(self.color_support);
                self.set_status(format!("Theme: {}", self.theme.name));
            }
            Action::None => {}
        }
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// The status message, if it has not expired yet.
    pub fn active_status(&self) -> Option<&str> {
        self.status_message
            .as_ref()
            .filter(|(_, at)| at.elapsed() < STATUS_MESSAGE_TTL)
            .map(|(msg, _)| msg.as_str())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::system::snapshot::{Accelerator, CpuUsage, MemoryUsage};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn make_app() -> App {
        let mut config = Config::default();
        config.general.color_support = "truecolor".to_string();
        App::new(&config)
    }

    #[test]
    fn quit_keys() {
        let app = make_app();
        assert_eq!(app.map_key(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(app.map_key(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            app.map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(app.map_key(key(KeyCode::Char('c'))), Action::None);
    }

    #[test]
    fn dispatch_quit_stops_app() {
        let mut app = make_app();
        app.dispatch(Action::Quit);
        assert!(!app.running);
    }

    #[test]
    fn cycle_theme_sets_status() {
        let mut app = make_app();
        assert_eq!(app.theme.name, "dark");
        app.dispatch(Action::CycleTheme);
        assert_eq!(app.theme.name, "light");
        assert_eq!(app.active_status(), Some("Theme: light"));
    }

    #[test]
    fn newer_snapshot_replaces_older() {
        let mut app = make_app();
        for used in [10.0, 20.0] {
            app.on_snapshot(Snapshot {
                timestamp: Utc::now(),
                cpu: CpuUsage::new(used),
                memory: MemoryUsage::from_total_and_available(100, 50),
                accelerator: Accelerator::Absent,
            });
        }
        assert_eq!(app.snapshot.as_ref().unwrap().cpu.used_percent, 20.0);
    }
}
