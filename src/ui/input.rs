//! Keyboard and drag routing with input suppression rules

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::TimerPhase;

/// A key press as reported by the browser (`KeyboardEvent.key` plus modifiers)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
}

impl KeyInput {
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: false,
            meta: false,
        }
    }
}

/// Which keys trigger which command. Loadable from TOML; missing fields keep defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub next_page: Vec<String>,
    pub previous_page: Vec<String>,
    pub toggle_timer: Vec<String>,
    pub reset_timer: Vec<String>,
    pub fullscreen: Vec<String>,
    pub settings: Vec<String>,
    /// Combined with Ctrl or Cmd this is the browser's open-file shortcut
    pub open_file: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        fn keys(list: &[&str]) -> Vec<String> {
            list.iter().map(|k| k.to_string()).collect()
        }

        Self {
            next_page: keys(&["ArrowRight", "Enter"]),
            previous_page: keys(&["ArrowLeft", "Backspace"]),
            toggle_timer: keys(&[" "]),
            reset_timer: keys(&["r", "R"]),
            fullscreen: keys(&["f", "F"]),
            settings: keys(&["s", "S"]),
            open_file: "o".to_string(),
        }
    }
}

impl KeyBindings {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn matches(list: &[String], key: &str) -> bool {
        list.iter().any(|k| k == key)
    }
}

/// Command produced by a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "page", rename_all = "snake_case")]
pub enum Action {
    GoToPage(u32),
    StartTimer,
    PauseTimer,
    ResetTimer,
    ToggleFullscreen,
    ToggleSettings,
}

/// Result of routing a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum KeyOutcome {
    /// Swallowed by a suppression rule
    Suppressed,
    /// Reserved combination the browser must handle itself
    PassThrough,
    /// Not bound to anything
    Unbound,
    /// Bound key; `action` is `None` when its guard failed
    Handled { action: Option<Action> },
}

impl KeyOutcome {
    /// Whether the browser should cancel its default handling
    pub fn prevent_default(&self) -> bool {
        matches!(self, KeyOutcome::Handled { .. })
    }

    pub fn action(&self) -> Option<Action> {
        match self {
            KeyOutcome::Handled { action } => *action,
            _ => None,
        }
    }
}

/// What the router needs to know about the rest of the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteContext {
    pub document_loaded: bool,
    pub current_page: u32,
    pub page_count: u32,
    pub phase: TimerPhase,
}

/// Drag-and-drop notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragEvent {
    Over,
    Leave,
}

/// Maps input to actions. Owns the settings-panel and drag-overlay flags.
#[derive(Debug, Default)]
pub struct InputRouter {
    bindings: KeyBindings,
    settings_open: bool,
    dragging: bool,
}

impl InputRouter {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            settings_open: false,
            dragging: false,
        }
    }

    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    pub fn dragging(&self) -> bool {
        self.dragging
    }

    pub fn route_key(&mut self, input: &KeyInput, ctx: &RouteContext) -> KeyOutcome {
        let key = input.key.as_str();
        let is_settings = KeyBindings::matches(&self.bindings.settings, key);

        if self.settings_open && !is_settings {
            debug!("Key {:?} suppressed: settings panel open", key);
            return KeyOutcome::Suppressed;
        }
        if !ctx.document_loaded && !is_settings {
            debug!("Key {:?} suppressed: no document", key);
            return KeyOutcome::Suppressed;
        }
        if (input.ctrl || input.meta) && key == self.bindings.open_file {
            return KeyOutcome::PassThrough;
        }

        let b = &self.bindings;
        let action = if KeyBindings::matches(&b.next_page, key) {
            (ctx.current_page < ctx.page_count).then(|| Action::GoToPage(ctx.current_page + 1))
        } else if KeyBindings::matches(&b.previous_page, key) {
            (ctx.current_page > 1).then(|| Action::GoToPage(ctx.current_page - 1))
        } else if KeyBindings::matches(&b.toggle_timer, key) {
            if ctx.phase.is_active() {
                Some(Action::PauseTimer)
            } else {
                Some(Action::StartTimer)
            }
        } else if KeyBindings::matches(&b.reset_timer, key) {
            Some(Action::ResetTimer)
        } else if KeyBindings::matches(&b.fullscreen, key) {
            Some(Action::ToggleFullscreen)
        } else if is_settings {
            self.settings_open = !self.settings_open;
            Some(Action::ToggleSettings)
        } else {
            return KeyOutcome::Unbound;
        };

        KeyOutcome::Handled { action }
    }

    /// Update the drag overlay. Returns true when the flag changed.
    pub fn drag(&mut self, event: DragEvent) -> bool {
        let dragging = event == DragEvent::Over;
        let changed = self.dragging != dragging;
        self.dragging = dragging;
        changed
    }

    /// A file arrived; the drag is over
    pub fn dropped(&mut self) {
        self.dragging = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(current_page: u32, page_count: u32, phase: TimerPhase) -> RouteContext {
        RouteContext {
            document_loaded: page_count > 0,
            current_page,
            page_count,
            phase,
        }
    }

    fn route(router: &mut InputRouter, key: &str, ctx: RouteContext) -> KeyOutcome {
        router.route_key(&KeyInput::plain(key), &ctx)
    }

    #[test]
    fn navigation_stays_inside_the_document() {
        let mut router = InputRouter::default();
        let middle = ctx(2, 3, TimerPhase::Stopped);

        assert_eq!(route(&mut router, "ArrowRight", middle).action(), Some(Action::GoToPage(3)));
        assert_eq!(route(&mut router, "Enter", middle).action(), Some(Action::GoToPage(3)));
        assert_eq!(route(&mut router, "ArrowLeft", middle).action(), Some(Action::GoToPage(1)));
        assert_eq!(route(&mut router, "Backspace", middle).action(), Some(Action::GoToPage(1)));

        let last = route(&mut router, "ArrowRight", ctx(3, 3, TimerPhase::Stopped));
        assert_eq!(last, KeyOutcome::Handled { action: None });
        assert!(last.prevent_default());
        assert_eq!(route(&mut router, "ArrowLeft", ctx(1, 3, TimerPhase::Stopped)).action(), None);
    }

    #[test]
    fn toggle_depends_on_phase() {
        let mut router = InputRouter::default();
        for (phase, expected) in [
            (TimerPhase::Running, Action::PauseTimer),
            (TimerPhase::Counting, Action::PauseTimer),
            (TimerPhase::Paused, Action::StartTimer),
            (TimerPhase::Stopped, Action::StartTimer),
        ] {
            assert_eq!(route(&mut router, " ", ctx(1, 1, phase)).action(), Some(expected));
        }
    }

    #[test]
    fn everything_but_settings_is_suppressed_without_a_document() {
        let mut router = InputRouter::default();
        let empty = ctx(0, 0, TimerPhase::Stopped);

        for key in ["ArrowRight", " ", "r", "f"] {
            assert_eq!(route(&mut router, key, empty), KeyOutcome::Suppressed);
        }
        assert_eq!(
            route(&mut router, "s", empty).action(),
            Some(Action::ToggleSettings)
        );
        assert!(router.settings_open());
    }

    #[test]
    fn open_settings_panel_swallows_other_keys() {
        let mut router = InputRouter::default();
        let loaded = ctx(1, 5, TimerPhase::Running);

        route(&mut router, "S", loaded);
        assert!(router.settings_open());
        assert_eq!(route(&mut router, " ", loaded), KeyOutcome::Suppressed);
        assert_eq!(route(&mut router, "ArrowRight", loaded), KeyOutcome::Suppressed);

        route(&mut router, "s", loaded);
        assert!(!router.settings_open());
        assert_eq!(route(&mut router, " ", loaded).action(), Some(Action::PauseTimer));
    }

    #[test]
    fn open_file_shortcut_passes_through() {
        let mut router = InputRouter::default();
        let loaded = ctx(1, 2, TimerPhase::Stopped);

        let ctrl_o = KeyInput {
            key: "o".into(),
            ctrl: true,
            meta: false,
        };
        let cmd_o = KeyInput {
            key: "o".into(),
            ctrl: false,
            meta: true,
        };
        assert_eq!(router.route_key(&ctrl_o, &loaded), KeyOutcome::PassThrough);
        assert_eq!(router.route_key(&cmd_o, &loaded), KeyOutcome::PassThrough);
        assert!(!KeyOutcome::PassThrough.prevent_default());
        assert_eq!(route(&mut router, "o", loaded), KeyOutcome::Unbound);
    }

    #[test]
    fn reset_and_fullscreen() {
        let mut router = InputRouter::default();
        let loaded = ctx(1, 2, TimerPhase::Running);
        assert_eq!(route(&mut router, "R", loaded).action(), Some(Action::ResetTimer));
        assert_eq!(route(&mut router, "f", loaded).action(), Some(Action::ToggleFullscreen));
    }

    #[test]
    fn custom_bindings_from_toml() {
        let bindings = KeyBindings::from_toml(
            r#"
            next_page = ["PageDown"]
            previous_page = ["PageUp"]
            "#,
        )
        .expect("valid keymap");
        assert_eq!(bindings.toggle_timer, vec![" ".to_string()]);

        let mut router = InputRouter::new(bindings);
        let loaded = ctx(1, 2, TimerPhase::Stopped);
        assert_eq!(route(&mut router, "PageDown", loaded).action(), Some(Action::GoToPage(2)));
        assert_eq!(route(&mut router, "ArrowRight", loaded), KeyOutcome::Unbound);
    }

    #[test]
    fn drag_flag_follows_events() {
        let mut router = InputRouter::default();
        assert!(router.drag(DragEvent::Over));
        assert!(!router.drag(DragEvent::Over));
        assert!(router.dragging());
        router.dropped();
        assert!(!router.dragging());
        assert!(!router.drag(DragEvent::Leave));
    }
}
