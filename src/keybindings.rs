//! Keybinding registry: maps keys to actions, with config overrides.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Pop the active feed, or ask to quit at the base feed.
    Quit,
    NavDown,
    NavUp,
    NavTop,
    NavBottom,
    CycleFocus,
    FocusList,
    FocusDetail,
    Refresh,
    OpenThread,
    OpenAccount,
    OpenPost,
    OpenOriginal,
    OpenCard,
    ConfirmQuit,
    CancelQuit,
}

impl Action {
    /// Human-readable description for the footer hint line.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Back / quit",
            Self::NavDown => "Next post",
            Self::NavUp => "Previous post",
            Self::NavTop => "First post",
            Self::NavBottom => "Last post",
            Self::CycleFocus => "Cycle pane focus",
            Self::FocusList => "Focus timeline",
            Self::FocusDetail => "Focus detail",
            Self::Refresh => "Load newer posts",
            Self::OpenThread => "Open thread",
            Self::OpenAccount => "Open author",
            Self::OpenPost => "Open post in browser",
            Self::OpenOriginal => "Open original post URL",
            Self::OpenCard => "Open link card",
            Self::ConfirmQuit => "Quit",
            Self::CancelQuit => "Stay",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    /// Timeline list has focus
    Timeline,
    /// Detail pane has focus
    Detail,
    /// Quit confirmation is showing; Global is not consulted
    QuitPrompt,
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    const fn ch(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "j", "G"
/// - Named keys: "Enter", "Esc", "Tab", "Up", "Down", "Left", "Right", "Space"
/// - Ctrl combos: "Ctrl+d"
/// - Function keys: "F1" through "F12"
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "home" => Some(KeyCode::Home),
        "end" => Some(KeyCode::End),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|n| n.parse::<u8>().ok())
    {
        return (1..=12).contains(&n).then(|| KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::ch(c)),
        _ => None,
    }
}

/// Format a KeySpec for display.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts; lookups
/// fall back to [`Context::Global`] except from [`Context::QuitPrompt`].
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// All bindings in registration order, for the hint line
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn register_defaults(&mut self) {
        use Context::*;

        // === Global ===
        self.bind(Global, KeySpec::ch('q'), Action::Quit);
        self.bind(Global, KeySpec::ctrl('c'), Action::ConfirmQuit);
        self.bind(Global, KeySpec::plain(KeyCode::Tab), Action::CycleFocus);
        self.bind(Global, KeySpec::ch('h'), Action::FocusList);
        self.bind(Global, KeySpec::ch('l'), Action::FocusDetail);
        self.bind(Global, KeySpec::ch('r'), Action::Refresh);
        self.bind(Global, KeySpec::ch('t'), Action::OpenThread);
        self.bind(Global, KeySpec::ch('u'), Action::OpenAccount);

        // === Timeline list ===
        self.bind(Timeline, KeySpec::ch('j'), Action::NavDown);
        self.bind(Timeline, KeySpec::plain(KeyCode::Down), Action::NavDown);
        self.bind(Timeline, KeySpec::ch('k'), Action::NavUp);
        self.bind(Timeline, KeySpec::plain(KeyCode::Up), Action::NavUp);
        self.bind(Timeline, KeySpec::ch('g'), Action::NavTop);
        self.bind(Timeline, KeySpec::plain(KeyCode::Home), Action::NavTop);
        self.bind(Timeline, KeySpec::ch('G'), Action::NavBottom);
        self.bind(Timeline, KeySpec::plain(KeyCode::End), Action::NavBottom);
        self.bind(Timeline, KeySpec::ch('o'), Action::OpenPost);
        self.bind(Timeline, KeySpec::ch('O'), Action::OpenOriginal);
        self.bind(Timeline, KeySpec::ch('v'), Action::OpenCard);

        // === Quit confirmation ===
        self.bind(QuitPrompt, KeySpec::ch('y'), Action::ConfirmQuit);
        self.bind(QuitPrompt, KeySpec::plain(KeyCode::Enter), Action::ConfirmQuit);
        self.bind(QuitPrompt, KeySpec::ctrl('c'), Action::ConfirmQuit);
        self.bind(QuitPrompt, KeySpec::ch('n'), Action::CancelQuit);
        self.bind(QuitPrompt, KeySpec::plain(KeyCode::Esc), Action::CancelQuit);
        self.bind(QuitPrompt, KeySpec::ch('q'), Action::CancelQuit);
    }

    /// Apply user overrides from the config `[keybindings]` table.
    ///
    /// Keys in the map are action names (e.g., "quit", "nav_down").
    /// Values are key strings (e.g., "q", "Ctrl+d", "F5").
    ///
    /// Returns a list of warnings for unrecognized action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };
            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            // Rebind in every context the action had, dropping its old keys
            let mut contexts: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);
            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(action = %action_name, key = %key_str, "Applied keybinding override");
        }

        warnings
    }

    /// Look up the action for a key in a context, falling back to Global.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers);

        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }
        if matches!(context, Context::Global | Context::QuitPrompt) {
            return None;
        }
        self.lookup.get(&(Context::Global, key)).copied()
    }

    /// First key bound to `action`, for hint text.
    pub fn key_for(&self, action: Action) -> Option<String> {
        self.bindings
            .iter()
            .find(|(_, _, a)| *a == action)
            .map(|(_, key, _)| format_key(key))
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action enum.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" | "back" => Some(Action::Quit),
        "nav_down" | "down" | "next" => Some(Action::NavDown),
        "nav_up" | "up" | "previous" => Some(Action::NavUp),
        "nav_top" | "top" | "first" => Some(Action::NavTop),
        "nav_bottom" | "bottom" | "last" => Some(Action::NavBottom),
        "cycle_focus" | "tab" => Some(Action::CycleFocus),
        "focus_list" | "focus_timeline" => Some(Action::FocusList),
        "focus_detail" => Some(Action::FocusDetail),
        "refresh" => Some(Action::Refresh),
        "open_thread" | "thread" => Some(Action::OpenThread),
        "open_account" | "account" => Some(Action::OpenAccount),
        "open_post" | "open" => Some(Action::OpenPost),
        "open_original" => Some(Action::OpenOriginal),
        "open_card" | "card" => Some(Action::OpenCard),
        "confirm_quit" => Some(Action::ConfirmQuit),
        "cancel_quit" => Some(Action::CancelQuit),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
