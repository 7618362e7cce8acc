//! Hotkey table.
//!
//! Hotkeys are written the way users type them (`"mod+shift+x"`), where
//! `mod` stands for Ctrl or Super. Terminals report shifted keys
//! inconsistently (`Ctrl+Shift+8` may arrive as `*` with or without the
//! SHIFT flag), so matching folds shifted US-layout symbols and uppercase
//! letters back onto their base key.

use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::document::Mark;
use crate::editor::BlockFormat;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotkeyParseError {
    #[error("empty hotkey")]
    Empty,
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),
    #[error("unknown key `{0}`")]
    UnknownKey(String),
}

/// A key plus the modifiers that must be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    code: KeyCode,
    primary: bool,
    shift: bool,
    alt: bool,
}

impl Hotkey {
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            primary: false,
            shift: false,
            alt: false,
        }
    }

    /// `mod` + key.
    pub const fn primary(code: KeyCode) -> Self {
        Self {
            primary: true,
            ..Self::new(code)
        }
    }

    pub const fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub const fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        let mods = key.modifiers;
        let primary = mods.intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER);
        if primary != self.primary || mods.contains(KeyModifiers::ALT) != self.alt {
            return false;
        }
        match (self.code, key.code) {
            (KeyCode::Char(want), KeyCode::Char(got)) => {
                let (base, implied_shift) = unshift(got);
                let shift = mods.contains(KeyModifiers::SHIFT) || implied_shift;
                shift == self.shift && base == want.to_ascii_lowercase()
            }
            (want, got) => want == got && mods.contains(KeyModifiers::SHIFT) == self.shift,
        }
    }
}

/// Map a reported char to (base key, whether producing it needs shift).
fn unshift(c: char) -> (char, bool) {
    if c.is_ascii_uppercase() {
        return (c.to_ascii_lowercase(), true);
    }
    let base = match c {
        '!' => '1',
        '@' => '2',
        '#' => '3',
        '$' => '4',
        '%' => '5',
        '^' => '6',
        '&' => '7',
        '*' => '8',
        '(' => '9',
        ')' => '0',
        '>' => '.',
        '<' => ',',
        '~' => '`',
        '?' => '/',
        '_' => '-',
        '+' => '=',
        '"' => '\'',
        ':' => ';',
        _ => return (c, false),
    };
    (base, true)
}

impl FromStr for Hotkey {
    type Err = HotkeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(HotkeyParseError::Empty);
        }
        // A trailing "+" is the plus key itself.
        let (mods, key) = match s.strip_suffix("++") {
            Some(rest) => (rest, "+"),
            None => s.rsplit_once('+').unwrap_or(("", s)),
        };
        let mut hotkey = Self::new(parse_key(key)?);
        for modifier in mods.split('+').filter(|m| !m.is_empty()) {
            match modifier.to_ascii_lowercase().as_str() {
                "mod" | "ctrl" | "control" | "cmd" | "super" => hotkey.primary = true,
                "shift" => hotkey.shift = true,
                "alt" | "opt" | "option" => hotkey.alt = true,
                other => return Err(HotkeyParseError::UnknownModifier(other.to_string())),
            }
        }
        Ok(hotkey)
    }
}

fn parse_key(key: &str) -> Result<KeyCode, HotkeyParseError> {
    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c.to_ascii_lowercase()));
    }
    let code = match key.to_ascii_lowercase().as_str() {
        "" => return Err(HotkeyParseError::Empty),
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "esc" | "escape" => KeyCode::Esc,
        "backspace" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "space" => KeyCode::Char(' '),
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        other => {
            return other
                .strip_prefix('f')
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| (1..=12).contains(n))
                .map(KeyCode::F)
                .ok_or_else(|| HotkeyParseError::UnknownKey(key.to_string()));
        }
    };
    Ok(code)
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.primary {
            f.write_str("mod+")?;
        }
        if self.alt {
            f.write_str("alt+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::F(n) => write!(f, "f{n}"),
            other => write!(f, "{}", format!("{other:?}").to_ascii_lowercase()),
        }
    }
}

/// What a hotkey does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    Mark(Mark),
    Block(BlockFormat),
    Image,
    Undo,
    Redo,
    Link,
}

impl HotkeyAction {
    pub const fn category(self) -> &'static str {
        match self {
            Self::Mark(_) => "mark",
            Self::Block(_) => "block",
            Self::Image => "image",
            Self::Undo | Self::Redo => "special",
            Self::Link => "link",
        }
    }

    /// Formatting actions are gated by `can_be_formatted`; undo and redo
    /// are not.
    pub const fn is_formatting(self) -> bool {
        !matches!(self, Self::Undo | Self::Redo)
    }
}

/// How many entries run when one key matches several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    #[default]
    FirstMatch,
    /// Every matching entry runs, in table order.
    AllMatches,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyEntry {
    pub hotkey: Hotkey,
    pub action: HotkeyAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyTable {
    entries: Vec<HotkeyEntry>,
}

impl Default for HotkeyTable {
    fn default() -> Self {
        use BlockFormat::{BlockQuote, BulletedList, CodeBlock, Heading, NumberedList};
        use HotkeyAction::{Block, Image, Link, Redo, Undo};

        let bindings = [
            ("mod+b", HotkeyAction::Mark(Mark::Bold)),
            ("mod+i", HotkeyAction::Mark(Mark::Italic)),
            ("mod+`", HotkeyAction::Mark(Mark::Code)),
            ("mod+shift+x", HotkeyAction::Mark(Mark::Strikethrough)),
            ("mod+1", Block(Heading(1))),
            ("mod+2", Block(Heading(2))),
            ("mod+3", Block(Heading(3))),
            ("mod+shift+.", Block(BlockQuote)),
            ("mod+shift+8", Block(BulletedList)),
            ("mod+shift+7", Block(NumberedList)),
            ("mod+shift+c", Block(CodeBlock)),
            ("mod+shift+g", Image),
            ("mod+k", Link),
            ("mod+z", Undo),
            ("mod+shift+z", Redo),
            ("mod+y", Redo),
        ];
        let mut table = Self::empty();
        for (hotkey, action) in bindings {
            if let Ok(hotkey) = hotkey.parse() {
                table.entries.push(HotkeyEntry { hotkey, action });
            }
        }
        table
    }
}

impl HotkeyTable {
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn bind(mut self, hotkey: &str, action: HotkeyAction) -> Result<Self, HotkeyParseError> {
        self.entries.push(HotkeyEntry {
            hotkey: hotkey.parse()?,
            action,
        });
        Ok(self)
    }

    pub fn entries(&self) -> &[HotkeyEntry] {
        &self.entries
    }

    /// Actions bound to `key`, in table order.
    pub fn matching(&self, key: &KeyEvent) -> Vec<HotkeyAction> {
        self.entries
            .iter()
            .filter(|entry| entry.hotkey.matches(key))
            .map(|entry| entry.action)
            .collect()
    }

    /// Hotkeys bound more than once, with every action bound to them.
    pub fn overlaps(&self) -> Vec<(Hotkey, Vec<HotkeyAction>)> {
        let mut out: Vec<(Hotkey, Vec<HotkeyAction>)> = Vec::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            if out.iter().any(|(hotkey, _)| *hotkey == entry.hotkey) {
                continue;
            }
            let actions: Vec<_> = self.entries[idx..]
                .iter()
                .filter(|other| other.hotkey == entry.hotkey)
                .map(|other| other.action)
                .collect();
            if actions.len() > 1 {
                out.push((entry.hotkey, actions));
            }
        }
        out
    }
}
