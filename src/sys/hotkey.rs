use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CONTROL = 0b0010;
        const ALT = 0b0100;
        const SUPER = 0b1000;
    }
}

impl Modifiers {
    fn from_token(token: &str) -> Option<Modifiers> {
        Some(match token {
            "shift" => Modifiers::SHIFT,
            "ctrl" | "control" => Modifiers::CONTROL,
            "alt" | "mod1" | "option" => Modifiers::ALT,
            "super" | "mod4" | "meta" | "win" | "logo" | "cmd" => Modifiers::SUPER,
            _ => return None,
        })
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = Vec::new();
        if self.contains(Modifiers::SUPER) {
            parts.push("Super");
        }
        if self.contains(Modifiers::CONTROL) {
            parts.push("Ctrl");
        }
        if self.contains(Modifiers::ALT) {
            parts.push("Alt");
        }
        if self.contains(Modifiers::SHIFT) {
            parts.push("Shift");
        }
        write!(f, "{}", parts.join(" + "))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Letters and digits, stored lowercase.
    Char(char),
    F(u8),
    Return,
    Space,
    Tab,
    Escape,
    Backspace,
    Delete,
    Insert,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Minus,
    Equal,
    Comma,
    Period,
    Slash,
    Semicolon,
    Quote,
    Grave,
    Backslash,
    BracketLeft,
    BracketRight,
    Print,
    AudioRaiseVolume,
    AudioLowerVolume,
    AudioMute,
    MonBrightnessUp,
    MonBrightnessDown,
    /// Hardware keycode with no symbolic name (e.g. `232`).
    Raw(u32),
}

impl KeyCode {
    fn from_token(token: &str) -> Option<KeyCode> {
        use KeyCode::*;

        let mut chars = token.chars();
        if let (Some(c), None) = (chars.next(), chars.clone().next()) {
            if c.is_ascii_alphanumeric() {
                return Some(Char(c.to_ascii_lowercase()));
            }
            return Some(match c {
                '-' => Minus,
                '=' => Equal,
                ',' => Comma,
                '.' => Period,
                '/' => Slash,
                ';' => Semicolon,
                '\'' => Quote,
                '`' => Grave,
                '\\' => Backslash,
                '[' => BracketLeft,
                ']' => BracketRight,
                _ => return None,
            });
        }

        if let Some(code) = token.strip_prefix("code:") {
            return code.parse().ok().map(Raw);
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            return token.parse().ok().map(Raw);
        }
        if let Some(n) = token.strip_prefix('f') {
            if let Ok(n) = n.parse::<u8>() {
                return (1..=24).contains(&n).then_some(F(n));
            }
        }

        Some(match token {
            "return" | "enter" => Return,
            "space" => Space,
            "tab" => Tab,
            "esc" | "escape" => Escape,
            "backspace" => Backspace,
            "delete" => Delete,
            "insert" => Insert,
            "left" | "arrowleft" => Left,
            "right" | "arrowright" => Right,
            "up" | "arrowup" => Up,
            "down" | "arrowdown" => Down,
            "home" => Home,
            "end" => End,
            "pageup" | "prior" => PageUp,
            "pagedown" | "next" => PageDown,
            "minus" | "hyphen" => Minus,
            "equal" | "equals" => Equal,
            "comma" => Comma,
            "period" | "dot" => Period,
            "slash" => Slash,
            "semicolon" => Semicolon,
            "quote" | "apostrophe" => Quote,
            "grave" | "backquote" => Grave,
            "backslash" => Backslash,
            "bracketleft" => BracketLeft,
            "bracketright" => BracketRight,
            "print" => Print,
            "xf86audioraisevolume" => AudioRaiseVolume,
            "xf86audiolowervolume" => AudioLowerVolume,
            "xf86audiomute" => AudioMute,
            "xf86monbrightnessup" => MonBrightnessUp,
            "xf86monbrightnessdown" => MonBrightnessDown,
            _ => return None,
        })
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use KeyCode::*;
        let s = match self {
            Char(c) => return write!(f, "{}", c.to_ascii_uppercase()),
            F(n) => return write!(f, "F{n}"),
            Raw(code) => return write!(f, "code:{code}"),
            Return => "Return",
            Space => "Space",
            Tab => "Tab",
            Escape => "Escape",
            Backspace => "Backspace",
            Delete => "Delete",
            Insert => "Insert",
            Left => "Left",
            Right => "Right",
            Up => "Up",
            Down => "Down",
            Home => "Home",
            End => "End",
            PageUp => "PageUp",
            PageDown => "PageDown",
            Minus => "Minus",
            Equal => "Equal",
            Comma => "Comma",
            Period => "Period",
            Slash => "Slash",
            Semicolon => "Semicolon",
            Quote => "Quote",
            Grave => "Grave",
            Backslash => "Backslash",
            BracketLeft => "BracketLeft",
            BracketRight => "BracketRight",
            Print => "Print",
            AudioRaiseVolume => "XF86AudioRaiseVolume",
            AudioLowerVolume => "XF86AudioLowerVolume",
            AudioMute => "XF86AudioMute",
            MonBrightnessUp => "XF86MonBrightnessUp",
            MonBrightnessDown => "XF86MonBrightnessDown",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Button {
    Left,
    Middle,
    Right,
    ScrollUp,
    ScrollDown,
    Other(u8),
}

impl Button {
    pub fn from_number(n: u8) -> Self {
        match n {
            1 => Button::Left,
            2 => Button::Middle,
            3 => Button::Right,
            4 => Button::ScrollUp,
            5 => Button::ScrollDown,
            n => Button::Other(n),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Button::Left => 1,
            Button::Middle => 2,
            Button::Right => 3,
            Button::ScrollUp => 4,
            Button::ScrollDown => 5,
            Button::Other(n) => n,
        }
    }

    fn from_token(token: &str) -> Option<Button> {
        let n = token.strip_prefix("button")?.parse::<u8>().ok()?;
        (n > 0).then(|| Button::from_number(n))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Input {
    Key(KeyCode),
    Button(Button),
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Key(key) => write!(f, "{key}"),
            Input::Button(button) => write!(f, "Button{}", button.number()),
        }
    }
}

/// A modifier set plus one key or mouse button.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub input: Input,
}

impl Hotkey {
    pub fn key(modifiers: Modifiers, key: KeyCode) -> Self {
        Self { modifiers, input: Input::Key(key) }
    }

    pub fn button(modifiers: Modifiers, button: Button) -> Self {
        Self {
            modifiers,
            input: Input::Button(button),
        }
    }

    pub fn is_button(&self) -> bool { matches!(self.input, Input::Button(_)) }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.input)
        } else {
            write!(f, "{} + {}", self.modifiers, self.input)
        }
    }
}

impl FromStr for Hotkey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A literal "+" key is written as "Plus" so splitting on '+' is safe.
        let parts: Vec<&str> = s.split('+').map(|p| p.trim()).filter(|p| !p.is_empty()).collect();
        let mut mods = Modifiers::empty();
        let mut input: Option<Input> = None;

        for part in parts {
            let token = part.to_lowercase();
            if let Some(m) = Modifiers::from_token(&token) {
                mods.insert(m);
                continue;
            }
            if input.is_some() {
                anyhow::bail!("More than one key in hotkey: {s}");
            }
            input = Some(if let Some(button) = Button::from_token(&token) {
                Input::Button(button)
            } else if let Some(key) = KeyCode::from_token(&token) {
                Input::Key(key)
            } else if token == "plus" {
                Input::Key(KeyCode::Equal)
            } else {
                anyhow::bail!("Unrecognized key token: {part}");
            });
        }

        let input = input.ok_or_else(|| anyhow::anyhow!("No key specified in hotkey: {}", s))?;
        Ok(Hotkey { modifiers: mods, input })
    }
}

impl Serialize for Hotkey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: serde::Serializer {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hotkey {
    fn deserialize<D>(deserializer: D) -> Result<Hotkey, D::Error>
    where D: serde::Deserializer<'de> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum HotkeyRepr {
            Str(String),
            Map {
                #[serde(default)]
                modifiers: Vec<String>,
                key: String,
            },
        }

        let repr = HotkeyRepr::deserialize(deserializer)?;
        let text = match repr {
            HotkeyRepr::Str(s) => s,
            HotkeyRepr::Map { mut modifiers, key } => {
                modifiers.push(key);
                modifiers.join(" + ")
            }
        };
        Hotkey::from_str(&text).map_err(serde::de::Error::custom)
    }
}
