// Keymirror Key Type
// Represents a single key code from Linux input-event-codes.h

use std::fmt;
use std::str::FromStr;

/// Represents a single keyboard key code.
///
/// This is a newtype wrapper around u16 for type safety.
/// The numeric values match Linux input-event-codes.h definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Key(pub u16);

impl Key {
    pub const ESC: Key = Key(1);
    pub const SPACE: Key = Key(57);
    pub const MUTE: Key = Key(113);

    /// Get the raw numeric code value
    pub fn code(self) -> u16 {
        self.0
    }

    /// Get the name of this key
    pub fn name(self) -> &'static str {
        key_name(self.0)
    }
}

impl From<u16> for Key {
    fn from(code: u16) -> Self {
        Key(code)
    }
}

impl From<Key> for u16 {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        key_from_name(s).ok_or_else(|| format!("Unknown key: {}", s))
    }
}

// Canonical names first; aliases follow so `key_name` always finds the
// canonical spelling for a code.
const KEY_NAMES: &[(&str, u16)] = &[
    ("RESERVED", 0),
    ("ESC", 1),
    ("KEY_1", 2),
    ("KEY_2", 3),
    ("KEY_3", 4),
    ("KEY_4", 5),
    ("KEY_5", 6),
    ("KEY_6", 7),
    ("KEY_7", 8),
    ("KEY_8", 9),
    ("KEY_9", 10),
    ("KEY_0", 11),
    ("MINUS", 12),
    ("EQUAL", 13),
    ("BACKSPACE", 14),
    ("TAB", 15),
    ("Q", 16),
    ("W", 17),
    ("E", 18),
    ("R", 19),
    ("T", 20),
    ("Y", 21),
    ("U", 22),
    ("I", 23),
    ("O", 24),
    ("P", 25),
    ("LEFT_BRACE", 26),
    ("RIGHT_BRACE", 27),
    ("ENTER", 28),
    ("LEFT_CTRL", 29),
    ("A", 30),
    ("S", 31),
    ("D", 32),
    ("F", 33),
    ("G", 34),
    ("H", 35),
    ("J", 36),
    ("K", 37),
    ("L", 38),
    ("SEMICOLON", 39),
    ("APOSTROPHE", 40),
    ("GRAVE", 41),
    ("LEFT_SHIFT", 42),
    ("BACKSLASH", 43),
    ("Z", 44),
    ("X", 45),
    ("C", 46),
    ("V", 47),
    ("B", 48),
    ("N", 49),
    ("M", 50),
    ("COMMA", 51),
    ("DOT", 52),
    ("SLASH", 53),
    ("RIGHT_SHIFT", 54),
    ("KPASTERISK", 55),
    ("LEFT_ALT", 56),
    ("SPACE", 57),
    ("CAPSLOCK", 58),
    ("F1", 59),
    ("F2", 60),
    ("F3", 61),
    ("F4", 62),
    ("F5", 63),
    ("F6", 64),
    ("F7", 65),
    ("F8", 66),
    ("F9", 67),
    ("F10", 68),
    ("NUMLOCK", 69),
    ("SCROLLLOCK", 70),
    ("F11", 87),
    ("F12", 88),
    ("RIGHT_CTRL", 97),
    ("SYSRQ", 99),
    ("RIGHT_ALT", 100),
    ("HOME", 102),
    ("UP", 103),
    ("PAGE_UP", 104),
    ("LEFT", 105),
    ("RIGHT", 106),
    ("END", 107),
    ("DOWN", 108),
    ("PAGE_DOWN", 109),
    ("INSERT", 110),
    ("DELETE", 111),
    ("MUTE", 113),
    ("VOLUMEDOWN", 114),
    ("VOLUMEUP", 115),
    ("PAUSE", 119),
    ("LEFT_META", 125),
    ("RIGHT_META", 126),
    ("COMPOSE", 127),
    ("MENU", 139),
    ("EJECTCD", 161),
    ("NEXTSONG", 163),
    ("PLAYPAUSE", 164),
    ("PREVIOUSSONG", 165),
    ("STOPCD", 166),
    ("F13", 183),
    ("F14", 184),
    ("F15", 185),
    ("F16", 186),
    ("F17", 187),
    ("F18", 188),
    ("F19", 189),
    ("F20", 190),
    ("F21", 191),
    ("F22", 192),
    ("F23", 193),
    ("F24", 194),
    // Aliases
    ("ESCAPE", 1),
    ("1", 2),
    ("2", 3),
    ("3", 4),
    ("4", 5),
    ("5", 6),
    ("6", 7),
    ("7", 8),
    ("8", 9),
    ("9", 10),
    ("0", 11),
    ("PRINT", 99),
    ("LEFTCTRL", 29),
    ("LEFTSHIFT", 42),
    ("LEFTALT", 56),
    ("LEFTMETA", 125),
    ("RIGHTCTRL", 97),
    ("RIGHTSHIFT", 54),
    ("RIGHTALT", 100),
    ("RIGHTMETA", 126),
];

/// Display name for a key code
pub fn key_name(code: u16) -> &'static str {
    KEY_NAMES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
        .unwrap_or("UNKNOWN")
}

/// Try to parse a key name to a key code.
///
/// Names are case-insensitive and an optional `KEY_` prefix is accepted,
/// so `space`, `SPACE` and `KEY_SPACE` all resolve to the same key.
pub fn key_from_name(name: &str) -> Option<Key> {
    let name_upper = name.trim().to_uppercase();
    let lookup = |n: &str| {
        KEY_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == n)
            .map(|(_, code)| Key::from(*code))
    };
    lookup(&name_upper).or_else(|| name_upper.strip_prefix("KEY_").and_then(lookup))
}
