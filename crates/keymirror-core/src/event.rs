// Keymirror Input Events
// Immutable event records passed through the translation pipeline

use std::fmt;
use std::time::SystemTime;

use crate::{Action, Key};

/// EV_SYN event type code from input-event-codes.h
pub const EV_SYN: u16 = 0x00;
/// EV_KEY event type code from input-event-codes.h
pub const EV_KEY: u16 = 0x01;
/// SYN_REPORT code: terminates one hardware report
pub const SYN_REPORT: u16 = 0;

/// Check if an event type is a key event.
pub fn is_key_event(event_type: u16) -> bool {
    event_type == EV_KEY
}

/// One input event as read from (or written to) an evdev device.
///
/// Events are values: pipeline stages that change an event build a new one
/// with [`InputEvent::with_code`] instead of editing it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    timestamp: SystemTime,
    event_type: u16,
    code: u16,
    value: i32,
}

impl InputEvent {
    pub fn new(timestamp: SystemTime, event_type: u16, code: u16, value: i32) -> Self {
        Self {
            timestamp,
            event_type,
            code,
            value,
        }
    }

    /// Key event for `key` with the given action.
    pub fn key(timestamp: SystemTime, key: Key, action: Action) -> Self {
        Self::new(timestamp, EV_KEY, key.code(), action.to_i32())
    }

    /// SYN_REPORT marker (type 0, code 0, value 0).
    pub fn sync(timestamp: SystemTime) -> Self {
        Self::new(timestamp, EV_SYN, SYN_REPORT, 0)
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn event_type(&self) -> u16 {
        self.event_type
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn is_key(&self) -> bool {
        is_key_event(self.event_type)
    }

    pub fn is_sync_report(&self) -> bool {
        self.event_type == EV_SYN && self.code == SYN_REPORT
    }

    /// Key and action of a key event; `None` for other event types or
    /// values outside release/press/repeat.
    pub fn as_key(&self) -> Option<(Key, Action)> {
        if !self.is_key() {
            return None;
        }
        Action::from_i32(self.value).map(|action| (Key::from(self.code), action))
    }

    /// Same event, reporting `key` instead of the original code.
    pub fn with_code(self, key: Key) -> Self {
        Self {
            code: key.code(),
            ..self
        }
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.event_type, self.as_key()) {
            (_, Some((key, action))) => write!(f, "key {} ({}) {}", key, self.code, action),
            (EV_SYN, None) => write!(f, "sync code={} value={}", self.code, self.value),
            _ => write!(
                f,
                "type={} code={} value={}",
                self.event_type, self.code, self.value
            ),
        }
    }
}

#[cfg(feature = "evdev-backend")]
impl From<evdev::InputEvent> for InputEvent {
    fn from(event: evdev::InputEvent) -> Self {
        Self::new(
            event.timestamp(),
            event.event_type().0,
            event.code(),
            event.value(),
        )
    }
}

#[cfg(feature = "evdev-backend")]
impl From<InputEvent> for evdev::InputEvent {
    fn from(event: InputEvent) -> Self {
        // The kernel stamps uinput events on write, so the timestamp is not carried.
        evdev::InputEvent::new(evdev::EventType(event.event_type), event.code, event.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(ms: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(ms)
    }

    #[test]
    fn test_is_key_event() {
        assert!(is_key_event(EV_KEY));
        assert!(!is_key_event(EV_SYN));
        assert!(!is_key_event(0x02)); // EV_REL
        assert!(!is_key_event(0x04)); // EV_MSC
    }

    #[test]
    fn test_as_key() {
        let press = InputEvent::key(at(0), Key::from(16), Action::Press);
        assert_eq!(press.as_key(), Some((Key::from(16), Action::Press)));

        assert_eq!(InputEvent::sync(at(0)).as_key(), None);
        assert_eq!(InputEvent::new(at(0), EV_KEY, 16, 7).as_key(), None);
    }

    #[test]
    fn test_with_code_keeps_everything_else() {
        let original = InputEvent::key(at(42), Key::from(16), Action::Repeat);
        let rewritten = original.with_code(Key::from(25));

        assert_eq!(rewritten.code(), 25);
        assert_eq!(rewritten.value(), 2);
        assert_eq!(rewritten.event_type(), EV_KEY);
        assert_eq!(rewritten.timestamp(), at(42));
        assert_eq!(original.code(), 16);
    }

    #[test]
    fn test_sync_report() {
        let sync = InputEvent::sync(at(5));
        assert!(sync.is_sync_report());
        assert_eq!((sync.event_type(), sync.code(), sync.value()), (0, 0, 0));
        // SYN_DROPPED
        assert!(!InputEvent::new(at(5), EV_SYN, 3, 0).is_sync_report());
    }

    #[test]
    fn test_display() {
        let press = InputEvent::key(at(0), Key::SPACE, Action::Press);
        assert_eq!(press.to_string(), "key SPACE (57) down");
        assert_eq!(InputEvent::sync(at(0)).to_string(), "sync code=0 value=0");
        assert_eq!(
            InputEvent::new(at(0), 0x04, 4, 458775).to_string(),
            "type=4 code=4 value=458775"
        );
    }
}
