// Keymirror Key Actions
// The value field of an EV_KEY event

use std::fmt;

/// What happened to a key in one EV_KEY event.
///
/// The discriminants are the kernel's `value` field, so a translated event
/// keeps its action by copying the value through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Action {
    Release = 0,
    Press = 1,
    /// Autorepeat while held
    Repeat = 2,
}

impl Action {
    /// `None` for anything the kernel does not define for EV_KEY.
    pub fn from_i32(value: i32) -> Option<Self> {
        [Action::Release, Action::Press, Action::Repeat]
            .into_iter()
            .find(|action| action.to_i32() == value)
    }

    pub fn to_i32(self) -> i32 {
        self as i32
    }

    fn label(self) -> &'static str {
        match self {
            Action::Release => "up",
            Action::Press => "down",
            Action::Repeat => "repeat",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_values() {
        for (value, action) in [(0, Action::Release), (1, Action::Press), (2, Action::Repeat)] {
            assert_eq!(Action::from_i32(value), Some(action));
            assert_eq!(action.to_i32(), value);
        }
    }

    #[test]
    fn test_undefined_values_rejected() {
        assert_eq!(Action::from_i32(3), None);
        assert_eq!(Action::from_i32(-1), None);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(Action::Press.to_string(), "down");
        assert_eq!(Action::Release.to_string(), "up");
    }
}
