// Keymirror Input Layer - Device Detection
// Capability checks and device matching used by `ls` and `mirror`

/// Device capabilities extracted from evdev device.supported_keys()
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// Whether the device supports EV_KEY events
    pub has_ev_key: bool,
    /// List of supported key codes (EV_KEY capability codes)
    pub supported_keys: Vec<u16>,
}

impl DeviceCapabilities {
    pub fn new(has_ev_key: bool, supported_keys: Vec<u16>) -> Self {
        Self {
            has_ev_key,
            supported_keys,
        }
    }

    /// Check if a specific key code is supported
    pub fn supports_key(&self, key_code: u16) -> bool {
        self.supported_keys.contains(&key_code)
    }
}

// Every key the default table reads from, plus SPACE.
const MIRROR_SOURCE_CODES: &[u16] = &[
    16, 17, 18, 19, 20, // Q W E R T
    30, 31, 32, 33, 34, // A S D F G
    44, 45, 46, 47, 48, // Z X C V B
    57, // SPACE
];

/// Determine if a device is a keyboard that can drive the translator.
///
/// A device qualifies if it supports EV_KEY events and has every left-hand
/// key the default table mirrors, plus SPACE.
pub fn is_keyboard(capabilities: &DeviceCapabilities) -> bool {
    if !capabilities.has_ev_key {
        return false;
    }

    MIRROR_SOURCE_CODES
        .iter()
        .all(|code| capabilities.supports_key(*code))
}

/// Check if a device is our own virtual output device.
///
/// Selecting it as a source would feed our output back into the translator.
pub fn is_virtual_device(name: &str, output_name: &str) -> bool {
    name == output_name
}

/// Check if a device matches the `mirror <DEVICE>` argument.
///
/// A query matches a device when it equals the device path exactly or is a
/// substring of the device name.
pub fn matches_device_query(device_name: &str, device_path: &str, query: &str) -> bool {
    if query.is_empty() {
        return false;
    }
    device_path == query || device_name.contains(query)
}
