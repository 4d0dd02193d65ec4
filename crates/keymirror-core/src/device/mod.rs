// Keymirror Input Layer
// Source device selection, exclusive acquisition and the read loop

mod detect;
mod source;

#[cfg(feature = "evdev-backend")]
mod grab;

pub use detect::{is_keyboard, is_virtual_device, matches_device_query, DeviceCapabilities};
pub use source::{run_loop, EventSource, LoopError, LoopResult};

#[cfg(feature = "evdev-backend")]
pub use grab::{find_device, list_devices, DeviceInfo, GrabbedDevice};

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors raised while locating, acquiring or reading a source device
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to grab {path}: {source}")]
    Grab {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read events: {0}")]
    Read(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
