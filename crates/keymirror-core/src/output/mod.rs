// Keymirror Output Layer
// Virtual uinput device that re-emits translated events

#[cfg(feature = "evdev-backend")]
mod uinput;

#[cfg(feature = "evdev-backend")]
pub use uinput::Injector;

/// Error types for output operations
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to create virtual device: {0}")]
    DeviceCreation(#[source] std::io::Error),

    #[error("Failed to write event: {0}")]
    Write(#[source] std::io::Error),
}
