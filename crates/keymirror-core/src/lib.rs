// Keymirror Core Library
// One-handed typing: mirror the left-hand rows onto the right while space is held

pub mod action;
pub mod config;
pub mod device;
pub mod event;
pub mod key;
pub mod output;
pub mod pipeline;
pub mod table;
pub mod translator;

pub use action::Action;
pub use config::{Config, ConfigError};
pub use device::{run_loop, DeviceError, EventSource, LoopError};
pub use event::InputEvent;
pub use key::Key;
pub use output::OutputError;
pub use pipeline::{EventLogger, EventSink, Handler, Next, Pipeline, PipelineBuilder};
pub use table::{KeyTable, TableError};
pub use translator::{Phase, Translator, TranslatorConfig, TranslatorState};

#[cfg(feature = "evdev-backend")]
pub use device::{find_device, list_devices, DeviceInfo, GrabbedDevice};
#[cfg(feature = "evdev-backend")]
pub use output::Injector;
