// Keymirror uinput Output
// Virtual device creation and event injection

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, Device};

use super::OutputError;
use crate::event::EV_SYN;
use crate::pipeline::EventSink;
use crate::{InputEvent, Key};

/// Terminal pipeline stage writing to a uinput device.
///
/// `VirtualDevice::emit` closes every batch with its own SYN_REPORT, so events
/// are buffered until the source's SYN_REPORT arrives and then written as one
/// report. Other sync codes (SYN_DROPPED and friends) are not forwarded.
pub struct Injector {
    device: VirtualDevice,
    pending: Vec<evdev::InputEvent>,
}

impl Injector {
    /// Create a virtual device advertising every key of `source` plus `extra_keys`.
    pub fn create_mirror<I>(source: &Device, name: &str, extra_keys: I) -> Result<Self, OutputError>
    where
        I: IntoIterator<Item = Key>,
    {
        let mut keys = AttributeSet::<evdev::Key>::new();
        if let Some(supported) = source.supported_keys() {
            for key in supported.iter() {
                keys.insert(key);
            }
        }
        for key in extra_keys {
            keys.insert(evdev::Key::new(key.code()));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(OutputError::DeviceCreation)?
            .name(name)
            .with_keys(&keys)
            .map_err(OutputError::DeviceCreation)?
            .build()
            .map_err(OutputError::DeviceCreation)?;

        log::info!("Created virtual device {:?}", name);
        Ok(Self {
            device,
            pending: Vec::new(),
        })
    }

    fn flush(&mut self) -> Result<(), OutputError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.device
            .emit(&self.pending)
            .map_err(OutputError::Write)?;
        self.pending.clear();
        Ok(())
    }
}

impl EventSink for Injector {
    fn emit(&mut self, event: InputEvent) -> Result<(), OutputError> {
        log::trace!("   injecting {}", event);
        if event.is_sync_report() {
            self.flush()
        } else if event.event_type() == EV_SYN {
            Ok(())
        } else {
            self.pending.push(event.into());
            Ok(())
        }
    }
}
