// Keymirror evdev Source
// Device enumeration and exclusive (grabbed) access

use std::collections::VecDeque;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use evdev::{Device, EventType};

use super::detect::{is_keyboard, is_virtual_device, matches_device_query, DeviceCapabilities};
use super::source::EventSource;
use super::{DeviceError, DeviceResult};
use crate::InputEvent;

/// Device information for listing devices
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Device node, e.g. /dev/input/event3
    pub path: PathBuf,
    /// Device name
    pub name: String,
    /// Whether the device has the keys the translator needs
    pub is_keyboard: bool,
}

fn capabilities(device: &Device) -> DeviceCapabilities {
    let has_ev_key = device.supported_events().contains(EventType::KEY);
    let supported_keys = device
        .supported_keys()
        .map(|keys| keys.iter().map(|key| key.code()).collect())
        .unwrap_or_default();
    DeviceCapabilities::new(has_ev_key, supported_keys)
}

/// List all input devices, sorted by path.
pub fn list_devices() -> Vec<DeviceInfo> {
    let mut devices: Vec<DeviceInfo> = evdev::enumerate()
        .map(|(path, device)| DeviceInfo {
            name: device.name().unwrap_or("Unknown").to_string(),
            is_keyboard: is_keyboard(&capabilities(&device)),
            path,
        })
        .collect();
    devices.sort_by(|a, b| a.path.cmp(&b.path));
    devices
}

/// Resolve the `mirror <DEVICE>` argument to a device path.
///
/// The first device (by path) whose path equals `query` or whose name
/// contains it wins. A device named `output_name` is our own virtual
/// device and never matches.
pub fn find_device(query: &str, output_name: &str) -> DeviceResult<PathBuf> {
    list_devices()
        .into_iter()
        .filter(|info| !is_virtual_device(&info.name, output_name))
        .find(|info| {
            matches_device_query(&info.name, &info.path.to_string_lossy(), query)
        })
        .map(|info| {
            log::debug!("Matched {:?} to {} ({})", query, info.name, info.path.display());
            info.path
        })
        .ok_or_else(|| DeviceError::NotFound(query.to_string()))
}

/// An input device held exclusively for the lifetime of this value.
///
/// Events the kernel delivers in batches are queued and handed out one at a
/// time, in order.
pub struct GrabbedDevice {
    device: Device,
    path: PathBuf,
    pending: VecDeque<InputEvent>,
    grabbed: bool,
}

impl GrabbedDevice {
    /// Open `path`, grab it, and discard anything already buffered.
    pub fn acquire(path: impl AsRef<Path>) -> DeviceResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut device = Device::open(&path).map_err(|source| DeviceError::Open {
            path: path.display().to_string(),
            source,
        })?;
        device.grab().map_err(|source| DeviceError::Grab {
            path: path.display().to_string(),
            source,
        })?;

        let mut grabbed = Self {
            device,
            path,
            pending: VecDeque::new(),
            grabbed: true,
        };
        let stale = grabbed.drain()?;
        log::debug!(
            "Grabbed {}; discarded {} stale events",
            grabbed.path.display(),
            stale
        );
        Ok(grabbed)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.device.name().unwrap_or("Unknown")
    }

    /// Release the exclusive grab (also done on drop)
    pub fn ungrab(&mut self) {
        if self.grabbed {
            if let Err(e) = self.device.ungrab() {
                log::warn!("Failed to ungrab {}: {}", self.path.display(), e);
            }
            self.grabbed = false;
        }
    }

    /// Whether the kernel has events ready, without blocking.
    fn has_buffered_input(&self) -> DeviceResult<bool> {
        let mut poll_fd = libc::pollfd {
            fd: self.device.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let poll_result = unsafe { libc::poll(&mut poll_fd, 1, 0) };

        if poll_result < 0 {
            let err = std::io::Error::last_os_error();
            // EINTR: a signal arrived, nothing to read right now
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(DeviceError::Io(err));
        }

        Ok(poll_result > 0 && poll_fd.revents & libc::POLLIN != 0)
    }
}

impl EventSource for GrabbedDevice {
    fn next_event(&mut self) -> DeviceResult<InputEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(event);
            }
            let events = self.device.fetch_events().map_err(DeviceError::Read)?;
            self.pending.extend(events.map(InputEvent::from));
        }
    }

    fn drain(&mut self) -> DeviceResult<usize> {
        let mut dropped = self.pending.len();
        self.pending.clear();

        while self.has_buffered_input()? {
            dropped += self
                .device
                .fetch_events()
                .map_err(DeviceError::Read)?
                .count();
        }

        Ok(dropped)
    }
}

/// Leaving a device grabbed would leave the keyboard dead, so the grab is
/// released on every exit path, including unwinding.
impl Drop for GrabbedDevice {
    fn drop(&mut self) {
        self.ungrab();
    }
}
