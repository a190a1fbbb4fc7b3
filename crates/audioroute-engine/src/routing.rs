//! Device routing.
//!
//! Each device counts how many routes hold it on. Its "on" path is applied
//! only on the 0 to 1 transition and its "off" path only when the count
//! returns to 0. Any other path applies every time it is named.

use audioroute_core::devices::{self, DeviceMask};
use audioroute_core::{PATH_ID_OFF, PATH_ID_ON, PathId, StreamId};
use audioroute_mixer::apply_ctls;

use crate::manager::{ConfigManager, State, StreamHandle};

impl State {
    fn apply_device_path(&mut self, dev: usize, path: usize) {
        let device = &mut self.model.devices[dev];
        let id = device.paths[path].id;

        match id {
            PATH_ID_OFF => {
                if device.use_count == 0 {
                    tracing::debug!(device = devices::device_name(device.mask), "off with use count already 0");
                } else {
                    device.use_count -= 1;
                }
                if device.use_count > 0 {
                    tracing::trace!(use_count = device.use_count, "device still in use, not applying off");
                    return;
                }
            }
            PATH_ID_ON => {
                device.use_count += 1;
                if device.use_count > 1 {
                    tracing::trace!(use_count = device.use_count, "device already on, not applying on");
                    return;
                }
            }
            _ => {}
        }

        tracing::trace!(
            device = devices::device_name(device.mask),
            path = id,
            "applying device path"
        );
        apply_ctls(self.mixer.as_mut(), &mut device.paths[path].ctls);
    }

    /// Apply up to two paths of one device, `first` then `second`.
    fn apply_paths_by_id(&mut self, dev: usize, first: Option<PathId>, second: Option<PathId>) {
        let device = &self.model.devices[dev];
        let first_pos = first.and_then(|id| device.path_position(id));
        let second_pos = if first == second {
            None
        } else {
            second.and_then(|id| device.path_position(id))
        };

        for pos in [first_pos, second_pos].into_iter().flatten() {
            self.apply_device_path(dev, pos);
        }
    }

    /// Apply paths to every device in `mask`.
    ///
    /// Devices are visited in declaration order and each device claims its
    /// bits, so a bit is served by the first device that declares it. Only
    /// devices of the mask's direction are considered.
    pub(crate) fn apply_paths_to_devices(
        &mut self,
        mask: DeviceMask,
        first: Option<PathId>,
        second: Option<PathId>,
    ) {
        let input = devices::is_input(mask);
        let mut remaining = mask & !devices::BIT_IN;
        tracing::trace!(mask = format_args!("{mask:#x}"), ?first, ?second, "apply paths to devices");

        for dev in 0..self.model.devices.len() {
            if remaining == 0 {
                break;
            }
            let device_mask = self.model.devices[dev].mask;
            if devices::is_input(device_mask) == input && device_mask & remaining != 0 {
                remaining &= !device_mask;
                self.apply_paths_by_id(dev, first, second);
            }
        }
    }

    pub(crate) fn apply_paths_to_global(&mut self, first: Option<PathId>, second: Option<PathId>) {
        if let Some(dev) = self.model.global_device() {
            self.apply_paths_by_id(dev, first, second);
        }
    }

    pub(crate) fn route(&mut self, id: StreamId, mut mask: DeviceMask) {
        let Some(stream) = self.model.stream(id) else {
            tracing::warn!(?id, "route for unknown stream");
            return;
        };
        if stream.ref_count == 0 {
            tracing::warn!(?id, "route for released stream ignored");
            return;
        }
        let input_stream = stream.stream_type().is_input();

        if mask != devices::NONE {
            if devices::is_input(mask) {
                if !input_stream {
                    tracing::error!(mask = format_args!("{mask:#x}"), "input routing on output stream");
                    return;
                }
                mask = (mask & devices::IN_ALL) | devices::BIT_IN;
            } else {
                if input_stream {
                    tracing::error!(mask = format_args!("{mask:#x}"), "output routing on input stream");
                    return;
                }
                mask &= devices::OUT_ALL;
            }
        }

        let current = stream.current_devices;
        let (enable_path, disable_path) = (stream.enable_path, stream.disable_path);
        let direction = mask & devices::BIT_IN;
        let enabling = (mask & !current) | direction;
        let disabling = (!mask & current) | direction;

        tracing::debug!(
            mask = format_args!("{mask:#x}"),
            enabling = format_args!("{enabling:#x}"),
            disabling = format_args!("{disabling:#x}"),
            "apply route"
        );

        self.apply_paths_to_devices(disabling, disable_path, Some(PATH_ID_OFF));
        self.apply_paths_to_devices(enabling, Some(PATH_ID_ON), enable_path);

        if let Some(stream) = self.model.stream_mut(id) {
            stream.current_devices = mask;
        }
    }
}

impl ConfigManager {
    /// Route a stream to `devices`.
    ///
    /// Only devices that change state are touched: newly routed devices get
    /// "on" then the stream's enable path, dropped ones get the stream's
    /// disable path then "off". A mask of the wrong direction for the stream
    /// is ignored.
    pub fn apply_route(&self, stream: &StreamHandle, devices: DeviceMask) {
        self.state.lock().route(stream.id, devices);
    }

    /// Devices the stream is currently routed to.
    pub fn get_current_routes(&self, stream: &StreamHandle) -> DeviceMask {
        self.state
            .lock()
            .model
            .stream(stream.id)
            .map_or(devices::NONE, |s| s.current_devices)
    }
}
