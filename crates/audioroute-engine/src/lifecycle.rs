//! Stream acquisition and release.

use audioroute_core::devices::{self, DeviceMask};
use audioroute_core::{
    AudioFormat, OutputFlags, PATH_ID_OFF, PATH_ID_ON, StreamId, StreamPool, StreamType,
};

use crate::manager::{ConfigManager, State, StreamHandle};

impl State {
    /// Take one instance of a stream. The first instance turns on the
    /// stream's global paths.
    fn open_stream(&mut self, id: StreamId) -> bool {
        let Some(stream) = self.model.stream_mut(id) else {
            return false;
        };
        if stream.ref_count >= stream.max_ref_count {
            tracing::trace!(ref_count = stream.ref_count, "stream at maximum ref count");
            return false;
        }

        stream.ref_count += 1;
        if stream.ref_count == 1 {
            let enable_path = stream.enable_path;
            self.apply_paths_to_global(Some(PATH_ID_ON), enable_path);
        }
        true
    }

    fn handle(&self, id: StreamId) -> Option<StreamHandle> {
        self.model.stream(id).map(|s| StreamHandle::new(id, s.info))
    }
}

impl ConfigManager {
    /// Acquire an anonymous stream for a device mask and format.
    ///
    /// The stream type follows from the mask direction and whether the
    /// format is linear PCM. Later declarations are tried first. The stream
    /// is routed to `devices` before returning. `None` when every matching
    /// stream is at its instance limit.
    pub fn get_stream(
        &self,
        devices: DeviceMask,
        flags: OutputFlags,
        format: AudioFormat,
    ) -> Option<StreamHandle> {
        let stream_type =
            StreamType::for_request(devices::is_input(devices), format.is_linear_pcm());
        tracing::debug!(
            devices = format_args!("{devices:#x}"),
            flags = format_args!("{:#x}", flags.0),
            format = format_args!("{:#x}", format.0),
            %stream_type,
            "get_stream"
        );

        let mut state = self.state.lock();
        let mut acquired = None;
        for index in (0..state.model.anon_streams.len()).rev() {
            let id = StreamId {
                pool: StreamPool::Anonymous,
                index,
            };
            if state.model.anon_streams[index].stream_type() == stream_type
                && state.open_stream(id)
            {
                acquired = Some(id);
                break;
            }
        }

        let Some(id) = acquired else {
            tracing::debug!(%stream_type, "no suitable stream");
            return None;
        };

        state.route(id, devices);
        state.handle(id)
    }

    /// Acquire a named stream. No route is applied.
    pub fn get_named_stream(&self, name: &str) -> Option<StreamHandle> {
        let mut state = self.state.lock();
        let Some(index) = state.model.find_named_stream(name) else {
            tracing::debug!(name, "named stream not declared");
            return None;
        };

        let id = StreamId {
            pool: StreamPool::Named,
            index,
        };
        if !state.open_stream(id) {
            tracing::debug!(name, "named stream unavailable");
            return None;
        }
        tracing::debug!(name, "got named stream");
        state.handle(id)
    }

    /// Release one instance of a stream.
    ///
    /// Releasing the last instance turns off every device the stream is
    /// routed to and its global paths.
    pub fn release_stream(&self, stream: &StreamHandle) {
        let mut state = self.state.lock();
        let Some(s) = state.model.stream_mut(stream.id) else {
            tracing::warn!(id = ?stream.id, "release of unknown stream");
            return;
        };
        if s.ref_count == 0 {
            tracing::warn!(id = ?stream.id, "release of stream that is not open");
            return;
        }

        s.ref_count -= 1;
        tracing::debug!(id = ?stream.id, ref_count = s.ref_count, "release_stream");
        if s.ref_count > 0 {
            return;
        }

        let current = s.current_devices;
        let disable_path = s.disable_path;
        s.current_devices = devices::NONE;
        state.apply_paths_to_devices(current, Some(PATH_ID_OFF), disable_path);
        state.apply_paths_to_global(disable_path, Some(PATH_ID_OFF));
    }
}
