//! Per-stream constants.

use audioroute_core::{Error, Result, parse_i32, parse_u32};

use crate::manager::{ConfigManager, StreamHandle};

impl ConfigManager {
    fn constant(&self, stream: &StreamHandle, name: &str) -> Result<String> {
        let state = self.state.lock();
        state
            .model
            .stream(stream.id)
            .and_then(|s| s.constant(name))
            .map(str::to_owned)
            .ok_or_else(|| Error::NotFound(format!("constant '{name}'")))
    }

    /// Raw text of a stream constant.
    pub fn get_stream_constant_string(&self, stream: &StreamHandle, name: &str) -> Result<String> {
        self.constant(stream, name)
    }

    /// A stream constant parsed as an unsigned integer.
    pub fn get_stream_constant_u32(&self, stream: &StreamHandle, name: &str) -> Result<u32> {
        let text = self.constant(stream, name)?;
        parse_u32(&text).map_err(|_| {
            Error::InvalidArgument(format!("constant '{name}' = '{text}' is not an unsigned integer"))
        })
    }

    /// A stream constant parsed as a signed integer.
    pub fn get_stream_constant_i32(&self, stream: &StreamHandle, name: &str) -> Result<i32> {
        let text = self.constant(stream, name)?;
        parse_i32(&text).map_err(|_| {
            Error::InvalidArgument(format!("constant '{name}' = '{text}' is not an integer"))
        })
    }
}
