//! Static stream description handed to callers.

use std::fmt;

/// Kind and direction of a declared stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// PCM playback.
    OutPcm,
    /// PCM capture.
    InPcm,
    /// Compressed playback.
    OutCompress,
    /// Compressed capture.
    InCompress,
    /// Hardware link towards an output device.
    OutHw,
    /// Hardware link from an input device.
    InHw,
    /// The stream named `global`, direction-less.
    Global,
}

impl StreamType {
    /// Pick the PCM or compressed type for a direction.
    pub const fn for_request(input: bool, pcm: bool) -> Self {
        match (input, pcm) {
            (true, true) => StreamType::InPcm,
            (true, false) => StreamType::InCompress,
            (false, true) => StreamType::OutPcm,
            (false, false) => StreamType::OutCompress,
        }
    }

    /// Whether the stream captures audio.
    pub const fn is_input(self) -> bool {
        matches!(
            self,
            StreamType::InPcm | StreamType::InCompress | StreamType::InHw
        )
    }

    /// Whether the stream carries linear PCM.
    pub const fn is_pcm(self) -> bool {
        matches!(self, StreamType::OutPcm | StreamType::InPcm)
    }

    /// Whether the stream carries a compressed bitstream.
    pub const fn is_compressed(self) -> bool {
        matches!(self, StreamType::OutCompress | StreamType::InCompress)
    }

    /// Whether the stream is a hardware link.
    pub const fn is_hardware(self) -> bool {
        matches!(self, StreamType::OutHw | StreamType::InHw)
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamType::OutPcm => "pcm out",
            StreamType::InPcm => "pcm in",
            StreamType::OutCompress => "compress out",
            StreamType::InCompress => "compress in",
            StreamType::OutHw => "hw out",
            StreamType::InHw => "hw in",
            StreamType::Global => "global",
        };
        f.write_str(s)
    }
}

/// Hardware parameters of a stream.
///
/// `device_number == u32::MAX` means the declaration did not name a device.
/// `rate`, `period_size` and `period_count` are 0 when not declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwStream {
    /// Kind and direction.
    pub stream_type: StreamType,
    /// Sound card the stream lives on.
    pub card_number: u32,
    /// PCM or compress device on that card.
    pub device_number: u32,
    /// Sample rate in Hz.
    pub rate: u32,
    /// Frames per period.
    pub period_size: u32,
    /// Number of periods in the buffer.
    pub period_count: u32,
}

impl HwStream {
    /// Stream info with only the type and card set.
    pub const fn new(stream_type: StreamType, card_number: u32) -> Self {
        Self {
            stream_type,
            card_number,
            device_number: u32::MAX,
            rate: 0,
            period_size: 0,
            period_count: 0,
        }
    }

    /// Whether a device number was declared.
    pub const fn has_device(&self) -> bool {
        self.device_number != u32::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_types() {
        assert_eq!(StreamType::for_request(true, true), StreamType::InPcm);
        assert_eq!(StreamType::for_request(false, false), StreamType::OutCompress);
    }

    #[test]
    fn predicates() {
        assert!(StreamType::InHw.is_input());
        assert!(StreamType::InHw.is_hardware());
        assert!(!StreamType::OutHw.is_input());
        assert!(!StreamType::Global.is_input());
        assert!(!StreamType::Global.is_pcm());
        assert!(StreamType::OutCompress.is_compressed());
    }

    #[test]
    fn defaults_have_no_device() {
        let info = HwStream::new(StreamType::OutPcm, 0);
        assert!(!info.has_device());
        assert_eq!(info.rate, 0);
    }
}
