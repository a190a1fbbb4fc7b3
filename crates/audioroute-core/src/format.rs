//! Stream request attributes.
//!
//! Only the parts of the framework's format and flag words that affect stream
//! selection are interpreted here.

/// Audio sample format word, in the framework's encoding.
///
/// The top byte selects the main format; zero means linear PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AudioFormat(pub u32);

impl AudioFormat {
    /// Linear PCM, any sample width.
    pub const PCM: Self = Self(0x0000_0000);
    /// 16-bit signed PCM.
    pub const PCM_16_BIT: Self = Self(0x0000_0001);
    /// MP3 bitstream.
    pub const MP3: Self = Self(0x0100_0000);
    /// AAC bitstream.
    pub const AAC: Self = Self(0x0400_0000);

    /// Mask selecting the main format byte.
    pub const MAIN_MASK: u32 = 0xFF00_0000;

    /// Main format with the sub-format bits cleared.
    pub const fn main_format(self) -> u32 {
        self.0 & Self::MAIN_MASK
    }

    /// Whether this is a linear PCM format.
    pub const fn is_linear_pcm(self) -> bool {
        self.main_format() == Self::PCM.0
    }
}

/// Output flags passed with a stream request.
///
/// Accepted for interface compatibility and logged; matching uses only the
/// device direction and the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OutputFlags(pub u32);

impl OutputFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Stream is the primary output.
    pub const PRIMARY: Self = Self(0x2);
    /// Compressed offload playback.
    pub const COMPRESS_OFFLOAD: Self = Self(0x10);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_variants_are_linear() {
        assert!(AudioFormat::PCM.is_linear_pcm());
        assert!(AudioFormat::PCM_16_BIT.is_linear_pcm());
        assert!(AudioFormat(0x0000_0006).is_linear_pcm());
    }

    #[test]
    fn bitstreams_are_not_linear() {
        assert!(!AudioFormat::MP3.is_linear_pcm());
        assert!(!AudioFormat(AudioFormat::AAC.0 | 0x2).is_linear_pcm());
    }
}
