//! Stream volume.

use audioroute_core::{Error, Result, VolumeControl};
use audioroute_mixer::{Mixer, bind_volume};

use crate::manager::{ConfigManager, State, StreamHandle};

/// Map a percentage onto a control range. 0 and 100 hit the ends exactly.
pub fn scale_volume(min: i32, max: i32, percent: i32) -> i32 {
    match percent {
        0 => min,
        100 => max,
        _ => {
            let (lo, hi) = (i64::from(min), i64::from(max));
            (lo + (hi - lo) * i64::from(percent) / 100) as i32
        }
    }
}

fn write_volume(mixer: &mut dyn Mixer, vol: &mut VolumeControl, percent: i32) {
    let id = match bind_volume(mixer, vol) {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(control = %vol.name, error = %e, "volume control unavailable");
            return;
        }
    };
    let value = scale_volume(vol.min, vol.max, percent);
    tracing::trace!(control = %vol.name, percent, value, "set volume");
    if let Err(e) = mixer.set_value(id, vol.index, value) {
        tracing::error!(control = %vol.name, error = %e, "failed to set volume");
    }
}

impl ConfigManager {
    /// Set a stream's hardware volume in percent.
    ///
    /// A stream with only a left control is mono and gets the average of the
    /// two values.
    pub fn set_hw_volume(&self, stream: &StreamHandle, left: i32, right: i32) -> Result<()> {
        for percent in [left, right] {
            if !(0..=100).contains(&percent) {
                tracing::error!(percent, "volume percent out of range 0..100");
                return Err(Error::InvalidArgument(format!(
                    "volume percent {percent} is out of range 0..100"
                )));
            }
        }

        let mut guard = self.state.lock();
        let State { mixer, model } = &mut *guard;
        let s = model
            .stream_mut(stream.id)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown stream {:?}", stream.id)))?;

        if s.volume_left.is_none() && s.volume_right.is_none() {
            return Err(Error::NotSupported("stream has no volume control".into()));
        }

        let mono = s.volume_right.is_none();
        if let Some(vol) = s.volume_left.as_mut() {
            let percent = if mono { (left + right) / 2 } else { left };
            write_volume(mixer.as_mut(), vol, percent);
        }
        if let Some(vol) = s.volume_right.as_mut() {
            write_volume(mixer.as_mut(), vol, right);
        }

        tracing::debug!(left, right, "set_hw_volume");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_exact() {
        assert_eq!(scale_volume(-6000, 0, 0), -6000);
        assert_eq!(scale_volume(-6000, 0, 100), 0);
        assert_eq!(scale_volume(0, 255, 50), 127);
        assert_eq!(scale_volume(10, 0, 50), 5);
    }

    #[test]
    fn wide_range_does_not_overflow() {
        assert_eq!(scale_volume(i32::MIN, i32::MAX, 50), -1);
        assert_eq!(scale_volume(i32::MIN, i32::MAX, 99), 2_104_533_974);
    }
}
