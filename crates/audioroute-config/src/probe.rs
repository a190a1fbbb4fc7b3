//! Codec probe file reading.
//!
//! The probe file may be created by a driver some time after boot, so it is
//! polled until it appears or the timeout runs out.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use audioroute_core::{Error, Result};

/// Read the codec name from a probe file.
///
/// The file may be created by a driver after boot, so opening is retried
/// every `interval` until `timeout` has passed. Only the first line is read,
/// with surrounding whitespace removed. An empty file yields `None`.
pub fn read_codec_name(path: &Path, interval: Duration, timeout: Duration) -> Result<Option<String>> {
    let start = Instant::now();
    let file = loop {
        match File::open(path) {
            Ok(f) => break f,
            Err(e) if start.elapsed() >= timeout => {
                tracing::error!(file = %path.display(), error = %e, "gave up waiting for probe file");
                return Err(Error::read_file(path, e));
            }
            Err(_) => {
                tracing::trace!(file = %path.display(), "probe file not there yet");
                thread::sleep(interval);
            }
        }
    };

    let mut line = String::new();
    match BufReader::new(file).read_line(&mut line) {
        Ok(0) => {
            tracing::warn!(file = %path.display(), "probe file is empty");
            Ok(None)
        }
        Ok(_) => {
            let name = line.trim();
            tracing::debug!(file = %path.display(), codec = name, "probed codec");
            Ok((!name.is_empty()).then(|| name.to_owned()))
        }
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "failed to read probe file");
            Ok(None)
        }
    }
}
