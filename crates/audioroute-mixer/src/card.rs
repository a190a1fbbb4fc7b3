//! Sound card lookup.

use std::fs;
use std::path::Path;

/// Where the kernel publishes sound card information.
pub const PROC_ASOUND: &str = "/proc/asound";

/// Find the number of the card whose `cardN/id` file holds `name`.
///
/// Only the first line of each id file is compared. Unreadable entries are
/// skipped.
pub fn find_card_by_name(root: &Path, name: &str) -> Option<u32> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(root = %root.display(), error = %e, "cannot list sound cards");
            return None;
        }
    };

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(number) = file_name
            .to_str()
            .and_then(|n| n.strip_prefix("card"))
            .and_then(|n| n.parse::<u32>().ok())
        else {
            continue;
        };

        match card_id(root, number) {
            Some(id) if id == name => {
                tracing::debug!(card = number, name, "found sound card");
                return Some(number);
            }
            _ => {}
        }
    }

    tracing::error!(name, "no sound card with this id");
    None
}

fn card_id(root: &Path, number: u32) -> Option<String> {
    let path = root.join(format!("card{number}")).join("id");
    match fs::read_to_string(&path) {
        Ok(text) => text.lines().next().map(str::to_owned),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read card id");
            None
        }
    }
}
