use std::path::Path;

use crate::{Error, Result};

pub fn create_directory_for_file(p: &Path) -> Result {
    if let Some(parent_dir) = p.parent() {
        std::fs::create_dir_all(parent_dir).map_err(|e| {
            Error::Runtime(format!(
                "Failed to create output directory for file '{}' ({e})",
                p.to_string_lossy()
            ))
        })?;
    }

    Ok(())
}

pub fn sanitize_filename(name: &str, replacement_char: char) -> String {
    let forbidden = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
    name.chars()
        .map(|c| if forbidden.contains(&c) { replacement_char } else { c })
        .collect()
}

/// Checks that the filesystem backing `path` (or its nearest existing
/// ancestor, for a file that doesn't exist yet) has at least `required_bytes`
/// free. Returns `Error::DiskSpace` when it does not.
pub fn ensure_free_space(path: &Path, required_bytes: u64) -> Result {
    let mut probe = path;
    while !probe.exists() {
        match probe.parent() {
            Some(parent) => probe = parent,
            None => break,
        }
    }

    let available = fs4::available_space(probe).map_err(|e| Error::Io(format!("Failed to query free disk space: {e}")))?;

    if available < required_bytes {
        return Err(Error::DiskSpace {
            required: required_bytes,
            available,
        });
    }

    Ok(())
}
