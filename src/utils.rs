use std::path::Path;

pub fn human_readable_size(size: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    const T: usize = 2048;

    let mut scaled = size;
    let mut unit = 0;
    while scaled >= T && unit < UNITS.len() - 1 {
        scaled /= 1024;
        unit += 1;
    }

    format!("{} {}", scaled, UNITS[unit])
}

/// Lowercase file extension, used to pick the output format of a save dialog.
pub fn extension_of(filename: &Path) -> Option<String> {
    filename
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
