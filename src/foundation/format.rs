//! Small text formatting helpers shared by the renderer labels and export naming.

use std::path::{Path, PathBuf};

use crate::foundation::error::{BlackboxError, BlackboxResult};

/// Left-pad `value` with `pad` until it is at least `min_len` characters long.
pub fn left_pad(value: impl std::fmt::Display, pad: char, min_len: usize) -> String {
    let s = value.to_string();
    let len = s.chars().count();
    if len >= min_len {
        return s;
    }
    let mut out = String::with_capacity(min_len);
    out.extend(std::iter::repeat_n(pad, min_len - len));
    out.push_str(&s);
    out
}

/// Format milliseconds as `[h:]mm:ss[.mmm]`.
///
/// Hours are shown when non-zero or when `display_hours` is set.
pub fn format_time(msec: f64, display_msec: bool, display_hours: bool) -> String {
    let total = msec.round().max(0.0) as u64;
    let ms = total % 1000;
    let secs_total = total / 1000;
    let secs = secs_total % 60;
    let mins_total = secs_total / 60;
    let mins = mins_total % 60;
    let hours = mins_total / 60;

    let mut out = String::new();
    if hours > 0 || display_hours {
        out.push_str(&format!("{hours}:"));
    }
    out.push_str(&format!("{mins:02}:{secs:02}"));
    if display_msec {
        out.push_str(&format!(".{ms:03}"));
    }
    out
}

/// Whole megabytes, e.g. `12MB`.
pub fn format_filesize(bytes: u64) -> String {
    let megs = (bytes as f64 / (1024.0 * 1024.0)).round() as u64;
    format!("{megs}MB")
}

/// Replace (or add) the extension of `path`. `extension` includes the dot, e.g. `.png`.
pub fn set_file_extension(path: &Path, extension: &str) -> BlackboxResult<PathBuf> {
    let stem = path
        .file_stem()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BlackboxError::validation("empty filename not allowed"))?;
    let mut name = stem.to_os_string();
    name.push(extension);
    Ok(path.with_file_name(name))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/format.rs"]
mod tests;
