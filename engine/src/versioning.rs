//! Versioned filenames for name clashes.
//!
//! `photo.jpg` becomes `photo_00.jpg`, `photo_00.jpg` becomes `photo_01.jpg`
//! and so on. Only one increment is performed per call; the filesystem is not
//! consulted, so an occupied versioned name is resolved by another round trip
//! through the collision resolver.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Derive the next `root_NN` variant of `path`, keeping its directory and
/// extension.
///
/// The root is carried over byte for byte, so names that are not valid
/// UTF-8 keep their exact spelling.
pub fn next_versioned_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().as_encoded_bytes();

    let (root, next_version) = match split_version(stem) {
        Some((root, version)) => (root, version + 1),
        None => (stem, 0),
    };

    let mut name = root.to_vec();
    name.extend_from_slice(format!("_{:02}", next_version).as_bytes());
    // SAFETY: `root` is the whole stem or a prefix cut right before an ASCII `_`,
    // and only ASCII is appended to it.
    let mut file_name = unsafe { OsString::from_encoded_bytes_unchecked(name) };
    if let Some(ext) = path.extension() {
        file_name.push(".");
        file_name.push(ext);
    }

    path.with_file_name(file_name)
}

/// Split a trailing `_NN` suffix (exactly two digits) off a file stem.
fn split_version(stem: &[u8]) -> Option<(&[u8], u32)> {
    let underscore = stem.iter().rposition(|&b| b == b'_')?;
    let digits = &stem[underscore + 1..];
    if digits.len() != 2 || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let version = u32::from(digits[0] - b'0') * 10 + u32::from(digits[1] - b'0');
    Some((&stem[..underscore], version))
}
