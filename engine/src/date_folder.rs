//! Date folder labels.
//!
//! Ingested files are grouped under `YYYY-MM` folders. The resolver that
//! decides a file's folder sits behind the `DateFolderResolver` trait so the
//! engine never depends on how capture dates are read.
//!
//! `ExifDateResolver` reads the capture date from image EXIF or video track
//! metadata, trying `DateTimeOriginal`, then the creation date, then the file
//! modification time. Files that are not recognized media are rejected.

use crate::error::EngineError;
use chrono::{DateTime, Datelike, Local, TimeZone};
use nom_exif::{EntryValue, Exif, ExifIter, ExifTag, MediaParser, MediaSource, TrackInfo, TrackInfoTag};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// A `YYYY-MM` destination folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateFolder {
    year: i32,
    month: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid date folder label '{label}': {reason}")]
pub struct DateFolderParseError {
    pub label: String,
    pub reason: &'static str,
}

impl DateFolder {
    /// Returns None for a month outside 1..=12 or a year outside 0..=9999.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(0..=9999).contains(&year) || !(1..=12).contains(&month) {
            return None;
        }
        Some(DateFolder { year, month })
    }

    pub fn from_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>) -> Option<Self> {
        Self::new(datetime.year(), datetime.month())
    }
}

impl fmt::Display for DateFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for DateFolder {
    type Err = DateFolderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| DateFolderParseError {
            label: s.to_string(),
            reason,
        };

        let (year, month) = s.split_once('-').ok_or_else(|| invalid("expected YYYY-MM"))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid("expected YYYY-MM"));
        }
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid("year and month must be digits"));
        }

        let year: i32 = year.parse().map_err(|_| invalid("year must be a number"))?;
        let month: u32 = month.parse().map_err(|_| invalid("month must be a number"))?;
        DateFolder::new(year, month).ok_or_else(|| invalid("month must be between 01 and 12"))
    }
}

/// Decides which date folder a file belongs in.
pub trait DateFolderResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> Result<DateFolder, EngineError>;
}

/// Resolves from the file's modification time, in local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModifiedTimeResolver;

impl DateFolderResolver for ModifiedTimeResolver {
    fn resolve(&self, path: &Path) -> Result<DateFolder, EngineError> {
        let unresolved = |reason: String| EngineError::DateUnresolved {
            path: path.to_path_buf(),
            reason,
        };

        let modified = std::fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .map_err(|e| unresolved(e.to_string()))?;
        let local: DateTime<Local> = modified.into();

        DateFolder::from_datetime(&local).ok_or_else(|| unresolved(format!("Year {} is out of range", local.year())))
    }
}

/// Resolves from media metadata, falling back to the modification time only
/// for files that carry media metadata without a capture date.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifDateResolver;

/// Capture dates found in a file's metadata, in cascade order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CaptureDates {
    /// `DateTimeOriginal`, written by cameras at the moment of capture
    original: Option<DateFolder>,
    /// EXIF `CreateDate` or the video track creation date
    created: Option<DateFolder>,
}

impl CaptureDates {
    fn pick(self) -> Option<DateFolder> {
        self.original.or(self.created)
    }
}

impl DateFolderResolver for ExifDateResolver {
    fn resolve(&self, path: &Path) -> Result<DateFolder, EngineError> {
        match read_capture_dates(path)?.pick() {
            Some(folder) => Ok(folder),
            None => ModifiedTimeResolver.resolve(path),
        }
    }
}

fn read_capture_dates(path: &Path) -> Result<CaptureDates, EngineError> {
    let unresolved = |reason: String| EngineError::DateUnresolved {
        path: path.to_path_buf(),
        reason,
    };

    let source = MediaSource::file_path(path).map_err(|e| unresolved(format!("Not a recognized media file: {}", e)))?;
    let mut parser = MediaParser::new();

    if source.has_exif() {
        let iter: ExifIter = parser
            .parse(source)
            .map_err(|e| unresolved(format!("Unreadable EXIF metadata: {}", e)))?;
        let exif: Exif = iter.into();
        Ok(CaptureDates {
            original: exif.get(ExifTag::DateTimeOriginal).and_then(folder_from_value),
            created: exif.get(ExifTag::CreateDate).and_then(folder_from_value),
        })
    } else if source.has_track() {
        let info: TrackInfo = parser
            .parse(source)
            .map_err(|e| unresolved(format!("Unreadable track metadata: {}", e)))?;
        Ok(CaptureDates {
            original: None,
            created: info.get(TrackInfoTag::CreateDate).and_then(folder_from_value),
        })
    } else {
        Err(unresolved("File carries no media metadata".to_string()))
    }
}

/// Timestamps come back as EXIF text (`YYYY:MM:DD ...`) or as rendered
/// date-times (`YYYY-MM-DD...`); only the wall-clock year and month matter.
fn folder_from_value(value: &EntryValue) -> Option<DateFolder> {
    folder_from_timestamp(&value.to_string())
}

fn folder_from_timestamp(text: &str) -> Option<DateFolder> {
    let bytes = text.trim().as_bytes();
    if bytes.len() < 7 || !matches!(bytes[4], b'-' | b':') {
        return None;
    }
    let (year, month) = (&bytes[..4], &bytes[5..7]);
    if !year.iter().chain(month).all(u8::is_ascii_digit) {
        return None;
    }

    let year = year.iter().fold(0i32, |acc, b| acc * 10 + i32::from(b - b'0'));
    let month = month.iter().fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
    // Cameras write zeroed dates when the clock was never set
    if year == 0 {
        return None;
    }
    DateFolder::new(year, month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use filetime::FileTime;
    use std::fs;

    #[test]
    fn test_display_pads_month() {
        let folder = DateFolder::new(2021, 5).expect("valid folder");
        assert_eq!(folder.to_string(), "2021-05");
        assert_eq!(DateFolder::new(987, 12).expect("valid folder").to_string(), "0987-12");
    }

    #[test]
    fn test_new_rejects_invalid_month() {
        assert!(DateFolder::new(2021, 0).is_none());
        assert!(DateFolder::new(2021, 13).is_none());
        assert!(DateFolder::new(10000, 1).is_none());
    }

    #[test]
    fn test_parse_label() {
        let folder: DateFolder = "2019-11".parse().expect("Failed to parse label");
        assert_eq!(Some(folder), DateFolder::new(2019, 11));
        assert_eq!(folder.to_string(), "2019-11");
    }

    #[test]
    fn test_parse_rejects_malformed_labels() {
        for label in ["2019-1", "19-01", "2019/01", "2019-13", "2019-00", "abcd-01", "2019-+1", ""] {
            assert!(label.parse::<DateFolder>().is_err(), "'{}' should not parse", label);
        }
    }

    #[test]
    fn test_from_datetime() {
        let datetime = NaiveDate::from_ymd_opt(2020, 2, 29)
            .and_then(|date| date.and_hms_opt(23, 59, 0))
            .expect("valid date")
            .and_utc();
        assert_eq!(DateFolder::from_datetime(&datetime), DateFolder::new(2020, 2));
    }

    #[test]
    fn test_modified_time_resolver() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("img.jpg");
        fs::write(&path, b"photo").expect("Failed to write file");

        // Mid-month, so the local offset cannot change the month
        let mid_may = NaiveDate::from_ymd_opt(2021, 5, 15)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("valid date")
            .and_utc();
        let mtime = FileTime::from_unix_time(mid_may.timestamp(), 0);
        filetime::set_file_mtime(&path, mtime).expect("Failed to set mtime");

        let folder = ModifiedTimeResolver.resolve(&path).expect("Failed to resolve");
        assert_eq!(folder.to_string(), "2021-05");
    }

    #[test]
    fn test_missing_file_is_unresolved() {
        let result = ModifiedTimeResolver.resolve(Path::new("/nonexistent/img.jpg"));
        assert!(matches!(result, Err(EngineError::DateUnresolved { .. })));
    }

    /// Minimal JPEG whose Exif IFD holds the given ASCII tags.
    fn jpeg_with_exif(entries: &[(u16, &str)]) -> Vec<u8> {
        let exif_ifd_offset: u32 = 8 + 2 + 12 + 4;
        let mut data_offset = exif_ifd_offset + 2 + 12 * entries.len() as u32 + 4;

        let mut tiff = b"II\x2a\x00\x08\x00\x00\x00".to_vec();
        // IFD0 holds only the pointer to the Exif IFD
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x8769u16.to_le_bytes());
        tiff.extend_from_slice(&4u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&exif_ifd_offset.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes());

        let mut values = Vec::new();
        tiff.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for (tag, value) in entries {
            let mut bytes = value.as_bytes().to_vec();
            bytes.push(0);
            tiff.extend_from_slice(&tag.to_le_bytes());
            tiff.extend_from_slice(&2u16.to_le_bytes());
            tiff.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            tiff.extend_from_slice(&data_offset.to_le_bytes());
            data_offset += bytes.len() as u32;
            values.extend_from_slice(&bytes);
        }
        tiff.extend_from_slice(&0u32.to_le_bytes());
        tiff.extend_from_slice(&values);

        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(&tiff);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    const DATE_TIME_ORIGINAL: u16 = 0x9003;
    const CREATE_DATE: u16 = 0x9004;
    const LENS_MODEL: u16 = 0xA434;

    #[test]
    fn test_capture_date_wins_over_modified_time() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("img.jpg");
        fs::write(
            &path,
            jpeg_with_exif(&[(DATE_TIME_ORIGINAL, "2017:11:15 12:00:00"), (CREATE_DATE, "2018:03:15 12:00:00")]),
        )
        .expect("Failed to write file");

        let folder = ExifDateResolver.resolve(&path).expect("Failed to resolve");
        assert_eq!(folder.to_string(), "2017-11");
    }

    #[test]
    fn test_create_date_used_without_original() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("img.jpg");
        fs::write(&path, jpeg_with_exif(&[(CREATE_DATE, "2018:03:15 12:00:00")])).expect("Failed to write file");

        let folder = ExifDateResolver.resolve(&path).expect("Failed to resolve");
        assert_eq!(folder.to_string(), "2018-03");
    }

    #[test]
    fn test_media_without_dates_falls_back_to_modified_time() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("img.jpg");
        fs::write(&path, jpeg_with_exif(&[(LENS_MODEL, "Test Lens 50mm")])).expect("Failed to write file");

        let expected = ModifiedTimeResolver.resolve(&path).expect("Failed to resolve mtime");
        assert_eq!(ExifDateResolver.resolve(&path).expect("Failed to resolve"), expected);
    }

    #[test]
    fn test_non_media_file_is_rejected() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("notes.txt");
        fs::write(&path, b"shopping list").expect("Failed to write file");

        let result = ExifDateResolver.resolve(&path);
        assert!(matches!(result, Err(EngineError::DateUnresolved { .. })));
    }

    #[test]
    fn test_cascade_order() {
        let nov = DateFolder::new(2017, 11);
        let mar = DateFolder::new(2018, 3);

        assert_eq!(CaptureDates { original: nov, created: mar }.pick(), nov);
        assert_eq!(CaptureDates { original: None, created: mar }.pick(), mar);
        assert_eq!(CaptureDates::default().pick(), None);
    }

    #[test]
    fn test_timestamp_text_forms() {
        assert_eq!(folder_from_timestamp("2017:11:15 12:00:00"), DateFolder::new(2017, 11));
        assert_eq!(folder_from_timestamp("2017-11-15T12:00:00+08:00"), DateFolder::new(2017, 11));
        assert_eq!(folder_from_timestamp("2017-11-15 12:00:00"), DateFolder::new(2017, 11));
        assert_eq!(folder_from_timestamp("0000:00:00 00:00:00"), None);
        assert_eq!(folder_from_timestamp("2017:13:01 00:00:00"), None);
        assert_eq!(folder_from_timestamp("Canon"), None);
    }
}
