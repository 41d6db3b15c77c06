//! Descriptive file names and sequence grouping
//!
//! Only names are produced here; copying files into category or sequence
//! directories is left to the caller.

use chrono::NaiveDate;
use std::path::Path;
use vmap_common::SpaceCategory;

fn is_sequence_part(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

/// `"{category}_{seq}_{YYYYMMDD}{.ext}"`
///
/// `seq` is the last all-digit `_`-separated part of the file stem, padded to at
/// least 3 digits, or `000` when there is none.
#[must_use]
pub fn descriptive_filename(original: &str, category: SpaceCategory, date: NaiveDate) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let sequence = stem
        .split('_')
        .rev()
        .find(|part| is_sequence_part(part))
        .map_or_else(|| "000".to_string(), |part| format!("{part:0>3}"));

    format!(
        "{category}_{sequence}_{}{extension}",
        date.format("%Y%m%d")
    )
}

/// First all-digit `_`-separated part of the file name, extension included
///
/// The extension stays attached to the last part, so only a number followed by
/// another `_` is found: `hallway_042_20240307.jpg` yields 42, `IMG_0042.jpg` yields
/// nothing. Names produced by [`descriptive_filename`] always parse.
#[must_use]
pub fn extract_sequence(filename: &str) -> Option<u64> {
    let name = Path::new(filename)
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    name.split('_')
        .filter(|part| is_sequence_part(part))
        .find_map(|part| part.parse().ok())
}

/// Directory name for a block of ten sequence numbers, e.g. `seq_040-049`
#[must_use]
pub fn sequence_group(sequence: u64) -> String {
    let start = sequence / 10 * 10;
    format!("seq_{start:03}-{:03}", start + 9)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn test_descriptive_filename() {
        assert_eq!(
            descriptive_filename("IMG_42.jpg", SpaceCategory::Hallway, date()),
            "hallway_042_20240307.jpg"
        );
        assert_eq!(
            descriptive_filename("pano_7_take_0815.JPG", SpaceCategory::CommonArea, date()),
            "common_area_0815_20240307.JPG"
        );
    }

    #[test]
    fn test_descriptive_filename_without_sequence() {
        assert_eq!(
            descriptive_filename("lobby.png", SpaceCategory::Unknown, date()),
            "unknown_000_20240307.png"
        );
        assert_eq!(
            descriptive_filename("noext", SpaceCategory::Office, date()),
            "office_000_20240307"
        );
    }

    #[test]
    fn test_extract_sequence() {
        assert_eq!(extract_sequence("hallway_007_20240307.jpg"), Some(7));
        assert_eq!(extract_sequence("scans/pano_12_a.jpg"), Some(12));
        assert_eq!(extract_sequence("floor2_west.jpg"), None);
        assert_eq!(extract_sequence("a__b.jpg"), None);
    }

    #[test]
    fn test_extract_sequence_keeps_extension_on_last_part() {
        assert_eq!(extract_sequence("IMG_0042.jpg"), None);
        assert_eq!(extract_sequence("IMG_0042"), Some(42));
        assert_eq!(extract_sequence("0042.jpg"), None);
    }

    #[test]
    fn test_descriptive_names_always_carry_a_sequence() {
        for (original, expected) in [("IMG_0042.jpg", 42), ("lobby.png", 0), ("x_9", 9)] {
            let renamed = descriptive_filename(original, SpaceCategory::Lab, date());
            assert_eq!(extract_sequence(&renamed), Some(expected), "{renamed}");
        }
    }

    #[test]
    fn test_sequence_group() {
        assert_eq!(sequence_group(0), "seq_000-009");
        assert_eq!(sequence_group(42), "seq_040-049");
        assert_eq!(sequence_group(1234), "seq_1230-1239");
    }
}
