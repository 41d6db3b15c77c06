//! Image sources handed to the batch processor

use image::RgbImage;
use std::path::{Path, PathBuf};
use vmap_common::Result;

/// One item of a batch: an identifier plus a way to decode its pixels
///
/// Decoding happens inside the per-item step so a bad item becomes a recorded
/// failure instead of aborting the batch.
pub trait ImageSource: Sync {
    /// Identifier reported in records and layout exports, usually the file name
    fn id(&self) -> &str;

    /// Decode the image into RGB pixels
    ///
    /// # Errors
    /// Returns a decode or I/O error for unreadable input
    fn decode(&self) -> Result<RgbImage>;

    /// Encoded size in bytes, when the source has one
    fn file_size(&self) -> Option<u64> {
        None
    }
}

/// Image stored on disk
#[derive(Debug, Clone)]
pub struct FileImageSource {
    path: PathBuf,
    name: String,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileImageSource {
    fn id(&self) -> &str {
        &self.name
    }

    fn decode(&self) -> Result<RgbImage> {
        vmap_feature_classifier::load_rgb(&self.path)
    }

    fn file_size(&self) -> Option<u64> {
        std::fs::metadata(&self.path).ok().map(|m| m.len())
    }
}

/// Already-decoded image, for callers that obtain pixels elsewhere
#[derive(Debug, Clone)]
pub struct MemoryImageSource {
    name: String,
    image: RgbImage,
}

impl MemoryImageSource {
    pub fn new(name: impl Into<String>, image: RgbImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }
}

impl ImageSource for MemoryImageSource {
    fn id(&self) -> &str {
        &self.name
    }

    fn decode(&self) -> Result<RgbImage> {
        Ok(self.image.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_file_source_uses_file_name() {
        let source = FileImageSource::new("/data/survey/IMG_0042.jpg");
        assert_eq!(source.id(), "IMG_0042.jpg");
        assert_eq!(source.path(), Path::new("/data/survey/IMG_0042.jpg"));
    }

    #[test]
    fn test_file_source_round_trips_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pano.png");
        RgbImage::from_pixel(8, 4, Rgb([1, 2, 3])).save(&path).unwrap();

        let source = FileImageSource::new(&path);
        let image = source.decode().unwrap();
        assert_eq!(image.dimensions(), (8, 4));
        assert_eq!(image.get_pixel(7, 3), &Rgb([1, 2, 3]));
        assert_eq!(
            source.file_size(),
            Some(std::fs::metadata(&path).unwrap().len())
        );
    }

    #[test]
    fn test_missing_file_has_no_size() {
        assert_eq!(
            FileImageSource::new("/nonexistent/pano.jpg").file_size(),
            None
        );
    }

    #[test]
    fn test_memory_source() {
        let source = MemoryImageSource::new("mem", RgbImage::new(3, 3));
        assert_eq!(source.id(), "mem");
        assert_eq!(source.decode().unwrap().dimensions(), (3, 3));
        assert_eq!(source.file_size(), None);
    }
}
