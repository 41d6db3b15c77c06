//! Input directory scanning

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Regular image files directly inside `dir`, sorted by file name
pub fn find_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        if entry.file_type()?.is_file() && is_image(&path) {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let names = [
            "IMG_0003.JPG",
            "IMG_0001.jpg",
            "notes.txt",
            "IMG_0002.png",
            "scan.Bmp",
            "raw.tiff",
        ];
        for name in names {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let names: Vec<String> = find_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["IMG_0001.jpg", "IMG_0002.png", "IMG_0003.JPG", "scan.Bmp"]
        );
    }

    #[test]
    fn test_missing_directory_fails() {
        assert!(find_images(Path::new("/nonexistent/survey")).is_err());
    }
}
