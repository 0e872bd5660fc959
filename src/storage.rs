// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for saved photos

use crate::constants::PHOTO_FILE_PREFIX;
use crate::errors::PhotoError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Destination for captured photos
///
/// Writes are blocking and are issued from a worker, never the UI context.
pub trait MediaLibraryWriter: Send + Sync {
    /// Persist encoded image bytes, returning where they ended up
    fn write(&self, image: &[u8]) -> Result<PathBuf, PhotoError>;
}

/// Photo library backed by a directory
#[derive(Debug, Clone)]
pub struct PhotoLibrary {
    directory: PathBuf,
}

impl PhotoLibrary {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Timestamped file name that does not collide with an existing file
    fn next_path(&self, extension: &str) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let base = format!("{}_{}", PHOTO_FILE_PREFIX, timestamp);
        let mut path = self.directory.join(format!("{}.{}", base, extension));
        let mut counter = 1;
        while path.exists() {
            path = self
                .directory
                .join(format!("{}_{}.{}", base, counter, extension));
            counter += 1;
        }
        path
    }
}

impl MediaLibraryWriter for PhotoLibrary {
    fn write(&self, image: &[u8]) -> Result<PathBuf, PhotoError> {
        // Refuse anything the library could not display later
        let format = image::guess_format(image)?;
        image::load_from_memory_with_format(image, format)?;
        let extension = format.extensions_str().first().copied().unwrap_or("img");

        std::fs::create_dir_all(&self.directory)?;
        let path = self.next_path(extension);
        std::fs::write(&path, image)?;

        info!(path = %path.display(), size = image.len(), "Photo saved to library");
        Ok(path)
    }
}

/// Most recently modified JPEG or PNG in a directory
///
/// Entries whose modification time cannot be read are skipped.
pub async fn latest_photo(photos_dir: PathBuf) -> Option<PathBuf> {
    let mut photos = tokio::task::spawn_blocking(move || {
        let mut files = Vec::new();
        if let Ok(entries) = std::fs::read_dir(&photos_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                let is_photo = path.extension().is_some_and(|ext| {
                    let ext_str = ext.to_string_lossy();
                    ext_str.eq_ignore_ascii_case("jpg")
                        || ext_str.eq_ignore_ascii_case("jpeg")
                        || ext_str.eq_ignore_ascii_case("png")
                });
                if !is_photo {
                    continue;
                }
                if let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) {
                    files.push((modified, path));
                }
            }
        }
        files
    })
    .await
    .ok()?;

    // Newest first
    photos.sort_by_key(|(modified, _)| std::cmp::Reverse(*modified));

    let (_, latest) = photos.into_iter().next()?;
    debug!(path = ?latest, "Latest photo");
    Some(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::PhotoSettings;
    use crate::backends::virtual_camera::{encode_pattern, test_pattern};

    #[test]
    fn test_write_rejects_non_image_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let library = PhotoLibrary::new(dir.path());
        let err = library.write(&[0x01, 0x02]).unwrap_err();
        assert!(matches!(err, PhotoError::InvalidImage(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let library = PhotoLibrary::new(dir.path().join("photos"));
        let jpeg = encode_pattern(&test_pattern(8, 8), PhotoSettings::default()).unwrap();

        let first = library.write(&jpeg).unwrap();
        let second = library.write(&jpeg).unwrap();
        assert_ne!(first, second);
        assert_eq!(first.extension().unwrap(), "jpg");
        assert_eq!(std::fs::read(&second).unwrap(), jpeg);
    }

    #[tokio::test]
    async fn test_latest_photo_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let now = std::time::SystemTime::now();
        for (name, age) in [("IMG_old.jpg", 120), ("IMG_new.png", 0), ("notes.txt", 0)] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"x").unwrap();
            std::fs::File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(now - std::time::Duration::from_secs(age))
                .unwrap();
        }

        let latest = latest_photo(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(latest.file_name().unwrap(), "IMG_new.png");
    }

    #[tokio::test]
    async fn test_latest_photo_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(latest_photo(dir.path().to_path_buf()).await.is_none());
    }
}
