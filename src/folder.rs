//! Local folder scanning for uploads.

use std::path::{Path, PathBuf};

use tracing::warn;

/// File extensions accepted for each data type.
pub fn extensions_for(data_type: &str) -> &'static [&'static str] {
    match data_type {
        "image" => &["jpg", "jpeg", "png", "tiff"],
        "video" => &["mp4"],
        "audio" => &["mp3", "wav"],
        "document" => &["pdf"],
        "text" => &["txt"],
        _ => &[],
    }
}

/// List the files directly inside `folder` whose extension matches `data_type`.
///
/// Not recursive. An unreadable folder yields an empty list.
pub fn files_in_folder(folder: &Path, data_type: &str) -> Vec<PathBuf> {
    let allowed = extensions_for(data_type);
    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(folder = %folder.display(), error = %e, "error reading folder");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| allowed.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_in_folder_filters_by_type() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt", "clip.mp4"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let files = files_in_folder(dir.path(), "image");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG"]);

        assert_eq!(files_in_folder(dir.path(), "video").len(), 1);
        assert!(files_in_folder(dir.path(), "hologram").is_empty());
    }

    #[test]
    fn test_missing_folder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(files_in_folder(&dir.path().join("absent"), "image").is_empty());
    }
}
