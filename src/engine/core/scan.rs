use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Container formats accepted when adding a folder
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v"];

/// Check if a path has a supported video extension (case-insensitive)
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Scan a directory recursively for video files, invoking a callback for each
pub fn scan_streaming<F>(root: &Path, mut on_file: F)
where
    F: FnMut(PathBuf),
{
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && is_video_file(path) {
            on_file(path.to_path_buf());
        }
    }
}

/// Scan a directory recursively for video files, in file-name order
pub fn scan(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    scan_streaming(root, |path| files.push(path));
    files
}
