use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Checks if a file exists at the given path
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// Reads a whole file as UTF-8 text
pub fn file_get(path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
}

/// Writes `content` to `path`, creating the parent directory if absent
pub fn file_write(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)
}

/// Age of a file according to its modification time.
///
/// Returns `None` when the file is missing or its mtime lies in the future.
pub fn file_age(path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    SystemTime::now().duration_since(modified).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_write_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");

        file_write(&path, "hello").unwrap();

        assert!(file_exists(&path));
        assert_eq!(file_get(&path).unwrap(), "hello");
        assert!(file_age(&path).unwrap() < Duration::from_secs(60));
    }

    #[test]
    fn test_file_age_missing() {
        assert!(file_age(Path::new("/nonexistent/file")).is_none());
    }
}
