use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use uuid::Uuid;

/// Persist an uploaded source file under `{user_id}_{uuid}.{ext}`.
///
/// The stored file is deleted only after successful transcription; a
/// failure in any later stage leaves it in place.
pub fn store_upload(upload_dir: &Path, user_id: &str, source: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(upload_dir)
        .with_context(|| format!("Failed to create upload dir {:?}", upload_dir))?;

    let extension = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bin".to_string());

    let key = format!("{}_{}.{}", user_id, Uuid::new_v4(), extension);
    let target = upload_dir.join(key);

    std::fs::copy(source, &target)
        .with_context(|| format!("Failed to store upload from {:?}", source))?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_upload_key_format() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("gesprek.mp3");
        std::fs::write(&source, b"audio").unwrap();

        let stored = store_upload(dir.path(), "user-42", &source).unwrap();

        let name = stored.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("user-42_"));
        assert!(name.ends_with(".mp3"));
        assert_eq!(std::fs::read(&stored).unwrap(), b"audio");

        // the embedded uuid parses back
        let middle = name
            .strip_prefix("user-42_")
            .and_then(|s| s.strip_suffix(".mp3"))
            .unwrap();
        assert!(Uuid::parse_str(middle).is_ok());
    }

    #[test]
    fn test_store_upload_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("opname");
        std::fs::write(&source, b"x").unwrap();

        let stored = store_upload(dir.path(), "u", &source).unwrap();
        assert!(stored.to_string_lossy().ends_with(".bin"));
    }

    #[test]
    fn test_store_upload_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("bestaat-niet.wav");
        assert!(store_upload(dir.path(), "u", &missing).is_err());
    }
}
