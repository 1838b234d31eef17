//! Object naming rules.

use chrono::Utc;

use crate::error::{StorageError, StorageResult};

/// Stored name for `file_name`: `"<stem>-<unix_nanos><ext>"`.
pub fn unique_object_name(file_name: &str) -> StorageResult<String> {
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .ok_or_else(|| StorageError::InvalidName("clock out of range".to_string()))?;
    suffixed_name(file_name, nanos)
}

pub(crate) fn suffixed_name(file_name: &str, nanos: i64) -> StorageResult<String> {
    if file_name.is_empty() || file_name.contains('/') || file_name.contains('\\') {
        return Err(StorageError::InvalidName(file_name.to_string()));
    }
    let (stem, ext) = match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    };
    Ok(format!("{}-{}{}", stem, nanos, ext))
}

/// Local file name of the output for `source_object` under `profile`.
pub fn transcoded_file_name(source_object: &str, profile: &str) -> String {
    format!("{}-{}.mp4", source_object, profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_keeps_extension() {
        assert_eq!(suffixed_name("clip.mov", 42).unwrap(), "clip-42.mov");
        assert_eq!(suffixed_name("archive.tar.gz", 7).unwrap(), "archive.tar-7.gz");
    }

    #[test]
    fn test_suffix_without_extension() {
        assert_eq!(suffixed_name("clip", 1).unwrap(), "clip-1");
        assert_eq!(suffixed_name(".hidden", 1).unwrap(), ".hidden-1");
    }

    #[test]
    fn test_rejects_paths() {
        assert!(suffixed_name("a/b.mov", 1).is_err());
        assert!(suffixed_name("", 1).is_err());
    }

    #[test]
    fn test_unique_name_shape() {
        let a = unique_object_name("a.mov").unwrap();
        assert!(a.starts_with("a-") && a.ends_with(".mov"));
    }

    #[test]
    fn test_transcoded_file_name() {
        assert_eq!(
            transcoded_file_name("clip-42.mov", "iPhone5s"),
            "clip-42.mov-iPhone5s.mp4"
        );
    }
}
