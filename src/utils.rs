//! Utility functions for archive naming and download targets

use crate::results::ArchiveFormat;
use crate::types::ProductKind;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// File name of a product archive: `<stem><flag>.<ext>`
///
/// # Examples
///
/// ```
/// use xrt_prods::utils::archive_file_name;
/// use xrt_prods::{ArchiveFormat, ProductKind};
///
/// let name = archive_file_name(Some("grb_"), ProductKind::LightCurve, ArchiveFormat::TarGz);
/// assert_eq!(name, "grb_lc.tar.gz");
/// ```
pub fn archive_file_name(stem: Option<&str>, kind: ProductKind, format: ArchiveFormat) -> String {
    format!(
        "{}{}.{}",
        stem.unwrap_or_default(),
        kind.server_flag(),
        format.extension()
    )
}

/// Decide where an archive may be written
///
/// With `clobber` the path is returned unchanged, overwriting whatever is there. Without
/// it an existing file is reported as an error message, so that the caller can record it
/// against that product and carry on with the others.
pub fn download_target(path: &Path, clobber: bool) -> std::result::Result<PathBuf, String> {
    if !clobber && path.exists() {
        return Err(format!(
            "{} already exists and clobber is not set",
            path.display()
        ));
    }
    Ok(path.to_path_buf())
}

/// Read a server flag, which may arrive as a boolean, a number or an integer string
pub(crate) fn json_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" | "" => Some(false),
            other => other.parse::<i64>().ok().map(|n| n != 0),
        },
        _ => None,
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn server_flags_accept_every_encoding() {
        assert_eq!(json_flag(&json!(true)), Some(true));
        assert_eq!(json_flag(&json!(0)), Some(false));
        assert_eq!(json_flag(&json!("1")), Some(true));
        assert_eq!(json_flag(&json!("no")), Some(false));
        assert_eq!(json_flag(&json!([1])), None);
    }

    #[test]
    fn non_integer_flag_strings_are_not_flags() {
        assert_eq!(json_flag(&json!("nan")), None);
        assert_eq!(json_flag(&json!("inf")), None);
        assert_eq!(json_flag(&json!("0.5")), None);
        assert_eq!(json_flag(&json!(" 0 ")), Some(false));
    }

    #[test]
    fn archive_name_without_stem_is_just_the_flag() {
        assert_eq!(
            archive_file_name(None, ProductKind::AstromPos, ArchiveFormat::Zip),
            "xastrom.zip"
        );
    }

    #[test]
    fn missing_file_is_a_valid_target() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("image.tar.gz");
        assert_eq!(download_target(&path, false).unwrap(), path);
    }

    #[test]
    fn existing_file_without_clobber_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spec.tar.gz");
        std::fs::write(&path, b"old").unwrap();

        let err = download_target(&path, false).unwrap_err();
        assert!(err.contains("already exists"));
    }

    #[test]
    fn existing_file_with_clobber_is_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spec.tar.gz");
        std::fs::write(&path, b"old").unwrap();

        assert_eq!(download_target(&path, true).unwrap(), path);
    }
}
