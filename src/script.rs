use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// A local script file read into memory, with its service-facing name
/// derived from the file name.
#[derive(Debug, Clone)]
pub struct Script {
    pub path: PathBuf,
    pub name: String,
    pub content: String,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::internal_io(
                e.to_string(),
                Some(format!("read script {}", path.display())),
            )
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            name: script_name(path),
            content,
        })
    }
}

/// Script name is the file name up to the first dot ("greeting.flow" -> "greeting").
pub fn script_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.split('.').next().unwrap_or(n))
        .unwrap_or_default()
        .to_string()
}

/// Conventional test-suite location: a `tests/` directory next to the
/// script holding `<name>_tests.yml`. Absence is not an error.
pub fn conventional_test_suite_path(script_path: &Path) -> PathBuf {
    let dir = script_path.parent().unwrap_or_else(|| Path::new(""));
    dir.join("tests")
        .join(format!("{}_tests.yml", script_name(script_path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_name_strips_extension() {
        assert_eq!(script_name(Path::new("flows/greeting.flow")), "greeting");
    }

    #[test]
    fn script_name_stops_at_first_dot() {
        assert_eq!(script_name(Path::new("ivr.main.flow")), "ivr");
    }

    #[test]
    fn script_name_without_extension() {
        assert_eq!(script_name(Path::new("flows/greeting")), "greeting");
    }

    #[test]
    fn test_suite_path_is_derived_next_to_script() {
        let path = conventional_test_suite_path(Path::new("flows/greeting.flow"));
        assert_eq!(path, Path::new("flows/tests/greeting_tests.yml"));
    }

    #[test]
    fn test_suite_path_for_bare_file_name() {
        let path = conventional_test_suite_path(Path::new("greeting.flow"));
        assert_eq!(path, Path::new("tests/greeting_tests.yml"));
    }

    #[test]
    fn load_missing_script_is_an_io_error() {
        let err = Script::load(Path::new("/nonexistent/greeting.flow")).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InternalIoError);
    }

    #[test]
    fn load_reads_content_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greeting.flow");
        std::fs::write(&path, "PLAY greeting.wav").unwrap();

        let script = Script::load(&path).unwrap();
        assert_eq!(script.name, "greeting");
        assert_eq!(script.content, "PLAY greeting.wav");
    }
}
