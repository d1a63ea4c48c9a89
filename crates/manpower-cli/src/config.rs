use std::path::{Path, PathBuf};

use manpower_model::{Scenario, ScenarioError};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Scenario does not match the expected shape: {0}")]
    Shape(serde_json::Error),
    #[error("{0}")]
    Scenario(#[from] ScenarioError),
}

/// Load the built-in scenario, optionally overridden by a JSON file.
/// Validation is left to the caller.
pub fn load_scenario(path: Option<&Path>) -> Result<Scenario, ConfigError> {
    let Some(path) = path else {
        return Ok(Scenario::default());
    };

    let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let overrides: Value = serde_json::from_str(&source).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "applying scenario overrides");
    Scenario::from_overrides(overrides).map_err(ConfigError::Shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use manpower_model::{ObjectiveKind, Skill};

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("manpower-{}-{}.json", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_no_file_gives_defaults() {
        let scenario = load_scenario(None).unwrap();
        assert_eq!(scenario, Scenario::default());
    }

    #[test]
    fn test_file_overrides_keep_sibling_defaults() {
        let path = write_temp(
            "partial",
            r#"{ "recruitment_capacity": { "Skilled": 650 }, "objective": "minimize_cost" }"#,
        );

        let scenario = load_scenario(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(scenario.recruitment_capacity[Skill::Skilled], 650.0);
        assert_eq!(scenario.recruitment_capacity[Skill::Unskilled], 500.0);
        assert_eq!(scenario.objective, ObjectiveKind::MinimizeCost);
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        let path = write_temp("malformed", "{ \"overmanning_limit\": ");

        let err = load_scenario(Some(&path)).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, ConfigError::Json { .. }), "got {:?}", err);
    }

    #[test]
    fn test_wrong_type_is_a_shape_error() {
        let path = write_temp("shape", r#"{ "overmanning_limit": "lots" }"#);

        let err = load_scenario(Some(&path)).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, ConfigError::Shape(_)), "got {:?}", err);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_scenario(Some(Path::new("/nonexistent/scenario.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
