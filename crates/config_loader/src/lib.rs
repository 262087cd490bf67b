//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `AlignmentPlan`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let plan = ConfigLoader::load_from_path(Path::new("align.toml")).unwrap();
//! println!("Devices: {}", plan.devices.len());
//! ```

mod parser;
mod validator;

pub use contracts::AlignmentPlan;
pub use parser::ConfigFormat;

use contracts::AlignError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    /// Relative paths inside the file are taken relative to the file's directory.
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<AlignmentPlan, AlignError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        let plan = parser::parse(&content, format, Some(path))?;
        validator::validate(&plan)?;
        Ok(plan)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<AlignmentPlan, AlignError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate a plan assembled elsewhere (e.g. from command-line flags)
    pub fn validate(plan: &AlignmentPlan) -> Result<(), AlignError> {
        validator::validate(plan)
    }

    /// Serialize AlignmentPlan to TOML string
    pub fn to_toml(plan: &AlignmentPlan) -> Result<String, AlignError> {
        toml::to_string_pretty(plan)
            .map_err(|e| AlignError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize AlignmentPlan to JSON string
    pub fn to_json(plan: &AlignmentPlan) -> Result<String, AlignError> {
        serde_json::to_string_pretty(plan)
            .map_err(|e| AlignError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, AlignError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            AlignError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| AlignError::config_parse(format!("unsupported config format: .{ext}")))
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, AlignError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<AlignmentPlan, AlignError> {
        let plan = parser::parse(content, format, None)?;
        validator::validate(&plan)?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::MetricKind;

    const MINIMAL_TOML: &str = r#"
[tracker]
path = "tracker.jsonl"

[[devices]]
name = "phone"
path = "phone.jsonl"
pose_field = "VIO_pose"
output = "out/phone.aligned.jsonl"

[search]
metric = "orientation-variance"
parallel = true

[report]
path = "report.json"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let plan = result.unwrap();
        assert_eq!(plan.devices[0].name, "phone");
        assert_eq!(plan.search.metric, MetricKind::OrientationVariance);
        assert!(plan.search.parallel);
    }

    #[test]
    fn test_round_trip_toml() {
        let plan = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&plan).unwrap();
        let plan2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(plan.devices[0].path, plan2.devices[0].path);
        assert_eq!(plan.search, plan2.search);
    }

    #[test]
    fn test_round_trip_json() {
        let plan = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&plan).unwrap();
        let plan2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(plan.search, plan2.search);
    }

    #[test]
    fn test_load_from_path_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("align.toml");
        std::fs::write(&path, MINIMAL_TOML).unwrap();

        let plan = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(plan.tracker.path, dir.path().join("tracker.jsonl"));
        assert_eq!(
            plan.devices[0].output.as_deref(),
            Some(dir.path().join("out/phone.aligned.jsonl").as_path())
        );
        assert_eq!(
            plan.report.map(|r| r.path),
            Some(dir.path().join("report.json"))
        );
    }

    #[test]
    fn test_load_from_path_reports_file_and_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("align.toml");
        std::fs::write(&path, MINIMAL_TOML.replace("parallel = true", "parallel = \"yes\"")).unwrap();

        let err = ConfigLoader::load_from_path(&path).unwrap_err().to_string();
        assert!(err.contains(&path.display().to_string()), "got: {err}");
        assert!(err.contains("in [search]"), "got: {err}");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::load_from_path(Path::new("align.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported"), "got: {err}");
    }

    #[test]
    fn test_validation_runs_after_parse() {
        // Output would overwrite the tracker input
        let content = r#"
[tracker]
path = "tracker.jsonl"

[[devices]]
name = "phone"
path = "phone.jsonl"
output = "tracker.jsonl"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("overwrite"));
    }
}
