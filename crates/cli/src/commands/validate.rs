//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::AlignmentPlan;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    tracker: String,
    device_count: usize,
    metric: String,
    num_candidates: usize,
    report: Option<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(plan) => {
            let warnings = collect_warnings(&plan);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", plan.version),
                    tracker: plan.tracker.path.display().to_string(),
                    device_count: plan.devices.len(),
                    metric: plan.search.metric.to_string(),
                    num_candidates: plan.search.num_candidates,
                    report: plan.report.as_ref().map(|r| r.path.display().to_string()),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(plan: &AlignmentPlan) -> Vec<String> {
    let mut warnings = Vec::new();

    for device in &plan.devices {
        if !device.path.exists() {
            warnings.push(format!(
                "Device '{}' log does not exist yet: {}",
                device.name,
                device.path.display()
            ));
        }
        if device.output.is_none() {
            warnings.push(format!(
                "Device '{}' has no output - aligned trajectory will not be exported",
                device.name
            ));
        }
    }

    if !plan.tracker.path.exists() {
        warnings.push(format!(
            "Tracker log does not exist yet: {}",
            plan.tracker.path.display()
        ));
    }

    if !plan.search.metric.recovers_transform() {
        warnings.push(format!(
            "Metric '{}' recovers no rigid transform - exports keep the device frame",
            plan.search.metric
        ));
    }

    if plan.search.num_candidates < 2 {
        warnings.push("search.num_candidates < 2 - only the base offset is tried".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Tracker: {}", summary.tracker);
            println!("  Devices: {}", summary.device_count);
            println!("  Metric: {}", summary.metric);
            println!("  Candidates: {}", summary.num_candidates);
            if let Some(ref report) = summary.report {
                println!("  Report: {}", report);
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &tempfile::TempDir, content: &str) -> ValidateArgs {
        let config = dir.path().join("align.toml");
        std::fs::write(&config, content).unwrap();
        ValidateArgs { config, json: true }
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(
            &dir,
            r#"
[tracker]
path = "tracker.jsonl"

[[devices]]
name = "phone"
path = "phone.jsonl"

[search]
metric = "rotation-correlation"
"#,
        );

        let result = validate_config(&args);
        assert!(result.valid, "error: {:?}", result.error);
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("no output")), "{warnings:?}");
        assert!(warnings.iter().any(|w| w.contains("recovers no rigid transform")));
        assert_eq!(result.summary.unwrap().device_count, 1);
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(
            &dir,
            r#"
[tracker]
path = "tracker.jsonl"
devices = []
"#,
        );
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.is_some());
        assert!(run_validate(&args).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/no/such/align.toml".into(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
