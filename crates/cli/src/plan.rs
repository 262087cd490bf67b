//! Builds an `AlignmentPlan` from a config file and/or command-line flags.

use std::ffi::OsStr;
use std::path::Path;

use config_loader::ConfigLoader;
use contracts::{AlignmentPlan, ConfigVersion, DeviceInput, ReportConfig, StreamInput};
use tracing::info;

use crate::cli::PlanArgs;
use crate::error::{CliError, Result};

/// Load the plan named by `--config` (if any) and apply flag overrides.
///
/// Without a config file, `--tracker` and at least one `--device` are required.
pub fn build_plan(args: &PlanArgs) -> Result<AlignmentPlan> {
    let mut plan = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path));
            }
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)?
        }
        None => {
            let tracker = args.tracker.clone().ok_or_else(|| {
                CliError::missing_input("either --config or --tracker is required")
            })?;
            if args.devices.is_empty() {
                return Err(CliError::missing_input(
                    "at least one --device is required without --config",
                ));
            }
            AlignmentPlan {
                version: ConfigVersion::default(),
                tracker: StreamInput {
                    path: tracker,
                    pose_field: None,
                },
                devices: Vec::new(),
                search: Default::default(),
                report: None,
            }
        }
    };

    apply_overrides(&mut plan, args);
    ConfigLoader::validate(&plan)?;
    Ok(plan)
}

fn apply_overrides(plan: &mut AlignmentPlan, args: &PlanArgs) {
    if let Some(tracker) = &args.tracker {
        plan.tracker.path = tracker.clone();
    }
    if let Some(field) = &args.tracker_pose_field {
        plan.tracker.pose_field = Some(field.clone());
    }

    if !args.devices.is_empty() {
        plan.devices = args
            .devices
            .iter()
            .enumerate()
            .map(|(index, path)| DeviceInput {
                name: unique_name(path, index, &args.devices),
                path: path.clone(),
                pose_field: None,
                output: None,
            })
            .collect();
    }
    if let Some(field) = &args.pose_field {
        for device in &mut plan.devices {
            device.pose_field = Some(field.clone());
        }
    }

    if let Some(metric) = args.metric {
        plan.search.metric = metric.into();
    }
    if let Some(candidates) = args.candidates {
        plan.search.num_candidates = candidates;
    }
    if args.parallel {
        plan.search.parallel = true;
    }
}

/// Route every device's export into `dir` and the JSON report to `report`.
pub fn apply_outputs(
    plan: &mut AlignmentPlan,
    dir: Option<&Path>,
    report: Option<&Path>,
) -> Result<()> {
    if let Some(dir) = dir {
        for device in &mut plan.devices {
            let stem = file_stem(&device.path).unwrap_or(&device.name);
            device.output = Some(dir.join(format!("{stem}.aligned.jsonl")));
        }
    }
    if let Some(path) = report {
        let log = plan.report.as_ref().is_none_or(|r| r.log);
        plan.report = Some(ReportConfig {
            path: path.to_path_buf(),
            log,
        });
    }
    ConfigLoader::validate(plan)?;
    Ok(())
}

fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(OsStr::to_str)
}

/// File stem, suffixed with the position when two devices share one
fn unique_name(path: &Path, index: usize, all: &[std::path::PathBuf]) -> String {
    let stem = file_stem(path).unwrap_or("device");
    let shared = all
        .iter()
        .filter(|other| file_stem(other).unwrap_or("device") == stem)
        .count();
    if shared > 1 {
        format!("{stem}-{}", index + 1)
    } else {
        stem.to_string()
    }
}
