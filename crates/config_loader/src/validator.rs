//! 配置校验模块
//!
//! 校验规则：
//! - 至少一个 device，名称唯一
//! - 输入路径非空
//! - 输出路径不得覆盖任何输入，也不得互相重复
//! - num_candidates >= 1, test_samples >= 1
//! - anchor_fractions 非空且每项位于 [0, 1]

use std::collections::HashSet;
use std::path::Path;

use contracts::{AlignError, AlignmentPlan};

/// 校验 AlignmentPlan 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(plan: &AlignmentPlan) -> Result<(), AlignError> {
    validate_devices(plan)?;
    validate_paths(plan)?;
    validate_outputs(plan)?;
    validate_search(plan)?;
    Ok(())
}

/// 校验 device 数量与名称唯一性
fn validate_devices(plan: &AlignmentPlan) -> Result<(), AlignError> {
    if plan.devices.is_empty() {
        return Err(AlignError::config_validation(
            "devices",
            "at least one device input is required",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, device) in plan.devices.iter().enumerate() {
        if device.name.trim().is_empty() {
            return Err(AlignError::config_validation(
                format!("devices[{idx}].name"),
                "device name cannot be empty",
            ));
        }
        if !seen.insert(device.name.as_str()) {
            return Err(AlignError::config_validation(
                format!("devices[name={}]", device.name),
                "duplicate device name",
            ));
        }
    }
    Ok(())
}

/// 校验输入路径非空
fn validate_paths(plan: &AlignmentPlan) -> Result<(), AlignError> {
    if is_blank(&plan.tracker.path) {
        return Err(AlignError::config_validation(
            "tracker.path",
            "path cannot be empty",
        ));
    }
    for device in &plan.devices {
        if is_blank(&device.path) {
            return Err(AlignError::config_validation(
                format!("devices[{}].path", device.name),
                "path cannot be empty",
            ));
        }
    }
    Ok(())
}

/// 校验输出路径：不覆盖输入，不互相冲突
fn validate_outputs(plan: &AlignmentPlan) -> Result<(), AlignError> {
    let inputs: HashSet<&Path> = std::iter::once(plan.tracker.path.as_path())
        .chain(plan.devices.iter().map(|d| d.path.as_path()))
        .collect();

    let mut outputs = HashSet::new();
    let device_outputs = plan
        .devices
        .iter()
        .filter_map(|d| d.output.as_deref().map(|o| (format!("devices[{}].output", d.name), o)));
    let report_output = plan
        .report
        .iter()
        .map(|r| ("report.path".to_string(), r.path.as_path()));

    for (field, output) in device_outputs.chain(report_output) {
        if is_blank(output) {
            return Err(AlignError::config_validation(field, "path cannot be empty"));
        }
        if inputs.contains(output) {
            return Err(AlignError::config_validation(
                field,
                format!("output {} would overwrite an input", output.display()),
            ));
        }
        if !outputs.insert(output) {
            return Err(AlignError::config_validation(
                field,
                format!("output {} is used more than once", output.display()),
            ));
        }
    }
    Ok(())
}

/// 校验搜索参数
fn validate_search(plan: &AlignmentPlan) -> Result<(), AlignError> {
    let search = &plan.search;

    if search.num_candidates < 1 {
        return Err(AlignError::config_validation(
            "search.num_candidates",
            "num_candidates must be >= 1",
        ));
    }
    if search.test_samples < 1 {
        return Err(AlignError::config_validation(
            "search.test_samples",
            "test_samples must be >= 1",
        ));
    }
    if search.anchor_fractions.is_empty() {
        return Err(AlignError::config_validation(
            "search.anchor_fractions",
            "at least one anchor fraction is required",
        ));
    }
    for (idx, fraction) in search.anchor_fractions.iter().enumerate() {
        if !(0.0..=1.0).contains(fraction) {
            return Err(AlignError::config_validation(
                format!("search.anchor_fractions[{idx}]"),
                format!("anchor fraction must be within [0, 1], got {fraction}"),
            ));
        }
    }
    Ok(())
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().is_empty()
}
