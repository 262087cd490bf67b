//! 对齐计划解析
//!
//! TOML 为主，JSON 可选。解析失败时报告文件、行列号和所在的 plan 段落
//! (`[search]`、第 N 个 `[[devices]]` 等)；带来源路径时相对路径在这里落地。

use std::fmt;
use std::path::{Path, PathBuf};

use contracts::{AlignError, AlignmentPlan};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        })
    }
}

/// Where in the plan text a parse failure sits
#[derive(Debug, Clone, PartialEq, Eq)]
struct ErrorSite {
    /// 1-based
    line: usize,
    /// 1-based, in characters
    column: usize,
    /// Enclosing TOML table, e.g. `[search]` or `[[devices]] #2`
    section: Option<String>,
}

impl ErrorSite {
    fn at_offset(content: &str, offset: usize) -> Self {
        let offset = offset.min(content.len());
        let before = content.get(..offset).unwrap_or(content);
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Self {
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
            section: enclosing_table(before),
        }
    }
}

impl fmt::Display for ErrorSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)?;
        if let Some(section) = &self.section {
            write!(f, " in {section}")?;
        }
        Ok(())
    }
}

/// Last table header before the error, counting `[[array]]` entries.
fn enclosing_table(before: &str) -> Option<String> {
    let mut current = None;
    let mut entries: Vec<(String, usize)> = Vec::new();

    for line in before.lines() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix("[[").and_then(|l| l.split("]]").next()) {
            let name = name.trim().to_string();
            let count = match entries.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => {
                    *count += 1;
                    *count
                }
                None => {
                    entries.push((name.clone(), 1));
                    1
                }
            };
            current = Some(format!("[[{name}]] #{count}"));
        } else if let Some(name) = line.strip_prefix('[').and_then(|l| l.split(']').next()) {
            current = Some(format!("[{}]", name.trim()));
        }
    }
    current
}

fn parse_error(
    format: ConfigFormat,
    origin: Option<&Path>,
    site: Option<ErrorSite>,
    message: &str,
    source: Box<dyn std::error::Error + Send + Sync>,
) -> AlignError {
    let origin = origin.map_or_else(|| "<inline plan>".to_string(), |p| p.display().to_string());
    let message = match site {
        Some(site) => format!("{origin}: {format} error at {site}: {}", message.trim()),
        None => format!("{origin}: {format} error: {}", message.trim()),
    };
    AlignError::ConfigParse {
        message,
        source: Some(source),
    }
}

/// Parse plan text.
///
/// With an `origin`, relative tracker, device, output and report paths are
/// anchored at the origin's directory.
///
/// # Errors
/// `ConfigParse` naming the origin, the line and column, and for TOML the
/// enclosing table.
pub fn parse(
    content: &str,
    format: ConfigFormat,
    origin: Option<&Path>,
) -> Result<AlignmentPlan, AlignError> {
    let mut plan: AlignmentPlan = match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| {
            let site = e.span().map(|span| ErrorSite::at_offset(content, span.start));
            let message = e.message().to_string();
            parse_error(format, origin, site, &message, Box::new(e))
        })?,
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| {
            let site = (e.line() > 0).then(|| ErrorSite {
                line: e.line(),
                column: e.column(),
                section: None,
            });
            // serde_json appends its own location
            let text = e.to_string();
            let message = text.split(" at line ").next().unwrap_or(&text).to_string();
            parse_error(format, origin, site, &message, Box::new(e))
        })?,
    };

    if let Some(base) = origin.and_then(Path::parent) {
        resolve_relative(&mut plan, base);
    }
    Ok(plan)
}

/// Anchor every relative path of the plan at `base`
fn resolve_relative(plan: &mut AlignmentPlan, base: &Path) {
    let resolve = |path: &mut PathBuf| {
        if path.is_relative() && !path.as_os_str().is_empty() {
            *path = base.join(&*path);
        }
    };

    resolve(&mut plan.tracker.path);
    for device in &mut plan.devices {
        resolve(&mut device.path);
        if let Some(output) = device.output.as_mut() {
            resolve(output);
        }
    }
    if let Some(report) = plan.report.as_mut() {
        resolve(&mut report.path);
    }
}
