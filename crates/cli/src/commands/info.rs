//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{AlignmentPlan, StreamSummary};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::pipeline::read_stream;
use crate::plan::build_plan;

/// Plan info for JSON output
#[derive(Serialize)]
struct PlanInfo {
    version: String,
    tracker: InputInfo,
    devices: Vec<InputInfo>,
    search: contracts::SyncSearchConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<String>,
}

#[derive(Serialize)]
struct InputInfo {
    name: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pose_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<StreamSummary>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let plan = build_plan(&args.plan).context("Failed to build alignment plan")?;
    info!(devices = plan.devices.len(), "Loading plan info");

    let info = build_plan_info(&plan, args.streams)?;
    if args.json {
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize plan info")?;
        println!("{}", json);
    } else {
        print_plan_info(&info);
    }

    Ok(())
}

fn build_plan_info(plan: &AlignmentPlan, streams: bool) -> Result<PlanInfo> {
    let tracker_stream = if streams {
        let stream = read_stream(&plan.tracker.path, "tracker", plan.tracker.layout())
            .context("Failed to read tracker log")?;
        Some(stream.summary())
    } else {
        None
    };

    let mut devices = Vec::with_capacity(plan.devices.len());
    for device in &plan.devices {
        let stream = if streams {
            let stream = read_stream(&device.path, &device.name, device.layout())
                .with_context(|| format!("Failed to read log of device '{}'", device.name))?;
            Some(stream.summary())
        } else {
            None
        };
        devices.push(InputInfo {
            name: device.name.clone(),
            path: device.path.display().to_string(),
            pose_field: device.pose_field.clone(),
            output: device.output.as_ref().map(|p| p.display().to_string()),
            stream,
        });
    }

    Ok(PlanInfo {
        version: format!("{:?}", plan.version),
        tracker: InputInfo {
            name: "tracker".to_string(),
            path: plan.tracker.path.display().to_string(),
            pose_field: plan.tracker.pose_field.clone(),
            output: None,
            stream: tracker_stream,
        },
        devices,
        search: plan.search.clone(),
        report: plan.report.as_ref().map(|r| r.path.display().to_string()),
    })
}

fn print_input(prefix: &str, child: &str, input: &InputInfo) {
    println!("   {} {} ({})", prefix, input.name, input.path);
    if let Some(ref field) = input.pose_field {
        println!("   {}  ├─ Pose field: {}", child, field);
    }
    if let Some(ref output) = input.output {
        println!("   {}  ├─ Output: {}", child, output);
    }
    match &input.stream {
        Some(s) => {
            let interval = s
                .mean_interval
                .map(|dt| format!("{:.1} Hz", 1.0 / dt))
                .unwrap_or_else(|| "n/a".to_string());
            println!(
                "   {}  └─ {} samples, {:.2}s, {}, orientation {}/{}",
                child, s.samples, s.duration, interval, s.with_orientation, s.samples
            );
        }
        None => println!("   {}  └─ (not read)", child),
    }
}

fn print_plan_info(info: &PlanInfo) {
    println!("=== vio-align plan ({}) ===\n", info.version);

    println!("Tracker");
    print_input("└─", "   ", &info.tracker);

    println!("\nDevices ({})", info.devices.len());
    for (i, device) in info.devices.iter().enumerate() {
        let is_last = i == info.devices.len() - 1;
        let (prefix, child) = if is_last { ("└─", "   ") } else { ("├─", "│  ") };
        print_input(prefix, child, device);
    }

    let search = &info.search;
    println!("\nSearch");
    println!("   ├─ Metric: {}", search.metric);
    println!("   ├─ Candidates: {}", search.num_candidates);
    println!("   ├─ Anchor fractions: {:?}", search.anchor_fractions);
    println!("   ├─ Test samples: {}", search.test_samples);
    println!("   ├─ Shift to origin: {}", search.shift_to_origin);
    println!("   └─ Parallel: {}", search.parallel);

    if let Some(ref report) = info.report {
        println!("\nReport: {}", report);
    }
    println!();
}
