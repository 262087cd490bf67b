//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 文件 → 读取 → 搜索 → 导出 → 回读 的端到端测试
//! - 配置文件驱动的多设备对齐与报告分发

#[cfg(test)]
mod contract_tests {
    use contracts::{AlignError, MetricKind, SyncSearchConfig};

    #[test]
    fn test_search_defaults() {
        let config = SyncSearchConfig::default();
        assert_eq!(config.metric, MetricKind::PositionError);
        assert_eq!(config.num_candidates, 1000);
        assert_eq!(config.anchor_fractions, vec![0.2, 0.4, 0.6, 0.8]);
        assert!(config.shift_to_origin);
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(AlignError::NoOverlap { offset: 1.0 }.is_recoverable());
        assert!(!AlignError::empty_stream("tracker").is_recoverable());
    }
}

/// Synthetic recording pair written as JSONL files.
///
/// Tracker: 64 Hz for 16 s on a clock starting at 50 s, top-level layout.
/// Device: 16 Hz for 10 s on a clock starting at 7 s, `VIO_pose` layout,
/// starting 2.5 s into the tracker recording and expressed in a frame
/// related to the tracker's by `frame_transform`.
#[cfg(test)]
mod fixture {
    use std::fmt::Write as _;
    use std::path::{Path, PathBuf};

    use nalgebra::{Matrix3, Rotation3, Vector3};
    use serde_json::json;

    pub const TRACKER_START: f64 = 50.0;
    pub const DEVICE_START: f64 = 7.0;
    pub const TRUE_OFFSET: f64 = 2.5;
    pub const CLOCK_OFFSET: f64 = TRACKER_START + TRUE_OFFSET - DEVICE_START;
    /// Candidate count putting `TRUE_OFFSET` exactly on the grid (step 1/64 s)
    pub const EXACT_CANDIDATES: usize = 388;

    pub fn motion(tau: f64) -> (Matrix3<f64>, Vector3<f64>) {
        let yaw = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.4 * tau);
        let roll_angle = 0.3 * (0.45 * tau).sin() + 0.25 * (1.3 * tau).sin();
        let roll = Rotation3::from_axis_angle(&Vector3::x_axis(), roll_angle);
        let position = Vector3::new(
            2.0 * (0.5 * tau).sin(),
            (0.8 * tau).cos(),
            0.3 * tau + 0.2 * tau.sin(),
        );
        ((yaw * roll).into_inner(), position)
    }

    /// `p_tracker = R * p_device + t`
    pub fn frame_transform() -> (Matrix3<f64>, Vector3<f64>) {
        (
            Rotation3::from_euler_angles(0.3, -0.2, 1.1).into_inner(),
            Vector3::new(0.5, -1.0, 2.0),
        )
    }

    pub fn tracker_line(i: usize) -> String {
        let tau = i as f64 / 64.0;
        let (r, p) = motion(tau);
        let col = |c: usize| vec![r[(0, c)], r[(1, c)], r[(2, c)]];
        json!({
            "time": TRACKER_START + tau,
            "position": {"x": p.x, "y": p.y, "z": p.z},
            "rotation": {"col0": col(0), "col1": col(1), "col2": col(2)},
            "marker": "rigid_body_1",
        })
        .to_string()
    }

    pub fn device_line(j: usize) -> String {
        let tau = TRUE_OFFSET + j as f64 / 16.0;
        let (r_tracker, p_tracker) = motion(tau);
        let (r, t) = frame_transform();
        let r_device = r.transpose() * r_tracker;
        let p_device = r.transpose() * (p_tracker - t);
        let row = |k: usize| {
            vec![
                r_device[(k, 0)],
                r_device[(k, 1)],
                r_device[(k, 2)],
                p_device[k],
            ]
        };
        json!({
            "time": DEVICE_START + j as f64 / 16.0,
            "VIO_pose": [row(0), row(1), row(2)],
            "frame": j,
        })
        .to_string()
    }

    pub fn write_lines(path: &Path, lines: impl Iterator<Item = String>) {
        let mut content = String::new();
        for line in lines {
            writeln!(content, "{line}").unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Writes `tracker.jsonl` and `<device>.jsonl` into `dir`.
    pub fn write_recordings(dir: &Path, device: &str) -> (PathBuf, PathBuf) {
        let tracker = dir.join("tracker.jsonl");
        let device = dir.join(format!("{device}.jsonl"));
        write_lines(&tracker, (0..1024).map(tracker_line));
        write_lines(&device, (0..160).map(device_line));
        (tracker, device)
    }
}

#[cfg(test)]
mod e2e_tests {
    use contracts::{MetricKind, PoseLayout, SyncSearchConfig};
    use ingestion::PoseLog;
    use sync_engine::AlignmentEngine;

    use crate::fixture::{self, CLOCK_OFFSET, EXACT_CANDIDATES, TRUE_OFFSET};

    fn vio_layout() -> PoseLayout {
        PoseLayout::Named("VIO_pose".to_string())
    }

    fn config(metric: MetricKind) -> SyncSearchConfig {
        SyncSearchConfig {
            metric,
            num_candidates: EXACT_CANDIDATES,
            ..Default::default()
        }
    }

    /// End-to-end: JSONL files -> PoseLog -> AlignmentEngine -> export -> re-read
    #[test]
    fn test_e2e_position_error_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let (tracker_path, device_path) = fixture::write_recordings(dir.path(), "phone");

        let tracker = PoseLog::read(&tracker_path, "tracker", PoseLayout::TopLevel).unwrap();
        let device = PoseLog::read(&device_path, "phone", vio_layout()).unwrap();
        assert_eq!(tracker.stream().len(), 1024);
        assert_eq!(device.stream().len(), 160);

        let engine = AlignmentEngine::new(config(MetricKind::PositionError));
        let alignment = engine.align(tracker.stream(), device.stream()).unwrap();

        assert!(
            (alignment.result.offset - TRUE_OFFSET).abs() < 1e-9,
            "offset {}",
            alignment.result.offset
        );
        assert!((alignment.clock_offset - CLOCK_OFFSET).abs() < 1e-9);
        assert!(alignment.result.score < 1e-6, "score {}", alignment.result.score);

        let (rotation, translation) = fixture::frame_transform();
        assert!((alignment.transform.rotation() - rotation).norm() < 1e-6);
        assert!((alignment.transform.translation() - translation).norm() < 1e-6);

        let output = dir.path().join("phone.aligned.jsonl");
        let written = device.write_file(&alignment.transformed, &output).unwrap();
        assert_eq!(written, 160);

        let exported = PoseLog::read(&output, "phone_aligned", vio_layout()).unwrap();
        for (j, sample) in exported.stream().iter().enumerate() {
            let expected = tracker.stream().get(4 * j + 160).unwrap();
            assert_eq!(sample.timestamp, expected.timestamp, "timestamp of sample {j}");
            assert!(
                (sample.position - expected.position).norm() < 1e-6,
                "position of sample {j}"
            );
            let (Some(got), Some(want)) = (sample.orientation, expected.orientation) else {
                panic!("orientation lost at sample {j}");
            };
            assert!((got - want).norm() < 1e-6, "orientation of sample {j}");
        }
        assert_eq!(exported.records()[3]["frame"], 3, "extra fields pass through");
    }

    #[test]
    fn test_e2e_orientation_variance() {
        let dir = tempfile::tempdir().unwrap();
        let (tracker_path, device_path) = fixture::write_recordings(dir.path(), "glasses");

        let tracker = PoseLog::read(&tracker_path, "tracker", PoseLayout::TopLevel).unwrap();
        let device = PoseLog::read(&device_path, "glasses", vio_layout()).unwrap();

        let engine = AlignmentEngine::new(config(MetricKind::OrientationVariance));
        let alignment = engine.align(tracker.stream(), device.stream()).unwrap();

        assert!(
            (alignment.result.offset - TRUE_OFFSET).abs() < 1e-9,
            "offset {}",
            alignment.result.offset
        );
        assert!(alignment.result.transform.is_none());
    }

    #[test]
    fn test_e2e_rotation_correlation_parallel() {
        let dir = tempfile::tempdir().unwrap();
        let (tracker_path, device_path) = fixture::write_recordings(dir.path(), "watch");

        let tracker = PoseLog::read(&tracker_path, "tracker", PoseLayout::TopLevel).unwrap();
        let device = PoseLog::read(&device_path, "watch", vio_layout()).unwrap();

        let sequential = AlignmentEngine::new(config(MetricKind::RotationCorrelation))
            .align(tracker.stream(), device.stream())
            .unwrap();
        let parallel = AlignmentEngine::new(SyncSearchConfig {
            parallel: true,
            ..config(MetricKind::RotationCorrelation)
        })
        .align(tracker.stream(), device.stream())
        .unwrap();

        assert_eq!(sequential.result, parallel.result, "parallel must match sequential");
        assert!(
            (sequential.result.offset - TRUE_OFFSET).abs() < 0.25,
            "offset {}",
            sequential.result.offset
        );
    }

    #[test]
    fn test_malformed_line_is_located() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jsonl");
        let mut lines: Vec<String> = (0..4).map(fixture::device_line).collect();
        lines[2] = "{\"time\": 7.125, \"VIO_pose\": [[1, 0, 0]]}".to_string();
        fixture::write_lines(&path, lines.into_iter());

        let err = PoseLog::read(&path, "broken", vio_layout()).unwrap_err();
        assert!(err.as_record().is_some(), "record-level error expected: {err}");
        assert!(err.to_string().contains("broken"), "stream named: {err}");
    }
}

#[cfg(test)]
mod plan_tests {
    use std::sync::Arc;

    use config_loader::ConfigLoader;
    use contracts::AlignmentReport;
    use dispatcher::create_dispatcher;
    use ingestion::PoseLog;
    use observability::AlignmentMetricsAggregator;
    use sync_engine::AlignmentEngine;
    use tokio::sync::mpsc;

    use crate::fixture::{self, CLOCK_OFFSET};

    /// Config file -> every device aligned on the blocking pool -> report file
    #[tokio::test]
    async fn test_plan_to_report_file() {
        let dir = tempfile::tempdir().unwrap();
        fixture::write_recordings(dir.path(), "phone");
        fixture::write_recordings(dir.path(), "glasses");

        let config_path = dir.path().join("align.toml");
        std::fs::write(
            &config_path,
            r#"
[tracker]
path = "tracker.jsonl"

[[devices]]
name = "phone"
path = "phone.jsonl"
pose_field = "VIO_pose"
output = "out/phone.aligned.jsonl"

[[devices]]
name = "glasses"
path = "glasses.jsonl"
pose_field = "VIO_pose"

[search]
num_candidates = 388
keep_score_curve = false

[report]
path = "out/report.json"
log = false
"#,
        )
        .unwrap();

        let plan = ConfigLoader::load_from_path(&config_path).unwrap();
        let tracker = Arc::new(
            PoseLog::read(&plan.tracker.path, "tracker", plan.tracker.layout())
                .unwrap()
                .into_stream(),
        );
        let engine = Arc::new(AlignmentEngine::new(plan.search.clone()));

        let (tx, rx) = mpsc::channel::<AlignmentReport>(4);
        let dispatcher = create_dispatcher(plan.report.as_ref(), rx).unwrap().spawn();

        let mut aggregator = AlignmentMetricsAggregator::new();
        for device in plan.devices.clone() {
            let engine = Arc::clone(&engine);
            let tracker = Arc::clone(&tracker);
            let report = tokio::task::spawn_blocking(move || {
                let log = PoseLog::read(&device.path, &device.name, device.layout()).unwrap();
                let alignment = engine.align(&tracker, log.stream()).unwrap();
                if let Some(output) = &device.output {
                    std::fs::create_dir_all(output.parent().unwrap()).unwrap();
                    log.write_file(&alignment.transformed, output).unwrap();
                }
                AlignmentReport {
                    device: device.name.clone(),
                    tracker: alignment.tracker,
                    device_stream: alignment.device,
                    result: alignment.result,
                    clock_offset: alignment.clock_offset,
                    output: device.output.as_ref().map(|p| p.display().to_string()),
                    elapsed_ms: alignment.elapsed_ms,
                }
            })
            .await
            .unwrap();
            aggregator.update(&report);
            tx.send(report).await.unwrap();
        }
        drop(tx);

        let sink_metrics = dispatcher.await.unwrap();
        assert_eq!(sink_metrics.len(), 1, "report file sink only");
        assert_eq!(sink_metrics[0].1.write_count, 2);

        let report_path = dir.path().join("out/report.json");
        let document: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        let reports = document["reports"].as_array().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0]["device"], "phone");
        assert_eq!(reports[1]["device"], "glasses");
        for report in reports {
            let clock = report["clock_offset"].as_f64().unwrap();
            assert!((clock - CLOCK_OFFSET).abs() < 1e-9, "clock offset {clock}");
            assert!(report["result"]["score_curve"].is_null(), "curve disabled");
        }
        assert!(document["generated_at"].is_string());

        assert!(dir.path().join("out/phone.aligned.jsonl").exists());
        assert!(!dir.path().join("out/glasses.aligned.jsonl").exists());
        assert_eq!(aggregator.summary().total_alignments, 2);
    }
}
