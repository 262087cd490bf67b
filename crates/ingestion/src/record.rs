//! Single JSON record <-> pose sample.
//!
//! Top-level layout:
//! `{"time": t, "position": {"x","y","z"}, "rotation": {"col0","col1","col2"}}`
//! with `rotation` optional. Named layout: `{"time": t, "<field>": [[..4], [..4], [..4]]}`,
//! rows of `[R | p]`.

use contracts::{AlignError, PoseLayout, PoseSample};
use nalgebra::{Matrix3, Matrix3x4, Vector3};
use serde_json::{json, Map, Value};

pub type Record = Map<String, Value>;

/// Where a record sits in its file
#[derive(Debug, Clone, Copy)]
pub(crate) struct Location<'a> {
    pub stream: &'a str,
    /// 1-based line number
    pub line: usize,
    /// 0-based sample index
    pub index: usize,
}

impl Location<'_> {
    fn parse_error(&self, message: impl Into<String>) -> AlignError {
        AlignError::parse(self.stream, self.line, message)
    }

    fn shape_error(&self, field: &str, message: impl Into<String>) -> AlignError {
        AlignError::shape(self.stream, self.index, field, message)
    }
}

/// Parse one non-blank line into its JSON object.
pub(crate) fn parse_line(line: &str, at: Location<'_>) -> Result<Record, AlignError> {
    let value: Value = serde_json::from_str(line).map_err(|e| AlignError::Parse {
        stream: at.stream.to_string(),
        line: at.line,
        message: "invalid JSON".to_string(),
        source: Some(Box::new(e)),
    })?;
    match value {
        Value::Object(record) => Ok(record),
        other => Err(at.parse_error(format!(
            "expected a JSON object, found {}",
            json_type(&other)
        ))),
    }
}

/// Extract the pose sample of a record.
pub(crate) fn decode(
    record: &Record,
    layout: &PoseLayout,
    at: Location<'_>,
) -> Result<PoseSample, AlignError> {
    let timestamp = record
        .get("time")
        .and_then(Value::as_f64)
        .ok_or_else(|| at.parse_error("missing or non-numeric 'time'"))?;

    match layout {
        PoseLayout::TopLevel => {
            let position = record
                .get("position")
                .ok_or_else(|| at.shape_error("position", "missing"))?;
            let position = decode_xyz(position, at)?;

            match record.get("rotation") {
                None | Some(Value::Null) => Ok(PoseSample::new(timestamp, position)),
                Some(rotation) => Ok(PoseSample::with_orientation(
                    timestamp,
                    position,
                    decode_columns(rotation, at)?,
                )),
            }
        }
        PoseLayout::Named(field) => {
            let value = record
                .get(field)
                .ok_or_else(|| at.shape_error(field, "missing"))?;
            let block = decode_block(value, field, at)?;
            Ok(PoseSample::from_pose_block(timestamp, &block))
        }
    }
}

/// Write a sample into a copy of its source record.
///
/// Only the pose fields and `time` change; every other key is kept as is.
/// A named block has no form without a rotation, so a sample without
/// orientation is refused there.
pub(crate) fn encode(
    record: &Record,
    sample: &PoseSample,
    layout: &PoseLayout,
    stream: &str,
    index: usize,
) -> Result<Record, AlignError> {
    let mut out = record.clone();
    out.insert("time".into(), json!(sample.timestamp));

    let p = &sample.position;
    match layout {
        PoseLayout::TopLevel => {
            out.insert("position".into(), json!({ "x": p.x, "y": p.y, "z": p.z }));
            match &sample.orientation {
                Some(r) => {
                    let col = |c: usize| json!([r[(0, c)], r[(1, c)], r[(2, c)]]);
                    out.insert(
                        "rotation".into(),
                        json!({ "col0": col(0), "col1": col(1), "col2": col(2) }),
                    );
                }
                None => {
                    out.remove("rotation");
                }
            }
        }
        PoseLayout::Named(field) => {
            let r = sample
                .orientation
                .ok_or_else(|| AlignError::MissingOrientation {
                    stream: stream.to_string(),
                    index,
                })?;
            let rows: Vec<Value> = (0..3)
                .map(|i| json!([r[(i, 0)], r[(i, 1)], r[(i, 2)], p[i]]))
                .collect();
            out.insert(field.clone(), Value::Array(rows));
        }
    }
    Ok(out)
}

fn decode_xyz(value: &Value, at: Location<'_>) -> Result<Vector3<f64>, AlignError> {
    let object = value
        .as_object()
        .ok_or_else(|| at.shape_error("position", "expected an object with x, y, z"))?;
    let mut xyz = [0.0; 3];
    for (slot, key) in xyz.iter_mut().zip(["x", "y", "z"]) {
        *slot = object
            .get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| at.shape_error("position", format!("'{key}' missing or not a number")))?;
    }
    Ok(Vector3::from(xyz))
}

fn decode_columns(value: &Value, at: Location<'_>) -> Result<Matrix3<f64>, AlignError> {
    let object = value
        .as_object()
        .ok_or_else(|| at.shape_error("rotation", "expected an object with col0, col1, col2"))?;
    let mut columns = [Vector3::zeros(); 3];
    for (column, key) in columns.iter_mut().zip(["col0", "col1", "col2"]) {
        let values = object
            .get(key)
            .ok_or_else(|| at.shape_error("rotation", format!("'{key}' missing")))?;
        *column = Vector3::from(numbers::<3>(values).ok_or_else(|| {
            at.shape_error("rotation", format!("'{key}' must hold exactly 3 numbers"))
        })?);
    }
    Ok(Matrix3::from_columns(&columns))
}

fn decode_block(value: &Value, field: &str, at: Location<'_>) -> Result<Matrix3x4<f64>, AlignError> {
    let shape_error = || at.shape_error(field, "expected a 3x4 array of numbers");
    let rows = value.as_array().ok_or_else(shape_error)?;
    if rows.len() != 3 {
        return Err(shape_error());
    }

    let mut block = Matrix3x4::zeros();
    for (i, row) in rows.iter().enumerate() {
        let row = numbers::<4>(row).ok_or_else(shape_error)?;
        for (j, v) in row.into_iter().enumerate() {
            block[(i, j)] = v;
        }
    }
    Ok(block)
}

/// Array of exactly `N` numbers
fn numbers<const N: usize>(value: &Value) -> Option<[f64; N]> {
    let items = value.as_array()?;
    if items.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64()?;
    }
    Some(out)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
