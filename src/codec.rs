//! Tabular codec — converts between time-series collections and the
//! flat comma-delimited tables the simulation engine reads and writes.
//!
//! Pure and stateless in both directions. The engine's time column is
//! seconds relative to the simulation start; queue timestamps are
//! absolute epoch milliseconds. Both directions take an optional start
//! time and rescale across that boundary when it is present; when it
//! is absent, timestamps pass through unscaled.

use std::collections::HashMap;

use crate::error::{DecodeError, EncodeError};
use crate::timeseries::{Point, TimeSeries};

const COLUMN_SEPARATOR: char = ',';

/// Unit assigned to decoded series with no entry in the unit lookup.
pub const PLACEHOLDER_UNIT: &str = "unit";

/// Options for encoding an input table for the engine.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// When set, the time column is emitted as `(t_ms - start) / 1000`
    /// seconds; when unset, raw epoch milliseconds pass through.
    pub start_time_ms: Option<i64>,
    /// The legacy encoder writes row 0 twice, immediately after the
    /// header. On by default for bit-compatibility with the engine's
    /// existing input handling; turn off to emit each row once.
    pub duplicate_first_row: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            start_time_ms: None,
            duplicate_first_row: true,
        }
    }
}

/// Options for decoding an engine output table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions<'a> {
    /// When set, each row's time `t` (engine seconds) is rebased to
    /// `t * 1000 + start` absolute milliseconds; when unset, times
    /// pass through unscaled.
    pub start_time_ms: Option<i64>,
    /// Optional unit metadata keyed by column label. Missing entries
    /// degrade to [`PLACEHOLDER_UNIT`] rather than failing the task.
    pub units: Option<&'a HashMap<String, String>>,
}

/// Encode a collection of co-sampled series as a delimited table.
///
/// Line 1 is the header: `"time"` then each label double-quoted, in
/// collection order. One line per sample follows, carrying the first
/// series' timestamp and every series' value at that index. Lines are
/// newline-joined with no trailing newline.
///
/// Co-sampling (same timestamps across series) is a documented
/// precondition; only the point counts are checked.
pub fn encode(series: &[TimeSeries], opts: &EncodeOptions) -> Result<String, EncodeError> {
    let first = series.first().ok_or(EncodeError::Empty)?;
    let sample_count = first.points.len();

    for s in series {
        if s.points.len() != sample_count {
            return Err(EncodeError::LengthMismatch {
                label: s.label.clone(),
                expected: sample_count,
                actual: s.points.len(),
            });
        }
    }

    let mut header = vec!["\"time\"".to_string()];
    header.extend(series.iter().map(|s| format!("\"{}\"", s.label)));

    let mut rows = Vec::with_capacity(sample_count + 2);
    rows.push(header.join(&COLUMN_SEPARATOR.to_string()));

    for i in 0..sample_count {
        let mut fields = vec![format_time(first.points[i].timestamp, opts.start_time_ms)];
        fields.extend(series.iter().map(|s| s.points[i].value.to_string()));
        rows.push(fields.join(&COLUMN_SEPARATOR.to_string()));
    }

    if opts.duplicate_first_row && sample_count > 0 {
        rows.insert(2, rows[1].clone());
    }

    Ok(rows.join("\n"))
}

fn format_time(timestamp_ms: i64, start_time_ms: Option<i64>) -> String {
    match start_time_ms {
        Some(start) => ((timestamp_ms - start) as f64 / 1000.0).to_string(),
        None => timestamp_ms.to_string(),
    }
}

/// Decode a delimited table into a collection of series, one per
/// non-time column, in header order.
pub fn decode(table: &str, opts: &DecodeOptions<'_>) -> Result<Vec<TimeSeries>, DecodeError> {
    let normalized = table.replace("\r\n", "\n");
    let mut lines = normalized.lines();

    let header: Vec<String> = lines
        .next()
        .unwrap_or("")
        .split(COLUMN_SEPARATOR)
        .map(|field| field.trim_matches('"').to_string())
        .collect();
    let column_count = header.len();

    let mut timestamps: Vec<i64> = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); column_count.saturating_sub(1)];

    for (row, line) in lines.enumerate() {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(COLUMN_SEPARATOR).collect();
        if fields.len() != column_count {
            return Err(DecodeError::RaggedRow {
                row: row + 1,
                expected: column_count,
                actual: fields.len(),
            });
        }
        for (column, field) in fields.iter().enumerate() {
            let value: f64 = field.parse().map_err(|_| DecodeError::BadNumber {
                row: row + 1,
                column,
                value: (*field).to_string(),
            })?;
            if column == 0 {
                timestamps.push(rebase_time(value, opts.start_time_ms));
            } else {
                columns[column - 1].push(value);
            }
        }
    }

    if timestamps.is_empty() {
        return Err(DecodeError::Empty);
    }

    let series = header
        .iter()
        .skip(1)
        .zip(columns)
        .map(|(label, values)| {
            let unit = opts
                .units
                .and_then(|lookup| lookup.get(label))
                .cloned()
                .unwrap_or_else(|| PLACEHOLDER_UNIT.to_string());
            let points = timestamps
                .iter()
                .zip(values)
                .map(|(&timestamp, value)| Point { timestamp, value })
                .collect();
            TimeSeries::new(label.clone(), unit, points)
        })
        .collect();

    Ok(series)
}

fn rebase_time(raw: f64, start_time_ms: Option<i64>) -> i64 {
    match start_time_ms {
        Some(start) => (raw * 1000.0).round() as i64 + start,
        None => raw.round() as i64,
    }
}
