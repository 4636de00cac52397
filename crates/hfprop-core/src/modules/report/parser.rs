use crate::domain::{EngineReportLine, PredictError};
use regex::Regex;
use std::sync::OnceLock;

pub const SECTION_START: &str = "Calculated Parameters";
pub const SECTION_END: &str = "End Calculated";
pub const MIN_ROW_FIELDS: usize = 6;

const FREQUENCY_FIELD: usize = 2;
const RECEIVED_POWER_FIELD: usize = 3;
const SNR_FIELD: usize = 4;
const RELIABILITY_FIELD: usize = 5;

static MUF_PATTERN: OnceLock<Regex> = OnceLock::new();

fn muf_pattern() -> &'static Regex {
    MUF_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?:operational\s+muf|bmuf|muf)\b\s*[:=]?\s*(-?\d+(?:\.\d+)?)")
            .unwrap_or_else(|error| panic!("MUF pattern must compile: {error}"))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    OutsideTable,
    InsideTable,
    Finished,
}

/// Rows and MUF recovered from one engine report.
///
/// A report without usable rows still yields a value; `error` then explains
/// what was missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReport {
    pub lines: Vec<EngineReportLine>,
    pub muf: Option<f64>,
    pub error: Option<PredictError>,
}

impl ParsedReport {
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|error| error.message().to_string())
    }
}

pub fn parse_report(report: &str) -> ParsedReport {
    let muf = extract_muf(report);
    if report.trim().is_empty() {
        return ParsedReport {
            lines: Vec::new(),
            muf,
            error: Some(PredictError::parse_degraded(
                "PARSE.EMPTY_REPORT",
                "engine report is empty",
            )),
        };
    }

    let mut state = TableState::OutsideTable;
    let mut section_seen = false;
    let mut lines = Vec::new();

    for raw in report.lines() {
        let line = raw.trim();
        state = match state {
            TableState::OutsideTable => {
                if line.contains(SECTION_START) && !line.contains("End") {
                    section_seen = true;
                    TableState::InsideTable
                } else {
                    TableState::OutsideTable
                }
            }
            TableState::InsideTable => {
                let boundary = line.contains(SECTION_END) || is_asterisk_banner(line);
                if boundary && !lines.is_empty() {
                    TableState::Finished
                } else {
                    if !boundary && !line.is_empty() && !line.starts_with(['*', '-']) {
                        if let Some(row) = parse_data_row(line) {
                            lines.push(row);
                        }
                    }
                    TableState::InsideTable
                }
            }
            TableState::Finished => break,
        };
    }

    let error = if !section_seen {
        Some(PredictError::parse_degraded(
            "PARSE.NO_SECTION",
            format!("engine report has no '{SECTION_START}' section"),
        ))
    } else if lines.is_empty() {
        Some(PredictError::parse_degraded(
            "PARSE.NO_ROWS",
            format!("'{SECTION_START}' section contains no usable rows"),
        ))
    } else {
        None
    };

    ParsedReport { lines, muf, error }
}

/// First MUF-like figure anywhere in the report.
pub fn extract_muf(report: &str) -> Option<f64> {
    muf_pattern()
        .captures_iter(report)
        .filter_map(|captures| captures.get(1))
        .find_map(|value| value.as_str().parse::<f64>().ok())
}

/// Parses a comma separated table row; rows without a positive frequency are rejected.
pub fn parse_data_row(line: &str) -> Option<EngineReportLine> {
    let fields = line.split(',').map(str::trim).collect::<Vec<_>>();
    if fields.len() < MIN_ROW_FIELDS {
        return None;
    }

    let frequency = fields[FREQUENCY_FIELD].parse::<f64>().ok()?;
    if !frequency.is_finite() || frequency <= 0.0 {
        return None;
    }

    Some(EngineReportLine {
        frequency,
        received_power: numeric_field(fields[RECEIVED_POWER_FIELD]),
        snr: numeric_field(fields[SNR_FIELD]),
        reliability: numeric_field(fields[RELIABILITY_FIELD]),
    })
}

// unreadable values are kept as NaN so the row's frequency is not lost
fn numeric_field(field: &str) -> f64 {
    field.parse::<f64>().unwrap_or(f64::NAN)
}

fn is_asterisk_banner(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == '*')
}
