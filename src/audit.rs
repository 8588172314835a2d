// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Audit log of per-file outcomes, exportable as CSV

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use crate::{NamifyError, Result};

/// Header row of an exported log
pub const CSV_HEADER: [&str; 5] = [
    "Action",
    "Original Filename",
    "New Filename/Message",
    "Directory",
    "Timestamp",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Renamed,
    Skipped,
    Error,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Renamed => "Renamed",
            Action::Skipped => "Skipped",
            Action::Error => "Error",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = NamifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Renamed" => Ok(Action::Renamed),
            "Skipped" => Ok(Action::Skipped),
            "Error" => Ok(Action::Error),
            other => Err(NamifyError::AuditFormat(format!("unknown action '{}'", other))),
        }
    }
}

/// One audit record for a single file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub action: Action,
    /// Basename of the file before processing
    pub original_name: String,
    /// New filename for `Renamed`, otherwise the reason
    pub detail: String,
    /// Reporting directory supplied by the caller
    pub directory: String,
    pub timestamp: DateTime<Local>,
}

impl Outcome {
    /// Record an outcome stamped with the current time (second precision)
    pub fn now(action: Action, original_name: String, detail: String, directory: String) -> Self {
        let now = Local::now();
        let timestamp = now.with_nanosecond(0).unwrap_or(now);
        Self {
            action,
            original_name,
            detail,
            directory,
            timestamp,
        }
    }

    pub fn renamed(original_name: String, new_name: String, directory: String) -> Self {
        Self::now(Action::Renamed, original_name, new_name, directory)
    }

    pub fn skipped(original_name: String, reason: impl Into<String>, directory: String) -> Self {
        Self::now(Action::Skipped, original_name, reason.into(), directory)
    }

    pub fn error(original_name: String, reason: impl Into<String>, directory: String) -> Self {
        Self::now(Action::Error, original_name, reason.into(), directory)
    }

    /// Timestamp as written to the exported log
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    fn to_record(&self) -> [String; 5] {
        [
            self.action.to_string(),
            self.original_name.clone(),
            self.detail.clone(),
            self.directory.clone(),
            self.timestamp_string(),
        ]
    }

    fn from_record(record: &csv::StringRecord) -> Result<Self> {
        if record.len() != CSV_HEADER.len() {
            return Err(NamifyError::AuditFormat(format!(
                "expected {} fields, found {}",
                CSV_HEADER.len(),
                record.len()
            )));
        }

        let naive = NaiveDateTime::parse_from_str(&record[4], TIMESTAMP_FORMAT)
            .map_err(|e| NamifyError::AuditFormat(format!("bad timestamp '{}': {}", &record[4], e)))?;
        let timestamp = Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| NamifyError::AuditFormat(format!("nonexistent local time '{}'", &record[4])))?;

        Ok(Self {
            action: record[0].parse()?,
            original_name: record[1].to_string(),
            detail: record[2].to_string(),
            directory: record[3].to_string(),
            timestamp,
        })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.action, self.original_name, self.detail)
    }
}

/// Ordered record of outcomes for one job
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    outcomes: Vec<Outcome>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    pub fn clear(&mut self) {
        self.outcomes.clear();
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Count outcomes with the given action
    pub fn count(&self, action: Action) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }

    /// Write the log as CSV, header first
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(CSV_HEADER)?;
        for outcome in &self.outcomes {
            csv.write_record(outcome.to_record())?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Save the log to a CSV file. An empty log is not written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.is_empty() {
            return Err(NamifyError::EmptyLog);
        }
        let file = File::create(path)?;
        self.write_csv(file)?;
        tracing::info!("Log saved as {:?} ({} entries)", path, self.len());
        Ok(())
    }

    /// Read a previously exported log
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers = csv.headers()?;
        if headers.iter().ne(CSV_HEADER.iter().copied()) {
            return Err(NamifyError::AuditFormat(format!(
                "unexpected header: {:?}",
                headers
            )));
        }

        let mut log = Self::new();
        for record in csv.records() {
            log.append(Outcome::from_record(&record?)?);
        }
        Ok(log)
    }
}

impl From<Vec<Outcome>> for AuditLog {
    fn from(outcomes: Vec<Outcome>) -> Self {
        Self { outcomes }
    }
}

/// Default filename for a log saved at `at`
pub fn default_log_filename(prefix: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.csv", prefix, at.format("%Y-%m-%d_%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> AuditLog {
        AuditLog::from(vec![
            Outcome::renamed("cat1.jpg".into(), "cat_sitting_Ab3xZ.jpg".into(), "/pics".into()),
            Outcome::skipped("broken.jpg".into(), "Invalid image file", "/pics".into()),
            Outcome::error(
                "locked.png".into(),
                "Permission denied, \"really\"\nsecond line".to_string(),
                "/pics, with comma".into(),
            ),
        ])
    }

    #[test]
    fn test_header_row() {
        let mut buf = Vec::new();
        AuditLog::new().write_csv(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Action,Original Filename,New Filename/Message,Directory,Timestamp\n"
        );
    }

    #[test]
    fn test_export_then_parse_keeps_rows_in_order() {
        let log = sample_log();
        let mut buf = Vec::new();
        log.write_csv(&mut buf).unwrap();

        let parsed = AuditLog::parse(buf.as_slice()).unwrap();
        assert_eq!(parsed.len(), log.len());
        for (original, read_back) in log.outcomes().iter().zip(parsed.outcomes()) {
            assert_eq!(read_back.action, original.action);
            assert_eq!(read_back.original_name, original.original_name);
            assert_eq!(read_back.directory, original.directory);
            assert_eq!(read_back.timestamp_string(), original.timestamp_string());
        }
        assert_eq!(parsed.outcomes()[2].detail, log.outcomes()[2].detail);
    }

    #[test]
    fn test_fields_are_quoted() {
        let mut buf = Vec::new();
        sample_log().write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\"Permission denied, \"\"really\"\"\nsecond line\""));
        assert!(text.contains("\"/pics, with comma\""));
    }

    #[test]
    fn test_timestamp_format() {
        let outcome = Outcome::skipped("a.png".into(), "x", "d".into());
        let stamp = outcome.timestamp_string();
        assert!(NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S").is_ok());
        assert_eq!(stamp.len(), 19);
    }

    #[test]
    fn test_parse_rejects_wrong_header() {
        let data = "Action,Name\nRenamed,a.jpg\n";
        assert!(matches!(
            AuditLog::parse(data.as_bytes()),
            Err(NamifyError::AuditFormat(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_action() {
        let data = "Action,Original Filename,New Filename/Message,Directory,Timestamp\n\
                    Moved,a.jpg,b.jpg,/d,2024-01-01 10:00:00\n";
        assert!(AuditLog::parse(data.as_bytes()).is_err());
    }

    #[test]
    fn test_save_refuses_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        assert!(matches!(AuditLog::new().save(&path), Err(NamifyError::EmptyLog)));
        assert!(!path.exists());
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        sample_log().save(&path).unwrap();
        let parsed = AuditLog::parse(File::open(&path).unwrap()).unwrap();
        assert_eq!(parsed.count(Action::Renamed), 1);
        assert_eq!(parsed.count(Action::Skipped), 1);
        assert_eq!(parsed.count(Action::Error), 1);
    }

    #[test]
    fn test_default_log_filename() {
        let at = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(
            default_log_filename("AINamify_log", at),
            "AINamify_log_2024-05-06_07-08-09.csv"
        );
    }
}
