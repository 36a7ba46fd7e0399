//-
// Copyright (c) 2026, Jason Lingle
//
// This file is part of Lemoncrypt.
//
// Lemoncrypt is free software: you can redistribute it and/or modify it under
// the  terms of  the GNU  General Public  License as  published by  the Free
// Software Foundation, either version 3 of the License, or (at  your option)
// any later version.
//
// Lemoncrypt is distributed in the hope  that it will be useful, but WITHOUT
// ANY  WARRANTY; without  even the  implied warranty  of MERCHANTABILITY  or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public  License for
// more details.
//
// You should have received a copy of the GNU General Public License along
// with Lemoncrypt. If not, see <http://www.gnu.org/licenses/>.

//! Collection of per-message statistics into a CSV file.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::support::error::Error;

/// Collects per-message records and writes them to a CSV file.
///
/// A collector constructed with `disabled` accepts commits and discards
/// them, so callers need not care whether metrics were requested.
#[derive(Debug)]
pub struct MetricCollector {
    out: Option<fs::File>,
    counter: u64,
}

/// A single metric entry, created when a message enters the pipeline and
/// committed exactly once when it leaves, successfully or not.
pub struct MetricRecord {
    start_time: DateTime<Utc>,
    pub orig_size: u64,
    pub result_size: u64,
    pub success: bool,
}

impl MetricCollector {
    /// Create a collector writing to `path`, which must not yet exist so
    /// that previously collected data cannot be overwritten.
    pub fn create(path: &Path) -> Result<MetricCollector, Error> {
        let mut out = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                if std::io::ErrorKind::AlreadyExists == e.kind() {
                    Error::MetricsFileExists
                } else {
                    e.into()
                }
            })?;
        out.write_all(
            b"StartTime;EndTime;Duration (ns);OrigSize (B);\
              ResultSize (B);Success\n",
        )?;
        Ok(MetricCollector {
            out: Some(out),
            counter: 0,
        })
    }

    /// Create a collector which discards everything.
    pub fn disabled() -> MetricCollector {
        MetricCollector {
            out: None,
            counter: 0,
        }
    }

    /// Start a record for a message of `orig_size` bytes.
    pub fn new_record(&self, orig_size: u64) -> MetricRecord {
        MetricRecord {
            start_time: Utc::now(),
            orig_size,
            result_size: 0,
            success: false,
        }
    }

    /// Stamp the end time on `record` and write it out.
    ///
    /// The file is synced every 128 records to bound the amount of data
    /// lost in a crash.
    pub fn commit(&mut self, record: MetricRecord) -> Result<(), Error> {
        let end_time = Utc::now();
        let duration = end_time - record.start_time;

        let out = match self.out {
            Some(ref mut out) => out,
            None => return Ok(()),
        };
        writeln!(
            out,
            "{};{};{};{};{};{}",
            record.start_time,
            end_time,
            duration.num_nanoseconds().unwrap_or(i64::MAX),
            record.orig_size,
            record.result_size,
            record.success
        )?;

        self.counter += 1;
        if 0 == self.counter % 128 {
            out.sync_data()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn records_are_appended_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        let mut collector = MetricCollector::create(&path).unwrap();
        let mut record = collector.new_record(100);
        record.result_size = 2048;
        record.success = true;
        collector.commit(record).unwrap();
        let record = collector.new_record(5);
        collector.commit(record).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(3, lines.len());
        assert!(lines[0].starts_with("StartTime;EndTime;"));
        assert!(lines[1].ends_with(";100;2048;true"));
        assert!(lines[2].ends_with(";5;0;false"));
    }

    #[test]
    fn existing_output_file_is_refused() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_matches!(
            Err(Error::MetricsFileExists),
            MetricCollector::create(file.path())
        );
    }

    #[test]
    fn disabled_collector_discards_commits() {
        let mut collector = MetricCollector::disabled();
        let record = collector.new_record(42);
        collector.commit(record).unwrap();
    }
}
