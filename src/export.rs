//! CSV export of transaction pages.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use crate::data::model::TransactionLog;

const HEADERS: [&str; 9] = [
    "Method Name",
    "Start Time",
    "End Time",
    "Duration",
    "Status",
    "Propagation",
    "Isolation",
    "Thread",
    "SQL Count",
];

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// `transactions-2025-03-01.csv`
pub fn default_file_name(date: NaiveDate) -> String {
    format!("transactions-{}.csv", date.format("%Y-%m-%d"))
}

/// Write transactions and, after each, its children indented two spaces per level.
pub fn write_csv<W: io::Write>(writer: W, transactions: &[TransactionLog]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADERS)?;
    for tx in transactions {
        write_transaction(&mut csv, tx, 0)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_csv_file(path: &Path, transactions: &[TransactionLog]) -> Result<()> {
    let file = File::create(path)?;
    write_csv(file, transactions)
}

fn write_transaction<W: io::Write>(
    csv: &mut csv::Writer<W>,
    tx: &TransactionLog,
    depth: usize,
) -> Result<()> {
    csv.write_record([
        format!("{}{}", " ".repeat(depth * 2), tx.method),
        tx.start_time.format(TIME_FORMAT).to_string(),
        tx.end_time.format(TIME_FORMAT).to_string(),
        tx.duration.to_string(),
        tx.status.as_str().to_string(),
        tx.propagation.as_str().to_string(),
        tx.isolation.as_str().to_string(),
        tx.thread_name().to_string(),
        tx.executed_quires.len().to_string(),
    ])?;
    for child in &tx.children {
        write_transaction(csv, child, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transactions() -> Vec<TransactionLog> {
        let json = r#"[{
            "method": "OrderService.place",
            "propagation": "REQUIRED",
            "isolation": "DEFAULT",
            "startTime": "2025-03-01T10:00:00Z",
            "endTime": "2025-03-01T10:00:00.250Z",
            "duration": 250,
            "status": "COMMITTED",
            "thread": "exec-1",
            "executedQuires": ["select 1", "select 2"],
            "child": [{
                "method": "Audit, log",
                "propagation": "REQUIRES_NEW",
                "isolation": "READ_COMMITTED",
                "startTime": "2025-03-01T10:00:00.100Z",
                "endTime": "2025-03-01T10:00:00.120Z",
                "duration": 20,
                "status": "ROLLED_BACK",
                "child": [{
                    "method": "Deep",
                    "propagation": "NESTED",
                    "isolation": "DEFAULT",
                    "startTime": "2025-03-01T10:00:00.105Z",
                    "endTime": "2025-03-01T10:00:00.110Z",
                    "duration": 5,
                    "status": "ERRORED"
                }]
            }]
        }]"#;
        serde_json::from_str(json).unwrap()
    }

    fn export() -> Vec<String> {
        let mut out = Vec::new();
        write_csv(&mut out, &transactions()).unwrap();
        String::from_utf8(out).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_header_row() {
        assert_eq!(
            export()[0],
            "Method Name,Start Time,End Time,Duration,Status,Propagation,Isolation,Thread,SQL Count"
        );
    }

    #[test]
    fn test_children_follow_parent_indented() {
        let lines = export();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            "OrderService.place,2025-03-01 10:00:00.000,2025-03-01 10:00:00.250,250,COMMITTED,REQUIRED,DEFAULT,exec-1,2"
        );
        // commas are quoted, indentation is kept inside the field
        assert!(lines[2].starts_with("\"  Audit, log\","));
        assert!(lines[2].contains("ROLLED_BACK,REQUIRES_NEW,READ_COMMITTED,N/A,0"));
        assert!(lines[3].trim_start_matches('"').starts_with("    Deep"));
    }

    #[test]
    fn test_default_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(default_file_name(date), "transactions-2025-03-01.csv");
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv_file(&path, &transactions()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
    }
}
