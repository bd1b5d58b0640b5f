use std::io::{self, Write};

use anyhow::Result;

use crate::cli::args::OutputFormat;
use crate::models::LogRecord;

pub fn print_records(records: &[LogRecord], format: OutputFormat) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Text => write_text(&mut out, records)?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut out, records)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Render records one per line:
/// `timestamp [level] application: message`.
///
/// The application segment is dropped when empty.
fn write_text<W: Write>(out: &mut W, records: &[LogRecord]) -> Result<()> {
    for record in records {
        if record.application.is_empty() {
            writeln!(
                out,
                "{} [{}] {}",
                record.timestamp, record.level, record.message
            )?;
        } else {
            writeln!(
                out,
                "{} [{}] {}: {}",
                record.timestamp, record.level, record.application, record.message
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(application: &str) -> LogRecord {
        LogRecord {
            timestamp: "2024-05-01T10:00:00Z".to_string(),
            level: "Error".to_string(),
            message: "push rejected".to_string(),
            exception: String::new(),
            application: application.to_string(),
        }
    }

    #[test]
    fn text_lines_include_application_when_present() {
        let mut buf = Vec::new();
        write_text(&mut buf, &[record("registry-admin"), record("")]).expect("write");
        let text = String::from_utf8(buf).expect("utf-8");
        assert_eq!(
            text,
            "2024-05-01T10:00:00Z [Error] registry-admin: push rejected\n\
             2024-05-01T10:00:00Z [Error] push rejected\n"
        );
    }
}
