//! Report export

use anyhow::{anyhow, Result};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{ExportFormat, Report};

/// Writes a `Report` as CSV text or JSON
pub struct ReportExporter {
    format: ExportFormat,
}

impl ReportExporter {
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    /// Serialize the report to `writer`
    pub fn write<W: Write>(&self, report: &Report, writer: &mut W) -> Result<()> {
        match self.format {
            ExportFormat::Csv => self.write_csv(report, writer)?,
            ExportFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, report)?;
                writeln!(writer)?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn write_csv<W: Write>(&self, report: &Report, writer: &mut W) -> Result<()> {
        let counts = &report.counts;
        let summary: [(&str, String); 8] = [
            ("Candidate Name", report.candidate_name.clone()),
            ("Interview Duration", format!("{} sec", report.duration_secs)),
            ("Focus Lost Events", counts.no_face.to_string()),
            ("Multiple Faces Events", counts.multiple_faces.to_string()),
            ("Suspicious Item Events", counts.suspicious_item.to_string()),
            ("Eyes Closed Events", counts.eyes_closed.to_string()),
            ("Looking Away Events", counts.looking_away.to_string()),
            ("Final Integrity Score", report.score.to_string()),
        ];

        for (label, value) in &summary {
            writeln!(writer, "{},{}", label, csv_field(value))?;
        }

        writeln!(writer)?;
        writeln!(writer, "Event Logs")?;
        writeln!(writer, "Timestamp,Event")?;
        for event in &report.events {
            writeln!(
                writer,
                "{},{}",
                event.timestamp.to_rfc3339(),
                csv_field(&event.message())
            )?;
        }

        Ok(())
    }

    /// Render to a string
    pub fn render(&self, report: &Report) -> Result<String> {
        let mut buf = Vec::new();
        self.write(report, &mut buf)?;
        String::from_utf8(buf).map_err(|e| anyhow!("Report is not valid UTF-8: {}", e))
    }

    /// File name for this format, swapping the extension for JSON
    pub fn file_name(&self, base: &str) -> PathBuf {
        let path = PathBuf::from(base);
        match self.format {
            ExportFormat::Csv => path,
            ExportFormat::Json => path.with_extension("json"),
        }
    }

    /// Write the report into `dir`, returning the file path
    pub fn export_to_dir(&self, report: &Report, dir: &Path, base_name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name(base_name));

        let file = File::create(&path)
            .map_err(|e| anyhow!("Failed to create report file {:?}: {}", path, e))?;
        let mut writer = BufWriter::new(file);
        self.write(report, &mut writer)?;

        info!("Wrote {:?} report to {:?}", self.format, path);
        Ok(path)
    }
}

/// Quote a field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use crate::core::{Event, EventKind};
    use crate::report::{compute_score, EventCounts};

    fn sample_report(name: &str) -> Report {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let events = vec![
            Event::new(EventKind::NoFaceDetected, t + chrono::Duration::seconds(5)),
            Event::new(EventKind::SuspiciousItemDetected, t + chrono::Duration::seconds(7))
                .with_detail("cell phone"),
        ];
        Report {
            session_id: Uuid::nil(),
            candidate_name: name.to_string(),
            started_at: t,
            generated_at: t + chrono::Duration::seconds(30),
            duration_secs: 30,
            counts: EventCounts::from_events(&events),
            score: compute_score(&events),
            events,
        }
    }

    #[test]
    fn test_csv_layout() {
        let text = ReportExporter::new(ExportFormat::Csv)
            .render(&sample_report("Ada"))
            .unwrap();

        let expected = "\
Candidate Name,Ada
Interview Duration,30 sec
Focus Lost Events,1
Multiple Faces Events,0
Suspicious Item Events,1
Eyes Closed Events,0
Looking Away Events,0
Final Integrity Score,85

Event Logs
Timestamp,Event
2026-03-01T09:00:05+00:00,No face detected
2026-03-01T09:00:07+00:00,Suspicious item detected: cell phone
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_csv_quotes_commas() {
        let text = ReportExporter::new(ExportFormat::Csv)
            .render(&sample_report("Lovelace, Ada"))
            .unwrap();
        assert!(text.starts_with("Candidate Name,\"Lovelace, Ada\"\n"));
    }

    #[test]
    fn test_json_export() {
        let text = ReportExporter::new(ExportFormat::Json)
            .render(&sample_report("Ada"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["score"], 85);
        assert_eq!(value["events"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_export_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let csv = ReportExporter::new(ExportFormat::Csv)
            .export_to_dir(&sample_report("Ada"), dir.path(), "proctoring_report.csv")
            .unwrap();
        assert_eq!(csv.file_name().unwrap(), "proctoring_report.csv");
        assert!(std::fs::read_to_string(&csv).unwrap().contains("Event Logs"));

        let json = ReportExporter::new(ExportFormat::Json)
            .export_to_dir(&sample_report("Ada"), dir.path(), "proctoring_report.csv")
            .unwrap();
        assert_eq!(json.file_name().unwrap(), "proctoring_report.json");
    }
}
