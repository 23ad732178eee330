use std::fmt::Write as FmtWrite;

use crate::models::{OutputFormat, RunReport};

pub trait Formatter {
    fn format_run_report(&self, report: &RunReport) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub store_url: String,
    pub store_connected: bool,
    pub table: String,
    pub documents_pending: u64,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_reachable: bool,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_run_report(&self, report: &RunReport) -> String {
        let mut output = String::new();
        writeln!(output, "Backfill Complete").unwrap();
        writeln!(output, "-----------------").unwrap();
        writeln!(output, "Documents found: {}", report.documents_found).unwrap();
        writeln!(output, "Batches processed: {}", report.batches_processed).unwrap();
        writeln!(output, "Documents updated: {}", report.documents_updated).unwrap();
        writeln!(output, "Duration: {}ms", report.duration_ms).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let store_status = if status.store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "Document Store: {}", store_status).unwrap();
        if status.store_connected {
            writeln!(output, "  URL:     {}", status.store_url).unwrap();
            writeln!(output, "  Table:   {}", status.table).unwrap();
            writeln!(output, "  Pending: {}", status.documents_pending).unwrap();
        }
        writeln!(output).unwrap();

        let api_status = if status.embedding_reachable {
            "[REACHABLE]"
        } else {
            "[UNREACHABLE]"
        };
        writeln!(output, "Embedding API: {}", api_status).unwrap();
        writeln!(output, "  URL:   {}", status.embedding_url).unwrap();
        writeln!(output, "  Model: {}", status.embedding_model).unwrap();

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_run_report(&self, report: &RunReport) -> String {
        let json = serde_json::to_string_pretty(report)
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e));
        format!("{}\n", json)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let json = serde_json::json!({
            "store": {
                "url": status.store_url,
                "connected": status.store_connected,
                "table": status.table,
                "pending": status.documents_pending,
            },
            "embedding": {
                "url": status.embedding_url,
                "model": status.embedding_model,
                "reachable": status.embedding_reachable,
            },
        });
        format!("{}\n", serde_json::to_string_pretty(&json).unwrap_or_default())
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", serde_json::json!({ "message": message }))
    }

    fn format_error(&self, error: &str) -> String {
        format!("{}\n", serde_json::json!({ "error": error }))
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> RunReport {
        RunReport {
            documents_found: 200,
            batches_processed: 3,
            documents_updated: 198,
            duration_ms: 1234,
        }
    }

    #[test]
    fn test_text_run_report() {
        let output = TextFormatter.format_run_report(&sample_report());
        assert!(output.contains("Documents found: 200"));
        assert!(output.contains("Batches processed: 3"));
        assert!(output.contains("Documents updated: 198"));
    }

    #[test]
    fn test_json_run_report_parses_back() {
        let output = JsonFormatter.format_run_report(&sample_report());
        let parsed: RunReport = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.documents_found, 200);
        assert_eq!(parsed.documents_updated, 198);
    }

    #[test]
    fn test_text_status_hides_details_when_disconnected() {
        let status = StatusInfo {
            store_url: "postgres://localhost:5432/documents".to_string(),
            store_connected: false,
            table: "documents".to_string(),
            documents_pending: 0,
            embedding_url: "http://localhost:11411".to_string(),
            embedding_model: "cohere.embed-multilingual-v3".to_string(),
            embedding_reachable: true,
        };
        let output = TextFormatter.format_status(&status);
        assert!(output.contains("[DISCONNECTED]"));
        assert!(!output.contains("Pending:"));
    }
}
