//! Best-effort persistence of completed analysis runs
//!
//! One write-once JSON record per completed analysis, named
//! `{SYMBOL}_{YYYYMMDD_HHMMSS}.json`. A failed write is logged and ignored;
//! it never fails the analysis that produced the record.

use advisor_core::TraceStep;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Retained length of one recorded tool output
pub(crate) const OUTPUT_RETAINED_CHARS: usize = 500;

/// One numbered tool invocation in a run record
#[derive(Debug, Clone, Serialize)]
pub struct RecordedStep {
    pub step: usize,
    pub tool: String,
    pub input: Value,
    pub output: String,
}

/// Write-once record of one completed analysis
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub final_answer: String,
    pub steps: Vec<RecordedStep>,
    pub tools_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news_data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

impl RunRecord {
    /// Record a reasoning-loop run from its tool trace
    pub fn from_trace(
        symbol: impl Into<String>,
        final_answer: impl Into<String>,
        trace: &[TraceStep],
        news_data: Option<Value>,
    ) -> Self {
        let tools_used = trace.iter().map(|step| step.tool.clone()).collect();
        let steps = trace
            .iter()
            .enumerate()
            .map(|(idx, step)| RecordedStep {
                step: idx + 1,
                tool: step.tool.clone(),
                input: step.input.clone(),
                output: step.output.chars().take(OUTPUT_RETAINED_CHARS).collect(),
            })
            .collect();

        Self {
            symbol: symbol.into(),
            timestamp: Utc::now(),
            final_answer: final_answer.into(),
            steps,
            tools_used,
            news_data,
            messages: Vec::new(),
        }
    }

    /// Record a pipeline run from its stage transcript
    pub fn from_stages(
        symbol: impl Into<String>,
        final_answer: impl Into<String>,
        messages: Vec<String>,
        news_data: Option<Value>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp: Utc::now(),
            final_answer: final_answer.into(),
            steps: Vec::new(),
            tools_used: Vec::new(),
            news_data,
            messages,
        }
    }
}

/// Writes one JSON file per completed analysis under a logs directory
#[derive(Debug, Clone)]
pub struct TranscriptLog {
    dir: PathBuf,
}

impl TranscriptLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist one record; a failure is logged and otherwise ignored
    pub fn save(&self, record: &RunRecord) {
        match self.try_save(record) {
            Ok(path) => info!(path = %path.display(), "conversation log saved"),
            Err(e) => {
                warn!(symbol = %record.symbol, error = %e, "failed to save conversation log");
            }
        }
    }

    fn try_save(&self, record: &RunRecord) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;

        let stamp = record.timestamp.format("%Y%m%d_%H%M%S");
        let path = self.dir.join(format!("{}_{stamp}.json", record.symbol));
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn trace() -> Vec<TraceStep> {
        vec![
            TraceStep {
                tool: "get_stock_price".to_string(),
                input: json!({"symbol": "AAPL"}),
                output: "📊 AAPL 实时行情：…".to_string(),
            },
            TraceStep {
                tool: "get_news".to_string(),
                input: json!({"symbol": "AAPL"}),
                output: "x".repeat(900),
            },
        ]
    }

    #[test]
    fn test_record_from_trace_numbers_and_truncates() {
        let record = RunRecord::from_trace("AAPL", "建议持有", &trace(), None);

        assert_eq!(record.tools_used, vec!["get_stock_price", "get_news"]);
        assert_eq!(record.steps[0].step, 1);
        assert_eq!(record.steps[1].step, 2);
        assert_eq!(record.steps[1].output.chars().count(), 500);
        assert!(record.messages.is_empty());
    }

    #[test]
    fn test_record_serialization_skips_empty_fields() {
        let record = RunRecord::from_trace("AAPL", "建议持有", &trace(), None);
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("news_data").is_none());
        assert!(value.get("messages").is_none());

        let record = RunRecord::from_stages(
            "AAPL",
            "综合分析显示中性信号",
            vec!["请分析 AAPL".to_string(), "技术分析完成: AAPL".to_string()],
            Some(json!({"news_items": []})),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["messages"].as_array().unwrap().len(), 2);
        assert!(value.get("news_data").is_some());
        assert!(value["steps"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_save_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = TranscriptLog::new(dir.path());
        let record = RunRecord::from_trace("TSLA", "建议买入", &trace(), None);

        log.save(&record);

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].starts_with("TSLA_"));
        assert!(entries[0].ends_with(".json"));

        let content = std::fs::read_to_string(dir.path().join(&entries[0])).unwrap();
        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["symbol"], "TSLA");
        assert_eq!(value["final_answer"], "建议买入");
    }

    #[test]
    fn test_save_into_unwritable_directory_is_swallowed() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // a plain file as the target directory makes create_dir_all fail
        let log = TranscriptLog::new(file.path());
        let record = RunRecord::from_trace("AAPL", "建议持有", &[], None);
        log.save(&record);
    }
}
