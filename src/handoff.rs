//! One-shot hand-off of an analysis from `analyze --handoff` to `view`.
//!
//! The slot holds at most one record. The producer writes and the consumer
//! reads, renders, then deletes. None of that is atomic: a second `send`
//! before the consumer gets to it silently replaces the first record.

use crate::model::AnalysisResult;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const SLOT_FILE: &str = "pending_analysis.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub source: String,
    pub result: AnalysisResult,
}

pub struct HandoffSlot {
    path: PathBuf,
}

impl HandoffSlot {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SLOT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_pending(&self) -> bool {
        self.path.exists()
    }

    pub fn send(&self, source: &str, result: &AnalysisResult) -> Result<HandoffRecord> {
        if self.is_pending() {
            log::warn!("[Handoff] Overwriting an analysis that was never viewed");
        }

        let record = HandoffRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            source: source.to_string(),
            result: result.clone(),
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&self.path, json).context("Failed to store analysis for viewing")?;

        log::info!("[Handoff] Stored record {}", record.id);
        Ok(record)
    }

    /// Reads the pending record without consuming it.
    pub fn peek(&self) -> Result<Option<HandoffRecord>> {
        if !self.is_pending() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).context("Failed to read pending analysis")?;
        let record = serde_json::from_str(&content).context("Pending analysis is corrupted")?;
        Ok(Some(record))
    }

    pub fn clear(&self) -> Result<()> {
        if self.is_pending() {
            fs::remove_file(&self.path).context("Failed to remove pending analysis")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Clause, Severity};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("terms_lens_test_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample(title: &str) -> AnalysisResult {
        AnalysisResult {
            summary: "<ul><li>one</li></ul>".to_string(),
            concerning_clauses: vec![Clause {
                title: title.to_string(),
                text: "text".to_string(),
                severity: Severity::High,
                category: Category::Privacy,
            }],
        }
    }

    #[test]
    fn test_send_then_clear_is_one_shot() {
        let dir = temp_dir();
        let slot = HandoffSlot::new(&dir);

        assert!(slot.peek().unwrap().is_none());

        let sent = slot.send("https://example.com/terms", &sample("A")).unwrap();
        assert!(slot.is_pending());

        let received = slot.peek().unwrap().unwrap();
        assert_eq!(received, sent);
        slot.clear().unwrap();
        assert!(!slot.is_pending());
        assert!(slot.peek().unwrap().is_none());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_second_send_replaces_unread_record() {
        let dir = temp_dir();
        let slot = HandoffSlot::new(&dir);

        slot.send("first", &sample("A")).unwrap();
        slot.send("second", &sample("B")).unwrap();

        let received = slot.peek().unwrap().unwrap();
        assert_eq!(received.source, "second");
        assert_eq!(received.result.concerning_clauses[0].title, "B");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_peek_keeps_record_until_cleared() {
        let dir = temp_dir();
        let slot = HandoffSlot::new(&dir);
        slot.send("src", &sample("A")).unwrap();

        assert!(slot.peek().unwrap().is_some());
        assert!(slot.is_pending());
        slot.clear().unwrap();
        assert!(slot.peek().unwrap().is_none());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_corrupted_record_is_an_error() {
        let dir = temp_dir();
        let slot = HandoffSlot::new(&dir);
        fs::write(slot.path(), "{not json").unwrap();

        assert!(slot.peek().is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
