use crate::model::AnalysisResult;
use crate::presenter::{self, ClausePresenter};
use chrono::{DateTime, Local};

#[derive(Debug, Clone)]
pub struct CurrentAnalysis {
    pub source: String,
    pub result: AnalysisResult,
    pub analyzed_at: DateTime<Local>,
}

/// Owner of the single "current" analysis.
///
/// A new analysis always overwrites the previous one (last write wins); the
/// presenter and exporter borrow from here instead of sharing global state.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<CurrentAnalysis>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `result` as current and hands back whatever it replaced.
    pub fn replace(&mut self, source: &str, result: AnalysisResult) -> Option<CurrentAnalysis> {
        let previous = self.current.replace(CurrentAnalysis {
            source: source.to_string(),
            result,
            analyzed_at: Local::now(),
        });
        if let Some(prev) = &previous {
            log::debug!("[Session] Replacing analysis of {}", prev.source);
        }
        previous
    }

    pub fn current(&self) -> Option<&CurrentAnalysis> {
        self.current.as_ref()
    }

    pub fn presenter(&self) -> Option<ClausePresenter<'_>> {
        self.current.as_ref().map(|c| ClausePresenter::new(&c.result))
    }

    pub fn export(&self) -> Option<String> {
        self.current.as_ref().map(|c| {
            presenter::export_document(&c.result, Some(&c.source), c.analyzed_at)
        })
    }

    pub fn clear(&mut self) -> Option<CurrentAnalysis> {
        self.current.take()
    }
}
