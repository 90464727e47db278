pub mod browser;
pub mod clipboard;
pub mod config;
pub mod extract;
pub mod handoff;
pub mod llm;
pub mod logger;
pub mod markdown;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod presenter;
pub mod prompt;
pub mod report;
pub mod session;
pub mod source;

pub use model::{AnalysisResult, Category, Clause, Severity};
