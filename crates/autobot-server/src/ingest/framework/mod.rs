//! Concurrent ingestion framework
//!
//! Splits an export into record excerpts and parses them on a bounded pool
//! of workers. Format specifics live behind [`RecordParser`].

pub mod coordinator;
pub mod parser;
pub mod splitter;
pub mod types;
mod worker;

// Re-export commonly used types
pub use coordinator::IngestionPipeline;
pub use parser::RecordParser;
pub use splitter::ExcerptSplitter;
pub use types::{Excerpt, PipelineOutput, PipelineStats, SplitSummary};
