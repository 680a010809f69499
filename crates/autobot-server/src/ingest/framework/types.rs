//! Core types for the ingestion framework

use std::ops::AddAssign;

use crate::vehicle::Vehicle;

/// The raw text of one record, cut from the export by the splitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    /// Position of the excerpt in the export, starting at 0
    pub index: u64,
    pub text: String,
}

/// What the splitter found in an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitSummary {
    pub excerpts: u64,
    pub lines: u64,
    /// Records skipped because their bytes are not valid UTF-8
    pub invalid_utf8: u64,
    /// The export ended inside an open record
    pub truncated: bool,
}

/// Counters kept by each worker and summed by the coordinator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Excerpts handled, whatever their outcome
    pub processed: u64,
    /// Vehicles emitted, duplicates included
    pub kept: u64,
    /// Excerpts skipped because they could not be turned into a vehicle
    pub discarded: u64,
}

impl AddAssign for PipelineStats {
    fn add_assign(&mut self, rhs: Self) {
        self.processed += rhs.processed;
        self.kept += rhs.kept;
        self.discarded += rhs.discarded;
    }
}

/// Result of a completed pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Distinct vehicles, one per content hash, in no particular order
    pub vehicles: Vec<Vehicle>,
    pub processed: u64,
    pub kept: u64,
    pub discarded: u64,
}

impl PipelineOutput {
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            processed: self.processed,
            kept: self.kept,
            discarded: self.discarded,
        }
    }
}
