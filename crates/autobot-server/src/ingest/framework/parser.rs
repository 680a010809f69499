//! Record parser trait
//!
//! Implement this trait for every export format the pipeline should read.

use autobot_common::Result;

use crate::vehicle::Vehicle;

/// Turns one record excerpt into a vehicle
///
/// Errors are classified by kind:
/// - `ParseError::Fatal`: the excerpt could not be decoded at all; the
///   pipeline's decode policy decides whether the run aborts
/// - `ParseError::Recoverable` and hash errors: the record is unusable and
///   is skipped
pub trait RecordParser: Send + Sync {
    /// Parse one excerpt
    ///
    /// Returns `Ok(None)` for a well-formed record of a kind that is not
    /// kept, e.g. a non-primary statistical record.
    fn parse_excerpt(&self, excerpt: &str) -> Result<Option<Vehicle>>;

    /// Record type identifier, used in logs
    fn record_type(&self) -> &str;
}
