//! Export version discovery
//!
//! Registry exports are published as `<prefix><YYYYMMDD>-<HHMMSS>.<ext>`, e.g.
//! `ESStatistikListeModtag-20240105-013000.zip`. The timestamp embedded in the
//! name is the only version information a source offers, so picking the
//! newest export means parsing names and comparing their stamps.

use std::cmp::Ordering;

/// Timestamp assumed when no export has been synced yet
pub const BASELINE_STAMP: &str = "20000101-000000";

/// Length of `YYYYMMDD-HHMMSS`
const STAMP_LEN: usize = 15;

/// A filename that follows the export naming convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportName {
    pub name: String,
    /// `YYYYMMDD` as an integer
    pub date: u32,
    /// `HHMMSS` as an integer
    pub time: u32,
}

impl ExportName {
    /// Parse any name of the form `<prefix><8 digits>-<6 digits>.<ext>`
    ///
    /// Prefix and extension are arbitrary, so the rightmost stamp directly
    /// followed by a dot and a non-empty extension is taken.
    pub fn parse(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        let (date, time) = (0..bytes.len())
            .rev()
            .filter(|&dot| bytes[dot] == b'.' && dot + 1 < bytes.len() && dot >= STAMP_LEN)
            .find_map(|dot| name.get(dot - STAMP_LEN..dot).and_then(split_stamp))?;

        Some(Self {
            name: name.to_string(),
            date,
            time,
        })
    }

    /// Parse a name that must also carry the given prefix and extension
    ///
    /// `ext` is given without the leading dot.
    pub fn parse_with(name: &str, prefix: &str, ext: &str) -> Option<Self> {
        let rest = name.strip_prefix(prefix)?;
        let stamp = rest.strip_suffix(ext)?.strip_suffix('.')?;
        let (date, time) = split_stamp(stamp)?;

        Some(Self {
            name: name.to_string(),
            date,
            time,
        })
    }

    /// `<prefix>20000101-000000.<ext>`
    pub fn baseline(prefix: &str, ext: &str) -> String {
        format!("{}{}.{}", prefix, BASELINE_STAMP, ext)
    }

    /// Later stamp than `other`; equal stamps are never newer
    pub fn is_newer_than(&self, other: &ExportName) -> bool {
        self.stamp() > other.stamp()
    }

    fn stamp(&self) -> (u32, u32) {
        (self.date, self.time)
    }
}

impl PartialOrd for ExportName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExportName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.stamp()
            .cmp(&other.stamp())
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Split `YYYYMMDD-HHMMSS` into its integer halves
fn split_stamp(stamp: &str) -> Option<(u32, u32)> {
    if stamp.len() != STAMP_LEN || !stamp.is_char_boundary(8) {
        return None;
    }
    let (date, time) = stamp.split_at(8);
    Some((digits(date, 8)?, digits(time.strip_prefix('-')?, 6)?))
}

fn digits(value: &str, len: usize) -> Option<u32> {
    if value.len() != len || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Whether `candidate` carries a later timestamp than `baseline`
///
/// Dates are compared first and times only on equal dates. A name is never
/// newer than itself, and if either name does not follow the convention the
/// answer is `false`.
pub fn is_newer(candidate: &str, baseline: &str) -> bool {
    match (ExportName::parse(candidate), ExportName::parse(baseline)) {
        (Some(candidate), Some(baseline)) => candidate.is_newer_than(&baseline),
        _ => false,
    }
}

/// Pick the newest of `names` that beats `baseline`
///
/// Names not matching `prefix` and `ext` are ignored. A baseline that does
/// not match them either falls back to the default baseline. Returns `None`
/// when no name is newer than the baseline.
pub fn newest_export<'a, I>(names: I, baseline: &str, prefix: &str, ext: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let baseline = ExportName::parse_with(baseline, prefix, ext)
        .or_else(|| ExportName::parse_with(&ExportName::baseline(prefix, ext), prefix, ext))?;

    names
        .into_iter()
        .filter_map(|name| ExportName::parse_with(name, prefix, ext))
        .filter(|export| export.is_newer_than(&baseline))
        .max()
        .map(|export| export.name)
}
