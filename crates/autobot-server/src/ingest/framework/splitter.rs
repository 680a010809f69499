//! Line-based excerpt splitter
//!
//! Registry exports are huge XML documents made of many sibling record
//! elements, each spread over several lines. Instead of parsing the whole
//! document, the splitter cuts it into independent excerpts: an excerpt
//! starts at the line opening the record element and ends at the line
//! closing it. Everything between records is ignored.
//!
//! Lines are read as raw bytes. An excerpt that is not valid UTF-8 is never
//! emitted; it is counted in [`SplitSummary::invalid_utf8`] so the decode
//! policy decides what happens to it.

use std::io::{self, BufRead};

use super::types::{Excerpt, SplitSummary};

/// Cuts an export into record excerpts
#[derive(Debug, Clone)]
pub struct ExcerptSplitter {
    tag: String,
}

impl ExcerptSplitter {
    /// Split on elements whose local name is `tag`, with or without a
    /// namespace prefix
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    fn matches(&self, name: &str) -> bool {
        let local = name.rsplit(':').next().unwrap_or(name);
        local == self.tag
    }

    /// Whether the line starts a record element
    fn opens(&self, line: &str) -> bool {
        let Some(rest) = line.trim_start().strip_prefix('<') else {
            return false;
        };
        if rest.starts_with('/') || rest.starts_with('?') || rest.starts_with('!') {
            return false;
        }
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        self.matches(&rest[..end])
    }

    /// Whether the line closes a record element
    fn closes(&self, line: &str) -> bool {
        line.match_indices("</").any(|(at, _)| {
            let rest = &line[at + 2..];
            rest.find('>')
                .map(|end| self.matches(rest[..end].trim_end()))
                .unwrap_or(false)
        })
    }

    /// Read `reader` to the end, handing every excerpt to `emit`
    ///
    /// Splitting stops early, without error, as soon as `emit` returns
    /// `false`.
    pub fn split<R, F>(&self, mut reader: R, mut emit: F) -> io::Result<SplitSummary>
    where
        R: BufRead,
        F: FnMut(Excerpt) -> bool,
    {
        let mut summary = SplitSummary::default();
        let mut current: Option<Vec<u8>> = None;
        let mut raw = Vec::new();

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            summary.lines += 1;
            let line = String::from_utf8_lossy(&raw);

            let starting = current.is_none();
            if starting {
                if !self.opens(&line) {
                    continue;
                }
                current = Some(Vec::new());
            }
            let Some(record) = current.as_mut() else {
                continue;
            };
            record.extend_from_slice(&raw);

            // A self-closing record element has no separate closing tag
            let self_closing = starting && line.trim_end().ends_with("/>");
            if !self_closing && !self.closes(&line) {
                continue;
            }

            let index = summary.excerpts + summary.invalid_utf8;
            match String::from_utf8(current.take().unwrap_or_default()) {
                Ok(text) => {
                    summary.excerpts += 1;
                    if !emit(Excerpt { index, text }) {
                        return Ok(summary);
                    }
                },
                Err(_) => summary.invalid_utf8 += 1,
            }
        }

        summary.truncated = current.is_some();
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(splitter: &ExcerptSplitter, input: &str) -> (Vec<Excerpt>, SplitSummary) {
        let mut excerpts = Vec::new();
        let summary = splitter
            .split(Cursor::new(input), |e| {
                excerpts.push(e);
                true
            })
            .unwrap();
        (excerpts, summary)
    }

    #[test]
    fn test_splits_records_and_ignores_the_rest() {
        let input = "<?xml version=\"1.0\"?>\n\
                     <ns:StatistikSamling>\n\
                     <ns:Statistik>\n\
                     <ns:KoeretoejIdent>1</ns:KoeretoejIdent>\n\
                     </ns:Statistik>\n\
                     <ns:Statistik>\n\
                     <ns:KoeretoejIdent>2</ns:KoeretoejIdent>\n\
                     </ns:Statistik>\n\
                     </ns:StatistikSamling>\n";
        let splitter = ExcerptSplitter::new("Statistik");
        let (excerpts, summary) = collect(&splitter, input);

        assert_eq!(summary.excerpts, 2);
        assert!(!summary.truncated);
        assert_eq!(excerpts[1].index, 1);
        assert!(excerpts[0].text.starts_with("<ns:Statistik>"));
        assert!(excerpts[0].text.contains("<ns:KoeretoejIdent>1<"));
        assert!(excerpts[0].text.trim_end().ends_with("</ns:Statistik>"));
    }

    #[test]
    fn test_similar_element_names_do_not_match() {
        let splitter = ExcerptSplitter::new("Statistik");
        assert!(!splitter.opens("<StatistikSamling>"));
        assert!(!splitter.opens("</Statistik>"));
        assert!(splitter.opens("  <Statistik xmlns:a=\"x\">"));
        assert!(splitter.opens("<a:Statistik>"));
        assert!(splitter.closes("</a:Statistik>"));
        assert!(!splitter.closes("</StatistikSamling>"));
    }

    #[test]
    fn test_single_line_record() {
        let splitter = ExcerptSplitter::new("Statistik");
        let (excerpts, _) = collect(
            &splitter,
            "<Statistik><KoeretoejIdent>9</KoeretoejIdent></Statistik>\n",
        );
        assert_eq!(excerpts.len(), 1);
    }

    #[test]
    fn test_truncated_export_is_reported() {
        let splitter = ExcerptSplitter::new("Statistik");
        let (excerpts, summary) = collect(&splitter, "<Statistik>\n<KoeretoejIdent>1\n");
        assert!(excerpts.is_empty());
        assert!(summary.truncated);
    }

    #[test]
    fn test_emit_can_stop_splitting() {
        let splitter = ExcerptSplitter::new("Statistik");
        let input = "<Statistik>\n</Statistik>\n".repeat(5);
        let mut seen = 0;
        let summary = splitter
            .split(Cursor::new(input), |_| {
                seen += 1;
                seen < 2
            })
            .unwrap();
        assert_eq!(seen, 2);
        assert_eq!(summary.excerpts, 2);
    }

    #[test]
    fn test_invalid_utf8_excerpt_is_counted_not_emitted() {
        let splitter = ExcerptSplitter::new("Statistik");
        let mut input = b"<Statistik>\n<RegNr>A\xffB</RegNr>\n</Statistik>\n".to_vec();
        input.extend_from_slice(b"<!-- \xfe -->\n<Statistik>\n</Statistik>\n");

        let mut excerpts = Vec::new();
        let summary = splitter
            .split(Cursor::new(input), |e| {
                excerpts.push(e);
                true
            })
            .unwrap();

        assert_eq!(summary.invalid_utf8, 1);
        assert_eq!(summary.excerpts, 1);
        assert_eq!(excerpts.len(), 1);
        assert_eq!(excerpts[0].index, 1);
    }
}
