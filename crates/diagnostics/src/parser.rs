//! Analyzer Output Parsing
//!
//! Best-effort extraction of diagnostics from the analyzer's text output.
//! A diagnostic line looks like
//!
//! ```text
//! <module>:<line>[:<id>]: message: <text>
//! ```
//!
//! where `message` is the marker token (configurable). Everything else
//! (banners, score summaries, stack traces) is skipped without complaint.

use regex::Regex;
use tracing::trace;

use lintview_core::{CoreError, CoreResult};

use crate::detector::{PathProbe, RealFs};
use crate::models::{DiagnosticRecord, Target};
use crate::resolver::resolve_module;

/// Marker token the analyzer wrapper prints in front of each message
pub const DEFAULT_MARKER: &str = "message";

/// Separator between the marker and the message text, and between location fields
pub const SEPARATOR: char = ':';

/// Location fields parsed from the text in front of the marker
#[derive(Debug, Clone, PartialEq, Eq)]
struct Location<'a> {
    module: &'a str,
    line: u32,
    id: &'a str,
}

/// Split `<module>:<line>[:<id>]`, reading fields from the right so that a
/// module containing `:` (a drive letter) survives.
fn split_location(location: &str) -> Option<Location<'_>> {
    let (head, last) = location.rsplit_once(SEPARATOR)?;
    let last = last.trim();

    let (module, line, id) = match last.parse::<u32>() {
        Ok(line) => (head, line, ""),
        Err(_) => {
            let (module, line) = head.rsplit_once(SEPARATOR)?;
            (module, line.trim().parse::<u32>().ok()?, last)
        }
    };

    let module = module.trim();
    if module.is_empty() {
        return None;
    }
    Some(Location { module, line, id })
}

/// Line-oriented parser bound to one analysis target.
#[derive(Debug, Clone)]
pub struct OutputParser<P = RealFs> {
    target: Target,
    marker: Regex,
    probe: P,
}

impl OutputParser<RealFs> {
    /// Create a parser that resolves modules against the real filesystem
    pub fn new(target: Target, marker: &str) -> CoreResult<Self> {
        Self::with_probe(target, marker, RealFs)
    }
}

impl<P: PathProbe> OutputParser<P> {
    /// Create a parser with a custom filesystem probe
    pub fn with_probe(target: Target, marker: &str, probe: P) -> CoreResult<Self> {
        let marker = marker.trim();
        if marker.is_empty() {
            return Err(CoreError::validation("diagnostic marker must not be empty"));
        }
        let pattern = format!(r"\b{}\b", regex::escape(marker));
        let marker = Regex::new(&pattern)
            .map_err(|e| CoreError::parse(format!("Invalid marker pattern: {}", e)))?;
        Ok(Self {
            target,
            marker,
            probe,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Parse every line, keeping the order in which diagnostics appear
    pub fn parse(&self, raw: &str) -> Vec<DiagnosticRecord> {
        raw.lines().filter_map(|line| self.parse_line(line)).collect()
    }

    /// Parse a single line; `None` when it is not a well-formed diagnostic
    pub fn parse_line(&self, line: &str) -> Option<DiagnosticRecord> {
        // The marker may also occur inside a path; the right occurrence is the
        // one followed by the separator.
        let (found, message) = self.marker.find_iter(line).find_map(|m| {
            line[m.end()..]
                .trim_start()
                .strip_prefix(SEPARATOR)
                .map(|rest| (m, rest.trim()))
        })?;

        let location = line[..found.start()]
            .trim_end()
            .trim_end_matches(SEPARATOR)
            .trim_end();
        let Some(location) = split_location(location) else {
            trace!("Skipping line with malformed location: {}", line);
            return None;
        };

        let module = resolve_module(&self.target, location.module, &self.probe);
        Some(DiagnosticRecord::new(
            module.to_string_lossy(),
            location.line,
            message,
            location.id,
        ))
    }
}
