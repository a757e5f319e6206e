//! Placeholder templates for generated pages.
//!
//! A template is plain text containing `~~NAME~~` tokens. It is parsed once
//! into literal and placeholder segments, then filled from a
//! [`Substitutions`] map in a single pass, so substituted values are never
//! re-scanned for tokens. Each value carries its own [`Escape`] policy.

mod escape;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use advisorygen_shared::{AdvisoryError, Result};

pub use escape::escape_html;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~([A-Z][A-Z0-9_]*)~~").expect("valid regex"));

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// How a substituted value is embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    /// Markup-escape the value (`&`, `<`, `>`, quotes).
    Markup,
    /// Insert the value verbatim. Only for system-built or curated text.
    Trusted,
}

/// Named values for one template fill.
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    values: BTreeMap<String, (String, Escape)>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value that is markup-escaped on insertion.
    pub fn escaped(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.values
            .insert(name.to_string(), (value.into(), Escape::Markup));
        self
    }

    /// Add a value that is inserted as-is.
    pub fn trusted(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.values
            .insert(name.to_string(), (value.into(), Escape::Trusted));
        self
    }

    fn get(&self, name: &str) -> Option<&(String, Escape)> {
        self.values.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

impl Template {
    /// Split template text into literal and placeholder segments.
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in TOKEN_RE.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(text[last..whole.start()].to_string()));
            }
            segments.push(Segment::Placeholder(caps[1].to_string()));
            last = whole.end();
        }
        if last < text.len() {
            segments.push(Segment::Literal(text[last..].to_string()));
        }

        Self { segments }
    }

    /// Read and parse a template file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AdvisoryError::io(path, e))?;
        let template = Self::parse(&text);
        debug!(
            placeholders = template.placeholders().len(),
            "template loaded"
        );
        Ok(template)
    }

    /// Distinct placeholder names used by the template.
    pub fn placeholders(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Fail if the template uses a placeholder outside `known`.
    ///
    /// Lets a run abort before any page is written instead of failing on
    /// the first record.
    pub fn check_placeholders(&self, known: &[&str]) -> Result<()> {
        let unknown: Vec<String> = self
            .placeholders()
            .into_iter()
            .filter(|name| !known.contains(name))
            .map(|name| format!("~~{name}~~"))
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(AdvisoryError::template(format!(
                "unknown placeholder(s): {}",
                unknown.join(", ")
            )))
        }
    }

    /// Fill every placeholder. A placeholder without a value is an error.
    pub fn render(&self, values: &Substitutions) -> Result<String> {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let (value, escape) = values.get(name).ok_or_else(|| {
                        AdvisoryError::template(format!("unresolved placeholder ~~{name}~~"))
                    })?;
                    match escape {
                        Escape::Markup => out.push_str(&escape_html(value)),
                        Escape::Trusted => out.push_str(value),
                    }
                }
            }
        }

        Ok(out)
    }
}

/// Whether `text` still contains a `~~NAME~~` token.
pub fn has_placeholder(text: &str) -> bool {
    TOKEN_RE.is_match(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
