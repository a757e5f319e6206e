//! Advisory page renderer.
//!
//! Validates each loaded record and fills the page template for the ones
//! carrying every required field. A record missing any of them gets no page
//! at all.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use chrono::{DateTime, Datelike, FixedOffset};
use tracing::{info, instrument, warn};

use advisorygen_shared::{
    Acknowledgment, AdvisoryError, AdvisoryRecord, AffectedVersion, Category, GeneratorConfig,
    RequiredField, Result, RiskLevel,
};
use advisorygen_template::{Substitutions, Template, escape_html};

use crate::index::is_reserved_stem;
use crate::loader::LoadedAdvisories;
use crate::output::{WrittenFile, write_output};

/// Placeholders a page template may use.
pub const PLACEHOLDERS: [&str; 8] = [
    "TITLE",
    "IDENTIFIER",
    "DATE",
    "LEVEL",
    "DESCRIPTION",
    "AFFECTEDVERSIONS",
    "ACTION",
    "ACKNOWLEDGMENTS",
];

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// What is wrong with a required field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    Invalid(String),
}

/// A record rejected before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub category: Category,
    pub identifier: String,
    pub field: RequiredField,
    pub problem: FieldProblem,
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.problem {
            FieldProblem::Missing => write!(
                f,
                "{} ({}): missing required field {}",
                self.identifier, self.category, self.field
            ),
            FieldProblem::Invalid(why) => write!(
                f,
                "{} ({}): invalid field {}: {why}",
                self.identifier, self.category, self.field
            ),
        }
    }
}

/// A record with every required field present, borrowed from the snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedAdvisory<'a> {
    pub category: Category,
    pub identifier: &'a str,
    pub title: &'a str,
    pub timestamp: i64,
    pub risk: RiskLevel,
    pub description: &'a str,
    pub affected: &'a [AffectedVersion],
    pub action_taken: &'a str,
    pub acknowledgments: &'a [Acknowledgment],
}

/// Check required fields in [`RequiredField::ALL`] order and report the first problem.
///
/// The identifier is checked first: it must not name a generated index
/// fragment, since pages and fragments share one directory.
pub fn validate<'a>(
    category: Category,
    identifier: &'a str,
    record: &'a AdvisoryRecord,
) -> std::result::Result<ValidatedAdvisory<'a>, ValidationFailure> {
    let fail = |field, problem| ValidationFailure {
        category,
        identifier: identifier.to_string(),
        field,
        problem,
    };

    if is_reserved_stem(identifier) {
        return Err(fail(
            RequiredField::Identifier,
            FieldProblem::Invalid("name is reserved for an index fragment".into()),
        ));
    }

    let title = record
        .title
        .as_deref()
        .ok_or_else(|| fail(RequiredField::Title, FieldProblem::Missing))?;
    let raw = record
        .timestamp
        .as_ref()
        .ok_or_else(|| fail(RequiredField::Timestamp, FieldProblem::Missing))?;
    let timestamp = raw.as_i64().ok_or_else(|| {
        fail(
            RequiredField::Timestamp,
            FieldProblem::Invalid(format!("{raw} is not an integer")),
        )
    })?;
    if DateTime::from_timestamp(timestamp, 0).is_none() {
        return Err(fail(
            RequiredField::Timestamp,
            FieldProblem::Invalid(format!("{timestamp} is out of range")),
        ));
    }
    let level = record
        .risk
        .as_ref()
        .ok_or_else(|| fail(RequiredField::Risk, FieldProblem::Missing))?;
    let risk = level
        .as_i64()
        .and_then(RiskLevel::from_level)
        .ok_or_else(|| {
            fail(
                RequiredField::Risk,
                FieldProblem::Invalid(format!("{level} is not one of 1, 2, 3")),
            )
        })?;
    let description = record
        .description
        .as_deref()
        .ok_or_else(|| fail(RequiredField::Description, FieldProblem::Missing))?;
    let affected = record
        .affected
        .as_deref()
        .ok_or_else(|| fail(RequiredField::Affected, FieldProblem::Missing))?;

    Ok(ValidatedAdvisory {
        category,
        identifier,
        title,
        timestamp,
        risk,
        description,
        affected,
        action_taken: record.action_taken.as_deref().unwrap_or_default(),
        acknowledgments: record.acknowledgments.as_deref().unwrap_or_default(),
    })
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Fills the page template for validated advisories.
#[derive(Debug)]
pub struct PageRenderer<'a> {
    template: &'a Template,
    config: &'a GeneratorConfig,
    offset: FixedOffset,
}

impl<'a> PageRenderer<'a> {
    /// Fails if the template uses a placeholder outside [`PLACEHOLDERS`].
    pub fn new(template: &'a Template, config: &'a GeneratorConfig) -> Result<Self> {
        template.check_placeholders(&PLACEHOLDERS)?;
        let offset = config
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                AdvisoryError::config(format!(
                    "utc_offset_minutes {} is out of range",
                    config.utc_offset_minutes
                ))
            })?;

        Ok(Self {
            template,
            config,
            offset,
        })
    }

    /// Render one page.
    pub fn render(&self, advisory: &ValidatedAdvisory<'_>) -> Result<String> {
        let date = format_date(advisory.timestamp, self.offset).ok_or_else(|| {
            AdvisoryError::validation(format!(
                "{}: timestamp {} is out of range",
                advisory.identifier, advisory.timestamp
            ))
        })?;

        let mut values = Substitutions::new();
        values
            .escaped("TITLE", advisory.title)
            .escaped("IDENTIFIER", self.display_identifier(advisory.identifier))
            .escaped("DATE", date)
            .trusted("LEVEL", advisory.risk.label())
            .escaped("DESCRIPTION", advisory.description)
            .trusted(
                "AFFECTEDVERSIONS",
                self.affected_versions_block(advisory.category, advisory.affected),
            )
            .trusted("ACTION", advisory.action_taken)
            .trusted(
                "ACKNOWLEDGMENTS",
                acknowledgments_block(advisory.acknowledgments),
            );

        self.template.render(&values)
    }

    /// Rewrite the lowercase identifier prefix into its display form.
    pub fn display_identifier(&self, identifier: &str) -> String {
        normalize_identifier(
            identifier,
            &self.config.identifier_prefix,
            &self.config.identifier_display_prefix,
        )
    }

    fn affected_versions_block(&self, category: Category, affected: &[AffectedVersion]) -> String {
        let product = escape_html(&format!("{} {}", self.config.brand, category.display_name()));
        affected
            .iter()
            .map(|a| {
                let operator = a
                    .operator
                    .as_deref()
                    .map(|op| format!("{} ", escape_html(op)))
                    .unwrap_or_default();
                format!(
                    "<li>{product} {operator}<strong>{}</strong> ({})</li>",
                    escape_html(&a.version),
                    escape_html(&a.cve)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn acknowledgments_block(acknowledgments: &[Acknowledgment]) -> String {
    acknowledgments
        .iter()
        .map(|a| {
            format!(
                "<li>{} - {} ({}) - {}</li>",
                a.name,
                a.organization.as_deref().unwrap_or_default(),
                a.contact.as_deref().unwrap_or_default(),
                a.reason.as_deref().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace a leading `prefix` with `display`; other identifiers pass through.
pub fn normalize_identifier(identifier: &str, prefix: &str, display: &str) -> String {
    match identifier.strip_prefix(prefix) {
        Some(rest) if !prefix.is_empty() => format!("{display}{rest}"),
        _ => identifier.to_string(),
    }
}

/// `22nd April 2014`, in the given reference zone.
pub fn format_date(timestamp: i64, offset: FixedOffset) -> Option<String> {
    let date = DateTime::from_timestamp(timestamp, 0)?.with_timezone(&offset);
    let day = date.day();
    Some(format!(
        "{day}{} {}",
        ordinal_suffix(day),
        date.format("%B %Y")
    ))
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

// ---------------------------------------------------------------------------
// Batch rendering
// ---------------------------------------------------------------------------

/// Outcome of rendering every loaded record.
#[derive(Debug, Clone, Default)]
pub struct RenderReport {
    /// Records considered.
    pub discovered: usize,
    /// `(category, identifier)` of every rendered page.
    pub rendered: BTreeSet<(Category, String)>,
    /// Records rejected by validation.
    pub failures: Vec<ValidationFailure>,
    /// Page files written.
    pub files: Vec<WrittenFile>,
}

impl RenderReport {
    pub fn generated(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_rendered(&self, category: Category, identifier: &str) -> bool {
        self.rendered.contains(&(category, identifier.to_string()))
    }
}

/// Path of the page for `identifier`. Flat across categories.
pub fn page_path(
    advisories_dir: &Path,
    identifier: &str,
    extension: &str,
) -> std::path::PathBuf {
    advisories_dir.join(format!("{identifier}.{extension}"))
}

/// Validate and render every record in `loaded`, writing one page each into
/// `advisories_dir`.
#[instrument(skip_all, fields(dir = %advisories_dir.display(), records = loaded.loaded()))]
pub fn render_pages(
    loaded: &LoadedAdvisories,
    renderer: &PageRenderer<'_>,
    advisories_dir: &Path,
) -> Result<RenderReport> {
    let mut report = RenderReport::default();
    let mut owners: HashMap<&str, Category> = HashMap::new();

    for (category, identifier, record) in loaded.iter() {
        report.discovered += 1;

        let advisory = match validate(category, identifier, record) {
            Ok(advisory) => advisory,
            Err(failure) => {
                warn!(
                    %category,
                    identifier,
                    field = %failure.field,
                    "{failure}, no page generated"
                );
                report.failures.push(failure);
                continue;
            }
        };

        if let Some(previous) = owners.insert(identifier, category) {
            warn!(
                identifier,
                %previous,
                %category,
                "identifier used in two categories, page will be overwritten"
            );
        }

        let page = renderer.render(&advisory)?;
        let path = page_path(advisories_dir, identifier, &renderer.config.page_extension);
        report.files.push(write_output(&path, &page)?);
        report.rendered.insert((category, identifier.to_string()));
    }

    info!(
        generated = report.generated(),
        discovered = report.discovered,
        failed = report.failures.len(),
        "advisory pages generated"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
