//! Core domain types for security advisories.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// A product line an advisory applies to.
///
/// The set is fixed; each category maps to one input subdirectory and one
/// listing fragment. Declaration order is the processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Desktop,
    Mobile,
    Server,
}

impl Category {
    /// All categories, in processing order.
    pub const ALL: [Category; 3] = [Category::Desktop, Category::Mobile, Category::Server];

    /// Directory / file-name form (`server`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::Server => "server",
        }
    }

    /// Capitalized display form (`Server`).
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Desktop => "Desktop",
            Self::Mobile => "Mobile",
            Self::Server => "Server",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// RiskLevel
// ---------------------------------------------------------------------------

/// Human risk label looked up from the integer `Risk` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Map the stored integer to a label. Values outside `1..=3` have none.
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// AdvisoryRecord
// ---------------------------------------------------------------------------

/// One advisory as decoded from its JSON file.
///
/// Required fields are still `Option` here: a record with a missing field
/// loads fine and is rejected later by page validation, so the index can
/// decide independently whether to list it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AdvisoryRecord {
    /// Display title.
    pub title: Option<String>,
    /// Publication time, seconds since the Unix epoch.
    pub timestamp: Option<LooseInt>,
    /// Risk level as stored (1 = Low, 2 = Medium, 3 = High).
    pub risk: Option<LooseInt>,
    /// Free-text description.
    pub description: Option<String>,
    /// Affected product versions, in declaration order.
    pub affected: Option<Vec<AffectedVersion>>,
    /// What was done about it. Absent means empty.
    pub action_taken: Option<String>,
    /// People credited for the report. Absent means none.
    #[serde(rename = "Acknowledgment")]
    pub acknowledgments: Option<Vec<Acknowledgment>>,
}

impl AdvisoryRecord {
    /// Affected versions, or an empty slice when the field is absent.
    pub fn affected_versions(&self) -> &[AffectedVersion] {
        self.affected.as_deref().unwrap_or_default()
    }

    /// `Timestamp` as an integer, if present and numeric.
    pub fn timestamp_secs(&self) -> Option<i64> {
        self.timestamp.as_ref().and_then(LooseInt::as_i64)
    }
}

/// An integer field that hand-edited records sometimes store as a string
/// (`"Risk": "3"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseInt {
    Number(i64),
    Text(String),
}

impl LooseInt {
    /// The integer value; `None` for text that is not a base-10 integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<i64> for LooseInt {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl std::fmt::Display for LooseInt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "'{s}'"),
        }
    }
}

/// A single affected-version entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedVersion {
    #[serde(rename = "Version")]
    pub version: String,
    /// Comparison operator such as `<` or `<=`.
    #[serde(rename = "Operator", default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    /// Vulnerability identifier (usually a CVE number).
    #[serde(rename = "CVE", default)]
    pub cve: String,
}

/// A credited reporter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgment {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Company", default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(rename = "Mail", default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(rename = "Reason", default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// RequiredField
// ---------------------------------------------------------------------------

/// Fields a record must carry before a page is rendered for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredField {
    /// The record's file stem, which names its page.
    Identifier,
    Title,
    Timestamp,
    Risk,
    Description,
    Affected,
}

impl RequiredField {
    /// Record keys in the check order used for diagnostics.
    pub const ALL: [RequiredField; 5] = [
        RequiredField::Title,
        RequiredField::Timestamp,
        RequiredField::Risk,
        RequiredField::Description,
        RequiredField::Affected,
    ];

    /// Key name as it appears in the record file.
    pub fn key(self) -> &'static str {
        match self {
            Self::Identifier => "Identifier",
            Self::Title => "Title",
            Self::Timestamp => "Timestamp",
            Self::Risk => "Risk",
            Self::Description => "Description",
            Self::Affected => "Affected",
        }
    }
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
