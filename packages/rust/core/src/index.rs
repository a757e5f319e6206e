//! Listing and sidebar index builder.
//!
//! Groups records into per-category version buckets (newest version first,
//! oldest advisory first inside a bucket) and renders them as the
//! per-category listing fragments and the global sidebar fragment.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, instrument};

use advisorygen_shared::{AdvisoryRecord, Category, GeneratorConfig, Result};
use advisorygen_template::escape_html;
use url::form_urlencoded;

use crate::loader::LoadedAdvisories;
use crate::output::{WrittenFile, write_output};
use crate::version::VersionKey;

/// File name stem of the sidebar fragment.
const SIDEBAR_STEM: &str = "advisory-side";

/// Suffix of the per-category listing fragment stem (`server-list-part`).
const LISTING_SUFFIX: &str = "-list-part";

/// Whether a page named `stem` would land on an index fragment's path.
///
/// Compared case-insensitively so the answer holds on case-folding file
/// systems too.
pub fn is_reserved_stem(stem: &str) -> bool {
    if stem.eq_ignore_ascii_case(SIDEBAR_STEM) {
        return true;
    }
    Category::ALL.into_iter().any(|category| {
        stem.len() == category.as_str().len() + LISTING_SUFFIX.len()
            && stem.to_ascii_lowercase() == format!("{category}{LISTING_SUFFIX}")
    })
}

// ---------------------------------------------------------------------------
// Index model
// ---------------------------------------------------------------------------

/// One advisory link inside a version bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry<'a> {
    pub identifier: &'a str,
    /// Link text; the identifier when the record has no title.
    pub title: &'a str,
    pub timestamp: Option<i64>,
}

/// Advisories affecting one version, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBucket<'a> {
    pub version: &'a str,
    pub entries: Vec<IndexEntry<'a>>,
}

/// Buckets of one category, newest version first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryIndex<'a> {
    pub category: Category,
    pub buckets: Vec<VersionBucket<'a>>,
}

/// All categories, in [`Category::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryIndex<'a> {
    pub categories: Vec<CategoryIndex<'a>>,
}

/// Bucket the records of `loaded` for which `include` returns true.
#[instrument(skip_all, fields(records = loaded.loaded()))]
pub fn build_index<'a>(
    loaded: &'a LoadedAdvisories,
    include: impl Fn(Category, &str) -> bool,
) -> AdvisoryIndex<'a> {
    let categories = Category::ALL
        .into_iter()
        .map(|category| {
            let records = loaded
                .category(category)
                .iter()
                .filter(|(id, _)| include(category, id.as_str()))
                .map(|(id, record)| (id.as_str(), record));
            let index = index_category(category, records);
            debug!(%category, versions = index.buckets.len(), "category indexed");
            index
        })
        .collect();

    AdvisoryIndex { categories }
}

fn index_category<'a>(
    category: Category,
    records: impl Iterator<Item = (&'a str, &'a AdvisoryRecord)>,
) -> CategoryIndex<'a> {
    // Keyed by identifier so a version listed twice in one record counts once.
    let mut by_version: BTreeMap<VersionKey<'a>, BTreeMap<&'a str, &'a AdvisoryRecord>> =
        BTreeMap::new();

    for (identifier, record) in records {
        for affected in record.affected_versions() {
            by_version
                .entry(VersionKey(affected.version.as_str()))
                .or_default()
                .insert(identifier, record);
        }
    }

    let buckets = by_version
        .into_iter()
        .rev()
        .map(|(version, members)| {
            let mut entries: Vec<IndexEntry<'a>> = members
                .into_iter()
                .map(|(identifier, record)| IndexEntry {
                    identifier,
                    title: record.title.as_deref().unwrap_or(identifier),
                    timestamp: record.timestamp_secs(),
                })
                .collect();
            entries.sort_by_key(|e| (e.timestamp, e.identifier));
            VersionBucket {
                version: version.0,
                entries,
            }
        })
        .collect();

    CategoryIndex { category, buckets }
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

/// Listing fragment for one category.
pub fn render_listing(index: &CategoryIndex<'_>, link_base: &str) -> String {
    let mut out = String::new();
    for bucket in &index.buckets {
        out.push_str(&format!("<p>Version {}</p>\n", escape_html(bucket.version)));
        for entry in &bucket.entries {
            out.push_str(&link_line(entry, link_base));
        }
        out.push_str("<br><br>\n");
    }
    out
}

/// Sidebar fragment: a heading per category followed by at most
/// `sidebar_limit` links, taken in listing order.
///
/// A category without entries still gets its heading.
pub fn render_sidebar(index: &AdvisoryIndex<'_>, config: &GeneratorConfig) -> String {
    let mut out = String::new();
    for category_index in &index.categories {
        out.push_str(&format!(
            "<p>{}</p>\n",
            escape_html(&format!(
                "{} {}",
                config.brand,
                category_index.category.display_name()
            ))
        ));

        let links = category_index
            .buckets
            .iter()
            .flat_map(|b| b.entries.iter())
            .take(config.sidebar_limit);
        for entry in links {
            out.push_str(&link_line(entry, &config.link_base));
        }
    }
    out
}

/// The identifier is form-encoded as a query value, then the whole href is
/// HTML-escaped.
fn link_line(entry: &IndexEntry<'_>, link_base: &str) -> String {
    let identifier: String = form_urlencoded::byte_serialize(entry.identifier.as_bytes()).collect();
    format!(
        "<a href=\"{}{}\">{}</a><br>\n",
        escape_html(link_base),
        escape_html(&identifier),
        escape_html(entry.title)
    )
}

/// Path of the listing fragment for `category`.
pub fn listing_path(
    advisories_dir: &Path,
    category: Category,
    extension: &str,
) -> std::path::PathBuf {
    advisories_dir.join(format!("{category}{LISTING_SUFFIX}.{extension}"))
}

/// Path of the sidebar fragment.
pub fn sidebar_path(advisories_dir: &Path, extension: &str) -> std::path::PathBuf {
    advisories_dir.join(format!("{SIDEBAR_STEM}.{extension}"))
}

/// Write one listing fragment per category and the sidebar fragment.
#[instrument(skip_all, fields(dir = %advisories_dir.display()))]
pub fn write_index(
    index: &AdvisoryIndex<'_>,
    config: &GeneratorConfig,
    advisories_dir: &Path,
) -> Result<Vec<WrittenFile>> {
    let mut files = Vec::with_capacity(index.categories.len() + 1);

    for category_index in &index.categories {
        let path = listing_path(advisories_dir, category_index.category, &config.page_extension);
        files.push(write_output(&path, &render_listing(category_index, &config.link_base))?);
    }

    let path = sidebar_path(advisories_dir, &config.page_extension);
    files.push(write_output(&path, &render_sidebar(index, config))?);

    info!(count = files.len(), "index fragments written");
    Ok(files)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
