//! Record loader.
//!
//! Reads `<input>/<category>/*.json` for every category into an immutable
//! [`LoadedAdvisories`] snapshot. Files that cannot be read or decoded are
//! skipped with a warning; only an unreadable input root or category
//! directory aborts the run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use advisorygen_shared::{AdvisoryError, AdvisoryRecord, Category, Result};

/// OS housekeeping files that never hold a record.
const HOUSEKEEPING_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// A file that was discovered but produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub category: Category,
    pub path: PathBuf,
    pub reason: String,
}

/// Every successfully parsed record, grouped by category and keyed by
/// identifier.
///
/// Built once per run and only read afterwards. Every category in
/// [`Category::ALL`] has an entry, possibly empty.
#[derive(Debug, Clone, Default)]
pub struct LoadedAdvisories {
    categories: BTreeMap<Category, BTreeMap<String, AdvisoryRecord>>,
    skipped: Vec<SkippedFile>,
}

impl LoadedAdvisories {
    /// Build a snapshot from already-parsed records.
    pub fn from_records(
        records: impl IntoIterator<Item = (Category, String, AdvisoryRecord)>,
    ) -> Self {
        let mut loaded = Self::empty();
        for (category, identifier, record) in records {
            loaded
                .categories
                .entry(category)
                .or_default()
                .insert(identifier, record);
        }
        loaded
    }

    fn empty() -> Self {
        Self {
            categories: Category::ALL
                .into_iter()
                .map(|c| (c, BTreeMap::new()))
                .collect(),
            skipped: Vec::new(),
        }
    }

    /// Records of one category, keyed by identifier.
    pub fn category(&self, category: Category) -> &BTreeMap<String, AdvisoryRecord> {
        static EMPTY: BTreeMap<String, AdvisoryRecord> = BTreeMap::new();
        self.categories.get(&category).unwrap_or(&EMPTY)
    }

    /// Iterate `(category, identifier, record)` in category then identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &str, &AdvisoryRecord)> {
        self.categories.iter().flat_map(|(category, records)| {
            records
                .iter()
                .map(move |(id, record)| (*category, id.as_str(), record))
        })
    }

    /// Files that were discovered but not loaded.
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// Number of loaded records.
    pub fn loaded(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }

    /// Number of candidate record files found, loaded or not.
    pub fn discovered(&self) -> usize {
        self.loaded() + self.skipped.len()
    }
}

/// Load all categories below `input_root`.
#[instrument(skip_all, fields(root = %input_root.display()))]
pub fn load_advisories(input_root: &Path) -> Result<LoadedAdvisories> {
    // Fail on an unreadable root before looking at any category.
    std::fs::read_dir(input_root).map_err(|e| AdvisoryError::io(input_root, e))?;

    let mut loaded = LoadedAdvisories::empty();

    for category in Category::ALL {
        let dir = input_root.join(category.as_str());
        let files = match list_record_files(&dir, category, &mut loaded.skipped) {
            Ok(files) => files,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    %category,
                    path = %dir.display(),
                    "category directory missing, treating as empty"
                );
                continue;
            }
            Err(e) => return Err(AdvisoryError::io(&dir, e)),
        };

        for (identifier, path) in files {
            match read_record(&path) {
                Ok(record) => {
                    let records = loaded.categories.entry(category).or_default();
                    if records.contains_key(&identifier) {
                        warn!(
                            %category,
                            %identifier,
                            path = %path.display(),
                            "duplicate identifier, skipping file"
                        );
                        loaded.skipped.push(SkippedFile {
                            category,
                            path,
                            reason: format!("duplicate identifier '{identifier}'"),
                        });
                        continue;
                    }
                    debug!(%category, %identifier, "loaded advisory");
                    records.insert(identifier, record);
                }
                Err(e) => {
                    warn!(
                        %category,
                        path = %path.display(),
                        error = %e,
                        "could not parse advisory, skipping"
                    );
                    loaded.skipped.push(SkippedFile {
                        category,
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    info!(
        loaded = loaded.loaded(),
        skipped = loaded.skipped.len(),
        "advisory records loaded"
    );

    Ok(loaded)
}

/// Identifier for a record file name: the name minus a trailing `.json`.
pub fn identifier_from_file_name(name: &str) -> &str {
    name.strip_suffix(".json").unwrap_or(name)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// List `(identifier, path)` for candidate files in `dir`, sorted by name.
///
/// Only failing to open `dir` is an error. Entries that cannot be inspected,
/// or whose names are not UTF-8, are recorded in `skipped`.
fn list_record_files(
    dir: &Path,
    category: Category,
    skipped: &mut Vec<SkippedFile>,
) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    let mut skip = |path: PathBuf, reason: String| {
        warn!(%category, path = %path.display(), %reason, "skipping directory entry");
        skipped.push(SkippedFile {
            category,
            path,
            reason,
        });
    };

    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                skip(dir.to_path_buf(), format!("unreadable directory entry: {e}"));
                continue;
            }
        };
        let path = entry.path();

        match entry.file_type() {
            Ok(kind) if kind.is_dir() => continue,
            Ok(_) => {}
            Err(e) => {
                skip(path, format!("cannot stat entry: {e}"));
                continue;
            }
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            skip(path, "file name is not valid UTF-8".to_string());
            continue;
        };
        if is_housekeeping(&name) {
            debug!(%name, "skipping housekeeping file");
            continue;
        }

        files.push((identifier_from_file_name(&name).to_string(), path));
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

fn is_housekeeping(name: &str) -> bool {
    name.starts_with('.') || HOUSEKEEPING_FILES.contains(&name)
}

fn read_record(path: &Path) -> Result<AdvisoryRecord> {
    let content = std::fs::read_to_string(path).map_err(|e| AdvisoryError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| AdvisoryError::parse(format!("invalid JSON in {}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
