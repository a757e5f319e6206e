//! End-to-end `generate` pipeline: records → pages + listing fragments + sidebar.

use std::time::Instant;

use tracing::{info, instrument};

use advisorygen_shared::{IndexPolicy, Result, RunConfig};
use advisorygen_template::Template;

use crate::index::{build_index, write_index};
use crate::loader::load_advisories;
use crate::output::WrittenFile;
use crate::render::{PageRenderer, ValidationFailure, render_pages};

/// Result of one generator run.
#[derive(Debug)]
pub struct GenerateSummary {
    /// Candidate record files found.
    pub discovered: usize,
    /// Records parsed successfully.
    pub loaded: usize,
    /// Pages written.
    pub generated: usize,
    /// Files that could not be parsed.
    pub skipped: usize,
    /// Records rejected by page validation.
    pub failures: Vec<ValidationFailure>,
    /// Every file written (pages, listings, sidebar).
    pub files: Vec<WrittenFile>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Run the full generator.
///
/// 1. Read the page template (fatal if unreadable or malformed)
/// 2. Load records
/// 3. Render one page per valid record
/// 4. Build and write listing and sidebar fragments
#[instrument(
    skip_all,
    fields(input = %config.input_root.display(), output = %config.output_root.display())
)]
pub fn generate(config: &RunConfig) -> Result<GenerateSummary> {
    let start = Instant::now();
    let settings = &config.generator;
    let advisories_dir = config.advisories_dir();

    // --- Phase 1: Template ---
    let template = Template::from_file(&config.template_path)?;
    let renderer = PageRenderer::new(&template, settings)?;

    // --- Phase 2: Load ---
    let loaded = load_advisories(&config.input_root)?;

    // --- Phase 3: Pages ---
    let report = render_pages(&loaded, &renderer, &advisories_dir)?;

    // --- Phase 4: Indexes ---
    let index = match settings.index_policy {
        IndexPolicy::AllLoaded => build_index(&loaded, |_, _| true),
        IndexPolicy::RenderedOnly => build_index(&loaded, |category, identifier| {
            report.is_rendered(category, identifier)
        }),
    };
    let index_files = write_index(&index, settings, &advisories_dir)?;

    let mut files = report.files;
    files.extend(index_files);

    let summary = GenerateSummary {
        discovered: loaded.discovered(),
        loaded: loaded.loaded(),
        generated: report.rendered.len(),
        skipped: loaded.skipped().len(),
        failures: report.failures,
        files,
        elapsed: start.elapsed(),
    };

    info!(
        generated = summary.generated,
        discovered = summary.discovered,
        failed = summary.failures.len(),
        "generation complete"
    );

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    use advisorygen_shared::{AdvisoryError, GeneratorConfig, RequiredField};

    const TEMPLATE: &str = "<h2>~~TITLE~~ (~~IDENTIFIER~~)</h2><p>~~DATE~~</p>\
        <strong>~~LEVEL~~</strong><p>~~DESCRIPTION~~</p><ul>~~AFFECTEDVERSIONS~~</ul>\
        <p>~~ACTION~~</p><ul>~~ACKNOWLEDGMENTS~~</ul>";

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("advisorygen-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// The scenario from the product docs: one good and one incomplete
    /// server advisory.
    fn seed_input(input: &Path) {
        write(input, "advisory-template.php", TEMPLATE);
        write(
            input,
            "server/oc-sa-2014-001.json",
            r#"{
                "Title": "Example Flaw",
                "Timestamp": 1398124800,
                "Risk": 3,
                "Description": "D1",
                "Affected": [{"Version": "7.0.0", "CVE": "CVE-2014-0001"}]
            }"#,
        );
        write(
            input,
            "server/oc-sa-2014-002.json",
            r#"{
                "Title": "No Description",
                "Timestamp": 1398211200,
                "Risk": 2,
                "Affected": [{"Version": "6.0.2", "CVE": "CVE-2014-0002"}]
            }"#,
        );
    }

    fn run_config(input: &Path, output: &Path, generator: GeneratorConfig) -> RunConfig {
        RunConfig::new(input, output, None, generator).unwrap()
    }

    fn read(path: PathBuf) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn end_to_end_scenario() {
        let tmp = temp_dir();
        let (input, output) = (tmp.join("in"), tmp.join("www"));
        seed_input(&input);

        let summary = generate(&run_config(&input, &output, GeneratorConfig::default())).unwrap();

        assert_eq!(summary.discovered, 2);
        assert_eq!(summary.generated, 1);
        assert_eq!(summary.failures.len(), 1);
        let failure = summary.failures[0].to_string();
        assert!(failure.contains("oc-sa-2014-002"));
        assert!(failure.contains("Description"));
        assert_eq!(summary.failures[0].field, RequiredField::Description);

        let advisories = output.join("advisories");
        let page = read(advisories.join("oc-sa-2014-001.php"));
        assert!(page.contains("Example Flaw"));
        assert!(page.contains("22nd April 2014"));
        assert!(page.contains("High"));
        assert!(page.contains("CVE-2014-0001"));
        assert!(!advisorygen_template::has_placeholder(&page));
        assert!(!advisories.join("oc-sa-2014-002.php").exists());

        let listing = read(advisories.join("server-list-part.php"));
        let section = listing
            .split("<p>Version 7.0.0</p>\n")
            .nth(1)
            .unwrap()
            .split("<br><br>")
            .next()
            .unwrap();
        assert_eq!(section.matches("<a href=").count(), 1);
        assert!(section.contains("oc-sa-2014-001"));

        assert!(advisories.join("advisory-side.php").exists());
        assert!(advisories.join("desktop-list-part.php").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn default_policy_indexes_validation_failures() {
        let tmp = temp_dir();
        let (input, output) = (tmp.join("in"), tmp.join("www"));
        seed_input(&input);

        generate(&run_config(&input, &output, GeneratorConfig::default())).unwrap();

        let listing = read(output.join("advisories/server-list-part.php"));
        assert!(listing.contains("<p>Version 6.0.2</p>"));
        assert!(listing.contains("oc-sa-2014-002"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rendered_only_policy_drops_validation_failures() {
        let tmp = temp_dir();
        let (input, output) = (tmp.join("in"), tmp.join("www"));
        seed_input(&input);

        let generator = GeneratorConfig {
            index_policy: IndexPolicy::RenderedOnly,
            ..GeneratorConfig::default()
        };
        generate(&run_config(&input, &output, generator)).unwrap();

        let listing = read(output.join("advisories/server-list-part.php"));
        assert!(!listing.contains("6.0.2"));
        assert!(!listing.contains("oc-sa-2014-002"));
        let sidebar = read(output.join("advisories/advisory-side.php"));
        assert!(!sidebar.contains("oc-sa-2014-002"));
        assert!(sidebar.contains("oc-sa-2014-001"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn record_named_like_sidebar_leaves_sidebar_intact() {
        let tmp = temp_dir();
        let (input, output) = (tmp.join("in"), tmp.join("www"));
        seed_input(&input);
        write(
            &input,
            "server/advisory-side.json",
            r#"{
                "Title": "Impostor",
                "Timestamp": 1398124800,
                "Risk": 1,
                "Description": "D",
                "Affected": [{"Version": "7.0.0", "CVE": "CVE-2014-0009"}]
            }"#,
        );

        let summary = generate(&run_config(&input, &output, GeneratorConfig::default())).unwrap();

        assert_eq!(summary.generated, 1);
        assert!(
            summary
                .failures
                .iter()
                .any(|f| f.identifier == "advisory-side" && f.field == RequiredField::Identifier)
        );
        let sidebar = read(output.join("advisories/advisory-side.php"));
        assert!(sidebar.starts_with("<p>ownCloud Desktop</p>\n"), "{sidebar}");
        assert!(!sidebar.contains("<h2>"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn numeric_fields_stored_as_strings_render() {
        let tmp = temp_dir();
        let (input, output) = (tmp.join("in"), tmp.join("www"));
        write(&input, "advisory-template.php", TEMPLATE);
        write(
            &input,
            "desktop/oc-sa-2014-020.json",
            r#"{
                "Title": "Quoted Numbers",
                "Timestamp": "1398124800",
                "Risk": "2",
                "Description": "D",
                "Affected": [{"Version": "1.5.3", "CVE": "CVE-2014-0020"}]
            }"#,
        );

        let summary = generate(&run_config(&input, &output, GeneratorConfig::default())).unwrap();

        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.generated, 1);
        let page = read(output.join("advisories/oc-sa-2014-020.php"));
        assert!(page.contains("22nd April 2014"));
        assert!(page.contains("<strong>Medium</strong>"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn second_run_is_byte_identical() {
        let tmp = temp_dir();
        let (input, output) = (tmp.join("in"), tmp.join("www"));
        seed_input(&input);
        let config = run_config(&input, &output, GeneratorConfig::default());

        let first = generate(&config).unwrap();
        let snapshot: Vec<(PathBuf, String)> = first
            .files
            .iter()
            .map(|f| (f.path.clone(), read(f.path.clone())))
            .collect();

        let second = generate(&config).unwrap();

        assert_eq!(first.files, second.files);
        for (path, content) in snapshot {
            assert_eq!(read(path), content);
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_template_aborts_before_writing() {
        let tmp = temp_dir();
        let (input, output) = (tmp.join("in"), tmp.join("www"));
        seed_input(&input);
        std::fs::remove_file(input.join("advisory-template.php")).unwrap();

        let err = generate(&run_config(&input, &output, GeneratorConfig::default())).unwrap_err();
        assert!(matches!(err, AdvisoryError::Io { .. }));
        assert!(!output.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unreadable_input_root_aborts() {
        let tmp = temp_dir();
        let input = tmp.join("missing");
        let template = tmp.join("page.php");
        std::fs::write(&template, TEMPLATE).unwrap();

        let config =
            RunConfig::new(&input, tmp.join("www"), Some(template), GeneratorConfig::default())
                .unwrap();
        let err = generate(&config).unwrap_err();
        assert!(matches!(err, AdvisoryError::Io { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn fixture_tree_generates() {
        let tmp = temp_dir();
        let config = RunConfig::new(
            "../../../fixtures/advisories",
            &tmp,
            Some(PathBuf::from("../../../fixtures/advisory-template.php")),
            GeneratorConfig::default(),
        )
        .unwrap();

        let summary = generate(&config).unwrap();

        assert_eq!(summary.generated, 2);
        assert_eq!(summary.skipped, 1);
        let desktop = read(tmp.join("advisories/oc-sa-2014-003.php"));
        assert!(desktop.contains("&lt;self-signed&gt; certificates &amp; did not warn"));
        assert!(desktop.contains("ownCloud Desktop &lt; <strong>1.5.3</strong>"));
        assert!(desktop.contains("<strong>Low</strong>"));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
