//! Generator configuration.
//!
//! Every setting has a default, so the two positional arguments alone
//! configure a complete run. An optional TOML file overrides the defaults
//! and CLI options override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AdvisoryError, Result};

/// File name of the page template looked up in the input root when no
/// explicit template is configured (extension appended from `page_extension`).
const DEFAULT_TEMPLATE_STEM: &str = "advisory-template";

// ---------------------------------------------------------------------------
// Config structs (matching the TOML schema)
// ---------------------------------------------------------------------------

/// Generator settings, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Brand prefixed to category names ("ownCloud Server").
    #[serde(default = "default_brand")]
    pub brand: String,

    /// Lowercase identifier prefix rewritten for display.
    #[serde(default = "default_identifier_prefix")]
    pub identifier_prefix: String,

    /// Display form replacing `identifier_prefix`.
    #[serde(default = "default_identifier_display_prefix")]
    pub identifier_display_prefix: String,

    /// Offset of the reference time zone used for page dates.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// href prefix for index links; the identifier is appended.
    #[serde(default = "default_link_base")]
    pub link_base: String,

    /// Extension of every generated file.
    #[serde(default = "default_page_extension")]
    pub page_extension: String,

    /// Maximum links per category in the sidebar fragment.
    #[serde(default = "default_sidebar_limit")]
    pub sidebar_limit: usize,

    /// Which records the listing and sidebar fragments consider.
    #[serde(default)]
    pub index_policy: IndexPolicy,

    /// Page template file. Defaults to `<input>/advisory-template.<ext>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            brand: default_brand(),
            identifier_prefix: default_identifier_prefix(),
            identifier_display_prefix: default_identifier_display_prefix(),
            utc_offset_minutes: 0,
            link_base: default_link_base(),
            page_extension: default_page_extension(),
            sidebar_limit: default_sidebar_limit(),
            index_policy: IndexPolicy::default(),
            template: None,
        }
    }
}

fn default_brand() -> String {
    "ownCloud".into()
}
fn default_identifier_prefix() -> String {
    "oc-sa-".into()
}
fn default_identifier_display_prefix() -> String {
    "oC-SA-".into()
}
fn default_link_base() -> String {
    "/security/advisory?id=".into()
}
fn default_page_extension() -> String {
    "php".into()
}
fn default_sidebar_limit() -> usize {
    5
}

/// Whether records that fail page validation still appear in the indexes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexPolicy {
    /// Index every loaded record, even ones without a rendered page.
    #[default]
    AllLoaded,
    /// Index only records whose page was rendered.
    RenderedOnly,
}

impl GeneratorConfig {
    /// Reject settings that cannot produce sensible output.
    pub fn validate(&self) -> Result<()> {
        if self.page_extension.is_empty() || self.page_extension.contains(['/', '\\', '.']) {
            return Err(AdvisoryError::config(format!(
                "invalid page_extension '{}'",
                self.page_extension
            )));
        }
        // chrono only accepts offsets strictly inside one day.
        if !(-(24 * 60 - 1)..=24 * 60 - 1).contains(&self.utc_offset_minutes) {
            return Err(AdvisoryError::config(format!(
                "utc_offset_minutes {} is out of range",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config file + CLI arguments)
// ---------------------------------------------------------------------------

/// Everything one invocation needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root of the advisory record tree (one subdirectory per category).
    pub input_root: PathBuf,
    /// Root of the website tree receiving generated files.
    pub output_root: PathBuf,
    /// Resolved page template path.
    pub template_path: PathBuf,
    /// Generator settings.
    pub generator: GeneratorConfig,
}

impl RunConfig {
    /// Merge the positional arguments with generator settings.
    ///
    /// An explicit `template` wins over the one named in `generator`.
    pub fn new(
        input_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        template: Option<PathBuf>,
        generator: GeneratorConfig,
    ) -> Result<Self> {
        generator.validate()?;
        let input_root = input_root.into();
        let template_path = template
            .or_else(|| generator.template.clone())
            .unwrap_or_else(|| {
                input_root.join(format!(
                    "{DEFAULT_TEMPLATE_STEM}.{}",
                    generator.page_extension
                ))
            });

        Ok(Self {
            input_root,
            output_root: output_root.into(),
            template_path,
            generator,
        })
    }

    /// Directory receiving every generated file.
    pub fn advisories_dir(&self) -> PathBuf {
        self.output_root.join("advisories")
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load generator settings from a specific TOML file.
pub fn load_config_from(path: &Path) -> Result<GeneratorConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AdvisoryError::io(path, e))?;

    let config: GeneratorConfig = toml::from_str(&content).map_err(|e| {
        AdvisoryError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    tracing::debug!(?path, "loaded generator config");

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = GeneratorConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("link_base"));
        assert!(toml_str.contains("all-loaded"));
    }

    #[test]
    fn config_roundtrip() {
        let config = GeneratorConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: GeneratorConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
brand = "Example"
sidebar_limit = 3
index_policy = "rendered-only"
"#;
        let config: GeneratorConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.brand, "Example");
        assert_eq!(config.sidebar_limit, 3);
        assert_eq!(config.index_policy, IndexPolicy::RenderedOnly);
        assert_eq!(config.page_extension, "php");
        assert_eq!(config.identifier_display_prefix, "oC-SA-");
    }

    #[test]
    fn validate_rejects_bad_extension_and_offset() {
        let mut config = GeneratorConfig::default();
        config.page_extension = "../x".into();
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.utc_offset_minutes = 24 * 60;
        assert!(config.validate().is_err());

        for offset in [i32::MIN, i32::MAX, -(24 * 60)] {
            let config = GeneratorConfig {
                utc_offset_minutes: offset,
                ..GeneratorConfig::default()
            };
            assert!(config.validate().is_err(), "offset {offset} accepted");
        }

        let config = GeneratorConfig {
            utc_offset_minutes: -(24 * 60 - 1),
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_ok());

        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn run_config_resolves_template() {
        let run = RunConfig::new("/in", "/out", None, GeneratorConfig::default())
            .expect("run config");
        assert_eq!(run.template_path, PathBuf::from("/in/advisory-template.php"));
        assert_eq!(run.advisories_dir(), PathBuf::from("/out/advisories"));

        let generator = GeneratorConfig {
            template: Some("/etc/page.php".into()),
            ..GeneratorConfig::default()
        };
        let run = RunConfig::new("/in", "/out", None, generator.clone()).expect("run config");
        assert_eq!(run.template_path, PathBuf::from("/etc/page.php"));

        let run = RunConfig::new("/in", "/out", Some("/cli.php".into()), generator)
            .expect("run config");
        assert_eq!(run.template_path, PathBuf::from("/cli.php"));
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let err = load_config_from(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, AdvisoryError::Io { .. }));
    }
}
