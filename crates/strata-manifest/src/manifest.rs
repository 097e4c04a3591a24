//! Project manifest types (strata.toml)

use crate::error::ManifestResult;
use crate::options::OptionTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Project manifest (strata.toml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectManifest {
    pub project: ProjectMeta,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub options: OptionsConfig,
    #[serde(default)]
    pub foreign: Vec<ForeignFile>,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default, rename = "manual-dependencies")]
    pub manual_dependencies: BTreeMap<String, Vec<String>>,
}

impl ProjectManifest {
    /// Parse a manifest from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load a manifest from a file.
    pub fn from_file(path: &Path) -> ManifestResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::ManifestError::read(path, e))?;
        Ok(Self::from_str(&content)?)
    }

    /// Compile the declared option rules into a resolvable table.
    pub fn option_table(&self) -> ManifestResult<OptionTable> {
        OptionTable::from_config(&self.options)
    }
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectMeta {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Source-tree and object-tree layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    /// Roots scanned for source files, in declared order.
    #[serde(default = "default_source_roots")]
    pub source_roots: Vec<String>,
    /// Generated-artifact tree mirroring the source layout.
    #[serde(default = "default_object_root")]
    pub object_root: String,
    /// Roots whose files must not depend on files outside these roots;
    /// violations are logged, not fatal.
    #[serde(default = "default_spec_areas")]
    pub spec_areas: Vec<String>,
    /// Anchor for `{:from BASE}` includes; defaults to the first source root.
    #[serde(default)]
    pub base_root: Option<String>,
}

impl PathsConfig {
    pub fn base_root(&self) -> &str {
        match &self.base_root {
            Some(root) => root,
            None => self
                .source_roots
                .first()
                .map(String::as_str)
                .unwrap_or("code"),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_roots: default_source_roots(),
            object_root: default_object_root(),
            spec_areas: default_spec_areas(),
            base_root: None,
        }
    }
}

fn default_source_roots() -> Vec<String> {
    vec!["code".to_string(), "specs".to_string()]
}

fn default_object_root() -> String {
    "obj".to_string()
}

fn default_spec_areas() -> Vec<String> {
    vec!["specs".to_string()]
}

/// External tool programs. Only their input/output artifact shapes matter to
/// graph construction; the programs themselves run later, under the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    /// Meta-source to interface/implementation translator.
    #[serde(default = "default_translator")]
    pub translator: String,
    /// Interface/implementation verifier.
    #[serde(default = "default_verifier")]
    pub verifier: String,
    /// Whole-project dependency-inference tool.
    #[serde(default = "default_depend")]
    pub depend: String,
    /// Type-export import tool (ordered dumps in, `.types` artifact out).
    #[serde(default = "default_import_types", rename = "import-types")]
    pub import_types: String,
    /// Implementation-to-compiled-form extractor.
    #[serde(default = "default_extract")]
    pub extract: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            translator: default_translator(),
            verifier: default_verifier(),
            depend: default_depend(),
            import_types: default_import_types(),
            extract: default_extract(),
        }
    }
}

fn default_translator() -> String {
    "strata-translate".to_string()
}

fn default_verifier() -> String {
    "strata-verify".to_string()
}

fn default_depend() -> String {
    "strata-depend".to_string()
}

fn default_import_types() -> String {
    "strata-import-types".to_string()
}

fn default_extract() -> String {
    "strata-extract".to_string()
}

/// Per-file build-option declarations
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OptionsConfig {
    /// Fail on unresolved open/friend references instead of skipping them.
    #[serde(default, rename = "strict-references")]
    pub strict_references: bool,
    /// Default auxiliary include flags passed to the translator.
    #[serde(default, rename = "meta-includes")]
    pub meta_includes: Option<String>,
    /// Ordered path-pattern rules; first match wins within each precedence
    /// tier (exact path, then glob).
    #[serde(default, rename = "rule")]
    pub rules: Vec<OptionRule>,
    /// Extension-keyed fallback flags (keys without the leading dot).
    #[serde(default)]
    pub extension: BTreeMap<String, String>,
}

/// One option rule: a path pattern mapped to flags, or to `skip`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionRule {
    pub pattern: String,
    #[serde(default)]
    pub flags: Option<String>,
    /// Override of the default translator include flags.
    #[serde(default, rename = "meta-includes")]
    pub meta_includes: Option<String>,
    /// Exclude matching files from the build entirely.
    #[serde(default)]
    pub skip: bool,
}

/// A file outside the managed tree, assumed pre-verified with default
/// options; copied under the object root's external area.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForeignFile {
    pub path: String,
}

/// Extraction of implementation files into a compiled form
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Module names excluded from extraction.
    #[serde(default, rename = "no-extract")]
    pub no_extract: Vec<String>,
}
