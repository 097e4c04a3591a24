//! Configuration Resolver: path -> build-option bundle
//!
//! Precedence: exact path match, then the first matching glob pattern in
//! declared order, then the extension default. A `skip` rule resolves to
//! "absent", which excludes the file from the build graph entirely; absence
//! is an intentional do-not-verify marker, never an error.

use crate::error::{ManifestError, ManifestResult};
use crate::manifest::OptionsConfig;
use glob::Pattern;
use std::collections::BTreeMap;
use std::path::Path;

/// Options attached to one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionBundle {
    /// Ordered verifier flag string, passed through verbatim.
    pub verifier_flags: String,
    /// Override of the default translator include flags, if any.
    pub meta_includes: Option<String>,
}

impl OptionBundle {
    pub fn new(verifier_flags: impl Into<String>) -> Self {
        Self {
            verifier_flags: verifier_flags.into(),
            meta_includes: None,
        }
    }

    pub fn with_meta_includes(mut self, includes: impl Into<String>) -> Self {
        self.meta_includes = Some(includes.into());
        self
    }
}

#[derive(Debug, Clone)]
enum RuleMatcher {
    Exact(String),
    Glob(Pattern),
}

#[derive(Debug, Clone)]
struct TableRule {
    matcher: RuleMatcher,
    /// `None` marks a skip rule.
    bundle: Option<OptionBundle>,
}

/// Compiled option table.
#[derive(Debug, Clone, Default)]
pub struct OptionTable {
    rules: Vec<TableRule>,
    extensions: BTreeMap<String, OptionBundle>,
}

impl OptionTable {
    /// Compile the manifest's option rules, preserving their declared order.
    pub fn from_config(config: &OptionsConfig) -> ManifestResult<Self> {
        let mut rules = Vec::with_capacity(config.rules.len());
        for rule in &config.rules {
            let bundle = if rule.skip {
                None
            } else {
                let flags = rule.flags.as_ref().ok_or_else(|| {
                    ManifestError::RuleWithoutFlags {
                        pattern: rule.pattern.clone(),
                    }
                })?;
                let mut bundle = OptionBundle::new(flags);
                bundle.meta_includes = rule.meta_includes.clone();
                Some(bundle)
            };
            let matcher = if rule.pattern.contains(|c| matches!(c, '*' | '?' | '[')) {
                let pattern = Pattern::new(&rule.pattern).map_err(|e| {
                    ManifestError::BadPattern {
                        pattern: rule.pattern.clone(),
                        source: e,
                    }
                })?;
                RuleMatcher::Glob(pattern)
            } else {
                RuleMatcher::Exact(rule.pattern.clone())
            };
            rules.push(TableRule { matcher, bundle });
        }
        let extensions = config
            .extension
            .iter()
            .map(|(ext, flags)| {
                let key = ext.trim_start_matches('.').to_string();
                (key, OptionBundle::new(flags.clone()))
            })
            .collect();
        Ok(Self { rules, extensions })
    }

    /// Resolve the option bundle for a source path.
    ///
    /// `None` means the file is excluded from all further processing.
    pub fn resolve(&self, path: &str) -> Option<&OptionBundle> {
        for rule in &self.rules {
            if let RuleMatcher::Exact(exact) = &rule.matcher {
                if exact == path {
                    return rule.bundle.as_ref();
                }
            }
        }
        // Glob patterns match across `/`, like the shells this table mimics.
        let glob_options = glob::MatchOptions {
            require_literal_separator: false,
            require_literal_leading_dot: false,
            case_sensitive: true,
        };
        for rule in &self.rules {
            if let RuleMatcher::Glob(pattern) = &rule.matcher {
                if pattern.matches_with(path, glob_options) {
                    return rule.bundle.as_ref();
                }
            }
        }
        let ext = Path::new(path).extension()?.to_str()?;
        self.extensions.get(ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::OptionRule;
    use pretty_assertions::assert_eq;

    fn rule(pattern: &str, flags: &str) -> OptionRule {
        OptionRule {
            pattern: pattern.to_string(),
            flags: Some(flags.to_string()),
            meta_includes: None,
            skip: false,
        }
    }

    fn skip_rule(pattern: &str) -> OptionRule {
        OptionRule {
            pattern: pattern.to_string(),
            flags: None,
            meta_includes: None,
            skip: true,
        }
    }

    fn table(rules: Vec<OptionRule>, extensions: &[(&str, &str)]) -> OptionTable {
        let config = OptionsConfig {
            rules,
            extension: extensions
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..OptionsConfig::default()
        };
        OptionTable::from_config(&config).unwrap()
    }

    #[test]
    fn test_glob_beats_extension_default() {
        let table = table(
            vec![rule("special/*", "--strict --extra")],
            &[("meta", "--strict")],
        );
        let bundle = table.resolve("special/x.meta").unwrap();
        assert_eq!(bundle.verifier_flags, "--strict --extra");
    }

    #[test]
    fn test_exact_beats_glob_regardless_of_declared_order() {
        let table = table(
            vec![
                rule("special/*", "--glob"),
                rule("special/x.meta", "--exact"),
            ],
            &[],
        );
        assert_eq!(table.resolve("special/x.meta").unwrap().verifier_flags, "--exact");
        assert_eq!(table.resolve("special/y.meta").unwrap().verifier_flags, "--glob");
    }

    #[test]
    fn test_first_matching_glob_wins() {
        let table = table(
            vec![rule("code/*", "--first"), rule("code/lib/*", "--second")],
            &[],
        );
        assert_eq!(table.resolve("code/lib/a.fst").unwrap().verifier_flags, "--first");
    }

    #[test]
    fn test_glob_star_crosses_directory_separators() {
        let table = table(vec![rule("code/arch/interop/*", "--interop")], &[]);
        assert_eq!(
            table.resolve("code/arch/interop/x64/mem.fst").unwrap().verifier_flags,
            "--interop"
        );
    }

    #[rstest::rstest]
    #[case("code/a.fst", Some("--default-fst"))]
    #[case("code/deep/tree/b.fst", Some("--default-fst"))]
    #[case("code/a.unknown", None)]
    #[case("noextension", None)]
    fn test_extension_default_fallback(#[case] path: &str, #[case] expected: Option<&str>) {
        let table = table(vec![], &[("fst", "--default-fst")]);
        assert_eq!(
            table.resolve(path).map(|b| b.verifier_flags.as_str()),
            expected
        );
    }

    #[test]
    fn test_skip_rule_excludes_file_even_with_extension_default() {
        let table = table(vec![skip_rule("legacy/*")], &[("meta", "--strict")]);
        assert!(table.resolve("legacy/old.meta").is_none());
        assert!(table.resolve("code/new.meta").is_some());
    }

    #[test]
    fn test_rule_without_flags_is_rejected() {
        let config = OptionsConfig {
            rules: vec![OptionRule {
                pattern: "code/*".to_string(),
                flags: None,
                meta_includes: None,
                skip: false,
            }],
            ..OptionsConfig::default()
        };
        assert!(matches!(
            OptionTable::from_config(&config),
            Err(ManifestError::RuleWithoutFlags { .. })
        ));
    }

    #[test]
    fn test_meta_includes_override_carried() {
        let config = OptionsConfig {
            rules: vec![OptionRule {
                pattern: "code/lib/operator.meta".to_string(),
                flags: Some("--strict".to_string()),
                meta_includes: Some(String::new()),
                skip: false,
            }],
            ..OptionsConfig::default()
        };
        let table = OptionTable::from_config(&config).unwrap();
        let bundle = table.resolve("code/lib/operator.meta").unwrap();
        assert_eq!(bundle.meta_includes.as_deref(), Some(""));
    }
}
