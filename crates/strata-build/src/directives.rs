//! Typed directive grammar for meta-source files
//!
//! Meta-source files reference other modules through a small directive
//! language. The scanner recognizes four forms and produces typed records,
//! so adding a directive form is a localized change:
//!
//! - `include {:types} "Name"`: reference to another module's externally
//!   computed type signature (cross-stage), not a retranslation.
//! - `include "file"`: reference to a sibling meta-source file, optionally
//!   `{:from BASE}` to anchor the path at the base source root.
//! - `open Name` / `module X = Name`: depend on a module's interface.
//! - `friend Name`: depend on a module's implementation, not just its
//!   interface; friend code may see internal definitions.

use regex::Regex;

/// One parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `include {:types} "Name"`
    IncludeTypes { module: String },
    /// `include "file"`, optionally `{:from BASE}`
    IncludeFile { path: String, from_base: bool },
    /// `open Name` or `module X = Name`
    Open { module: String },
    /// `friend Name`
    Friend { module: String },
}

/// Compiled directive patterns.
#[derive(Debug)]
pub struct DirectiveScanner {
    include: Regex,
    types_attr: Regex,
    from_base_attr: Regex,
    open: Regex,
    module_alias: Regex,
    friend: Regex,
}

impl DirectiveScanner {
    pub fn new() -> Self {
        // match `include {:attr1} ... {:attrn} "filename"`
        Self {
            include: Regex::new(r#"include((?:\s*\{:[\w ]*\})*)\s*"(\S+)""#)
                .expect("static directive pattern"),
            types_attr: Regex::new(r"\{:\s*types\s*\}").expect("static directive pattern"),
            from_base_attr: Regex::new(r"\{:\s*from\s+BASE\s*\}").expect("static directive pattern"),
            open: Regex::new(r"\bopen\s+([A-Za-z0-9_.]+)").expect("static directive pattern"),
            module_alias: Regex::new(r"\bmodule\s+[A-Za-z0-9_]+\s*=\s*([A-Za-z0-9_.]+)")
                .expect("static directive pattern"),
            friend: Regex::new(r"\bfriend\s+([A-Za-z0-9_.]+)").expect("static directive pattern"),
        }
    }

    /// Extract every directive from one meta-source file. Directives are
    /// order-independent within the file.
    pub fn scan(&self, text: &str) -> Vec<Directive> {
        let mut directives = Vec::new();
        for captures in self.include.captures_iter(text) {
            let attrs = &captures[1];
            let operand = captures[2].to_string();
            if self.types_attr.is_match(attrs) {
                directives.push(Directive::IncludeTypes { module: operand });
            } else {
                directives.push(Directive::IncludeFile {
                    path: operand,
                    from_base: self.from_base_attr.is_match(attrs),
                });
            }
        }
        for captures in self.open.captures_iter(text) {
            directives.push(Directive::Open {
                module: captures[1].to_string(),
            });
        }
        for captures in self.module_alias.captures_iter(text) {
            directives.push(Directive::Open {
                module: captures[1].to_string(),
            });
        }
        for captures in self.friend.captures_iter(text) {
            directives.push(Directive::Friend {
                module: captures[1].to_string(),
            });
        }
        directives
    }
}

impl Default for DirectiveScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_include_file_plain() {
        let scanner = DirectiveScanner::new();
        let directives = scanner.scan(r#"include "memory.meta""#);
        assert_eq!(
            directives,
            vec![Directive::IncludeFile {
                path: "memory.meta".to_string(),
                from_base: false,
            }]
        );
    }

    #[test]
    fn test_include_from_base() {
        let scanner = DirectiveScanner::new();
        let directives = scanner.scan(r#"include {:from BASE} "lib/util/operator.meta""#);
        assert_eq!(
            directives,
            vec![Directive::IncludeFile {
                path: "lib/util/operator.meta".to_string(),
                from_base: true,
            }]
        );
    }

    #[test]
    fn test_include_types() {
        let scanner = DirectiveScanner::new();
        let directives = scanner.scan(r#"include {:types} "Memory""#);
        assert_eq!(
            directives,
            vec![Directive::IncludeTypes {
                module: "Memory".to_string(),
            }]
        );
    }

    #[test]
    fn test_open_module_alias_and_friend() {
        let scanner = DirectiveScanner::new();
        let text = "open Words.Seq\nmodule M = Collections.Lists\nfriend Memory\n";
        let directives = scanner.scan(text);
        assert_eq!(
            directives,
            vec![
                Directive::Open {
                    module: "Words.Seq".to_string(),
                },
                Directive::Open {
                    module: "Collections.Lists".to_string(),
                },
                Directive::Friend {
                    module: "Memory".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_directives_anywhere_in_file() {
        let scanner = DirectiveScanner::new();
        let text = r#"
// header comment
include {:types} "Memory"
procedure Copy() {}
include "helpers.meta"
open Arch.Types
"#;
        let directives = scanner.scan(text);
        assert_eq!(directives.len(), 3);
    }

    #[test]
    fn test_unrelated_text_produces_nothing() {
        let scanner = DirectiveScanner::new();
        assert!(scanner.scan("procedure Main() { call Copy(); }").is_empty());
    }
}
