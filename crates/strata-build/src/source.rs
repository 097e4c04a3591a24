//! Typed source model and artifact path conventions
//!
//! Every path that enters the graph is a normalized, `/`-separated relative
//! string, and every source file carries an explicit [`SourceKind`] derived
//! from its extension by a total classification function. Artifact names
//! follow fixed suffix conventions that the downstream tool invocations rely
//! on: `<base>.verified`, `<base>.verified.tmp`, `<base>.dump`,
//! `<base>.types`.

use std::path::Path;

/// Kind of source file, derived from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Meta-source annotation file, translated before verification.
    MetaSource,
    /// Verifier-native interface file.
    Interface,
    /// Verifier-native implementation file.
    Implementation,
}

impl SourceKind {
    /// Classify a path by extension. Returns `None` for files the pipeline
    /// does not manage.
    pub fn classify(path: &str) -> Option<Self> {
        match extension_of(path)? {
            "meta" => Some(Self::MetaSource),
            "fsti" => Some(Self::Interface),
            "fst" => Some(Self::Implementation),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::MetaSource => "meta",
            Self::Interface => "fsti",
            Self::Implementation => "fst",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MetaSource => write!(f, "meta-source"),
            Self::Interface => write!(f, "interface"),
            Self::Implementation => write!(f, "implementation"),
        }
    }
}

/// A discovered source file. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: String,
    kind: SourceKind,
}

impl SourceFile {
    /// Build a source file from a path, classifying it by extension.
    pub fn discover(path: impl AsRef<Path>) -> Option<Self> {
        let path = normalize_path(&path.as_ref().to_string_lossy());
        let kind = SourceKind::classify(&path)?;
        Some(Self { path, kind })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Module name defined by this file.
    pub fn module_name(&self) -> String {
        module_name_of(&self.path)
    }
}

/// Normalize a path into the graph's `/`-separated relative form.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                // A leading .. escapes the tree and must be preserved.
                if matches!(parts.last(), None | Some(&"..")) {
                    parts.push("..");
                } else {
                    parts.pop();
                }
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Join a directory and a relative path, then normalize.
pub fn join_path(dir: &str, rest: &str) -> String {
    if dir.is_empty() {
        normalize_path(rest)
    } else {
        normalize_path(&format!("{dir}/{rest}"))
    }
}

/// The file name component of a normalized path.
pub fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// The directory component of a normalized path, or "" at the tree root.
pub fn dir_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

/// The extension (without the dot) of a normalized path.
pub fn extension_of(path: &str) -> Option<&str> {
    let name = file_name_of(path);
    match name.rfind('.') {
        Some(i) if i > 0 => Some(&name[i + 1..]),
        _ => None,
    }
}

/// Drop the extension of a normalized path.
pub fn drop_extension(path: &str) -> String {
    let name = file_name_of(path);
    match name.rfind('.') {
        Some(i) if i > 0 => path[..path.len() - (name.len() - i)].to_string(),
        _ => path.to_string(),
    }
}

/// Module name for a file: base name with the first letter uppercased and
/// the extension dropped.
pub fn module_name_of(path: &str) -> String {
    let name = file_name_of(path);
    let stem = match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    };
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Is `path` equal to or inside `root` (component-boundary aware)?
pub fn path_under(root: &str, path: &str) -> bool {
    path == root || path.starts_with(&format!("{root}/"))
}

/// `<path>.verified`: marker asserting the file passed the verifier.
pub fn verified(path: &str) -> String {
    format!("{path}.verified")
}

/// `<path>.verified.tmp`: the verifier's raw output, copied to `.verified`.
pub fn verified_tmp(path: &str) -> String {
    format!("{path}.verified.tmp")
}

/// `<path>.dump`: serialized type-signature export of a verified module.
pub fn dump(path: &str) -> String {
    format!("{path}.dump")
}

/// `<base>.types`: cross-stage type import consumed by the translator.
pub fn types_artifact(base: &str) -> String {
    format!("{base}.types")
}

/// Generated-artifact tree layout, mirroring the source tree.
#[derive(Debug, Clone)]
pub struct ObjectLayout {
    root: String,
    dummy_root: String,
    external_root: String,
    extract_root: String,
}

impl ObjectLayout {
    pub fn new(object_root: &str) -> Self {
        let root = normalize_path(object_root);
        Self {
            dummy_root: format!("{root}/dummies"),
            external_root: format!("{root}/external"),
            extract_root: format!("{root}/ml_out"),
            root,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn dummy_root(&self) -> &str {
        &self.dummy_root
    }

    pub fn external_root(&self) -> &str {
        &self.external_root
    }

    pub fn extract_root(&self) -> &str {
        &self.extract_root
    }

    /// Map a source path into the object tree; paths already under the
    /// object root are returned unchanged.
    pub fn to_obj(&self, path: &str) -> String {
        if self.under(&self.root, path) {
            path.to_string()
        } else {
            format!("{}/{path}", self.root)
        }
    }

    /// Dummy stand-in for a not-yet-translated meta-source file.
    pub fn dummy(&self, meta_base: &str, extension: &str) -> String {
        format!("{}/{meta_base}.{extension}", self.dummy_root)
    }

    /// Rewrite a dummy-tree path back to the real object tree.
    pub fn rewrite_dummy(&self, path: &str) -> String {
        match path.strip_prefix(&format!("{}/", self.dummy_root)) {
            Some(rest) => format!("{}/{rest}", self.root),
            None => path.to_string(),
        }
    }

    /// Object-tree copy of a foreign file.
    pub fn external_copy(&self, path: &str) -> String {
        format!("{}/{}", self.external_root, file_name_of(path))
    }

    /// Shared dump location for a foreign file, produced once with default
    /// options regardless of which project file references it.
    pub fn external_dump(&self, path: &str) -> String {
        format!("{}/{}.dump", self.external_root, file_name_of(path))
    }

    /// Extraction artifact for a module.
    pub fn extracted(&self, module_name: &str, suffix: &str) -> String {
        format!("{}/{}{suffix}", self.extract_root, module_name.replace('.', "_"))
    }

    /// Is the path managed by this project (under the object root or one of
    /// the source roots)?
    pub fn is_project(&self, path: &str, source_roots: &[String]) -> bool {
        self.under(&self.root, path)
            || source_roots.iter().any(|root| self.under(root, path))
    }

    fn under(&self, root: &str, path: &str) -> bool {
        path == root || path.starts_with(&format!("{root}/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_is_total_over_known_extensions() {
        assert_eq!(SourceKind::classify("code/a.meta"), Some(SourceKind::MetaSource));
        assert_eq!(SourceKind::classify("code/a.fsti"), Some(SourceKind::Interface));
        assert_eq!(SourceKind::classify("code/a.fst"), Some(SourceKind::Implementation));
        assert_eq!(SourceKind::classify("code/a.txt"), None);
        assert_eq!(SourceKind::classify("code/noext"), None);
    }

    #[rstest::rstest]
    #[case("code/arch/memory.fst", "Memory")]
    #[case("specs/Spec.Hash.fsti", "Spec.Hash")]
    #[case("code/x64_decls.meta", "X64_decls")]
    #[case("code/Memory.fst", "Memory")]
    fn test_module_name_uppercases_first_letter(#[case] path: &str, #[case] module: &str) {
        assert_eq!(module_name_of(path), module);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./code//a.fst"), "code/a.fst");
        assert_eq!(normalize_path("code\\lib\\a.fst"), "code/lib/a.fst");
        assert_eq!(normalize_path("code/lib/../a.fst"), "code/a.fst");
        assert_eq!(normalize_path("../specs/a.fst"), "../specs/a.fst");
    }

    #[test]
    fn test_drop_extension_keeps_directories() {
        assert_eq!(drop_extension("code/a.b/x.fst"), "code/a.b/x");
        assert_eq!(drop_extension("noext"), "noext");
    }

    #[test]
    fn test_obj_mapping_is_idempotent() {
        let layout = ObjectLayout::new("obj");
        assert_eq!(layout.to_obj("code/a.fst"), "obj/code/a.fst");
        assert_eq!(layout.to_obj("obj/code/a.fst"), "obj/code/a.fst");
    }

    #[test]
    fn test_dummy_rewrite() {
        let layout = ObjectLayout::new("obj");
        assert_eq!(
            layout.rewrite_dummy("obj/dummies/code/a.fst"),
            "obj/code/a.fst"
        );
        assert_eq!(layout.rewrite_dummy("code/a.fst"), "code/a.fst");
    }

    #[test]
    fn test_is_project_requires_component_boundary() {
        let layout = ObjectLayout::new("obj");
        let roots = vec!["code".to_string(), "specs".to_string()];
        assert!(layout.is_project("code/a.fst", &roots));
        assert!(layout.is_project("obj/code/a.fst", &roots));
        assert!(!layout.is_project("codex/a.fst", &roots));
        assert!(!layout.is_project("../lib/a.fst", &roots));
    }

    #[test]
    fn test_artifact_suffix_conventions() {
        assert_eq!(verified("obj/a.fst"), "obj/a.fst.verified");
        assert_eq!(verified_tmp("obj/a.fst"), "obj/a.fst.verified.tmp");
        assert_eq!(dump("obj/a.fsti"), "obj/a.fsti.dump");
        assert_eq!(types_artifact("obj/a"), "obj/a.types");
    }

    #[test]
    fn test_external_dump_is_shared_by_name() {
        let layout = ObjectLayout::new("obj");
        assert_eq!(
            layout.external_dump("../lib/Spec.Hash.fst"),
            "obj/external/Spec.Hash.fst.dump"
        );
    }

    #[test]
    fn test_extracted_path_flattens_dots() {
        let layout = ObjectLayout::new("obj");
        assert_eq!(layout.extracted("Spec.Hash", ".ml"), "obj/ml_out/Spec_Hash.ml");
    }
}
