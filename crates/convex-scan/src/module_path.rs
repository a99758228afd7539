//! Module paths from file layout
//!
//! `src/lib.rs` and `src/main.rs` are the crate root, `src/net/mod.rs` and `src/net.rs` are both
//! module `net`, `src/net/wan.rs` is `net::wan`. Files under `src/bin/` belong to other targets
//! and have no module path in this crate.

use std::path::Path;

/// Crate root files, the library first
pub(crate) const ROOT_FILES: &[&str] = &["lib.rs", "main.rs"];

/// Module path of `file` relative to `src_root`, or `None` when it isn't part of the crate root
/// target.
pub fn module_path_for(src_root: &Path, file: &Path) -> Option<Vec<String>> {
    let rel = file.strip_prefix(src_root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;

    let (file_name, dirs) = parts.split_last()?;
    if dirs.first() == Some(&"bin") {
        return None;
    }
    let stem = file_name.strip_suffix(".rs")?;

    let mut module: Vec<String> = dirs.iter().map(|d| (*d).to_string()).collect();
    let is_root = dirs.is_empty() && ROOT_FILES.contains(file_name);
    if !is_root && stem != "mod" {
        module.push(stem.to_string());
    }
    Some(module)
}

/// Whether `module` lives inside (or is) `ancestor`
pub fn is_within(module: &[String], ancestor: &[String]) -> bool {
    module.len() >= ancestor.len() && module[..ancestor.len()] == *ancestor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn module(file: &str) -> Option<String> {
        let root = PathBuf::from("/work/app/src");
        module_path_for(&root, &root.join(file)).map(|m| m.join("::"))
    }

    #[test]
    fn test_root_files() {
        assert_eq!(module("lib.rs").as_deref(), Some(""));
        assert_eq!(module("main.rs").as_deref(), Some(""));
    }

    #[test]
    fn test_nested_files_and_mod_rs() {
        assert_eq!(module("net.rs").as_deref(), Some("net"));
        assert_eq!(module("net/mod.rs").as_deref(), Some("net"));
        assert_eq!(module("net/wan.rs").as_deref(), Some("net::wan"));
        assert_eq!(module("net/lib.rs").as_deref(), Some("net::lib"));
    }

    #[test]
    fn test_bin_targets_and_foreign_files() {
        assert_eq!(module("bin/tool.rs"), None);
        assert_eq!(module("bin/tool/main.rs"), None);
        assert_eq!(module("README.md"), None);
        assert_eq!(
            module_path_for(&PathBuf::from("/work/app/src"), &PathBuf::from("/elsewhere/x.rs")),
            None
        );
    }

    #[test]
    fn test_is_within() {
        let tests = vec!["net".to_string(), "tests".to_string()];
        assert!(is_within(&tests, &tests));
        assert!(is_within(
            &["net".to_string(), "tests".to_string(), "deep".to_string()],
            &tests
        ));
        assert!(!is_within(&["net".to_string()], &tests));
    }
}
