use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

/// Extensions served as `application/javascript`
const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs"];

/// Script files below `root` (or `root` itself), in a stable order.
///
/// Symlinks are followed; unreadable entries are logged and skipped.
pub fn script_sources(root: &Path) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_script(entry.path()) {
            sources.push(entry.into_path());
        }
    }
    sources
}

fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_collects_scripts_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("user/nested")).unwrap();
        fs::write(root.join("Login.js"), "").unwrap();
        fs::write(root.join("user/Profile.mjs"), "").unwrap();
        fs::write(root.join("user/nested/Old.cjs"), "").unwrap();
        fs::write(root.join("user/readme.md"), "").unwrap();
        fs::write(root.join("Login.js.backup"), "").unwrap();

        let found: Vec<_> = script_sources(root)
            .into_iter()
            .map(|path| path.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            found,
            vec![
                PathBuf::from("Login.js"),
                PathBuf::from("user/Profile.mjs"),
                PathBuf::from("user/nested/Old.cjs"),
            ]
        );
    }

    #[test]
    fn test_single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("View.js");
        fs::write(&file, "").unwrap();
        assert_eq!(script_sources(&file), vec![file]);
    }
}
